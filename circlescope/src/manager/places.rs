//! Places layer manager.
//!
//! Renders point markers for the selected place buckets inside the places
//! circle. Fetches go through the place provider in chunks of at most 30
//! category codes per request and results are cached per bucket; toggling
//! a bucket off and on again re-renders from cache without a new request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};

use crate::cache::ServiceDataCache;
use crate::canvas::{MapCanvas, Marker, MarkerId};
use crate::geometry::LonLat;
use crate::provider::{Place, PlaceProvider};
use crate::registry::{CircleEvent, CircleRegistry, ServiceId};

use super::LayerManager;

/// Maximum category codes per search request, a provider-side limit.
const MAX_CODES_PER_REQUEST: usize = 30;

const CAFE_CODES: &[u32] = &[
    11126, 13032, 13033, 13034, 13035, 13036, 13063, 13372, 17063,
];
const PHARMACY_CODES: &[u32] = &[17145, 17035];
const HOSPITAL_CODES: &[u32] = &[15013, 15014, 15058, 15059];
const MARKET_CODES: &[u32] = &[
    11185, 11186, 11193, 13062, 14009, 14010, 14011, 14012, 14013, 14014, 17054, 17055, 17065,
    17066, 17069, 17070, 17114, 17115, 17142, 17144, 11056, 11057, 11058, 17057, 17058, 17059,
    17060, 17061, 17062, 17064, 17067, 17068, 17071, 17072, 17073, 17074, 17075, 17076, 17077,
    17078, 17079, 17080,
];
const FUEL_CODES: &[u32] = &[19007, 19006];
const PARK_CODES: &[u32] = &[
    10001, 10055, 10058, 12114, 16032, 16033, 16034, 16035, 16036, 16037, 16038, 16039, 18055,
    19020, 19025,
];

/// A selectable place category bucket.
///
/// Each bucket groups the provider category codes that share one marker
/// icon. A code belongs to at most one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceBucket {
    Cafe,
    Pharmacy,
    Hospital,
    Market,
    Fuel,
    Park,
}

impl PlaceBucket {
    pub const ALL: [PlaceBucket; 6] = [
        PlaceBucket::Cafe,
        PlaceBucket::Pharmacy,
        PlaceBucket::Hospital,
        PlaceBucket::Market,
        PlaceBucket::Fuel,
        PlaceBucket::Park,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceBucket::Cafe => "cafe",
            PlaceBucket::Pharmacy => "pharmacy",
            PlaceBucket::Hospital => "hospital",
            PlaceBucket::Market => "market",
            PlaceBucket::Fuel => "fuel",
            PlaceBucket::Park => "park",
        }
    }

    /// Provider category codes belonging to this bucket.
    pub fn codes(&self) -> &'static [u32] {
        match self {
            PlaceBucket::Cafe => CAFE_CODES,
            PlaceBucket::Pharmacy => PHARMACY_CODES,
            PlaceBucket::Hospital => HOSPITAL_CODES,
            PlaceBucket::Market => MARKET_CODES,
            PlaceBucket::Fuel => FUEL_CODES,
            PlaceBucket::Park => PARK_CODES,
        }
    }

    /// Marker icon asset name for this bucket.
    pub fn icon(&self) -> &'static str {
        match self {
            PlaceBucket::Cafe => "coffee",
            PlaceBucket::Pharmacy => "pharmacy",
            PlaceBucket::Hospital => "hospital",
            PlaceBucket::Market => "market",
            PlaceBucket::Fuel => "gas",
            PlaceBucket::Park => "park",
        }
    }

    /// Bucket a provider category code belongs to, `None` if unmapped.
    pub fn for_code(code: u32) -> Option<PlaceBucket> {
        Self::ALL.iter().copied().find(|b| b.codes().contains(&code))
    }
}

impl std::fmt::Display for PlaceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlaceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown place bucket: {s}"))
    }
}

/// Manager for the places marker layer.
pub struct PlacesManager<P> {
    provider: P,
    registry: Arc<CircleRegistry>,
    canvas: Arc<dyn MapCanvas>,
    cache: ServiceDataCache<Place>,
    selected: RwLock<HashSet<PlaceBucket>>,
    markers: Mutex<Vec<MarkerId>>,
}

impl<P> PlacesManager<P> {
    pub fn new(provider: P, registry: Arc<CircleRegistry>, canvas: Arc<dyn MapCanvas>) -> Self {
        Self {
            provider,
            registry,
            canvas,
            cache: ServiceDataCache::new(),
            selected: RwLock::new(HashSet::new()),
            markers: Mutex::new(Vec::new()),
        }
    }

    /// Currently selected buckets, sorted.
    pub fn selected(&self) -> Vec<PlaceBucket> {
        let mut buckets: Vec<PlaceBucket> = self
            .selected
            .read()
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        buckets.sort();
        buckets
    }

    /// Number of place markers currently rendered.
    pub fn marker_count(&self) -> usize {
        self.markers.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn clear_markers(&self) {
        if let Ok(mut markers) = self.markers.lock() {
            for id in markers.drain(..) {
                self.canvas.remove_marker(id);
            }
        }
    }

    fn teardown(&self) {
        self.clear_markers();
        self.cache.invalidate(ServiceId::Places);
        debug!("places layer torn down");
    }
}

impl<P: PlaceProvider> PlacesManager<P> {
    /// Replace the bucket selection and refresh the markers if the places
    /// circle is live.
    pub async fn set_selected(&self, buckets: impl IntoIterator<Item = PlaceBucket>) {
        if let Ok(mut selected) = self.selected.write() {
            *selected = buckets.into_iter().collect();
        }
        if let Some(handle) = self.registry.handle(ServiceId::Places) {
            self.refresh(handle.center, handle.radius_m, handle.generation)
                .await;
        }
    }

    /// Re-fetch and re-render markers for the current selection.
    ///
    /// Cached buckets are served without a request; the rest are fetched in
    /// code chunks. If every request fails the previous markers stay up.
    /// Results are discarded when the circle's generation changed while the
    /// fetch was in flight.
    async fn refresh(&self, center: LonLat, radius_m: f64, generation: u64) {
        let selected = self.selected();
        if selected.is_empty() {
            self.clear_markers();
            debug!("no place buckets selected, markers cleared");
            return;
        }

        let mut merged: Vec<Place> = Vec::new();
        let mut to_fetch: Vec<PlaceBucket> = Vec::new();
        for bucket in &selected {
            match self.cache.get(ServiceId::Places, bucket.as_str()) {
                Some(places) => merged.extend(places),
                None => to_fetch.push(*bucket),
            }
        }

        if !to_fetch.is_empty() {
            let codes: Vec<u32> = to_fetch
                .iter()
                .flat_map(|b| b.codes().iter().copied())
                .collect();
            let mut fetched: Vec<Place> = Vec::new();
            let mut failed_codes: HashSet<u32> = HashSet::new();
            for chunk in codes.chunks(MAX_CODES_PER_REQUEST) {
                match self.provider.search(center, radius_m, chunk).await {
                    Ok(places) => fetched.extend(places),
                    Err(error) => {
                        failed_codes.extend(chunk.iter().copied());
                        warn!(%error, "place search chunk failed");
                    }
                }
            }
            if failed_codes.len() == codes.len() {
                warn!("every place search request failed, keeping previous markers");
                return;
            }

            // The circle may have moved while the requests were in flight;
            // the results belong to the old center and must not reach the
            // cache or the canvas.
            if self.registry.generation(ServiceId::Places) != Some(generation) {
                debug!("discarding stale place results");
                return;
            }

            // Partition the chunk results back into per-bucket cache entries,
            // keyed by each place's first mapped category code. A bucket
            // whose codes fell in a failed chunk gets no cache entry, so
            // re-selecting it retries the request.
            for bucket in &to_fetch {
                let mut entries: Vec<Place> = Vec::new();
                for place in &fetched {
                    let Some(owner) = place.category_ids.iter().find_map(|c| PlaceBucket::for_code(*c))
                    else {
                        continue;
                    };
                    if owner == *bucket && !entries.iter().any(|p| p.id == place.id) {
                        entries.push(place.clone());
                    }
                }
                if bucket.codes().iter().any(|c| failed_codes.contains(c)) {
                    debug!(bucket = bucket.as_str(), "bucket hit a failed request, not cached");
                } else {
                    self.cache
                        .put(ServiceId::Places, bucket.as_str(), entries.clone());
                }
                merged.extend(entries);
            }
        }

        if self.registry.generation(ServiceId::Places) != Some(generation) {
            debug!("discarding stale place results");
            return;
        }

        self.clear_markers();
        let mut seen: HashSet<String> = HashSet::new();
        if let Ok(mut markers) = self.markers.lock() {
            for place in &merged {
                if !seen.insert(place.id.clone()) {
                    continue;
                }
                // Places whose categories map to no bucket are not rendered.
                let Some(bucket) = place.category_ids.iter().find_map(|c| PlaceBucket::for_code(*c))
                else {
                    continue;
                };
                let mut popup = place.name.clone();
                if let Some(category) = &place.category_name {
                    popup.push('\n');
                    popup.push_str(category);
                }
                if let Some(address) = &place.address {
                    popup.push('\n');
                    popup.push_str(address);
                }
                let marker = Marker::at(place.position)
                    .with_icon(bucket.icon())
                    .with_popup(popup);
                markers.push(self.canvas.add_marker(marker));
            }
            info!(count = markers.len(), "place markers rendered");
        }
    }
}

impl<P: PlaceProvider> LayerManager for PlacesManager<P> {
    fn service(&self) -> ServiceId {
        ServiceId::Places
    }

    async fn handle_event(&self, event: CircleEvent) {
        match event {
            CircleEvent::Created {
                center,
                radius_m,
                generation,
                ..
            } => {
                self.cache.invalidate(ServiceId::Places);
                self.refresh(center, radius_m, generation).await;
            }
            CircleEvent::Moved {
                center,
                radius_m,
                generation,
                ..
            } => {
                self.cache.invalidate(ServiceId::Places);
                self.refresh(center, radius_m, generation).await;
            }
            CircleEvent::Removed { .. } => self.teardown(),
        }
    }
}
