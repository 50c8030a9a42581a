//! Buildings layer manager.
//!
//! Fetches building footprints around the buildings circle, applies the
//! display offset correction once, and renders them as an orange fill
//! layer. The corrected collection is kept as the canonical cache that
//! attribute filters are evaluated against; a re-fetch resets any active
//! filter so the new area starts unfiltered.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use geojson::FeatureCollection;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::canvas::{FillPaint, MapCanvas};
use crate::filter::BuildingFilter;
use crate::geometry::LonLat;
use crate::provider::{apply_offset, BuildingProvider};
use crate::registry::{CircleEvent, CircleRegistry, ServiceId};

use super::LayerManager;

pub const BUILDING_SOURCE_ID: &str = "building-source";
pub const BUILDING_LAYER_ID: &str = "building-layer";

const BUILDING_FILL_COLOR: &str = "#ff6600";
const BUILDING_FILL_OPACITY: f64 = 0.5;

/// Feature property holding the floors-above-ground count.
const FLOORS_PROPERTY: &str = "ZEMINUSTUKATSAYISI";

/// Manager for the buildings fill layer.
pub struct BuildingsManager<B> {
    provider: B,
    registry: Arc<CircleRegistry>,
    canvas: Arc<dyn MapCanvas>,
    /// Offset-corrected collection from the latest successful fetch.
    cache: RwLock<Option<FeatureCollection>>,
    filter: RwLock<BuildingFilter>,
}

impl<B> BuildingsManager<B> {
    pub fn new(provider: B, registry: Arc<CircleRegistry>, canvas: Arc<dyn MapCanvas>) -> Self {
        Self {
            provider,
            registry,
            canvas,
            cache: RwLock::new(None),
            filter: RwLock::new(BuildingFilter::default()),
        }
    }

    /// The corrected building collection, if one has been fetched.
    pub fn building_cache(&self) -> Option<FeatureCollection> {
        self.cache.read().ok().and_then(|c| c.clone())
    }

    /// The filter currently applied to the layer.
    pub fn active_filter(&self) -> BuildingFilter {
        self.filter
            .read()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Re-render the layer from the cache through a new filter.
    ///
    /// A no-op with a debug log when no buildings have been fetched yet.
    pub fn apply_filter(&self, filter: BuildingFilter) {
        let Some(cached) = self.building_cache() else {
            debug!("no building cache to filter");
            return;
        };
        let filtered = filter.apply(&cached);
        info!(
            kept = filtered.features.len(),
            total = cached.features.len(),
            "building filter applied"
        );
        if let Ok(mut current) = self.filter.write() {
            *current = filter;
        }
        self.render(&filtered);
    }

    /// Histogram of floors above ground over the cached collection.
    ///
    /// Features without a readable floor count land in the `0` bin.
    pub fn floor_histogram(&self) -> BTreeMap<i64, usize> {
        let mut histogram = BTreeMap::new();
        let Some(cached) = self.building_cache() else {
            return histogram;
        };
        for feature in &cached.features {
            let floors = feature
                .properties
                .as_ref()
                .and_then(|props| match props.get(FLOORS_PROPERTY)? {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                })
                .unwrap_or(0);
            *histogram.entry(floors).or_insert(0) += 1;
        }
        histogram
    }

    fn render(&self, collection: &FeatureCollection) {
        let data = match serde_json::to_value(collection) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "failed to encode building collection");
                return;
            }
        };
        if self.canvas.has_source(BUILDING_SOURCE_ID) {
            self.canvas.set_source_data(BUILDING_SOURCE_ID, data);
        } else {
            self.canvas.add_geojson_source(BUILDING_SOURCE_ID, data);
            self.canvas.add_fill_layer(
                BUILDING_LAYER_ID,
                BUILDING_SOURCE_ID,
                FillPaint {
                    color: BUILDING_FILL_COLOR.to_string(),
                    opacity: BUILDING_FILL_OPACITY,
                },
            );
        }
    }

    fn teardown(&self) {
        if self.canvas.has_layer(BUILDING_LAYER_ID) {
            self.canvas.remove_layer(BUILDING_LAYER_ID);
        }
        if self.canvas.has_source(BUILDING_SOURCE_ID) {
            self.canvas.remove_source(BUILDING_SOURCE_ID);
        }
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
        if let Ok(mut filter) = self.filter.write() {
            *filter = BuildingFilter::default();
        }
        debug!("buildings layer torn down");
    }
}

impl<B: BuildingProvider> BuildingsManager<B> {
    /// Fetch, correct and render the buildings for the circle.
    ///
    /// The offset correction runs exactly once on the raw response. A
    /// failed fetch keeps the previous layer and cache; a stale generation
    /// discards the response before any state is touched.
    async fn refresh(&self, center: LonLat, radius_m: f64, generation: u64) {
        let raw = match self.provider.buildings_around(center, radius_m).await {
            Ok(collection) => collection,
            Err(error) => {
                warn!(%error, "building fetch failed, keeping previous layer");
                return;
            }
        };
        let corrected = apply_offset(raw);

        if self.registry.generation(ServiceId::Buildings) != Some(generation) {
            debug!("discarding stale building results");
            return;
        }

        info!(count = corrected.features.len(), "buildings fetched");
        if let Ok(mut filter) = self.filter.write() {
            *filter = BuildingFilter::default();
        }
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(corrected.clone());
        }
        self.render(&corrected);
    }
}

impl<B: BuildingProvider> LayerManager for BuildingsManager<B> {
    fn service(&self) -> ServiceId {
        ServiceId::Buildings
    }

    async fn handle_event(&self, event: CircleEvent) {
        match event {
            CircleEvent::Created {
                center,
                radius_m,
                generation,
                ..
            }
            | CircleEvent::Moved {
                center,
                radius_m,
                generation,
                ..
            } => {
                self.refresh(center, radius_m, generation).await;
            }
            CircleEvent::Removed { .. } => self.teardown(),
        }
    }
}
