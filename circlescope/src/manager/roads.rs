//! Roads layer manager.
//!
//! Fetches `highway=*` ways around the roads circle, clips them to the
//! circle polygon and renders them as a single line layer colored per
//! highway class. The raw fetch is cached; dragging within the debounce
//! window re-clips against the cache only after the committed move
//! invalidates it.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::ServiceDataCache;
use crate::canvas::{LinePaint, MapCanvas};
use crate::geometry::{circle_polygon, clip_ways, LonLat, RoadLine, WayGeometry};
use crate::provider::RoadProvider;
use crate::registry::{CircleEvent, CircleRegistry, ServiceId};

use super::LayerManager;

pub const ROADS_SOURCE_ID: &str = "roads-source";
pub const ROADS_LAYER_ID: &str = "roads-layer";

/// Cache key for the single roads entry; there are no sub-categories.
const CACHE_KEY: &str = "highway";

/// Feature property the line layer reads its color from.
const COLOR_PROPERTY: &str = "color";

const FALLBACK_COLOR: &str = "#888888";
const LINE_WIDTH: f64 = 2.0;

static LEGEND: &[(&str, &str)] = &[
    ("motorway", "#ff0000"),
    ("trunk", "#ff7f00"),
    ("primary", "#ffa500"),
    ("secondary", "#ffff00"),
    ("tertiary", "#9acd32"),
    ("residential", "#00bfff"),
    ("unclassified", "#cccccc"),
    ("service", "#999999"),
    ("footway", "#00ff7f"),
    ("path", "#228b22"),
    ("cycleway", "#8a2be2"),
];

/// Line color for a highway class.
pub fn highway_color(highway: &str) -> &'static str {
    LEGEND
        .iter()
        .find(|(class, _)| *class == highway)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// The highway classes with a dedicated color, in legend order.
pub fn legend() -> &'static [(&'static str, &'static str)] {
    LEGEND
}

/// Manager for the clipped road line layer.
pub struct RoadsManager<R> {
    provider: R,
    registry: Arc<CircleRegistry>,
    canvas: Arc<dyn MapCanvas>,
    cache: ServiceDataCache<WayGeometry>,
    steps: usize,
}

impl<R> RoadsManager<R> {
    pub fn new(
        provider: R,
        registry: Arc<CircleRegistry>,
        canvas: Arc<dyn MapCanvas>,
        steps: usize,
    ) -> Self {
        Self {
            provider,
            registry,
            canvas,
            cache: ServiceDataCache::new(),
            steps,
        }
    }

    fn render(&self, lines: &[RoadLine]) {
        let data = roads_geojson(lines);
        if self.canvas.has_source(ROADS_SOURCE_ID) {
            self.canvas.set_source_data(ROADS_SOURCE_ID, data);
        } else {
            self.canvas.add_geojson_source(ROADS_SOURCE_ID, data);
            self.canvas.add_line_layer(
                ROADS_LAYER_ID,
                ROADS_SOURCE_ID,
                LinePaint {
                    color_property: Some(COLOR_PROPERTY.to_string()),
                    fallback_color: FALLBACK_COLOR.to_string(),
                    width: LINE_WIDTH,
                },
            );
        }
        info!(count = lines.len(), "road segments rendered");
    }

    fn teardown(&self) {
        if self.canvas.has_layer(ROADS_LAYER_ID) {
            self.canvas.remove_layer(ROADS_LAYER_ID);
        }
        if self.canvas.has_source(ROADS_SOURCE_ID) {
            self.canvas.remove_source(ROADS_SOURCE_ID);
        }
        self.cache.invalidate(ServiceId::Roads);
        debug!("roads layer torn down");
    }
}

impl<R: RoadProvider> RoadsManager<R> {
    /// Fetch (or reuse), clip and render the roads for the circle.
    ///
    /// A failed fetch keeps the previous line layer. Results are discarded
    /// when the circle's generation changed while the fetch was in flight.
    async fn refresh(&self, center: LonLat, radius_m: f64, generation: u64) {
        let ways = match self.cache.get(ServiceId::Roads, CACHE_KEY) {
            Some(ways) => ways,
            None => match self.provider.highways_around(center, radius_m).await {
                Ok(ways) => {
                    self.cache.put(ServiceId::Roads, CACHE_KEY, ways.clone());
                    ways
                }
                Err(error) => {
                    warn!(%error, "road fetch failed, keeping previous lines");
                    return;
                }
            },
        };

        let ring = match circle_polygon(center, radius_m, self.steps) {
            Ok(ring) => ring,
            Err(error) => {
                warn!(%error, "invalid circle for road clipping");
                return;
            }
        };
        let clipped = clip_ways(&ways, &ring);

        if self.registry.generation(ServiceId::Roads) != Some(generation) {
            debug!("discarding stale road results");
            return;
        }
        self.render(&clipped);
    }
}

impl<R: RoadProvider> LayerManager for RoadsManager<R> {
    fn service(&self) -> ServiceId {
        ServiceId::Roads
    }

    async fn handle_event(&self, event: CircleEvent) {
        match event {
            CircleEvent::Created {
                center,
                radius_m,
                generation,
                ..
            } => {
                self.refresh(center, radius_m, generation).await;
            }
            CircleEvent::Moved {
                center,
                radius_m,
                generation,
                ..
            } => {
                self.cache.invalidate(ServiceId::Roads);
                self.refresh(center, radius_m, generation).await;
            }
            CircleEvent::Removed { .. } => self.teardown(),
        }
    }
}

/// Build the line FeatureCollection, one feature per clipped piece.
fn roads_geojson(lines: &[RoadLine]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = lines
        .iter()
        .map(|line| {
            let coords: Vec<[f64; 2]> = line.coords.iter().map(|p| [p.lon, p.lat]).collect();
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coords,
                },
                "properties": {
                    "id": line.way_id,
                    "highway": line.highway,
                    "color": highway_color(&line.highway),
                },
            })
        })
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
