//! Overpass API road provider.
//!
//! Queries ways tagged `highway=*` within a radius, asking for inline
//! geometry (`out geom`) so no separate node resolution pass is needed.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::http::AsyncHttpClient;
use super::types::{ProviderError, RoadProvider};
use crate::geometry::{LonLat, WayGeometry};

const DEFAULT_INTERPRETER_URL: &str = "https://overpass-api.de/api/interpreter";

/// Highway value used when a way carries no `highway` tag.
const UNKNOWN_HIGHWAY: &str = "unknown";

/// Road provider backed by the public Overpass interpreter.
pub struct OverpassRoads<C> {
    http: C,
    url: String,
}

impl<C> OverpassRoads<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            url: DEFAULT_INTERPRETER_URL.to_string(),
        }
    }

    /// Override the interpreter URL (tests, mirrors).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn build_query(center: LonLat, radius_m: f64) -> String {
        format!(
            "[out:json];(way[\"highway\"](around:{},{},{}););out geom;",
            radius_m as u64, center.lat, center.lon
        )
    }
}

impl<C: AsyncHttpClient> RoadProvider for OverpassRoads<C> {
    async fn highways_around(
        &self,
        center: LonLat,
        radius_m: f64,
    ) -> Result<Vec<WayGeometry>, ProviderError> {
        let query = Self::build_query(center, radius_m);
        let body = self.http.post_text(&self.url, query).await?;

        let parsed: OverpassResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let ways: Vec<WayGeometry> = parsed
            .elements
            .into_iter()
            .filter_map(Element::into_way)
            .collect();
        debug!(count = ways.len(), "highway ways fetched");
        Ok(ways)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Way {
        id: u64,
        #[serde(default)]
        geometry: Vec<GeomPoint>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GeomPoint {
    lat: f64,
    lon: f64,
}

impl Element {
    fn into_way(self) -> Option<WayGeometry> {
        match self {
            Element::Way { id, geometry, tags } if !geometry.is_empty() => Some(WayGeometry {
                id,
                highway: tags
                    .get("highway")
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_HIGHWAY.to_string()),
                coords: geometry
                    .into_iter()
                    .map(|p| LonLat::new(p.lon, p.lat))
                    .collect(),
            }),
            _ => None,
        }
    }
}
