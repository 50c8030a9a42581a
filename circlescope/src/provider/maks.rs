//! MAKS buildings API provider.
//!
//! The MAKS backend serves building footprints whose coordinate reference
//! is vertically offset from the map's. The provider queries in backend
//! space (offset subtracted from the requested center); the manager shifts
//! the response into map space with [`apply_offset`], exactly once per raw
//! fetch - the correction is not idempotent.

use geojson::{FeatureCollection, GeoJson, Value};
use serde::Deserialize;
use tracing::debug;

use super::http::AsyncHttpClient;
use super::types::{BuildingProvider, ProviderError};
use crate::geometry::LonLat;

/// Longitude component of the display correction, in degrees.
pub const OFFSET_LON: f64 = 0.0;

/// Latitude component of the display correction, in degrees.
pub const OFFSET_LAT: f64 = -0.0158;

/// Shift every Polygon/MultiPolygon ring coordinate by the display offset.
///
/// Other geometry types pass through untouched. Must be applied exactly
/// once to a raw fetch; applying it again shifts the data out of place.
pub fn apply_offset(mut collection: FeatureCollection) -> FeatureCollection {
    for feature in &mut collection.features {
        let Some(geometry) = feature.geometry.as_mut() else {
            continue;
        };
        match &mut geometry.value {
            Value::Polygon(rings) => {
                for ring in rings {
                    for coord in ring {
                        shift(coord);
                    }
                }
            }
            Value::MultiPolygon(polygons) => {
                for polygon in polygons {
                    for ring in polygon {
                        for coord in ring {
                            shift(coord);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    collection
}

fn shift(coord: &mut Vec<f64>) {
    if coord.len() >= 2 {
        coord[0] += OFFSET_LON;
        coord[1] += OFFSET_LAT;
    }
}

/// Buildings provider backed by the MAKS HTTP API.
pub struct MaksBuildings<C> {
    http: C,
    base_url: String,
}

impl<C> MaksBuildings<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl<C: AsyncHttpClient> MaksBuildings<C> {
    /// Run a gated SQL update against the buildings dataset.
    ///
    /// Destructive; callers must have obtained explicit user confirmation
    /// before invoking this.
    pub async fn update(
        &self,
        sql_query: &str,
        building_ids: &[i64],
    ) -> Result<u64, ProviderError> {
        let url = format!("{}/maks/update", self.base_url);
        let body = serde_json::json!({
            "sql_query": sql_query,
            "building_ids": building_ids,
        });
        let response = self.http.post_json(&url, body).await?;
        let parsed: UpdateResponse = serde_json::from_slice(&response)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(parsed.affected_rows)
    }

    /// Restore the buildings dataset to its original state.
    ///
    /// Destructive; confirmation-gated like [`Self::update`].
    pub async fn restore(&self) -> Result<(), ProviderError> {
        let url = format!("{}/maks/yapi/restore", self.base_url);
        self.http.post_json(&url, serde_json::json!({})).await?;
        Ok(())
    }

    /// Clone the buildings dataset into the working table.
    ///
    /// Destructive; confirmation-gated like [`Self::update`].
    pub async fn clone_dataset(&self) -> Result<(), ProviderError> {
        let url = format!("{}/maks/yapi/clone", self.base_url);
        self.http.post_json(&url, serde_json::json!({})).await?;
        Ok(())
    }
}

impl<C: AsyncHttpClient> BuildingProvider for MaksBuildings<C> {
    async fn buildings_around(
        &self,
        center: LonLat,
        radius_m: f64,
    ) -> Result<FeatureCollection, ProviderError> {
        // Query in backend space: undo the display offset on the center.
        let lon = center.lon - OFFSET_LON;
        let lat = center.lat - OFFSET_LAT;
        let url = format!(
            "{}/maks/bina?lon={}&lat={}&radius={}",
            self.base_url, lon, lat, radius_m as u64
        );

        let body = self.http.get(&url).await?;
        let text = String::from_utf8(body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| ProviderError::InvalidResponse(e.to_string()))?;
        let collection = FeatureCollection::try_from(geojson)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!(count = collection.features.len(), "buildings fetched");
        Ok(collection)
    }
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    affected_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockHttpClient, RecordedRequest};

    fn building_body() -> Vec<u8> {
        br#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[27.0, 39.6], [27.001, 39.6], [27.001, 39.601], [27.0, 39.6]]]
                },
                "properties": {"ID": 1, "ZEMINUSTUKATSAYISI": 4}
            }]
        }"#
        .to_vec()
    }

    #[tokio::test]
    async fn test_query_center_is_shifted_into_backend_space() {
        let http = MockHttpClient::with_responses(vec![Ok(building_body())]);
        let provider = MaksBuildings::new(http, "http://localhost:8001");

        let collection = provider
            .buildings_around(LonLat::new(27.0, 39.6), 500.0)
            .await
            .unwrap();
        assert_eq!(collection.features.len(), 1);

        let requests = provider.http.requests();
        match &requests[0] {
            RecordedRequest::Get { url } => {
                assert!(url.contains("/maks/bina?"));
                assert!(url.contains("radius=500"));
                // lat has OFFSET_LAT (-0.0158) subtracted before the request.
                let lat_param: f64 = url
                    .split("lat=")
                    .nth(1)
                    .and_then(|s| s.split('&').next())
                    .and_then(|s| s.parse().ok())
                    .unwrap();
                assert!((lat_param - 39.6158).abs() < 1e-9);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_apply_offset_single_ring() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[27.0, 39.6]]]},
                "properties": {}
            }]
        }"#;
        let geojson: GeoJson = text.parse().unwrap();
        let collection = FeatureCollection::try_from(geojson).unwrap();

        let shifted = apply_offset(collection);
        let geometry = shifted.features[0].geometry.as_ref().unwrap();
        match &geometry.value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0][0][0], 27.0);
                assert!((rings[0][0][1] - (39.6 - 0.0158)).abs() < 1e-12);
            }
            other => panic!("unexpected geometry: {other:?}"),
        }
    }

    #[test]
    fn test_apply_offset_is_not_idempotent() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[27.0, 39.6]]]},
                "properties": {}
            }]
        }"#;
        let geojson: GeoJson = text.parse().unwrap();
        let collection = FeatureCollection::try_from(geojson).unwrap();

        let once = apply_offset(collection);
        let twice = apply_offset(once.clone());

        let lat = |fc: &FeatureCollection| match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings[0][0][1],
            _ => unreachable!(),
        };
        assert!((lat(&once) - lat(&twice)).abs() > 1e-6);
    }

    #[test]
    fn test_apply_offset_covers_multipolygons() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[27.0, 39.6], [27.1, 39.7]]]]
                },
                "properties": {}
            }]
        }"#;
        let geojson: GeoJson = text.parse().unwrap();
        let shifted = apply_offset(FeatureCollection::try_from(geojson).unwrap());
        match &shifted.features[0].geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polygons) => {
                assert!((polygons[0][0][0][1] - (39.6 - 0.0158)).abs() < 1e-12);
                assert!((polygons[0][0][1][1] - (39.7 - 0.0158)).abs() < 1e-12);
            }
            other => panic!("unexpected geometry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_parses_affected_rows() {
        let http =
            MockHttpClient::with_responses(vec![Ok(br#"{"affected_rows": 12}"#.to_vec())]);
        let provider = MaksBuildings::new(http, "http://localhost:8001");

        let affected = provider
            .update("UPDATE yapi SET \"DURUM\" = '2'", &[5, 6, 7])
            .await
            .unwrap();
        assert_eq!(affected, 12);

        let requests = provider.http.requests();
        match &requests[0] {
            RecordedRequest::PostJson { url, body } => {
                assert!(url.ends_with("/maks/update"));
                assert_eq!(body["building_ids"], serde_json::json!([5, 6, 7]));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
