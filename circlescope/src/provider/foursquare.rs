//! Foursquare Places search provider.

use serde::Deserialize;
use tracing::debug;

use super::http::AsyncHttpClient;
use super::types::{Place, PlaceProvider, ProviderError};
use crate::geometry::LonLat;

/// Maximum results per search request.
const SEARCH_LIMIT: u32 = 30;

const DEFAULT_BASE_URL: &str = "https://api.foursquare.com/v3";

/// Places provider backed by the Foursquare Places Search API.
pub struct FoursquarePlaces<C> {
    http: C,
    api_key: String,
    base_url: String,
}

impl<C> FoursquarePlaces<C> {
    /// Create a provider using the public Foursquare endpoint.
    pub fn new(http: C, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl<C: AsyncHttpClient> PlaceProvider for FoursquarePlaces<C> {
    async fn search(
        &self,
        center: LonLat,
        radius_m: f64,
        category_codes: &[u32],
    ) -> Result<Vec<Place>, ProviderError> {
        if category_codes.is_empty() {
            return Ok(Vec::new());
        }

        let categories = category_codes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/places/search?ll={},{}&radius={}&categories={}&limit={}",
            self.base_url, center.lat, center.lon, radius_m as u64, categories, SEARCH_LIMIT
        );

        let body = self.http.get_with_bearer(&url, &self.api_key).await?;
        let parsed: SearchResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let places: Vec<Place> = parsed
            .results
            .into_iter()
            .filter_map(RawPlace::into_place)
            .collect();
        debug!(count = places.len(), "places fetched");
        Ok(places)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    fsq_id: String,
    name: String,
    #[serde(default)]
    categories: Vec<RawCategory>,
    geocodes: Option<RawGeocodes>,
    location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: u32,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeocodes {
    main: Option<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    address: Option<String>,
}

impl RawPlace {
    /// Convert to the domain record; places without coordinates are dropped.
    fn into_place(self) -> Option<Place> {
        let point = self.geocodes?.main?;
        Some(Place {
            id: self.fsq_id,
            name: self.name,
            position: LonLat::new(point.longitude, point.latitude),
            category_ids: self.categories.iter().map(|c| c.id).collect(),
            category_name: self.categories.first().and_then(|c| c.name.clone()),
            address: self.location.and_then(|l| l.address),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockHttpClient, RecordedRequest};

    fn sample_body() -> Vec<u8> {
        br#"{
            "results": [
                {
                    "fsq_id": "abc123",
                    "name": "Sahil Kahvesi",
                    "categories": [{"id": 13032, "name": "Cafe"}],
                    "geocodes": {"main": {"latitude": 39.5961, "longitude": 27.0250}},
                    "location": {"address": "Cumhuriyet Cd. 12"}
                },
                {
                    "fsq_id": "nogeom",
                    "name": "Missing Coordinates",
                    "categories": [{"id": 13032, "name": "Cafe"}]
                }
            ]
        }"#
        .to_vec()
    }

    #[tokio::test]
    async fn test_search_builds_url_and_parses_results() {
        let http = MockHttpClient::with_responses(vec![Ok(sample_body())]);
        let provider = FoursquarePlaces::new(http, "test-key");

        let places = provider
            .search(LonLat::new(27.024772, 39.596321), 500.0, &[13032, 13033])
            .await
            .unwrap();

        // Place without coordinates is dropped.
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "abc123");
        assert_eq!(places[0].category_ids, vec![13032]);
        assert_eq!(places[0].category_name.as_deref(), Some("Cafe"));
        assert_eq!(places[0].position, LonLat::new(27.0250, 39.5961));

        let requests = provider.http.requests();
        assert_eq!(requests.len(), 1);
        match &requests[0] {
            RecordedRequest::GetBearer { url, token } => {
                assert!(url.contains("ll=39.596321,27.024772"));
                assert!(url.contains("radius=500"));
                assert!(url.contains("categories=13032,13033"));
                assert!(url.contains("limit=30"));
                assert_eq!(token, "test-key");
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_category_list_issues_no_request() {
        let http = MockHttpClient::with_responses(vec![]);
        let provider = FoursquarePlaces::new(http, "test-key");

        let places = provider
            .search(LonLat::new(27.0, 39.6), 500.0, &[])
            .await
            .unwrap();

        assert!(places.is_empty());
        assert!(provider.http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let http = MockHttpClient::with_responses(vec![Ok(b"not json".to_vec())]);
        let provider = FoursquarePlaces::new(http, "test-key");

        let err = provider
            .search(LonLat::new(27.0, 39.6), 500.0, &[13032])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
