//! Client for the location/NLU backend.
//!
//! The backend does all language understanding and geocoding; this client
//! only models the wire shapes and never interprets them. Responses come in
//! three forms (single result, result list, error object) and are decoded
//! into [`LocationResponse`].

use serde::Deserialize;
use tracing::debug;
use urlencoding::encode;

use super::http::AsyncHttpClient;
use super::types::ProviderError;

/// Client for the location service endpoints.
pub struct LocationBackend<C> {
    http: C,
    base_url: String,
}

/// One geocoded location candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationResult {
    pub latitude: f64,
    pub longitude: f64,
    pub place: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub description: Option<String>,
    // Enhanced-endpoint context fields.
    pub service_type: Option<String>,
    pub context_location: Option<String>,
    pub source: Option<String>,
}

/// Response of the location endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationResponse {
    /// Backend-reported failure.
    Error { error: String },
    /// Multiple candidates.
    Many { results: Vec<LocationResult> },
    /// Single best match.
    Single(LocationResult),
}

/// Structured filter parameters extracted by the backend from a prompt.
///
/// Field names follow the backend contract; all filters are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub zeminustu: Option<i64>,
    pub zeminalti: Option<i64>,
    pub durum: Option<String>,
    pub tip: Option<String>,
    pub seragazi: Option<String>,
    pub deprem_riski: Option<String>,
    #[serde(default)]
    pub deprem_toggle: bool,
    pub sql_query: Option<String>,
    #[serde(default)]
    pub is_update_request: bool,
}

impl<C> LocationBackend<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl<C: AsyncHttpClient> LocationBackend<C> {
    /// Resolve a natural-language location prompt.
    pub async fn locate(&self, prompt: &str) -> Result<LocationResponse, ProviderError> {
        let url = format!("{}/api/location/?prompt={}", self.base_url, encode(prompt));
        let body = self.http.post_json(&url, serde_json::json!({})).await?;
        decode(&body)
    }

    /// Resolve a prompt with richer context fields.
    pub async fn enhanced_locate(
        &self,
        prompt: &str,
        language: &str,
    ) -> Result<LocationResponse, ProviderError> {
        let url = format!(
            "{}/api/enhanced-location/?prompt={}&language={}",
            self.base_url,
            encode(prompt),
            encode(language)
        );
        let body = self.http.post_json(&url, serde_json::json!({})).await?;
        decode(&body)
    }

    /// Amenity search passthrough; the payload is forwarded untouched.
    pub async fn amenities(
        &self,
        amenity_type: &str,
        lat: f64,
        lon: f64,
        radius_m: f64,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!(
            "{}/api/osm/amenities/?amenity_type={}&lat={}&lon={}&radius={}",
            self.base_url,
            encode(amenity_type),
            lat,
            lon,
            radius_m as u64
        );
        let body = self.http.get(&url).await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Extract structured building filter parameters from a prompt.
    pub async fn filter_prompt(&self, prompt: &str) -> Result<FilterParams, ProviderError> {
        let url = format!("{}/ai-filter/filter/", self.base_url);
        let body = self
            .http
            .post_json(&url, serde_json::json!({ "prompt": prompt }))
            .await?;
        let params: FilterParams = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        debug!(?params, "filter parameters extracted");
        Ok(params)
    }
}

fn decode(body: &[u8]) -> Result<LocationResponse, ProviderError> {
    serde_json::from_slice(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockHttpClient, RecordedRequest};

    #[tokio::test]
    async fn test_locate_single_result() {
        let body = br#"{
            "latitude": 39.596321,
            "longitude": 27.024772,
            "place": "Burhaniye",
            "address": "Burhaniye, Balikesir",
            "categories": ["cafe"],
            "description": "seaside town"
        }"#;
        let http = MockHttpClient::with_responses(vec![Ok(body.to_vec())]);
        let backend = LocationBackend::new(http, "http://localhost:8001");

        let response = backend.locate("en yakın kafe").await.unwrap();
        match response {
            LocationResponse::Single(result) => {
                assert_eq!(result.place.as_deref(), Some("Burhaniye"));
                assert_eq!(result.categories, vec!["cafe"]);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let requests = backend.http.requests();
        match &requests[0] {
            RecordedRequest::PostJson { url, .. } => {
                assert_eq!(
                    url,
                    "http://localhost:8001/api/location/?prompt=en%20yak%C4%B1n%20kafe"
                );
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locate_error_shape() {
        let http = MockHttpClient::with_responses(vec![Ok(
            br#"{"error": "location not found"}"#.to_vec(),
        )]);
        let backend = LocationBackend::new(http, "http://localhost:8001");

        let response = backend.locate("asdfgh").await.unwrap();
        assert!(matches!(response, LocationResponse::Error { .. }));
    }

    #[tokio::test]
    async fn test_filter_prompt_parses_params() {
        let body = br#"{
            "zeminustu": 3,
            "zeminalti": null,
            "durum": "1",
            "tip": null,
            "seragazi": "C",
            "deprem_riski": "4",
            "deprem_toggle": true,
            "sql_query": null,
            "is_update_request": false
        }"#;
        let http = MockHttpClient::with_responses(vec![Ok(body.to_vec())]);
        let backend = LocationBackend::new(http, "http://localhost:8001");

        let params = backend.filter_prompt("4 kattan yüksek riskli binalar").await.unwrap();
        assert_eq!(params.zeminustu, Some(3));
        assert_eq!(params.durum.as_deref(), Some("1"));
        assert_eq!(params.seragazi.as_deref(), Some("C"));
        assert_eq!(params.deprem_riski.as_deref(), Some("4"));
        assert!(params.deprem_toggle);
        assert!(!params.is_update_request);
    }
}
