//! External service providers.
//!
//! Each integrated service gets a thin async client that turns HTTP
//! responses into domain records. Everything goes through the
//! [`AsyncHttpClient`] seam so the exact requests can be asserted in tests.

mod backend;
mod foursquare;
mod http;
mod maks;
mod overpass;
mod types;

pub use backend::{FilterParams, LocationBackend, LocationResponse, LocationResult};
pub use foursquare::FoursquarePlaces;
pub use http::{AsyncHttpClient, ReqwestClient};
pub use maks::{apply_offset, MaksBuildings, OFFSET_LAT, OFFSET_LON};
pub use overpass::OverpassRoads;
pub use types::{BuildingProvider, Place, PlaceProvider, ProviderError, RoadProvider};

#[cfg(test)]
pub(crate) mod mock {
    //! Mock HTTP client for provider unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::http::AsyncHttpClient;
    use super::types::ProviderError;

    /// A request observed by the mock, in issue order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedRequest {
        Get { url: String },
        GetBearer { url: String, token: String },
        PostText { url: String, body: String },
        PostJson { url: String, body: serde_json::Value },
    }

    /// HTTP client returning queued canned responses.
    pub struct MockHttpClient {
        responses: Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockHttpClient {
        pub fn with_responses(responses: Vec<Result<Vec<u8>, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn record(&self, request: RecordedRequest) -> Result<Vec<u8>, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Http("no canned response".to_string())))
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.record(RecordedRequest::Get {
                url: url.to_string(),
            })
        }

        async fn get_with_bearer(
            &self,
            url: &str,
            bearer_token: &str,
        ) -> Result<Vec<u8>, ProviderError> {
            self.record(RecordedRequest::GetBearer {
                url: url.to_string(),
                token: bearer_token.to_string(),
            })
        }

        async fn post_text(&self, url: &str, body: String) -> Result<Vec<u8>, ProviderError> {
            self.record(RecordedRequest::PostText {
                url: url.to_string(),
                body,
            })
        }

        async fn post_json(
            &self,
            url: &str,
            body: serde_json::Value,
        ) -> Result<Vec<u8>, ProviderError> {
            self.record(RecordedRequest::PostJson {
                url: url.to_string(),
                body,
            })
        }
    }
}
