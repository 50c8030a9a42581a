//! HTTP client abstraction for testability.
//!
//! All providers go through [`AsyncHttpClient`] so tests can inject mock
//! clients and assert on the exact requests issued.

use std::future::Future;
use std::time::Duration;

use tracing::{trace, warn};

use super::types::ProviderError;

/// Trait for asynchronous HTTP operations.
pub trait AsyncHttpClient: Send + Sync {
    /// Perform a GET request, returning the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Perform a GET request with Bearer token authentication.
    fn get_with_bearer(
        &self,
        url: &str,
        bearer_token: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Perform a POST request with a raw text body.
    fn post_text(
        &self,
        url: &str,
        body: String,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Perform a POST request with a JSON body.
    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read_response(
        url: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Vec<u8>, ProviderError> {
        let response = response.map_err(|e| {
            warn!(url, error = %e, "request failed");
            ProviderError::Http(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "non-success status");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        trace!(url, bytes = bytes.len(), "response received");
        Ok(bytes.to_vec())
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url, "HTTP GET");
        let result = self.client.get(url).send().await;
        Self::read_response(url, result).await
    }

    async fn get_with_bearer(
        &self,
        url: &str,
        bearer_token: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        trace!(url, "HTTP GET (bearer)");
        let result = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .bearer_auth(bearer_token)
            .send()
            .await;
        Self::read_response(url, result).await
    }

    async fn post_text(&self, url: &str, body: String) -> Result<Vec<u8>, ProviderError> {
        trace!(url, "HTTP POST (text)");
        let result = self
            .client
            .post(url)
            .header("Content-Type", "text/plain")
            .body(body)
            .send()
            .await;
        Self::read_response(url, result).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<Vec<u8>, ProviderError> {
        trace!(url, "HTTP POST (json)");
        let result = self.client.post(url).json(&body).send().await;
        Self::read_response(url, result).await
    }
}
