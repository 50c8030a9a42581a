//! Provider types and traits.

use std::future::Future;

use thiserror::Error;

use crate::geometry::{LonLat, WayGeometry};

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Non-2xx response status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A place record from the places service, already reduced to the fields
/// the manager renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Provider-assigned unique id, used for deduplication.
    pub id: String,
    pub name: String,
    pub position: LonLat,
    /// Provider category codes attached to the place.
    pub category_ids: Vec<u32>,
    /// Human-readable name of the primary category.
    pub category_name: Option<String>,
    pub address: Option<String>,
}

/// Async provider of place search results.
pub trait PlaceProvider: Send + Sync {
    /// Search places around a center, restricted to the given provider
    /// category codes.
    fn search(
        &self,
        center: LonLat,
        radius_m: f64,
        category_codes: &[u32],
    ) -> impl Future<Output = Result<Vec<Place>, ProviderError>> + Send;
}

/// Async provider of road geometries.
pub trait RoadProvider: Send + Sync {
    /// Fetch all `highway=*` ways within a radius of the center.
    fn highways_around(
        &self,
        center: LonLat,
        radius_m: f64,
    ) -> impl Future<Output = Result<Vec<WayGeometry>, ProviderError>> + Send;
}

/// Async provider of building footprints.
pub trait BuildingProvider: Send + Sync {
    /// Fetch buildings within a radius of the center as a raw, uncorrected
    /// GeoJSON FeatureCollection.
    fn buildings_around(
        &self,
        center: LonLat,
        radius_m: f64,
    ) -> impl Future<Output = Result<geojson::FeatureCollection, ProviderError>> + Send;
}
