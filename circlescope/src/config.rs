//! Session configuration.

use std::time::Duration;

use crate::geometry::DEFAULT_CIRCLE_STEPS;

/// Default radius of a new circle, in meters.
pub const DEFAULT_RADIUS_M: f64 = 500.0;

/// Default quiet period after a drag before downstream re-fetches fire.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

const DEFAULT_FOURSQUARE_URL: &str = "https://api.foursquare.com/v3";
const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_MAKS_URL: &str = "http://localhost:8001";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Configuration for a map session.
///
/// `Default` gives the public endpoints and the standard drag debounce;
/// the `with_*` builders override individual fields.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Places API key. Place search is unavailable without one.
    pub foursquare_api_key: Option<String>,
    pub foursquare_base_url: String,
    pub overpass_url: String,
    pub maks_base_url: String,
    pub backend_base_url: String,
    /// Quiet period after the last drag before a move is committed.
    pub drag_debounce: Duration,
    /// Radius used when a circle is created without an explicit one.
    pub default_radius_m: f64,
    /// Ring resolution of the circle polygon.
    pub circle_steps: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            foursquare_api_key: None,
            foursquare_base_url: DEFAULT_FOURSQUARE_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            maks_base_url: DEFAULT_MAKS_URL.to_string(),
            backend_base_url: DEFAULT_BACKEND_URL.to_string(),
            drag_debounce: DEFAULT_DEBOUNCE,
            default_radius_m: DEFAULT_RADIUS_M,
            circle_steps: DEFAULT_CIRCLE_STEPS,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foursquare_api_key(mut self, key: impl Into<String>) -> Self {
        self.foursquare_api_key = Some(key.into());
        self
    }

    pub fn with_foursquare_base_url(mut self, url: impl Into<String>) -> Self {
        self.foursquare_base_url = url.into();
        self
    }

    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    pub fn with_maks_base_url(mut self, url: impl Into<String>) -> Self {
        self.maks_base_url = url.into();
        self
    }

    pub fn with_backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.backend_base_url = url.into();
        self
    }

    pub fn with_drag_debounce(mut self, debounce: Duration) -> Self {
        self.drag_debounce = debounce;
        self
    }

    pub fn with_default_radius(mut self, radius_m: f64) -> Self {
        self.default_radius_m = radius_m;
        self
    }

    pub fn with_circle_steps(mut self, steps: usize) -> Self {
        self.circle_steps = steps;
        self
    }
}
