//! Registry types: service identity, circle handles, lifecycle events.

use crate::canvas::MarkerId;
use crate::geometry::LonLat;

/// Identity of an integrated map service.
///
/// At most one live circle exists per service id at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    /// Foursquare place search.
    Places,
    /// Overpass road query.
    Roads,
    /// MAKS buildings query.
    Buildings,
}

impl ServiceId {
    pub const ALL: [ServiceId; 3] = [ServiceId::Places, ServiceId::Roads, ServiceId::Buildings];

    /// Stable string form used in source/layer ids and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Places => "places",
            ServiceId::Roads => "roads",
            ServiceId::Buildings => "buildings",
        }
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "places" => Ok(ServiceId::Places),
            "roads" => Ok(ServiceId::Roads),
            "buildings" => Ok(ServiceId::Buildings),
            other => Err(format!("unknown service id: {other}")),
        }
    }
}

/// A live circle tracked by the registry.
///
/// The handle records every canvas primitive the registry created for the
/// circle so a single teardown call can remove all of them.
#[derive(Debug, Clone)]
pub struct CircleHandle {
    pub service: ServiceId,
    pub center: LonLat,
    pub radius_m: f64,
    /// The draggable anchor marker.
    pub marker_id: MarkerId,
    /// GeoJSON source holding the circle polygon.
    pub source_id: String,
    /// Fill layer rendering the circle polygon.
    pub layer_id: String,
    /// Bumped on every committed move and on removal. Managers compare
    /// generations at fetch completion to discard stale responses.
    pub generation: u64,
}

/// Lifecycle events emitted by the registry.
///
/// Managers subscribe to these and react only to their own service id;
/// they never observe each other directly.
#[derive(Debug, Clone, PartialEq)]
pub enum CircleEvent {
    Created {
        service: ServiceId,
        center: LonLat,
        radius_m: f64,
        generation: u64,
    },
    /// Emitted after the drag debounce window closes, for the final
    /// position only.
    Moved {
        service: ServiceId,
        center: LonLat,
        radius_m: f64,
        generation: u64,
    },
    Removed { service: ServiceId },
}

impl CircleEvent {
    /// The service this event belongs to.
    pub fn service(&self) -> ServiceId {
        match self {
            CircleEvent::Created { service, .. }
            | CircleEvent::Moved { service, .. }
            | CircleEvent::Removed { service } => *service,
        }
    }
}
