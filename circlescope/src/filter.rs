//! Building attribute filtering.
//!
//! Filters operate on the corrected building cache, never on the backend.
//! The recognized options mirror the MAKS feature properties; a filter is a
//! plain value object populated once (from UI state or from the backend's
//! prompt extraction) and applied as a whole.

use geojson::FeatureCollection;
use serde_json::Value;

use crate::provider::FilterParams;

/// MAKS property names the filter reads.
const PROP_FLOORS_ABOVE: &str = "ZEMINUSTUKATSAYISI";
const PROP_FLOORS_BELOW: &str = "ZEMINALTIKATSAYISI";
const PROP_STATUS: &str = "DURUM";
const PROP_TYPE: &str = "TIP";
const PROP_EMISSION_CLASS: &str = "SERAGAZEMISYONSINIF";
const PROP_RISK_SCORE: &str = "RISKSKORU";

/// A building filter. `Default` means "show all".
///
/// Numeric fields are minimums (at least this many floors, at least this
/// risk class); string fields match exactly. The earthquake criterion only
/// applies while `deprem_toggle` is set, matching the UI where the risk
/// dropdown is hidden behind a toggle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingFilter {
    /// Minimum floors above ground.
    pub zeminustu: Option<i64>,
    /// Minimum floors below ground.
    pub zeminalti: Option<i64>,
    /// Building status code ("1" = existing, "2" = demolished).
    pub durum: Option<String>,
    /// Building type code ("1" residential .. "4" other).
    pub tip: Option<String>,
    /// Greenhouse gas emission class ("A".."G").
    pub seragazi: Option<String>,
    /// Minimum earthquake risk class (1..5).
    pub deprem_riski: Option<i64>,
    /// Whether the earthquake criterion is active.
    pub deprem_toggle: bool,
}

impl BuildingFilter {
    /// Whether this filter excludes nothing.
    pub fn is_show_all(&self) -> bool {
        *self == Self::default()
    }

    /// Check a feature's properties against the filter.
    pub fn matches(&self, properties: &serde_json::Map<String, Value>) -> bool {
        if let Some(min) = self.zeminustu {
            if property_i64(properties, PROP_FLOORS_ABOVE).unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(min) = self.zeminalti {
            if property_i64(properties, PROP_FLOORS_BELOW).unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(expected) = &self.durum {
            if property_string(properties, PROP_STATUS).as_ref() != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.tip {
            if property_string(properties, PROP_TYPE).as_ref() != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.seragazi {
            if property_string(properties, PROP_EMISSION_CLASS).as_ref() != Some(expected) {
                return false;
            }
        }
        if self.deprem_toggle {
            if let Some(min) = self.deprem_riski {
                if property_i64(properties, PROP_RISK_SCORE).unwrap_or(0) < min {
                    return false;
                }
            }
        }
        true
    }

    /// Apply the filter to a collection, keeping matching features.
    pub fn apply(&self, collection: &FeatureCollection) -> FeatureCollection {
        if self.is_show_all() {
            return collection.clone();
        }
        let features = collection
            .features
            .iter()
            .filter(|f| match &f.properties {
                Some(props) => self.matches(props),
                None => false,
            })
            .cloned()
            .collect();
        FeatureCollection {
            bbox: collection.bbox.clone(),
            features,
            foreign_members: None,
        }
    }
}

impl From<FilterParams> for BuildingFilter {
    fn from(params: FilterParams) -> Self {
        Self {
            zeminustu: params.zeminustu,
            zeminalti: params.zeminalti,
            durum: params.durum,
            tip: params.tip,
            seragazi: params.seragazi,
            deprem_riski: params.deprem_riski.and_then(|s| s.parse().ok()),
            deprem_toggle: params.deprem_toggle,
        }
    }
}

/// Read a numeric property that may arrive as a number or a string.
fn property_i64(properties: &serde_json::Map<String, Value>, key: &str) -> Option<i64> {
    match properties.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a string property, stringifying bare numbers.
fn property_string(properties: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
