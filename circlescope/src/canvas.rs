//! Map canvas abstraction for dependency injection.
//!
//! The canvas is the one resource every manager shares. The trait keeps the
//! library independent of any concrete map SDK: a GL map binding implements
//! it in production, while [`RecordingCanvas`] backs tests and the CLI by
//! remembering every primitive that was added.
//!
//! Managers may only add or remove primitives under ids they created
//! themselves; the trait offers no enumeration that would let one manager
//! reach another's overlays.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::geometry::LonLat;

/// Opaque handle for a marker placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// A point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LonLat,
    pub draggable: bool,
    /// Icon asset name, e.g. `"cafe"`. `None` renders the default pin.
    pub icon: Option<String>,
    /// Popup content shown when the marker is clicked.
    pub popup: Option<String>,
}

impl Marker {
    /// A plain non-draggable marker at a position.
    pub fn at(position: LonLat) -> Self {
        Self {
            position,
            draggable: false,
            icon: None,
            popup: None,
        }
    }

    pub fn draggable(mut self) -> Self {
        self.draggable = true;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_popup(mut self, popup: impl Into<String>) -> Self {
        self.popup = Some(popup.into());
        self
    }
}

/// Paint properties for a fill layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPaint {
    /// Fill color as a hex string.
    pub color: String,
    pub opacity: f64,
}

/// Paint properties for a line layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePaint {
    /// Feature property to read the line color from, if per-feature.
    pub color_property: Option<String>,
    /// Color used when no per-feature color applies.
    pub fallback_color: String,
    pub width: f64,
}

/// Abstraction over the shared map instance.
///
/// All mutation is keyed by caller-chosen string ids for sources and layers,
/// mirroring how GL map styles address them. Removal of an unknown id is a
/// benign no-op so teardown paths can stay idempotent.
pub trait MapCanvas: Send + Sync {
    /// Add a GeoJSON source under `source_id`, replacing any previous one.
    fn add_geojson_source(&self, source_id: &str, data: serde_json::Value);

    /// Replace the data of an existing source in place.
    ///
    /// Unknown source ids are ignored.
    fn set_source_data(&self, source_id: &str, data: serde_json::Value);

    /// Add a fill layer bound to a source.
    fn add_fill_layer(&self, layer_id: &str, source_id: &str, paint: FillPaint);

    /// Add a line layer bound to a source.
    fn add_line_layer(&self, layer_id: &str, source_id: &str, paint: LinePaint);

    fn has_source(&self, source_id: &str) -> bool;
    fn has_layer(&self, layer_id: &str) -> bool;

    fn remove_layer(&self, layer_id: &str);
    fn remove_source(&self, source_id: &str);

    /// Place a marker, returning a handle for later removal.
    fn add_marker(&self, marker: Marker) -> MarkerId;
    fn remove_marker(&self, id: MarkerId);
}

#[derive(Debug, Clone)]
struct LayerRecord {
    source_id: String,
    fill: Option<FillPaint>,
    line: Option<LinePaint>,
}

#[derive(Default)]
struct CanvasState {
    sources: HashMap<String, serde_json::Value>,
    layers: HashMap<String, LayerRecord>,
    markers: HashMap<MarkerId, Marker>,
}

/// In-memory canvas that records every primitive.
///
/// Used by the test suite and by the CLI, which renders the recorded state
/// as text instead of drawing it.
#[derive(Default)]
pub struct RecordingCanvas {
    state: RwLock<CanvasState>,
    next_marker: AtomicU64,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers currently on the canvas.
    pub fn marker_count(&self) -> usize {
        self.state.read().map(|s| s.markers.len()).unwrap_or(0)
    }

    /// Snapshot of all current markers.
    pub fn markers(&self) -> Vec<Marker> {
        self.state
            .read()
            .map(|s| s.markers.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Current data of a source, if present.
    pub fn source_data(&self, source_id: &str) -> Option<serde_json::Value> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.sources.get(source_id).cloned())
    }

    /// Ids of all layers currently on the canvas.
    pub fn layer_ids(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| s.layers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of all sources currently on the canvas.
    pub fn source_ids(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| s.sources.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Source a layer is bound to, if the layer exists.
    pub fn layer_source(&self, layer_id: &str) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.layers.get(layer_id).map(|l| l.source_id.clone()))
    }

    /// Fill paint of a layer; `None` for line layers and unknown ids.
    pub fn fill_paint(&self, layer_id: &str) -> Option<FillPaint> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.layers.get(layer_id).and_then(|l| l.fill.clone()))
    }

    /// Line paint of a layer; `None` for fill layers and unknown ids.
    pub fn line_paint(&self, layer_id: &str) -> Option<LinePaint> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.layers.get(layer_id).and_then(|l| l.line.clone()))
    }
}

impl MapCanvas for RecordingCanvas {
    fn add_geojson_source(&self, source_id: &str, data: serde_json::Value) {
        if let Ok(mut s) = self.state.write() {
            s.sources.insert(source_id.to_string(), data);
        }
    }

    fn set_source_data(&self, source_id: &str, data: serde_json::Value) {
        if let Ok(mut s) = self.state.write() {
            if let Some(existing) = s.sources.get_mut(source_id) {
                *existing = data;
            }
        }
    }

    fn add_fill_layer(&self, layer_id: &str, source_id: &str, paint: FillPaint) {
        if let Ok(mut s) = self.state.write() {
            s.layers.insert(
                layer_id.to_string(),
                LayerRecord {
                    source_id: source_id.to_string(),
                    fill: Some(paint),
                    line: None,
                },
            );
        }
    }

    fn add_line_layer(&self, layer_id: &str, source_id: &str, paint: LinePaint) {
        if let Ok(mut s) = self.state.write() {
            s.layers.insert(
                layer_id.to_string(),
                LayerRecord {
                    source_id: source_id.to_string(),
                    fill: None,
                    line: Some(paint),
                },
            );
        }
    }

    fn has_source(&self, source_id: &str) -> bool {
        self.state
            .read()
            .map(|s| s.sources.contains_key(source_id))
            .unwrap_or(false)
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.state
            .read()
            .map(|s| s.layers.contains_key(layer_id))
            .unwrap_or(false)
    }

    fn remove_layer(&self, layer_id: &str) {
        if let Ok(mut s) = self.state.write() {
            s.layers.remove(layer_id);
        }
    }

    fn remove_source(&self, source_id: &str) {
        if let Ok(mut s) = self.state.write() {
            s.sources.remove(source_id);
        }
    }

    fn add_marker(&self, marker: Marker) -> MarkerId {
        let id = MarkerId(self.next_marker.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut s) = self.state.write() {
            s.markers.insert(id, marker);
        }
        id
    }

    fn remove_marker(&self, id: MarkerId) {
        if let Ok(mut s) = self.state.write() {
            s.markers.remove(&id);
        }
    }
}
