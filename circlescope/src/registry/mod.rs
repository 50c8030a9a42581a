//! Circle registry: lifecycle owner for the per-service radius circles.
//!
//! The registry is the only component that creates or destroys circles. It
//! owns the draggable anchor marker, the circle polygon source and its fill
//! layer, and broadcasts [`CircleEvent`]s that the layer managers react to.
//! Managers never talk to each other; this channel is the only coupling.

mod types;

pub use types::{CircleEvent, CircleHandle, ServiceId};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::canvas::{FillPaint, MapCanvas, Marker};
use crate::geometry::{circle_polygon, GeometryError, LonLat};

/// Fill color of the circle overlay.
const CIRCLE_FILL_COLOR: &str = "#5C6BC0";
const CIRCLE_FILL_OPACITY: f64 = 0.3;

/// Capacity of the lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Build the single-feature FeatureCollection for a circle ring.
pub fn circle_geojson(ring: &[LonLat]) -> serde_json::Value {
    let coords: Vec<[f64; 2]> = ring.iter().map(|p| [p.lon, p.lat]).collect();
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [coords],
            },
            "properties": {},
        }],
    })
}

/// Registry of live circles, at most one per [`ServiceId`].
///
/// Drag updates replace the polygon source in place immediately but the
/// `Moved` event is debounced: rapid drag positions within the window
/// coalesce into a single downstream re-fetch, so rate-limited external
/// APIs are not hammered mid-gesture.
pub struct CircleRegistry {
    canvas: Arc<dyn MapCanvas>,
    state: RwLock<HashMap<ServiceId, CircleHandle>>,
    /// Pending debounce timers, one per circle.
    timers: Mutex<HashMap<ServiceId, JoinHandle<()>>>,
    event_tx: broadcast::Sender<CircleEvent>,
    debounce: Duration,
    steps: usize,
}

impl CircleRegistry {
    /// Create a registry drawing on `canvas`.
    ///
    /// `debounce` is the quiet period after the last drag before a `Moved`
    /// event fires; `steps` is the circle ring resolution.
    pub fn new(canvas: Arc<dyn MapCanvas>, debounce: Duration, steps: usize) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            canvas,
            state: RwLock::new(HashMap::new()),
            timers: Mutex::new(HashMap::new()),
            event_tx,
            debounce,
            steps,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CircleEvent> {
        self.event_tx.subscribe()
    }

    /// Create a circle for a service.
    ///
    /// If a circle already exists for `service` this is a no-op returning
    /// the existing handle; it must be removed explicitly first.
    pub fn create(
        &self,
        service: ServiceId,
        center: LonLat,
        radius_m: f64,
    ) -> Result<CircleHandle, GeometryError> {
        if let Some(existing) = self.handle(service) {
            debug!(%service, "circle already exists, returning existing handle");
            return Ok(existing);
        }

        let ring = circle_polygon(center, radius_m, self.steps)?;

        let source_id = format!("circle-source-{service}");
        let layer_id = format!("circle-layer-{service}");
        self.canvas
            .add_geojson_source(&source_id, circle_geojson(&ring));
        self.canvas.add_fill_layer(
            &layer_id,
            &source_id,
            FillPaint {
                color: CIRCLE_FILL_COLOR.to_string(),
                opacity: CIRCLE_FILL_OPACITY,
            },
        );
        let marker_id = self.canvas.add_marker(Marker::at(center).draggable());

        let handle = CircleHandle {
            service,
            center,
            radius_m,
            marker_id,
            source_id,
            layer_id,
            generation: 0,
        };
        if let Ok(mut state) = self.state.write() {
            state.insert(service, handle.clone());
        }
        info!(%service, %center, radius_m, "circle created");

        let _ = self.event_tx.send(CircleEvent::Created {
            service,
            center,
            radius_m,
            generation: handle.generation,
        });
        Ok(handle)
    }

    /// Remove a circle and every canvas primitive the registry created
    /// for it.
    ///
    /// Returns `false` if no circle exists for `service`. Safe to call
    /// repeatedly.
    pub fn remove(&self, service: ServiceId) -> bool {
        if let Ok(mut timers) = self.timers.lock() {
            if let Some(pending) = timers.remove(&service) {
                pending.abort();
            }
        }

        let handle = match self.state.write() {
            Ok(mut state) => match state.remove(&service) {
                Some(h) => h,
                None => return false,
            },
            Err(_) => return false,
        };

        self.canvas.remove_marker(handle.marker_id);
        if self.canvas.has_layer(&handle.layer_id) {
            self.canvas.remove_layer(&handle.layer_id);
        }
        if self.canvas.has_source(&handle.source_id) {
            self.canvas.remove_source(&handle.source_id);
        }

        info!(%service, "circle removed");
        let _ = self.event_tx.send(CircleEvent::Removed { service });
        true
    }

    /// Handle a drag update for a circle.
    ///
    /// Replaces the circle polygon source in place right away, then
    /// restarts the debounce timer; the `Moved` event fires only for the
    /// final position within the window. Unknown ids are ignored.
    pub fn on_drag(self: &Arc<Self>, service: ServiceId, new_center: LonLat) {
        let (radius_m, source_id) = match self.handle(service) {
            Some(h) => (h.radius_m, h.source_id),
            None => {
                trace!(%service, "drag for unknown circle ignored");
                return;
            }
        };

        if let Ok(ring) = circle_polygon(new_center, radius_m, self.steps) {
            self.canvas.set_source_data(&source_id, circle_geojson(&ring));
        }
        if let Ok(mut state) = self.state.write() {
            if let Some(h) = state.get_mut(&service) {
                h.center = new_center;
            }
        }

        let registry = Arc::clone(self);
        let delay = self.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.commit_move(service);
        });
        if let Ok(mut timers) = self.timers.lock() {
            if let Some(previous) = timers.insert(service, timer) {
                previous.abort();
            }
        }
    }

    /// Commit a debounced move: bump the generation and emit `Moved`.
    fn commit_move(&self, service: ServiceId) {
        let event = match self.state.write() {
            Ok(mut state) => match state.get_mut(&service) {
                Some(h) => {
                    h.generation += 1;
                    CircleEvent::Moved {
                        service,
                        center: h.center,
                        radius_m: h.radius_m,
                        generation: h.generation,
                    }
                }
                None => return,
            },
            Err(_) => return,
        };
        debug!(%service, "debounce expired, committing move");
        let _ = self.event_tx.send(event);
    }

    /// Whether a circle exists for `service`.
    pub fn contains(&self, service: ServiceId) -> bool {
        self.state
            .read()
            .map(|s| s.contains_key(&service))
            .unwrap_or(false)
    }

    /// Current generation of a circle, `None` if absent.
    ///
    /// Managers snapshot this before a fetch and compare on completion;
    /// a mismatch means the circle moved or disappeared in the meantime
    /// and the response must be discarded.
    pub fn generation(&self, service: ServiceId) -> Option<u64> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.get(&service).map(|h| h.generation))
    }

    /// Clone of the current handle for `service`.
    pub fn handle(&self, service: ServiceId) -> Option<CircleHandle> {
        self.state.read().ok().and_then(|s| s.get(&service).cloned())
    }

    /// Remove every live circle. Used on session shutdown.
    pub fn remove_all(&self) {
        for service in ServiceId::ALL {
            self.remove(service);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;

    fn registry_with_canvas(debounce_ms: u64) -> (Arc<CircleRegistry>, Arc<RecordingCanvas>) {
        let canvas = Arc::new(RecordingCanvas::new());
        let registry = Arc::new(CircleRegistry::new(
            canvas.clone(),
            Duration::from_millis(debounce_ms),
            64,
        ));
        (registry, canvas)
    }

    fn center() -> LonLat {
        LonLat::new(27.024772, 39.596321)
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_service() {
        let (registry, canvas) = registry_with_canvas(50);

        let first = registry.create(ServiceId::Places, center(), 500.0).unwrap();
        let second = registry
            .create(ServiceId::Places, LonLat::new(28.0, 40.0), 800.0)
            .unwrap();

        // Second call returns the pre-existing handle untouched.
        assert_eq!(second.marker_id, first.marker_id);
        assert_eq!(second.center, first.center);
        assert_eq!(second.radius_m, 500.0);
        assert_eq!(canvas.marker_count(), 1);
        assert_eq!(canvas.source_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_create_emits_created_event() {
        let (registry, _canvas) = registry_with_canvas(50);
        let mut rx = registry.subscribe();

        registry.create(ServiceId::Roads, center(), 500.0).unwrap();

        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            CircleEvent::Created {
                service: ServiceId::Roads,
                generation: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_remove_tears_down_and_is_idempotent() {
        let (registry, canvas) = registry_with_canvas(50);
        let handle = registry.create(ServiceId::Places, center(), 500.0).unwrap();

        assert!(registry.remove(ServiceId::Places));
        assert_eq!(canvas.marker_count(), 0);
        assert!(!canvas.has_layer(&handle.layer_id));
        assert!(!canvas.has_source(&handle.source_id));
        assert!(registry.generation(ServiceId::Places).is_none());

        // Second removal changes nothing and reports absence.
        assert!(!registry.remove(ServiceId::Places));
    }

    #[tokio::test]
    async fn test_remove_unknown_is_benign() {
        let (registry, _canvas) = registry_with_canvas(50);
        assert!(!registry.remove(ServiceId::Buildings));
    }

    #[tokio::test]
    async fn test_drag_updates_polygon_in_place() {
        let (registry, canvas) = registry_with_canvas(200);
        let handle = registry.create(ServiceId::Places, center(), 500.0).unwrap();
        let before = canvas.source_data(&handle.source_id).unwrap();

        registry.on_drag(ServiceId::Places, LonLat::new(27.03, 39.60));

        let after = canvas.source_data(&handle.source_id).unwrap();
        assert_ne!(before, after, "polygon data should be replaced in place");
        // The layer itself is not recreated.
        assert!(canvas.has_layer(&handle.layer_id));
    }

    #[tokio::test]
    async fn test_rapid_drags_coalesce_into_one_moved_event() {
        let (registry, _canvas) = registry_with_canvas(40);
        let mut rx = registry.subscribe();
        registry.create(ServiceId::Buildings, center(), 500.0).unwrap();
        let _ = rx.try_recv(); // drop the Created event

        registry.on_drag(ServiceId::Buildings, LonLat::new(27.01, 39.60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.on_drag(ServiceId::Buildings, LonLat::new(27.02, 39.60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.on_drag(ServiceId::Buildings, LonLat::new(27.03, 39.60));

        tokio::time::sleep(Duration::from_millis(120)).await;

        let event = rx.try_recv().unwrap();
        match event {
            CircleEvent::Moved {
                center, generation, ..
            } => {
                assert_eq!(center, LonLat::new(27.03, 39.60));
                assert_eq!(generation, 1);
            }
            other => panic!("expected Moved, got {other:?}"),
        }
        // Only the final position produced an event.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_drag_unknown_circle_is_ignored() {
        let (registry, _canvas) = registry_with_canvas(10);
        let mut rx = registry.subscribe();

        registry.on_drag(ServiceId::Roads, LonLat::new(27.0, 39.6));
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_remove_cancels_pending_debounce() {
        let (registry, _canvas) = registry_with_canvas(40);
        let mut rx = registry.subscribe();
        registry.create(ServiceId::Places, center(), 500.0).unwrap();
        let _ = rx.try_recv();

        registry.on_drag(ServiceId::Places, LonLat::new(27.05, 39.60));
        assert!(registry.remove(ServiceId::Places));

        tokio::time::sleep(Duration::from_millis(120)).await;

        // Only the Removed event arrives; the pending move never fires.
        let event = rx.try_recv().unwrap();
        assert!(matches!(event, CircleEvent::Removed { .. }));
        assert!(rx.try_recv().is_err());
    }
}
