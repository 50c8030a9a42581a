//! Map session: top-level owner of the registry and the layer managers.
//!
//! A session wires one canvas, one circle registry and the three layer
//! managers together, spawns the manager subscription loops and tears
//! everything down on shutdown. It is the only type an embedding
//! application needs to hold.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::canvas::MapCanvas;
use crate::config::SessionConfig;
use crate::filter::BuildingFilter;
use crate::geometry::{GeometryError, LonLat};
use crate::manager::{
    spawn_manager, BuildingsManager, PlaceBucket, PlacesManager, RoadsManager,
};
use crate::provider::{BuildingProvider, FilterParams, PlaceProvider, RoadProvider};
use crate::registry::{CircleHandle, CircleRegistry, ServiceId};

/// A running map session.
///
/// Dropping the session aborts the manager loops; prefer an explicit
/// [`MapSession::shutdown`] so overlays are removed from the canvas first.
pub struct MapSession<P, R, B> {
    config: SessionConfig,
    registry: Arc<CircleRegistry>,
    places: Arc<PlacesManager<P>>,
    roads: Arc<RoadsManager<R>>,
    buildings: Arc<BuildingsManager<B>>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<P, R, B> MapSession<P, R, B>
where
    P: PlaceProvider + 'static,
    R: RoadProvider + 'static,
    B: BuildingProvider + 'static,
{
    /// Start a session on `canvas` with the given providers.
    ///
    /// Spawns one subscription task per layer manager.
    pub fn start(
        config: SessionConfig,
        canvas: Arc<dyn MapCanvas>,
        places_provider: P,
        roads_provider: R,
        buildings_provider: B,
    ) -> Self {
        let registry = Arc::new(CircleRegistry::new(
            canvas.clone(),
            config.drag_debounce,
            config.circle_steps,
        ));
        let places = Arc::new(PlacesManager::new(
            places_provider,
            registry.clone(),
            canvas.clone(),
        ));
        let roads = Arc::new(RoadsManager::new(
            roads_provider,
            registry.clone(),
            canvas.clone(),
            config.circle_steps,
        ));
        let buildings = Arc::new(BuildingsManager::new(
            buildings_provider,
            registry.clone(),
            canvas.clone(),
        ));

        let shutdown = CancellationToken::new();
        let tasks = vec![
            spawn_manager(places.clone(), registry.subscribe(), shutdown.clone()),
            spawn_manager(roads.clone(), registry.subscribe(), shutdown.clone()),
            spawn_manager(buildings.clone(), registry.subscribe(), shutdown.clone()),
        ];
        info!("map session started");

        Self {
            config,
            registry,
            places,
            roads,
            buildings,
            shutdown,
            tasks: Mutex::new(tasks),
        }
    }

    /// Create a circle for a service at the default radius.
    pub fn create_circle(
        &self,
        service: ServiceId,
        center: LonLat,
    ) -> Result<CircleHandle, GeometryError> {
        self.registry
            .create(service, center, self.config.default_radius_m)
    }

    /// Create a circle for a service with an explicit radius.
    pub fn create_circle_with_radius(
        &self,
        service: ServiceId,
        center: LonLat,
        radius_m: f64,
    ) -> Result<CircleHandle, GeometryError> {
        self.registry.create(service, center, radius_m)
    }

    /// Remove a service's circle and its overlays.
    pub fn remove_circle(&self, service: ServiceId) -> bool {
        self.registry.remove(service)
    }

    /// Forward a drag position for a service's circle.
    pub fn drag_circle(&self, service: ServiceId, new_center: LonLat) {
        self.registry.on_drag(service, new_center);
    }

    /// Replace the selected place buckets and refresh the markers.
    pub async fn set_place_categories(&self, buckets: impl IntoIterator<Item = PlaceBucket>) {
        self.places.set_selected(buckets).await;
    }

    /// Apply a building attribute filter to the cached buildings.
    pub fn apply_building_filter(&self, filter: BuildingFilter) {
        self.buildings.apply_filter(filter);
    }

    /// Apply filter parameters extracted by the backend from a prompt.
    pub fn apply_filter_params(&self, params: FilterParams) {
        self.buildings.apply_filter(BuildingFilter::from(params));
    }

    /// The session's circle registry.
    pub fn registry(&self) -> &Arc<CircleRegistry> {
        &self.registry
    }

    /// The places manager, for selection and marker inspection.
    pub fn places(&self) -> &Arc<PlacesManager<P>> {
        &self.places
    }

    /// The roads manager.
    pub fn roads(&self) -> &Arc<RoadsManager<R>> {
        &self.roads
    }

    /// The buildings manager, for cache and filter inspection.
    pub fn buildings(&self) -> &Arc<BuildingsManager<B>> {
        &self.buildings
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Remove every circle and stop the manager loops.
    ///
    /// The removal events are drained by the managers before their loops
    /// observe the cancellation, so overlays come off the canvas.
    pub async fn shutdown(&self) {
        self.registry.remove_all();
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for task in tasks {
            let _ = task.await;
        }
        info!("map session stopped");
    }
}
