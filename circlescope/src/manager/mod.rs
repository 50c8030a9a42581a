//! Per-service layer managers.
//!
//! A layer manager owns everything rendered for one service id: its result
//! cache, its overlay set, and the fetch pipeline that reacts to circle
//! lifecycle events. Managers subscribe to the registry's broadcast channel
//! and ignore events for other services; they hold no reference to each
//! other.
//!
//! Overlay updates are swap-on-fetch: the previous overlay set is cleared
//! immediately before the new one is added, never interleaved, so a render
//! frame observes either the old or the new state. A failed fetch leaves
//! the previous overlays untouched.

mod buildings;
mod places;
mod roads;

pub use buildings::{BuildingsManager, BUILDING_LAYER_ID, BUILDING_SOURCE_ID};
pub use places::{PlaceBucket, PlacesManager};
pub use roads::{highway_color, legend, RoadsManager, ROADS_LAYER_ID, ROADS_SOURCE_ID};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::{CircleEvent, ServiceId};

/// A manager driving one service's overlays from circle lifecycle events.
pub trait LayerManager: Send + Sync {
    /// The service id this manager reacts to.
    fn service(&self) -> ServiceId;

    /// Handle one lifecycle event for this manager's service.
    fn handle_event(&self, event: CircleEvent) -> impl Future<Output = ()> + Send;
}

/// Spawn the subscription loop for a manager.
///
/// The task runs until the token is cancelled or the event channel closes.
/// Lagged events are skipped with a warning; the next event re-syncs the
/// overlay state anyway since every refresh re-renders from scratch.
pub fn spawn_manager<M: LayerManager + 'static>(
    manager: Arc<M>,
    mut rx: broadcast::Receiver<CircleEvent>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(service = %manager.service(), "layer manager started");
        loop {
            // Biased toward the channel so queued lifecycle events are
            // drained before a cancellation is honored.
            tokio::select! {
                biased;
                result = rx.recv() => match result {
                    Ok(event) if event.service() == manager.service() => {
                        manager.handle_event(event).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(service = %manager.service(), skipped, "event channel lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        debug!(service = %manager.service(), "layer manager stopped");
    })
}
