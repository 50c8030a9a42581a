//! CircleScope - radius-circle map sessions over external geo services
//!
//! This library manages the lifecycle of draggable radius circles on a map
//! and the per-service overlays (markers, fill layers, line layers) derived
//! from them. Each integrated service (Foursquare places, Overpass roads,
//! MAKS buildings) owns its own fetch pipeline, result cache, and overlay
//! set; the circle registry coordinates them through broadcast lifecycle
//! events so the managers never know about each other.
//!
//! # High-Level API
//!
//! For most use cases, the [`session`] module provides a simplified facade:
//!
//! ```ignore
//! use circlescope::canvas::RecordingCanvas;
//! use circlescope::config::SessionConfig;
//! use circlescope::geometry::LonLat;
//! use circlescope::registry::ServiceId;
//! use circlescope::session::MapSession;
//!
//! let canvas = std::sync::Arc::new(RecordingCanvas::new());
//! let session = MapSession::start(SessionConfig::default(), canvas, places, roads, buildings);
//! session.create_circle(ServiceId::Places, LonLat::new(27.024772, 39.596321))?;
//! ```

pub mod cache;
pub mod canvas;
pub mod config;
pub mod filter;
pub mod geometry;
pub mod logging;
pub mod manager;
pub mod provider;
pub mod registry;
pub mod session;

/// Version of the CircleScope library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
