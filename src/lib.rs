//! # geoguide
//!
//! A location-aware audio-guide engine.
//!
//! Points of interest carry an activation radius. As the position moves (GPS
//! fixes, a simulated slider or a dragged marker), the geofence picks the
//! active point, the narration engine decides whether its audio may start
//! under a per-point cooldown, and a schematic map camera follows the user
//! until they pan or zoom it themselves.

pub mod core;
pub mod data;
pub mod engine;
pub mod input;
pub mod position;
pub mod prelude;
pub mod session;
#[cfg(feature = "egui")]
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    camera::{CameraState, CanvasSize, MapProjection},
    config::GuideConfig,
    geo::{distance_meters, format_distance, GeoBoundingBox, GeoPosition, Point},
    poi::Poi,
};

pub use data::{parse_catalog, sort_by_distance, Catalog, CatalogRecord, CatalogSource};

pub use engine::{select_active_poi, GeofenceTracker, NarrationEngine};

pub use input::{Action, InputHandler, InteractionState, PointerEvent};

pub use position::{GeolocationEvent, PositionArbiter, PositionSample, PositionSource};

pub use session::{GuideEvent, GuideSession, PlaybackTransport, StopReason};

#[cfg(feature = "egui")]
pub use ui::{GuideMapExt, GuideMapView};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, GuideError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Geolocation error: {0}")]
    Geolocation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Error = GuideError;
