//! Prelude module for common geoguide types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use geoguide::prelude::*;`

pub use crate::core::{
    camera::{CameraState, CanvasSize, MapProjection},
    config::{
        CameraLimits, GeofenceConfig, GeolocationOptions, GuideConfig, InteractionConfig,
        NarrationConfig,
    },
    geo::{distance_meters, format_distance, GeoBoundingBox, GeoPosition, Point},
    poi::Poi,
};

pub use crate::data::{
    catalog::{parse_catalog, sort_by_distance, Catalog, CatalogRecord},
    source::{CatalogSource, HttpCatalogSource, StaticCatalogSource},
};

pub use crate::engine::{
    clock::{Clock, ManualClock, SystemClock},
    geofence::{select_active_poi, GeofenceTracker, GeofenceTransition},
    narration::{NarrationEngine, NarrationLogEntry},
};

pub use crate::input::{
    events::PointerEvent,
    handler::{Action, InputHandler, InteractionState, MapOperations},
};

pub use crate::position::{
    arbiter::{GpsErrorOutcome, PositionArbiter, PositionSample, PositionSource},
    geolocation::{GeolocationEvent, GeolocationSource},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::position::geolocation::{GpsSubscription, SimulatedWalk};

pub use crate::session::{GuideEvent, GuideSession, PlaybackTransport, StopReason};

#[cfg(feature = "egui")]
pub use crate::ui::{GuideMapExt, GuideMapStyle, GuideMapView};

pub use crate::{Error as GuideError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
