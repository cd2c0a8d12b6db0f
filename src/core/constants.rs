//! Engine-wide defaults for the geofence, narration and map view.
//! Keeping them in a single place makes it easier to tweak the tuning knobs.

/// Mean Earth radius used by the haversine distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Activation radius applied to catalog records without a usable radius.
pub const DEFAULT_POI_RADIUS_M: f64 = 50.0;

/// Padding added around the catalog extent (~55 m of latitude).
pub const BBOX_PADDING_DEG: f64 = 0.0005;

/// Narration replay cooldown.
pub const DEFAULT_COOLDOWN_MINUTES: f64 = 5.0;

/// Camera zoom range.
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;

/// Pointer-down within this many pixels of the marker grabs it.
pub const MARKER_HIT_RADIUS_PX: f64 = 30.0;

/// Wheel zoom factors for scrolling down / up.
pub const WHEEL_ZOOM_OUT_FACTOR: f64 = 0.95;
pub const WHEEL_ZOOM_IN_FACTOR: f64 = 1.05;

/// Geolocation request policy handed to the position source.
pub const GEOLOCATION_MAX_AGE_MS: u64 = 5_000;
pub const GEOLOCATION_TIMEOUT_MS: u64 = 10_000;
