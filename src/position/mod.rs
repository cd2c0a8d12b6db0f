pub mod arbiter;
pub mod geolocation;

pub use arbiter::{GpsErrorOutcome, PositionArbiter, PositionSample, PositionSource};
pub use geolocation::{GeolocationEvent, GeolocationSource};

#[cfg(feature = "tokio-runtime")]
pub use geolocation::{GpsSubscription, SimulatedWalk};
