pub mod clock;
pub mod geofence;
pub mod narration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use geofence::{select_active_poi, GeofenceTracker, GeofenceTransition};
pub use narration::{NarrationEngine, NarrationLogEntry};
