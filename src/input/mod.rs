pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::PointerEvent;
pub use handler::{Action, InputHandler, InteractionState, MapOperations};
