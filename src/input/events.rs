use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Pointer input on the map canvas, in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// The pointer left the canvas
    Leave,
    /// Wheel notch; positive `delta_y` scrolls down
    Wheel { position: Point, delta_y: f64 },
}

impl PointerEvent {
    /// Gets the position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position }
            | PointerEvent::Wheel { position, .. } => Some(*position),
            PointerEvent::Leave => None,
        }
    }

    /// Whether this event ends any active gesture
    pub fn is_release(&self) -> bool {
        matches!(self, PointerEvent::Up { .. } | PointerEvent::Leave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_position() {
        let down = PointerEvent::Down {
            position: Point::new(100.0, 200.0),
        };
        assert_eq!(down.position(), Some(Point::new(100.0, 200.0)));
        assert_eq!(PointerEvent::Leave.position(), None);
    }

    #[test]
    fn test_release_events() {
        assert!(PointerEvent::Leave.is_release());
        assert!(PointerEvent::Up {
            position: Point::default()
        }
        .is_release());
        assert!(!PointerEvent::Move {
            position: Point::default()
        }
        .is_release());
    }
}
