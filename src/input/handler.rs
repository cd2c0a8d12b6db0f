use crate::{
    core::{
        camera::MapProjection,
        config::InteractionConfig,
        geo::{GeoPosition, Point},
    },
    input::events::PointerEvent,
};

/// What the pointer is currently doing on the map.
///
/// A single tagged state: the marker cannot be dragged while the camera is
/// being panned, and release always returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingMarker,
    Panning { last: Point },
}

/// Map operation produced by pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// The position marker was dragged to `position`. The position becomes a
    /// drag-sourced sample and the camera is re-centered on it regardless of
    /// any manual camera adjustment.
    DragMarker { position: GeoPosition },
    Pan { dx: f64, dy: f64 },
    ZoomAt { anchor: Point, factor: f64 },
}

/// Applies actions to the map projection
pub struct MapOperations;

impl MapOperations {
    /// Executes the camera side of an action. Returns the dragged position
    /// for the caller to hand to the position arbiter.
    pub fn execute_action(projection: &mut MapProjection, action: &Action) -> Option<GeoPosition> {
        match *action {
            Action::DragMarker { position } => {
                projection.recenter_on(&position);
                Some(position)
            }
            Action::Pan { dx, dy } => {
                projection.pan(dx, dy);
                None
            }
            Action::ZoomAt { anchor, factor } => {
                projection.zoom_at(anchor, factor);
                None
            }
        }
    }
}

/// Routes pointer and wheel input to marker dragging, panning or zooming
#[derive(Debug, Clone)]
pub struct InputHandler {
    pub enabled: bool,
    state: InteractionState,
    config: InteractionConfig,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(InteractionConfig::default())
    }

    pub fn with_config(config: InteractionConfig) -> Self {
        Self {
            enabled: true,
            state: InteractionState::Idle,
            config,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_dragging_marker(&self) -> bool {
        self.state == InteractionState::DraggingMarker
    }

    /// Handles one pointer event and returns the resulting actions.
    ///
    /// `marker` is the authoritative position; pointer-down within the hit
    /// radius of its screen position grabs it.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        projection: &MapProjection,
        marker: Option<GeoPosition>,
    ) -> Vec<Action> {
        if !self.enabled {
            self.state = InteractionState::Idle;
            return vec![];
        }

        let mut actions = vec![];

        match event {
            PointerEvent::Down { position } => {
                let on_marker = marker
                    .map(|m| projection.geo_to_pixel(&m).distance_to(&position))
                    .is_some_and(|d| d <= self.config.marker_hit_radius_px);

                self.state = if on_marker {
                    log::debug!("grabbed position marker at {:?}", position);
                    InteractionState::DraggingMarker
                } else {
                    InteractionState::Panning { last: position }
                };
            }
            PointerEvent::Move { position } => match self.state {
                InteractionState::DraggingMarker => {
                    if let Some(geo) = projection.pixel_to_geo(&position) {
                        actions.push(Action::DragMarker { position: geo });
                    }
                }
                InteractionState::Panning { last } => {
                    actions.push(Action::Pan {
                        dx: position.x - last.x,
                        dy: position.y - last.y,
                    });
                    self.state = InteractionState::Panning { last: position };
                }
                InteractionState::Idle => {}
            },
            PointerEvent::Up { .. } | PointerEvent::Leave => {
                self.state = InteractionState::Idle;
            }
            PointerEvent::Wheel { position, delta_y } => {
                actions.push(Action::ZoomAt {
                    anchor: position,
                    factor: self.config.wheel_factor(delta_y),
                });
            }
        }

        actions
    }

    /// Forces the idle state, e.g. when the view is torn down mid-gesture
    pub fn cancel(&mut self) {
        self.state = InteractionState::Idle;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{camera::CanvasSize, geo::GeoBoundingBox};

    fn projection() -> MapProjection {
        let bounds = GeoBoundingBox::new(10.0, 10.01, 20.0, 20.02).unwrap();
        MapProjection::new(bounds, CanvasSize::new(800.0, 600.0))
    }

    fn run(
        handler: &mut InputHandler,
        projection: &mut MapProjection,
        marker: &mut GeoPosition,
        event: PointerEvent,
    ) -> Vec<Action> {
        let actions = handler.handle_event(event, projection, Some(*marker));
        for action in &actions {
            if let Some(dragged) = MapOperations::execute_action(projection, action) {
                *marker = dragged;
            }
        }
        actions
    }

    #[test]
    fn test_pointer_down_on_marker_starts_drag() {
        let mut handler = InputHandler::new();
        let mut p = projection();
        let mut marker = GeoPosition::new(10.005, 20.01);
        let marker_px = p.geo_to_pixel(&marker);

        let down = Point::new(marker_px.x + 20.0, marker_px.y - 20.0);
        run(&mut handler, &mut p, &mut marker, PointerEvent::Down { position: down });
        assert_eq!(handler.state(), InteractionState::DraggingMarker);

        let target = Point::new(100.0, 100.0);
        let expected = p.pixel_to_geo(&target).unwrap();
        let actions = run(&mut handler, &mut p, &mut marker, PointerEvent::Move { position: target });
        assert_eq!(actions, vec![Action::DragMarker { position: expected }]);
        assert_eq!(marker, expected);

        // Camera was forced to center the dragged position
        let on_screen = p.geo_to_pixel(&marker);
        assert!((on_screen.x - 400.0).abs() < 1e-9 && (on_screen.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_recenters_even_after_manual_pan() {
        let mut handler = InputHandler::new();
        let mut p = projection();
        p.pan(50.0, 50.0);
        let mut marker = GeoPosition::new(10.005, 20.01);
        let marker_px = p.geo_to_pixel(&marker);

        run(&mut handler, &mut p, &mut marker, PointerEvent::Down { position: marker_px });
        run(
            &mut handler,
            &mut p,
            &mut marker,
            PointerEvent::Move { position: Point::new(200.0, 200.0) },
        );
        let on_screen = p.geo_to_pixel(&marker);
        assert!((on_screen.x - 400.0).abs() < 1e-9 && (on_screen.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_down_off_marker_pans() {
        let mut handler = InputHandler::new();
        let mut p = projection();
        let mut marker = GeoPosition::new(10.005, 20.01);

        let start = Point::new(10.0, 10.0);
        run(&mut handler, &mut p, &mut marker, PointerEvent::Down { position: start });
        assert_eq!(handler.state(), InteractionState::Panning { last: start });

        run(&mut handler, &mut p, &mut marker, PointerEvent::Move { position: Point::new(25.0, 5.0) });
        run(&mut handler, &mut p, &mut marker, PointerEvent::Move { position: Point::new(30.0, 15.0) });
        assert_eq!(p.camera().offset(), Point::new(20.0, 5.0));
        assert_eq!(marker, GeoPosition::new(10.005, 20.01));
    }

    #[test]
    fn test_without_marker_pointer_down_pans() {
        let mut handler = InputHandler::new();
        let p = projection();
        handler.handle_event(PointerEvent::Down { position: Point::new(400.0, 300.0) }, &p, None);
        assert!(matches!(handler.state(), InteractionState::Panning { .. }));
    }

    #[test]
    fn test_release_always_returns_to_idle() {
        let mut handler = InputHandler::new();
        let mut p = projection();
        let mut marker = GeoPosition::new(10.005, 20.01);
        let marker_px = p.geo_to_pixel(&marker);

        run(&mut handler, &mut p, &mut marker, PointerEvent::Down { position: marker_px });
        run(&mut handler, &mut p, &mut marker, PointerEvent::Leave);
        assert_eq!(handler.state(), InteractionState::Idle);

        run(&mut handler, &mut p, &mut marker, PointerEvent::Down { position: Point::new(1.0, 1.0) });
        run(&mut handler, &mut p, &mut marker, PointerEvent::Up { position: Point::new(2.0, 2.0) });
        assert_eq!(handler.state(), InteractionState::Idle);

        // Moves while idle do nothing
        let actions = run(&mut handler, &mut p, &mut marker, PointerEvent::Move { position: Point::new(9.0, 9.0) });
        assert!(actions.is_empty());
    }

    #[test]
    fn test_wheel_zooms_at_cursor() {
        let mut handler = InputHandler::new();
        let p = projection();
        let cursor = Point::new(120.0, 80.0);
        let actions = handler.handle_event(PointerEvent::Wheel { position: cursor, delta_y: 3.0 }, &p, None);
        assert_eq!(actions, vec![Action::ZoomAt { anchor: cursor, factor: 0.95 }]);
        let actions = handler.handle_event(PointerEvent::Wheel { position: cursor, delta_y: -3.0 }, &p, None);
        assert_eq!(actions, vec![Action::ZoomAt { anchor: cursor, factor: 1.05 }]);
    }

    #[test]
    fn test_disabled_handler_ignores_input() {
        let mut handler = InputHandler::new();
        handler.enabled = false;
        let p = projection();
        let actions = handler.handle_event(
            PointerEvent::Wheel { position: Point::default(), delta_y: 1.0 },
            &p,
            None,
        );
        assert!(actions.is_empty());
    }
}
