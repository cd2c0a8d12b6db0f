use crate::{
    core::{
        camera::{CanvasSize, MapProjection},
        geo::{GeoPosition, Point},
    },
    input::events::PointerEvent,
    session::{GuideSession, PlaybackTransport},
};
use egui::{Align2, Color32, CursorIcon, FontId, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2};

/// Segments used to draw an activation radius
const RADIUS_SEGMENTS: usize = 48;

/// Colors and sizes of the schematic map
#[derive(Debug, Clone)]
pub struct GuideMapStyle {
    pub background: Color32,
    pub frame: Stroke,
    pub radius_fill: Color32,
    pub radius_stroke: Stroke,
    pub selected_fill: Color32,
    pub selected_stroke: Stroke,
    pub poi_color: Color32,
    pub poi_size: f32,
    pub user_color: Color32,
    pub user_halo: Color32,
    pub user_size: f32,
    pub label_color: Color32,
}

impl Default for GuideMapStyle {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(244, 241, 234),
            frame: Stroke::new(1.0, Color32::from_gray(180)),
            radius_fill: Color32::from_rgba_unmultiplied(249, 115, 22, 30),
            radius_stroke: Stroke::new(1.0, Color32::from_rgb(249, 115, 22)),
            selected_fill: Color32::from_rgba_unmultiplied(220, 38, 38, 45),
            selected_stroke: Stroke::new(2.0, Color32::from_rgb(220, 38, 38)),
            poi_color: Color32::from_rgb(234, 88, 12),
            poi_size: 6.0,
            user_color: Color32::from_rgb(37, 99, 235),
            user_halo: Color32::from_rgba_unmultiplied(37, 99, 235, 50),
            user_size: 7.0,
            label_color: Color32::from_gray(60),
        }
    }
}

/// Immediate-mode view of a [`GuideSession`]: paints the bounding box as a
/// schematic canvas and feeds pointer input back to the session.
pub struct GuideMapView<'a, T: PlaybackTransport> {
    session: &'a mut GuideSession<T>,
    size: Option<Vec2>,
    style: GuideMapStyle,
    show_labels: bool,
    show_reset: bool,
}

impl<'a, T: PlaybackTransport> GuideMapView<'a, T> {
    pub fn new(session: &'a mut GuideSession<T>) -> Self {
        Self {
            session,
            size: None,
            style: GuideMapStyle::default(),
            show_labels: true,
            show_reset: true,
        }
    }

    pub fn size(mut self, size: Vec2) -> Self {
        self.size = Some(size);
        self
    }

    pub fn style(mut self, style: GuideMapStyle) -> Self {
        self.style = style;
        self
    }

    pub fn labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    pub fn reset_button(mut self, show: bool) -> Self {
        self.show_reset = show;
        self
    }

    pub fn show(mut self, ui: &mut Ui) -> Response {
        let desired_size = self.size.unwrap_or_else(|| ui.available_size());
        let (rect, mut response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

        self.session
            .set_canvas_size(CanvasSize::new(rect.width() as f64, rect.height() as f64));

        let reset_rect = Rect::from_min_size(
            rect.right_top() + Vec2::new(-60.0, 10.0),
            Vec2::new(50.0, 22.0),
        );

        if self.show_reset {
            let reset_response = ui.allocate_rect(reset_rect, Sense::click());
            if reset_response.clicked() {
                self.session.reset_view();
                response.mark_changed();
            }
        }

        for event in pointer_events(ui, &response, rect, self.show_reset.then_some(reset_rect)) {
            if let Err(e) = self.session.handle_pointer(event) {
                log::warn!("map input rejected: {}", e);
            }
            response.mark_changed();
        }

        if self.session.is_dragging_marker() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if response.dragged() {
            ui.ctx().set_cursor_icon(CursorIcon::Move);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, self.style.background);

        match self.session.projection() {
            Some(projection) => self.paint(&painter, rect, projection),
            None => {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "No located points",
                    FontId::proportional(14.0),
                    self.style.label_color,
                );
            }
        }

        painter.rect_stroke(rect, 4.0, self.style.frame);

        if self.show_reset {
            painter.rect_filled(reset_rect, 3.0, Color32::from_rgba_unmultiplied(255, 255, 255, 220));
            painter.rect_stroke(reset_rect, 3.0, Stroke::new(1.0, Color32::from_gray(100)));
            painter.text(
                reset_rect.center(),
                Align2::CENTER_CENTER,
                "Reset",
                FontId::proportional(12.0),
                Color32::BLACK,
            );
        }

        response
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect, projection: &MapProjection) {
        let origin = rect.min;
        let style = &self.style;
        let selected = self.session.selected().map(|r| r.id);

        // Bounding box outline
        let corners = [
            GeoPosition::new(projection.bounds().lat_max(), projection.bounds().lng_min()),
            GeoPosition::new(projection.bounds().lat_min(), projection.bounds().lng_max()),
        ];
        let a = to_screen(origin, projection.geo_to_pixel(&corners[0]));
        let b = to_screen(origin, projection.geo_to_pixel(&corners[1]));
        painter.rect_stroke(Rect::from_two_pos(a, b), 0.0, Stroke::new(1.0, Color32::from_gray(210)));

        for poi in self.session.catalog().pois() {
            let center = projection.geo_to_pixel(&poi.position());
            let (rx, ry) = projection.radius_to_pixels(&poi.position(), poi.radius);
            let is_selected = selected == Some(poi.id);
            let (fill, stroke) = if is_selected {
                (style.selected_fill, style.selected_stroke)
            } else {
                (style.radius_fill, style.radius_stroke)
            };
            painter.add(Shape::convex_polygon(
                ellipse_points(origin, center, rx, ry),
                fill,
                stroke,
            ));
        }

        for record in self.session.catalog().records() {
            let Some(position) = record.position() else {
                continue;
            };
            let center = to_screen(origin, projection.geo_to_pixel(&position));
            let size = if selected == Some(record.id) {
                style.poi_size * 1.3
            } else {
                style.poi_size
            };
            painter.circle(center, size, style.poi_color, Stroke::new(1.5, Color32::WHITE));

            if self.show_labels {
                painter.text(
                    center + Vec2::new(0.0, -size - 2.0),
                    Align2::CENTER_BOTTOM,
                    record.display_name(),
                    FontId::proportional(11.0),
                    style.label_color,
                );
            }
        }

        if let Some(marker) = self.session.marker_pixel() {
            let center = to_screen(origin, marker);
            painter.circle_filled(center, style.user_size * 2.5, style.user_halo);
            painter.circle(center, style.user_size, style.user_color, Stroke::new(2.0, Color32::WHITE));
        }
    }
}

/// Translates this frame's egui input into map pointer events, in canvas
/// pixels relative to `rect`
fn pointer_events(ui: &Ui, response: &Response, rect: Rect, exclude: Option<Rect>) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let local = |pos: Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

    if let Some(pos) = response.interact_pointer_pos() {
        let on_button = exclude.is_some_and(|r| r.contains(pos));
        if response.drag_started() && !on_button {
            events.push(PointerEvent::Down { position: local(pos) });
        } else if response.dragged() {
            events.push(PointerEvent::Move { position: local(pos) });
        }
        if response.drag_released() {
            events.push(PointerEvent::Up { position: local(pos) });
        }
    } else if response.drag_released() {
        events.push(PointerEvent::Leave);
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll.abs() > 0.1 {
            if let Some(pos) = response.hover_pos() {
                events.push(PointerEvent::Wheel {
                    position: local(pos),
                    delta_y: wheel_delta(scroll),
                });
            }
        }
    }

    events
}

/// egui reports scrolling up as positive; the map treats positive as
/// scrolling down (zoom out).
fn wheel_delta(egui_scroll_y: f32) -> f64 {
    -(egui_scroll_y as f64)
}

fn to_screen(origin: Pos2, point: Point) -> Pos2 {
    Pos2::new(origin.x + point.x as f32, origin.y + point.y as f32)
}

fn ellipse_points(origin: Pos2, center: Point, rx: f64, ry: f64) -> Vec<Pos2> {
    (0..RADIUS_SEGMENTS)
        .map(|i| {
            let t = i as f64 / RADIUS_SEGMENTS as f64 * std::f64::consts::TAU;
            to_screen(origin, Point::new(center.x + rx * t.cos(), center.y + ry * t.sin()))
        })
        .collect()
}

pub trait GuideMapExt {
    fn guide_map<T: PlaybackTransport>(&mut self, session: &mut GuideSession<T>) -> Response;
}

impl GuideMapExt for Ui {
    fn guide_map<T: PlaybackTransport>(&mut self, session: &mut GuideSession<T>) -> Response {
        GuideMapView::new(session).show(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_direction() {
        // Scrolling up in egui zooms in
        assert!(wheel_delta(3.0) < 0.0);
        assert!(wheel_delta(-3.0) > 0.0);
    }

    #[test]
    fn test_ellipse_points_span_radii() {
        let points = ellipse_points(Pos2::new(10.0, 20.0), Point::new(100.0, 50.0), 30.0, 10.0);
        assert_eq!(points.len(), RADIUS_SEGMENTS);
        assert!((points[0].x - 140.0).abs() < 1e-3);
        assert!((points[0].y - 70.0).abs() < 1e-3);
        let max_y = points.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_y - 80.0).abs() < 1e-2);
    }

    #[test]
    fn test_style_defaults() {
        let style = GuideMapStyle::default();
        assert!(style.user_size > 0.0);
        assert_ne!(style.selected_stroke, style.radius_stroke);
    }
}
