//! Camera and projection over the catalog's bounding box
//!
//! The map view is a stylized schematic: geographic coordinates are normalized
//! linearly against a fixed [`GeoBoundingBox`] and stretched over the canvas.
//! On top of that "world" space sits a camera made of a zoom factor and a
//! pixel offset:
//!
//! ```text
//! world.x  = n_lng * width            world.y = (1 - n_lat) * height
//! screen.x = world.x * zoom + offset_x
//! screen.y = world.y * zoom + offset_y
//! ```
//!
//! Every transform here has an exact inverse so a marker dragged on screen
//! lands on the same geographic position it is later drawn at.

use crate::{
    core::{
        config::CameraLimits,
        constants::EARTH_RADIUS_M,
        geo::{GeoBoundingBox, GeoPosition, Point},
    },
    position::{PositionSample, PositionSource},
};
use serde::{Deserialize, Serialize};

/// Zoom and pan state of the map view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Set by manual pan/zoom, cleared by [`CameraState::reset`]. Automatic
    /// re-centering never sets it.
    manually_adjusted: bool,
}

impl CameraState {
    pub fn new(zoom: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            zoom,
            offset_x,
            offset_y,
            manually_adjusted: false,
        }
    }

    /// Whether the camera still follows GPS, i.e. the user has not panned or
    /// zoomed since the last reset. Reflects the manual flag only, not the
    /// zoom and offset values.
    pub fn is_following(&self) -> bool {
        !self.manually_adjusted
    }

    pub fn is_manually_adjusted(&self) -> bool {
        self.manually_adjusted
    }

    /// Back to `{ zoom: 1, offset: (0, 0) }`
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// Canvas dimensions in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A canvas with no drawable area; projection math against it is skipped.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Projects a position to un-zoomed, un-panned world pixels
pub fn geo_to_world(position: &GeoPosition, bounds: &GeoBoundingBox, canvas: CanvasSize) -> Point {
    let (n_lat, n_lng) = bounds.normalize(position);
    Point::new(n_lng * canvas.width, (1.0 - n_lat) * canvas.height)
}

/// Inverse of [`geo_to_world`]; `None` on an empty canvas
pub fn world_to_geo(world: &Point, bounds: &GeoBoundingBox, canvas: CanvasSize) -> Option<GeoPosition> {
    if canvas.is_empty() {
        return None;
    }
    let n_lng = world.x / canvas.width;
    let n_lat = 1.0 - world.y / canvas.height;
    Some(bounds.denormalize(n_lat, n_lng))
}

/// Forward transform: geographic position to screen pixel
pub fn geo_to_pixel(
    position: &GeoPosition,
    camera: &CameraState,
    bounds: &GeoBoundingBox,
    canvas: CanvasSize,
) -> Point {
    let world = geo_to_world(position, bounds, canvas);
    Point::new(
        world.x * camera.zoom + camera.offset_x,
        world.y * camera.zoom + camera.offset_y,
    )
}

/// Inverse transform: screen pixel to geographic position. `None` when the
/// canvas is empty or the zoom is degenerate.
pub fn pixel_to_geo(
    pixel: &Point,
    camera: &CameraState,
    bounds: &GeoBoundingBox,
    canvas: CanvasSize,
) -> Option<GeoPosition> {
    if !(camera.zoom.is_finite() && camera.zoom > 0.0) {
        return None;
    }
    let world = Point::new(
        (pixel.x - camera.offset_x) / camera.zoom,
        (pixel.y - camera.offset_y) / camera.zoom,
    );
    world_to_geo(&world, bounds, canvas)
}

/// Camera over a fixed bounding box and canvas
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    bounds: GeoBoundingBox,
    canvas: CanvasSize,
    camera: CameraState,
    limits: CameraLimits,
}

impl MapProjection {
    pub fn new(bounds: GeoBoundingBox, canvas: CanvasSize) -> Self {
        Self::with_limits(bounds, canvas, CameraLimits::default())
    }

    pub fn with_limits(bounds: GeoBoundingBox, canvas: CanvasSize, limits: CameraLimits) -> Self {
        Self {
            bounds,
            canvas,
            camera: CameraState::default(),
            limits,
        }
    }

    pub fn bounds(&self) -> &GeoBoundingBox {
        &self.bounds
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn limits(&self) -> CameraLimits {
        self.limits
    }

    /// Updates the canvas size; the camera keeps its zoom and offsets
    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    pub fn geo_to_pixel(&self, position: &GeoPosition) -> Point {
        geo_to_pixel(position, &self.camera, &self.bounds, self.canvas)
    }

    pub fn pixel_to_geo(&self, pixel: &Point) -> Option<GeoPosition> {
        pixel_to_geo(pixel, &self.camera, &self.bounds, self.canvas)
    }

    /// Screen pixel back to world pixels, undoing only the camera
    pub fn screen_to_world(&self, pixel: &Point) -> Point {
        Point::new(
            (pixel.x - self.camera.offset_x) / self.camera.zoom,
            (pixel.y - self.camera.offset_y) / self.camera.zoom,
        )
    }

    /// Translates the camera. There is no clamp: content may leave the canvas.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if self.canvas.is_empty() || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.camera.offset_x += dx;
        self.camera.offset_y += dy;
        self.camera.manually_adjusted = true;
    }

    /// Scales the zoom by `factor` (clamped to the camera limits) while
    /// keeping the world point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if self.canvas.is_empty() || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        if !anchor.x.is_finite() || !anchor.y.is_finite() {
            return;
        }

        let world = self.screen_to_world(&anchor);
        let new_zoom = self.limits.clamp(self.camera.zoom * factor);

        self.camera.zoom = new_zoom;
        self.camera.offset_x = anchor.x - world.x * new_zoom;
        self.camera.offset_y = anchor.y - world.y * new_zoom;
        self.camera.manually_adjusted = true;
    }

    /// Moves the camera so `position` sits at the canvas center. Zoom is left
    /// unchanged and this does not count as a manual adjustment.
    pub fn recenter_on(&mut self, position: &GeoPosition) {
        if self.canvas.is_empty() || !position.lat.is_finite() || !position.lng.is_finite() {
            return;
        }
        let world = geo_to_world(position, &self.bounds, self.canvas);
        let center = self.canvas.center();
        self.camera.offset_x = center.x - world.x * self.camera.zoom;
        self.camera.offset_y = center.y - world.y * self.camera.zoom;
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    /// Pure auto-recenter decision: only GPS samples, and only while the user
    /// has not adjusted the camera.
    pub fn should_auto_recenter(&self, sample: &PositionSample) -> bool {
        sample.source == PositionSource::Gps && self.camera.is_following()
    }

    /// Applies the auto-recenter policy for a new sample; returns whether the
    /// camera moved.
    pub fn apply_sample(&mut self, sample: &PositionSample) -> bool {
        if !self.should_auto_recenter(sample) || self.canvas.is_empty() {
            return false;
        }
        let before = self.camera;
        self.recenter_on(&sample.position);
        before != self.camera
    }

    /// On-screen semi-axes (x, y) in pixels of a circle of `radius_m` meters
    /// around `center`, for drawing activation radii.
    pub fn radius_to_pixels(&self, center: &GeoPosition, radius_m: f64) -> (f64, f64) {
        let deg_per_meter = 1.0 / (EARTH_RADIUS_M.to_radians());
        let lat_deg = radius_m * deg_per_meter;
        let cos_lat = center.lat.to_radians().cos().abs().max(1e-9);
        let lng_deg = lat_deg / cos_lat;

        let rx = lng_deg / self.bounds.lng_span() * self.canvas.width * self.camera.zoom;
        let ry = lat_deg / self.bounds.lat_span() * self.canvas.height * self.camera.zoom;
        (rx, ry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_DEG: f64 = 1e-6;

    fn projection() -> MapProjection {
        let bounds = GeoBoundingBox::new(10.0, 10.01, 20.0, 20.02).unwrap();
        MapProjection::new(bounds, CanvasSize::new(800.0, 600.0))
    }

    fn gps(lat: f64, lng: f64) -> PositionSample {
        PositionSample::new(GeoPosition::new(lat, lng), PositionSource::Gps)
    }

    fn assert_close(a: &GeoPosition, b: &GeoPosition) {
        assert!(
            (a.lat - b.lat).abs() < TOLERANCE_DEG && (a.lng - b.lng).abs() < TOLERANCE_DEG,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_corners_map_to_canvas_corners() {
        let p = projection();
        let nw = p.geo_to_pixel(&GeoPosition::new(10.01, 20.0));
        let se = p.geo_to_pixel(&GeoPosition::new(10.0, 20.02));
        assert!(nw.x.abs() < 1e-6 && nw.y.abs() < 1e-6);
        assert!((se.x - 800.0).abs() < 1e-6 && (se.y - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_across_camera_states() {
        let mut p = projection();
        let samples = [
            GeoPosition::new(10.0, 20.0),
            GeoPosition::new(10.005, 20.01),
            GeoPosition::new(10.0099, 20.0001),
            GeoPosition::new(10.0033, 20.0199),
        ];

        for zoom_steps in 0..40 {
            for position in &samples {
                let pixel = p.geo_to_pixel(position);
                let back = p.pixel_to_geo(&pixel).unwrap();
                assert_close(&back, position);
            }
            p.pan(13.5, -7.25);
            let factor = if zoom_steps % 2 == 0 { 1.3 } else { 0.8 };
            p.zoom_at(Point::new(100.0 + zoom_steps as f64, 250.0), factor);
            assert!((0.5..=3.0).contains(&p.camera().zoom));
        }
    }

    #[test]
    fn test_pan_moves_offset_without_clamp() {
        let mut p = projection();
        p.pan(10.0, 10.0);
        p.pan(5_000.0, -5_000.0);
        assert_eq!(p.camera().offset(), Point::new(5_010.0, -4_990.0));
        assert!(p.camera().is_manually_adjusted());
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut p = projection();
        p.pan(40.0, -20.0);
        let anchor = Point::new(321.0, 123.0);
        let before = p.pixel_to_geo(&anchor).unwrap();

        p.zoom_at(anchor, 1.05);
        let after = p.pixel_to_geo(&anchor).unwrap();
        assert_close(&before, &after);
        assert!((p.camera().zoom - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut p = projection();
        for _ in 0..100 {
            p.zoom_at(Point::new(400.0, 300.0), 1.05);
        }
        assert_eq!(p.camera().zoom, 3.0);
        for _ in 0..200 {
            p.zoom_at(Point::new(0.0, 0.0), 0.95);
        }
        assert_eq!(p.camera().zoom, 0.5);
    }

    #[test]
    fn test_recenter_places_position_at_center() {
        let mut p = projection();
        p.zoom_at(Point::new(10.0, 10.0), 2.0);
        let target = GeoPosition::new(10.002, 20.015);
        p.recenter_on(&target);
        let pixel = p.geo_to_pixel(&target);
        assert!((pixel.x - 400.0).abs() < 1e-9);
        assert!((pixel.y - 300.0).abs() < 1e-9);
        assert_eq!(p.camera().zoom, 2.0);
    }

    #[test]
    fn test_auto_recenter_suppressed_after_manual_pan() {
        let mut p = projection();
        assert!(p.apply_sample(&gps(10.002, 20.003)));

        // Automatic recenter alone does not disable later ones
        assert!(p.apply_sample(&gps(10.008, 20.015)));
        assert!(p.camera().is_following());

        p.pan(10.0, 10.0);
        assert!(!p.camera().is_following());
        let offset = p.camera().offset();
        assert!(!p.apply_sample(&gps(10.001, 20.001)));
        assert_eq!(p.camera().offset(), offset);

        p.reset_view();
        assert_eq!(*p.camera(), CameraState::default());
        assert!(p.apply_sample(&gps(10.001, 20.001)));
    }

    #[test]
    fn test_non_gps_samples_never_recenter() {
        let mut p = projection();
        let simulated = PositionSample::new(GeoPosition::new(10.002, 20.003), PositionSource::Simulated);
        let dragged = PositionSample::new(GeoPosition::new(10.002, 20.003), PositionSource::Drag);
        assert!(!p.apply_sample(&simulated));
        assert!(!p.apply_sample(&dragged));
        assert_eq!(*p.camera(), CameraState::default());
    }

    #[test]
    fn test_empty_canvas_is_inert() {
        let bounds = GeoBoundingBox::new(10.0, 10.01, 20.0, 20.02).unwrap();
        let mut p = MapProjection::new(bounds, CanvasSize::new(0.0, 600.0));
        p.pan(10.0, 10.0);
        p.zoom_at(Point::new(1.0, 1.0), 2.0);
        p.recenter_on(&GeoPosition::new(10.005, 20.01));
        assert_eq!(*p.camera(), CameraState::default());
        assert!(p.pixel_to_geo(&Point::new(1.0, 1.0)).is_none());
        assert!(!p.apply_sample(&gps(10.005, 20.01)));
    }

    #[test]
    fn test_radius_to_pixels_scales_with_zoom() {
        let mut p = projection();
        let center = GeoPosition::new(10.005, 20.01);
        let (rx1, ry1) = p.radius_to_pixels(&center, 50.0);
        p.zoom_at(Point::new(0.0, 0.0), 2.0);
        let (rx2, ry2) = p.radius_to_pixels(&center, 50.0);
        assert!(rx1 > 0.0 && ry1 > 0.0);
        assert!((rx2 - 2.0 * rx1).abs() < 1e-9);
        assert!((ry2 - 2.0 * ry1).abs() < 1e-9);
    }
}
