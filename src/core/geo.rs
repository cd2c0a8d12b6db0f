use crate::core::constants::EARTH_RADIUS_M;
use serde::{Deserialize, Serialize};

/// A geographical coordinate in degrees.
///
/// Positions are immutable values: an update replaces the whole value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPosition {
    /// Creates a new position
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that both components are finite and within range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to another position in meters
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        distance_meters(self, other)
    }
}

impl From<GeoPosition> for geo_types::Coord<f64> {
    fn from(position: GeoPosition) -> Self {
        geo_types::coord! { x: position.lng, y: position.lat }
    }
}

impl From<geo_types::Coord<f64>> for GeoPosition {
    fn from(coord: geo_types::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

/// Calculates the great-circle distance between two positions using the
/// haversine formula on a sphere of radius [`EARTH_RADIUS_M`].
pub fn distance_meters(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Formats a distance for display: whole meters below one kilometer,
/// otherwise kilometers with one decimal.
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        None => "—".to_string(),
        Some(d) if d.round() < 1000.0 => format!("{}m", d.round() as i64),
        Some(d) => format!("{:.1}km", d.round() / 1000.0),
    }
}

/// Represents a point in screen or canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Geographic rectangle the map projection normalizes against.
///
/// Only constructed with `lat_max > lat_min` and `lng_max > lng_min`, so the
/// projection never divides by a zero span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, or `None` when either span is empty or a
    /// component is not finite.
    pub fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Option<Self> {
        let finite = [lat_min, lat_max, lng_min, lng_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || lat_max <= lat_min || lng_max <= lng_min {
            return None;
        }
        Some(Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        })
    }

    /// Smallest box around `positions`, grown by `padding_deg` on every side.
    pub fn from_positions<I>(positions: I, padding_deg: f64) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPosition>,
    {
        use geo::BoundingRect;

        let points: Vec<geo_types::Point<f64>> = positions
            .into_iter()
            .filter(|p| p.is_valid())
            .map(|p| geo_types::Point::from(geo_types::Coord::from(p)))
            .collect();
        let rect = geo_types::MultiPoint::from(points).bounding_rect()?;
        let padding = if padding_deg.is_finite() {
            padding_deg.max(0.0)
        } else {
            0.0
        };

        Self::new(
            rect.min().y - padding,
            rect.max().y + padding,
            rect.min().x - padding,
            rect.max().x + padding,
        )
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub fn lng_min(&self) -> f64 {
        self.lng_min
    }

    pub fn lng_max(&self) -> f64 {
        self.lng_max
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lng_span(&self) -> f64 {
        self.lng_max - self.lng_min
    }

    /// Checks if the box contains a position
    pub fn contains(&self, position: &GeoPosition) -> bool {
        position.lat >= self.lat_min
            && position.lat <= self.lat_max
            && position.lng >= self.lng_min
            && position.lng <= self.lng_max
    }

    pub fn center(&self) -> GeoPosition {
        GeoPosition::new(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lng_min + self.lng_max) / 2.0,
        )
    }

    /// Normalizes a position into `[0, 1]` per axis (values outside the box
    /// fall outside that range).
    pub fn normalize(&self, position: &GeoPosition) -> (f64, f64) {
        (
            (position.lat - self.lat_min) / self.lat_span(),
            (position.lng - self.lng_min) / self.lng_span(),
        )
    }

    /// Inverse of [`GeoBoundingBox::normalize`].
    pub fn denormalize(&self, n_lat: f64, n_lng: f64) -> GeoPosition {
        GeoPosition::new(
            self.lat_min + n_lat * self.lat_span(),
            self.lng_min + n_lng * self.lng_span(),
        )
    }
}
