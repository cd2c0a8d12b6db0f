use crate::core::geo::GeoPosition;
use serde::{Deserialize, Serialize};

/// A point of interest with an activation radius and the narration it plays.
///
/// POIs are derived from the catalog and never mutated individually; a
/// catalog refresh replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Activation radius in meters, always > 0
    pub radius: f64,
    /// Higher wins equal-distance ties
    pub priority: i32,
    pub audio_id: i64,
}

impl Poi {
    pub fn new(id: i64, latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
            radius,
            priority: 0,
            audio_id: id,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_audio(mut self, audio_id: i64) -> Self {
        self.audio_id = audio_id;
        self
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.latitude, self.longitude)
    }

    /// Distance from `position` to the POI center in meters
    pub fn distance_from(&self, position: &GeoPosition) -> f64 {
        position.distance_to(&self.position())
    }

    pub fn contains(&self, position: &GeoPosition) -> bool {
        self.distance_from(position) <= self.radius
    }
}
