//! Geofence selection
//!
//! Decides which single POI, if any, the current position is "inside".

use crate::core::{geo::GeoPosition, poi::Poi};
use std::cmp::Ordering;

/// Selects the active POI for `position`.
///
/// A POI is a candidate when the position lies within its radius. The closest
/// candidate wins; equal distances go to the higher priority, then the lower
/// id. Pure: the same inputs always give the same answer.
pub fn select_active_poi<'a>(position: &GeoPosition, pois: &'a [Poi]) -> Option<&'a Poi> {
    pois.iter()
        .filter_map(|poi| {
            let distance = poi.distance_from(position);
            (distance <= poi.radius).then_some((distance, poi))
        })
        .min_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|(_, poi)| poi)
}

/// Change in the active POI between two evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceTransition {
    /// A different POI became active; `previous` is the one left, if any
    Entered { poi_id: i64, previous: Option<i64> },
    /// No POI is active any more
    Exited { poi_id: i64 },
    Unchanged,
}

/// Remembers the last active POI so callers see one `Entered` per entry
/// rather than one per position update.
#[derive(Debug, Clone, Default)]
pub struct GeofenceTracker {
    active: Option<i64>,
}

impl GeofenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<i64> {
        self.active
    }

    /// Evaluates `position` against `pois` and reports the transition along
    /// with the currently active POI.
    pub fn update<'a>(
        &mut self,
        position: &GeoPosition,
        pois: &'a [Poi],
    ) -> (GeofenceTransition, Option<&'a Poi>) {
        let selected = select_active_poi(position, pois);
        let transition = match (self.active, selected.map(|p| p.id)) {
            (previous, Some(id)) if previous != Some(id) => {
                log::debug!("entered POI {} (previous {:?})", id, previous);
                GeofenceTransition::Entered {
                    poi_id: id,
                    previous,
                }
            }
            (Some(previous), None) => {
                log::debug!("left POI {}", previous);
                GeofenceTransition::Exited { poi_id: previous }
            }
            _ => GeofenceTransition::Unchanged,
        };
        self.active = selected.map(|p| p.id);
        (transition, selected)
    }

    /// Forgets the active POI, e.g. after a catalog refresh
    pub fn reset(&mut self) {
        self.active = None;
    }
}
