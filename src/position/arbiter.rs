//! Position arbitration
//!
//! Merges the GPS stream, the simulated slider and marker drags into the
//! single authoritative position. Updates are last-write-wins; there is no
//! queueing or averaging.

use crate::{
    core::geo::GeoPosition,
    position::geolocation::GeolocationEvent,
    GuideError, Result,
};
use serde::{Deserialize, Serialize};

/// Where a position sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    Gps,
    Simulated,
    Drag,
}

/// A position tagged with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub position: GeoPosition,
    pub source: PositionSource,
}

impl PositionSample {
    pub fn new(position: GeoPosition, source: PositionSource) -> Self {
        Self { position, source }
    }
}

/// Result of feeding a GPS error to the arbiter
#[derive(Debug, Clone, PartialEq)]
pub enum GpsErrorOutcome {
    /// Simulated mode was on with a value to fall back to
    FellBack(PositionSample),
    /// The error was surfaced and the position marked unavailable
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct PositionArbiter {
    current: Option<PositionSample>,
    simulated: Option<GeoPosition>,
    simulated_mode: bool,
    available: bool,
    error: Option<String>,
}

impl PositionArbiter {
    pub fn new(simulated_mode: bool) -> Self {
        Self {
            simulated_mode,
            ..Self::default()
        }
    }

    /// The authoritative sample. Kept even while position is unavailable so
    /// the last known position can still be displayed.
    pub fn current(&self) -> Option<&PositionSample> {
        self.current.as_ref()
    }

    pub fn position(&self) -> Option<GeoPosition> {
        self.current.map(|sample| sample.position)
    }

    pub fn simulated(&self) -> Option<GeoPosition> {
        self.simulated
    }

    pub fn is_simulated_mode(&self) -> bool {
        self.simulated_mode
    }

    /// `false` after a GPS error that could not fall back
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Dispatches a geolocation event. Returns the new sample if the event
    /// changed the authoritative position.
    pub fn on_geolocation(&mut self, event: GeolocationEvent) -> Result<Option<PositionSample>> {
        match event {
            GeolocationEvent::Fix(position) => self.on_gps_fix(position).map(Some),
            GeolocationEvent::Error(message) => match self.on_gps_error(message) {
                GpsErrorOutcome::FellBack(sample) => Ok(Some(sample)),
                GpsErrorOutcome::Unavailable => Ok(None),
            },
        }
    }

    /// A GPS reading becomes authoritative. In simulated mode the simulated
    /// value mirrors it so the slider follows reality.
    pub fn on_gps_fix(&mut self, position: GeoPosition) -> Result<PositionSample> {
        ensure_valid(&position)?;

        let sample = PositionSample::new(position, PositionSource::Gps);
        self.current = Some(sample);
        self.available = true;
        self.error = None;
        if self.simulated_mode {
            self.simulated = Some(position);
        }
        Ok(sample)
    }

    /// Handles a GPS failure: falls back to the simulated value when
    /// simulated mode is on and one exists, otherwise surfaces the error and
    /// marks the position unavailable without discarding it.
    pub fn on_gps_error(&mut self, message: impl Into<String>) -> GpsErrorOutcome {
        let message = message.into();
        match (self.simulated_mode, self.simulated) {
            (true, Some(position)) => {
                log::debug!("GPS error ({}), falling back to simulated position", message);
                let sample = PositionSample::new(position, PositionSource::Simulated);
                self.current = Some(sample);
                self.available = true;
                self.error = None;
                GpsErrorOutcome::FellBack(sample)
            }
            _ => {
                log::warn!("position unavailable: {}", message);
                self.available = false;
                self.error = Some(message);
                GpsErrorOutcome::Unavailable
            }
        }
    }

    /// Explicit simulated input (slider or marker drag). Engages simulated
    /// mode and becomes authoritative.
    pub fn set_simulated(
        &mut self,
        position: GeoPosition,
        source: PositionSource,
    ) -> Result<PositionSample> {
        ensure_valid(&position)?;
        if source == PositionSource::Gps {
            return Err(GuideError::InvalidCoordinates(
                "simulated input cannot carry a GPS source".to_string(),
            ));
        }

        self.simulated_mode = true;
        self.simulated = Some(position);
        let sample = PositionSample::new(position, source);
        self.current = Some(sample);
        self.available = true;
        self.error = None;
        Ok(sample)
    }

    /// Seeds the simulated value once, e.g. at the first located POI after the
    /// catalog loads. No-op when a simulated value already exists.
    ///
    /// The seed only becomes authoritative when there is no position yet, or
    /// when simulated mode is on and the current sample is not a GPS fix. A
    /// live GPS position is never replaced; the seeded value is kept for the
    /// slider and a later fallback.
    pub fn seed(&mut self, position: GeoPosition) -> Option<PositionSample> {
        if self.simulated.is_some() || !position.is_valid() {
            return None;
        }
        self.simulated = Some(position);

        let takes_over = match self.current {
            None => true,
            Some(current) => self.simulated_mode && current.source != PositionSource::Gps,
        };
        if !takes_over {
            return None;
        }
        let sample = PositionSample::new(position, PositionSource::Simulated);
        self.current = Some(sample);
        self.available = true;
        Some(sample)
    }

    /// Toggles simulated mode. Turning it on makes an existing simulated value
    /// authoritative if it differs from the current position.
    pub fn set_simulated_mode(&mut self, enabled: bool) -> Option<PositionSample> {
        self.simulated_mode = enabled;
        if !enabled {
            return None;
        }
        let position = self.simulated?;
        if self.position() == Some(position) {
            return None;
        }
        let sample = PositionSample::new(position, PositionSource::Simulated);
        self.current = Some(sample);
        self.available = true;
        self.error = None;
        Some(sample)
    }
}

fn ensure_valid(position: &GeoPosition) -> Result<()> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(GuideError::InvalidCoordinates(format!(
            "({}, {})",
            position.lat, position.lng
        )))
    }
}
