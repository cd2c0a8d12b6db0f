//! Configuration for the guide engine
//!
//! A hierarchical configuration mirroring the engine's components. Every field
//! has a default, so a partial JSON document only needs to name the knobs it
//! changes.

use crate::core::constants::{
    BBOX_PADDING_DEG, DEFAULT_COOLDOWN_MINUTES, DEFAULT_POI_RADIUS_M, GEOLOCATION_MAX_AGE_MS,
    GEOLOCATION_TIMEOUT_MS, MARKER_HIT_RADIUS_PX, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_IN_FACTOR,
    WHEEL_ZOOM_OUT_FACTOR,
};
use crate::{GuideError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Evaluate geofence + narration on position updates
    pub auto_guide: bool,
    /// Start with the simulated position channel engaged
    pub simulated_mode: bool,
    pub narration: NarrationConfig,
    pub geofence: GeofenceConfig,
    pub geolocation: GeolocationOptions,
    pub camera: CameraLimits,
    pub interaction: InteractionConfig,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            auto_guide: true,
            simulated_mode: true,
            narration: NarrationConfig::default(),
            geofence: GeofenceConfig::default(),
            geolocation: GeolocationOptions::default(),
            camera: CameraLimits::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl GuideConfig {
    /// Parses a (possibly partial) JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GuideConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects settings the engine cannot work with. The cooldown is left
    /// alone: a negative cooldown simply means "never block replay".
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        self.interaction.validate()?;
        if !self.geofence.bbox_padding_deg.is_finite() || self.geofence.bbox_padding_deg < 0.0 {
            return Err(GuideError::Config(format!(
                "bbox_padding_deg must be a non-negative number, got {}",
                self.geofence.bbox_padding_deg
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub cooldown_minutes: f64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    pub default_radius_m: f64,
    pub bbox_padding_deg: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_POI_RADIUS_M,
            bbox_padding_deg: BBOX_PADDING_DEG,
        }
    }
}

/// Request policy passed through to the geolocation source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub maximum_age_ms: u64,
    pub timeout_ms: u64,
}

impl GeolocationOptions {
    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            maximum_age_ms: GEOLOCATION_MAX_AGE_MS,
            timeout_ms: GEOLOCATION_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl CameraLimits {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    fn validate(&self) -> Result<()> {
        let ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= 1.0
            && self.max_zoom >= 1.0;
        if ok {
            Ok(())
        } else {
            Err(GuideError::Config(format!(
                "camera zoom range [{}, {}] must be positive and contain 1.0",
                self.min_zoom, self.max_zoom
            )))
        }
    }
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub marker_hit_radius_px: f64,
    pub wheel_zoom_out_factor: f64,
    pub wheel_zoom_in_factor: f64,
}

impl InteractionConfig {
    /// Zoom factor for a wheel notch; positive `delta_y` scrolls down (out).
    pub fn wheel_factor(&self, delta_y: f64) -> f64 {
        if delta_y > 0.0 {
            self.wheel_zoom_out_factor
        } else {
            self.wheel_zoom_in_factor
        }
    }

    fn validate(&self) -> Result<()> {
        let factors_ok = [self.wheel_zoom_out_factor, self.wheel_zoom_in_factor]
            .iter()
            .all(|f| f.is_finite() && *f > 0.0);
        if !factors_ok || !self.marker_hit_radius_px.is_finite() || self.marker_hit_radius_px < 0.0
        {
            return Err(GuideError::Config(
                "interaction factors must be positive and the hit radius non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            marker_hit_radius_px: MARKER_HIT_RADIUS_PX,
            wheel_zoom_out_factor: WHEEL_ZOOM_OUT_FACTOR,
            wheel_zoom_in_factor: WHEEL_ZOOM_IN_FACTOR,
        }
    }
}
