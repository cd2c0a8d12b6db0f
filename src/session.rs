//! Guide session
//!
//! Owns every piece of engine state on a single thread: the catalog, the
//! position arbiter, the narration log, the geofence tracker and the map
//! camera. Each accepted position sample runs the same pipeline: camera
//! auto-recenter, auto-stop, then geofence and narration when auto-guide is
//! on. Observers read what happened through [`GuideSession::drain_events`].

use crate::{
    core::{
        camera::{CanvasSize, MapProjection},
        config::GuideConfig,
        geo::{GeoPosition, Point},
    },
    data::catalog::{sort_by_distance, Catalog, CatalogRecord},
    engine::{
        clock::{Clock, SystemClock},
        geofence::{GeofenceTracker, GeofenceTransition},
        narration::NarrationEngine,
    },
    input::{
        events::PointerEvent,
        handler::{Action, InputHandler, MapOperations},
    },
    position::{
        arbiter::{PositionArbiter, PositionSample, PositionSource},
        geolocation::GeolocationEvent,
    },
    prelude::Arc,
    Result,
};
use serde::{Deserialize, Serialize};

/// The external audio player. The session never calls `start_playback`
/// twice without a `stop_playback` in between.
pub trait PlaybackTransport {
    fn start_playback(&mut self, audio_id: i64);
    fn stop_playback(&mut self);
}

/// Why playback stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The user walked out of the playing POI's radius
    LeftRadius,
    /// Manual pause
    Paused,
    /// The transport finished the clip
    Ended,
}

/// Something observable that happened during a session update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuideEvent {
    CatalogLoaded { records: usize, located: usize },
    PositionChanged(PositionSample),
    PositionUnavailable { message: String },
    PoiEntered { poi_id: i64, previous: Option<i64> },
    PoiExited { poi_id: i64 },
    SelectionChanged { record_id: i64 },
    NarrationStarted { record_id: i64, audio_id: i64, automatic: bool },
    NarrationStopped { record_id: i64, reason: StopReason },
    CameraRecentered,
}

pub struct GuideSession<T: PlaybackTransport> {
    config: GuideConfig,
    catalog: Catalog,
    arbiter: PositionArbiter,
    narration: NarrationEngine,
    geofence: GeofenceTracker,
    projection: Option<MapProjection>,
    canvas: CanvasSize,
    input: InputHandler,
    selected: Option<i64>,
    playing: Option<i64>,
    auto_guide: bool,
    events: Vec<GuideEvent>,
    transport: T,
    #[cfg(feature = "tokio-runtime")]
    geolocation: Option<crate::position::geolocation::GpsSubscription>,
}

impl<T: PlaybackTransport> GuideSession<T> {
    pub fn new(config: GuideConfig, transport: T) -> Self {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(config: GuideConfig, transport: T, clock: Arc<dyn Clock>) -> Self {
        let narration = NarrationEngine::with_clock(clock, config.narration.cooldown_minutes);
        Self {
            arbiter: PositionArbiter::new(config.simulated_mode),
            auto_guide: config.auto_guide,
            input: InputHandler::with_config(config.interaction.clone()),
            narration,
            geofence: GeofenceTracker::new(),
            catalog: Catalog::default(),
            projection: None,
            canvas: CanvasSize::default(),
            selected: None,
            playing: None,
            events: Vec::new(),
            transport,
            config,
            #[cfg(feature = "tokio-runtime")]
            geolocation: None,
        }
    }

    /// Replaces the catalog. The camera is reset over the new bounding box,
    /// the simulated position is seeded at the first located record when
    /// none exists yet, and the first record is selected if nothing is.
    pub fn load_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.geofence.reset();

        self.projection = self
            .catalog
            .bounding_box(self.config.geofence.bbox_padding_deg)
            .map(|bounds| MapProjection::with_limits(bounds, self.canvas, self.config.camera));

        self.events.push(GuideEvent::CatalogLoaded {
            records: self.catalog.records().len(),
            located: self.catalog.pois().len(),
        });

        let selection_valid = self
            .selected
            .is_some_and(|id| self.catalog.record(id).is_some());
        if !selection_valid {
            self.selected = None;
            if let Some(first) = self.catalog.records().first().map(|r| r.id) {
                self.set_selected(first);
            }
        }

        let seed = self.catalog.first_located().and_then(|r| r.position());
        if let Some(sample) = seed.and_then(|p| self.arbiter.seed(p)) {
            log::debug!("seeded simulated position at {:?}", sample.position);
            self.process_sample(sample);
        }
    }

    /// Feeds one event from the geolocation watch
    pub fn on_geolocation(&mut self, event: GeolocationEvent) -> Result<()> {
        match self.arbiter.on_geolocation(event)? {
            Some(sample) => self.process_sample(sample),
            None => {
                let message = self.arbiter.error().unwrap_or_default().to_string();
                self.events.push(GuideEvent::PositionUnavailable { message });
            }
        }
        Ok(())
    }

    /// Slider input. Engages simulated mode.
    pub fn set_simulated_position(&mut self, position: GeoPosition) -> Result<()> {
        let sample = self.arbiter.set_simulated(position, PositionSource::Simulated)?;
        self.process_sample(sample);
        Ok(())
    }

    pub fn set_simulated_mode(&mut self, enabled: bool) {
        if let Some(sample) = self.arbiter.set_simulated_mode(enabled) {
            self.process_sample(sample);
        }
    }

    /// Routes pointer input through the interaction controller
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<()> {
        let Some(projection) = self.projection.as_ref() else {
            return Ok(());
        };

        let marker = self.arbiter.position();
        let actions = self.input.handle_event(event, projection, marker);

        for action in &actions {
            if let Action::DragMarker { position } = action {
                // Validate before the camera moves
                let sample = self.arbiter.set_simulated(*position, PositionSource::Drag)?;
                if let Some(projection) = self.projection.as_mut() {
                    MapOperations::execute_action(projection, action);
                }
                self.process_sample(sample);
            } else if let Some(projection) = self.projection.as_mut() {
                MapOperations::execute_action(projection, action);
            }
        }
        Ok(())
    }

    /// Canvas resize from the view
    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
        if let Some(projection) = self.projection.as_mut() {
            projection.set_canvas_size(canvas);
        }
    }

    /// Back to the default camera; the next GPS fix recenters again
    pub fn reset_view(&mut self) {
        if let Some(projection) = self.projection.as_mut() {
            projection.reset_view();
        }
    }

    /// Manual play/pause of the selected record
    pub fn toggle_playback(&mut self) {
        if let Some(record_id) = self.playing {
            self.stop(record_id, StopReason::Paused);
            return;
        }
        let Some(record) = self.selected_record() else {
            return;
        };
        let (record_id, audio_id) = (record.id, self.audio_for(record));
        self.start(record_id, audio_id, false);
    }

    /// The transport finished the current clip
    pub fn on_playback_ended(&mut self) {
        if let Some(record_id) = self.playing.take() {
            log::debug!("narration for {} ended", record_id);
            self.events.push(GuideEvent::NarrationStopped {
                record_id,
                reason: StopReason::Ended,
            });
        }
    }

    /// Manual selection. Unknown ids are ignored.
    pub fn select(&mut self, record_id: i64) {
        if self.catalog.record(record_id).is_some() {
            self.set_selected(record_id);
        }
    }

    /// Turning auto-guide off also stops the geolocation watch
    pub fn set_auto_guide(&mut self, enabled: bool) {
        if self.auto_guide == enabled {
            return;
        }
        self.auto_guide = enabled;
        log::info!("auto-guide {}", if enabled { "enabled" } else { "disabled" });

        if enabled {
            if let Some(sample) = self.arbiter.current().copied() {
                self.evaluate_geofence(&sample.position);
            }
        } else {
            #[cfg(feature = "tokio-runtime")]
            self.stop_geolocation();
        }
    }

    pub fn set_cooldown_minutes(&mut self, minutes: f64) {
        self.narration.set_cooldown_minutes(minutes);
    }

    pub fn current_position(&self) -> Option<GeoPosition> {
        self.arbiter.position()
    }

    pub fn current_sample(&self) -> Option<&PositionSample> {
        self.arbiter.current()
    }

    /// Falls back to the first record when nothing is selected
    pub fn selected(&self) -> Option<&CatalogRecord> {
        self.selected_record()
    }

    /// Meters from the current position to the selected record
    pub fn current_distance(&self) -> Option<f64> {
        let position = self.arbiter.position()?;
        self.selected_record()?.distance_from(&position)
    }

    pub fn sorted_records(&self) -> Vec<&CatalogRecord> {
        sort_by_distance(self.catalog.records(), self.arbiter.position().as_ref())
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    pub fn playing(&self) -> Option<i64> {
        self.playing
    }

    pub fn geo_error(&self) -> Option<&str> {
        self.arbiter.error()
    }

    pub fn is_auto_guide(&self) -> bool {
        self.auto_guide
    }

    pub fn is_simulated_mode(&self) -> bool {
        self.arbiter.is_simulated_mode()
    }

    pub fn simulated_position(&self) -> Option<GeoPosition> {
        self.arbiter.simulated()
    }

    pub fn active_poi(&self) -> Option<i64> {
        self.geofence.active()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn projection(&self) -> Option<&MapProjection> {
        self.projection.as_ref()
    }

    pub fn narration(&self) -> &NarrationEngine {
        &self.narration
    }

    pub fn narration_mut(&mut self) -> &mut NarrationEngine {
        &mut self.narration
    }

    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_dragging_marker(&self) -> bool {
        self.input.is_dragging_marker()
    }

    /// Screen position of the user marker
    pub fn marker_pixel(&self) -> Option<Point> {
        let position = self.arbiter.position()?;
        Some(self.projection.as_ref()?.geo_to_pixel(&position))
    }

    pub fn drain_events(&mut self) -> Vec<GuideEvent> {
        std::mem::take(&mut self.events)
    }

    fn process_sample(&mut self, sample: PositionSample) {
        self.events.push(GuideEvent::PositionChanged(sample));

        if let Some(projection) = self.projection.as_mut() {
            if projection.apply_sample(&sample) {
                self.events.push(GuideEvent::CameraRecentered);
            }
        }

        self.check_auto_stop(&sample.position);

        if self.auto_guide {
            self.evaluate_geofence(&sample.position);
        }
    }

    /// Edge-triggered: clears `playing`, so it cannot fire twice
    fn check_auto_stop(&mut self, position: &GeoPosition) {
        let Some(record_id) = self.playing else {
            return;
        };
        let Some(poi) = self.catalog.poi(record_id) else {
            return;
        };
        let distance = poi.distance_from(position);
        if distance > poi.radius {
            log::info!(
                "left radius of {} ({:.0}m > {:.0}m), stopping narration",
                record_id,
                distance,
                poi.radius
            );
            self.stop(record_id, StopReason::LeftRadius);
        }
    }

    fn evaluate_geofence(&mut self, position: &GeoPosition) {
        let (transition, active) = self.geofence.update(position, self.catalog.pois());
        let active = active.map(|poi| (poi.id, poi.audio_id));

        match transition {
            GeofenceTransition::Entered { poi_id, previous } => {
                log::debug!("entered POI {}", poi_id);
                self.events.push(GuideEvent::PoiEntered { poi_id, previous });
            }
            GeofenceTransition::Exited { poi_id } => {
                self.events.push(GuideEvent::PoiExited { poi_id });
            }
            GeofenceTransition::Unchanged => {}
        }

        let Some((poi_id, audio_id)) = active else {
            return;
        };
        if self.selected != Some(poi_id) {
            self.set_selected(poi_id);
        }
        if self.narration.can_play(poi_id, self.playing.is_some()) {
            self.start(poi_id, audio_id, true);
        } else if matches!(transition, GeofenceTransition::Entered { .. }) {
            log::debug!("narration for {} suppressed", poi_id);
        }
    }

    fn start(&mut self, record_id: i64, audio_id: i64, automatic: bool) {
        if self.playing.is_some() {
            return;
        }
        log::info!("starting narration {} (audio {})", record_id, audio_id);
        if automatic {
            self.narration.log_play(record_id, audio_id);
        }
        self.transport.start_playback(audio_id);
        self.playing = Some(record_id);
        self.events.push(GuideEvent::NarrationStarted {
            record_id,
            audio_id,
            automatic,
        });
    }

    fn stop(&mut self, record_id: i64, reason: StopReason) {
        self.transport.stop_playback();
        self.playing = None;
        self.events.push(GuideEvent::NarrationStopped { record_id, reason });
    }

    fn set_selected(&mut self, record_id: i64) {
        self.selected = Some(record_id);
        self.events.push(GuideEvent::SelectionChanged { record_id });
    }

    fn selected_record(&self) -> Option<&CatalogRecord> {
        self.selected
            .and_then(|id| self.catalog.record(id))
            .or_else(|| self.catalog.records().first())
    }

    fn audio_for(&self, record: &CatalogRecord) -> i64 {
        self.catalog
            .poi(record.id)
            .map(|poi| poi.audio_id)
            .or(record.audio_id)
            .unwrap_or(record.id)
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T: PlaybackTransport> GuideSession<T> {
    /// Starts watching `source`, replacing any previous watch. Must be called
    /// from within a tokio runtime.
    pub fn start_geolocation(&mut self, source: &dyn crate::position::geolocation::GeolocationSource) {
        self.stop_geolocation();
        self.geolocation = Some(crate::position::geolocation::GpsSubscription::start(
            source,
            &self.config.geolocation,
        ));
    }

    pub fn stop_geolocation(&mut self) {
        if let Some(mut subscription) = self.geolocation.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_watching_geolocation(&self) -> bool {
        self.geolocation.as_ref().is_some_and(|s| s.is_active())
    }

    /// Applies every pending geolocation event; returns how many were handled
    pub fn poll_geolocation(&mut self) -> usize {
        let pending = match self.geolocation.as_ref() {
            Some(subscription) => subscription.drain(),
            None => return 0,
        };
        let count = pending.len();
        for event in pending {
            if let Err(e) = self.on_geolocation(event) {
                log::warn!("rejected geolocation event: {}", e);
            }
        }
        count
    }
}
