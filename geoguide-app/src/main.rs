use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel::{Receiver, TryRecvError};
use geoguide::prelude::*;

/// Food-street sample used when no catalog is given
const DEMO_CATALOG: &str = r#"{
    "data": {
        "meta": { "page": 1, "size": 100, "total": 4 },
        "result": [
            { "id": 1, "foodName": "Pho stall", "latitude": 10.7769, "longitude": 106.7009, "accuracy": 40 },
            { "id": 2, "foodName": "Banh mi cart", "latitude": 10.7775, "longitude": 106.7021, "accuracy": 30 },
            { "id": 3, "foodName": "Coffee corner", "latitude": 10.7762, "longitude": 106.7030, "priority": 1 },
            { "id": 4, "foodName": "Night market", "latitude": 10.7781, "longitude": 106.7040, "accuracy": 60 },
            { "id": 5, "foodName": "Street cart (no location)" }
        ]
    }
}"#;

/// Stand-in length of a narration clip
const CLIP_LENGTH: Duration = Duration::from_secs(12);

/// Logs playback commands and pretends each clip lasts [`CLIP_LENGTH`]
#[derive(Debug, Default)]
struct LoggingTransport {
    started: Option<(i64, Instant)>,
}

impl PlaybackTransport for LoggingTransport {
    fn start_playback(&mut self, audio_id: i64) {
        log::info!("▶ start audio {}", audio_id);
        self.started = Some((audio_id, Instant::now()));
    }

    fn stop_playback(&mut self) {
        log::info!("■ stop audio");
        self.started = None;
    }
}

impl LoggingTransport {
    fn finished(&self) -> bool {
        self.started
            .is_some_and(|(_, at)| at.elapsed() >= CLIP_LENGTH)
    }

    fn progress(&self) -> Option<f32> {
        self.started
            .map(|(_, at)| (at.elapsed().as_secs_f32() / CLIP_LENGTH.as_secs_f32()).min(1.0))
    }
}

enum CatalogArg {
    Demo,
    File(String),
    Url(String),
}

struct Args {
    catalog: CatalogArg,
    config: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        catalog: CatalogArg::Demo,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = iter.next(),
            value if value.starts_with("http://") || value.starts_with("https://") => {
                args.catalog = CatalogArg::Url(value.to_string())
            }
            value => args.catalog = CatalogArg::File(value.to_string()),
        }
    }
    args
}

/// Demo audio-guide viewer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = parse_args();
    let config = match &args.config {
        Some(path) => GuideConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => GuideConfig::default(),
    };

    let mut session = GuideSession::new(config, LoggingTransport::default());
    let mut pending_catalog = None;

    match args.catalog {
        CatalogArg::Demo => {
            let catalog = Catalog::from_json(DEMO_CATALOG, &session.config().geofence)?;
            session.load_catalog(catalog);
        }
        CatalogArg::File(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading catalog {}", path))?;
            let catalog = Catalog::from_json(&json, &session.config().geofence)?;
            session.load_catalog(catalog);
        }
        CatalogArg::Url(url) => {
            let (tx, rx) = crossbeam_channel::bounded(1);
            let source = HttpCatalogSource::new(url);
            tokio::spawn(async move {
                let _ = tx.send(source.fetch().await);
            });
            pending_catalog = Some(rx);
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("geoguide - audio guide demo"),
        ..Default::default()
    };

    eframe::run_native(
        "geoguide-app",
        options,
        Box::new(move |_cc| Box::new(GuideApp::new(session, pending_catalog))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {}", e))?;

    Ok(())
}

struct GuideApp {
    session: GuideSession<LoggingTransport>,
    pending_catalog: Option<Receiver<geoguide::Result<Vec<CatalogRecord>>>>,
    walking: bool,
    status: Option<String>,
}

impl GuideApp {
    fn new(
        session: GuideSession<LoggingTransport>,
        pending_catalog: Option<Receiver<geoguide::Result<Vec<CatalogRecord>>>>,
    ) -> Self {
        Self {
            session,
            pending_catalog,
            walking: false,
            status: None,
        }
    }

    fn poll_catalog(&mut self) {
        let Some(rx) = &self.pending_catalog else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(records)) => {
                let catalog = Catalog::from_records(records, &self.session.config().geofence);
                self.session.load_catalog(catalog);
                self.pending_catalog = None;
            }
            Ok(Err(e)) => {
                log::error!("could not load catalog: {}", e);
                self.status = Some(format!("Could not load catalog: {}", e));
                self.pending_catalog = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.pending_catalog = None,
        }
    }

    fn toggle_walk(&mut self) {
        if self.walking {
            self.session.stop_geolocation();
            self.walking = false;
            return;
        }
        let waypoints: Vec<GeoPosition> = self
            .session
            .catalog()
            .pois()
            .iter()
            .map(|poi| poi.position())
            .collect();
        if waypoints.len() < 2 {
            self.status = Some("Need at least two located points to walk".to_string());
            return;
        }
        let walk = SimulatedWalk::new(waypoints, Duration::from_millis(500))
            .with_steps_per_leg(25)
            .looping(true);
        self.session.set_simulated_mode(false);
        self.session.start_geolocation(&walk);
        self.walking = true;
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Guide");
        ui.separator();

        let mut auto_guide = self.session.is_auto_guide();
        if ui.checkbox(&mut auto_guide, "Auto-guide").changed() {
            self.session.set_auto_guide(auto_guide);
            if !auto_guide {
                self.walking = false;
            }
        }

        let walk_label = if self.walking { "Stop simulated walk" } else { "Start simulated walk" };
        if ui
            .add_enabled(self.session.is_auto_guide(), egui::Button::new(walk_label))
            .clicked()
        {
            self.toggle_walk();
        }

        if let Some(error) = self.session.geo_error() {
            ui.colored_label(egui::Color32::RED, format!("GPS: {}", error));
        }
        if let Some(status) = &self.status {
            ui.colored_label(egui::Color32::DARK_RED, status);
        }

        ui.separator();
        self.simulated_sliders(ui);

        ui.separator();
        if let Some(selected) = self.session.selected() {
            ui.label(egui::RichText::new(selected.display_name()).strong());
            if let Some(description) = &selected.description {
                ui.label(description);
            }
        }
        ui.label(format!(
            "Distance: {}",
            format_distance(self.session.current_distance().map(f64::round))
        ));

        let play_label = if self.session.is_playing() { "Pause" } else { "Play" };
        if ui.button(play_label).clicked() {
            self.session.toggle_playback();
        }
        if let Some(progress) = self.session.transport().progress() {
            ui.add(egui::ProgressBar::new(progress));
        }

        ui.separator();
        ui.label("Nearby");
        let position = self.session.current_position();
        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let selected = self.session.selected().map(|r| r.id);
            for record in self.session.sorted_records() {
                let distance = position.as_ref().and_then(|p| record.distance_from(p));
                let text = format!(
                    "{}  ·  {}",
                    record.display_name(),
                    format_distance(distance.map(f64::round))
                );
                if ui.selectable_label(selected == Some(record.id), text).clicked() {
                    clicked = Some(record.id);
                }
            }
        });
        if let Some(id) = clicked {
            self.session.select(id);
        }
    }

    fn simulated_sliders(&mut self, ui: &mut egui::Ui) {
        let Some(bounds) = self.session.projection().map(|p| *p.bounds()) else {
            return;
        };
        let Some(mut position) = self
            .session
            .simulated_position()
            .or_else(|| self.session.current_position())
        else {
            return;
        };

        ui.label(if self.session.is_simulated_mode() {
            "Simulated position"
        } else {
            "Simulated position (GPS active)"
        });
        let lat_changed = ui
            .add(
                egui::Slider::new(&mut position.lat, bounds.lat_min()..=bounds.lat_max())
                    .text("lat")
                    .max_decimals(6),
            )
            .changed();
        let lng_changed = ui
            .add(
                egui::Slider::new(&mut position.lng, bounds.lng_min()..=bounds.lng_max())
                    .text("lng")
                    .max_decimals(6),
            )
            .changed();

        if lat_changed || lng_changed {
            if let Err(e) = self.session.set_simulated_position(position) {
                log::warn!("slider position rejected: {}", e);
            }
        }
    }
}

impl eframe::App for GuideApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_catalog();
        self.session.poll_geolocation();

        if self.session.transport().finished() {
            self.session.transport_mut().started = None;
            self.session.on_playback_ended();
        }

        for event in self.session.drain_events() {
            log::debug!("{:?}", event);
        }

        egui::SidePanel::left("guide_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.pending_catalog.is_some() {
                ui.centered_and_justified(|ui| ui.spinner());
                return;
            }
            GuideMapView::new(&mut self.session).show(ui);
        });

        // Keep polling geolocation and playback progress
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
