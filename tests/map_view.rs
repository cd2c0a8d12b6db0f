#![cfg(feature = "egui")]

use geoguide::prelude::*;

/// Headless egui frames driving the schematic map view
#[cfg(test)]
mod map_view_tests {
    use super::*;
    use egui::{Context, RawInput, Rect, Vec2};

    struct Silent;

    impl PlaybackTransport for Silent {
        fn start_playback(&mut self, _audio_id: i64) {}
        fn stop_playback(&mut self) {}
    }

    fn session_with_catalog() -> GuideSession<Silent> {
        let mut session = GuideSession::new(GuideConfig::default(), Silent);
        let catalog = Catalog::from_records(
            vec![
                CatalogRecord::new(1).at(10.7769, 106.7009).with_name("Pho stall"),
                CatalogRecord::new(2).at(10.7775, 106.7021),
            ],
            &GeofenceConfig::default(),
        );
        session.load_catalog(catalog);
        session
    }

    fn run_frame(ctx: &Context, session: &mut GuideSession<Silent>, size: Vec2) -> Rect {
        let mut rect = Rect::NOTHING;
        ctx.run(RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                rect = GuideMapView::new(session).size(size).show(ui).rect;
            });
        });
        rect
    }

    #[tokio::test]
    async fn test_view_sizes_the_projection() {
        let ctx = Context::default();
        let mut session = session_with_catalog();
        assert!(session.projection().unwrap().canvas().is_empty());

        let rect = run_frame(&ctx, &mut session, Vec2::new(400.0, 300.0));
        assert!(rect.width() > 0.0 && rect.height() > 0.0);

        let canvas = session.projection().unwrap().canvas();
        assert_eq!(canvas, CanvasSize::new(rect.width() as f64, rect.height() as f64));

        // With a real canvas the marker can be placed on screen
        let marker = session.marker_pixel().unwrap();
        assert!(marker.x >= 0.0 && marker.x <= canvas.width);
        assert!(marker.y >= 0.0 && marker.y <= canvas.height);
    }

    #[tokio::test]
    async fn test_view_without_located_points() {
        let ctx = Context::default();
        let mut session = GuideSession::new(GuideConfig::default(), Silent);
        session.load_catalog(Catalog::from_records(
            vec![CatalogRecord::new(1)],
            &GeofenceConfig::default(),
        ));

        let rect = run_frame(&ctx, &mut session, Vec2::new(200.0, 200.0));
        assert!(rect.width() > 0.0);
        assert!(session.projection().is_none());
        assert!(session.marker_pixel().is_none());
    }

    #[test]
    fn test_idle_frames_leave_camera_untouched() {
        let ctx = Context::default();
        let mut session = session_with_catalog();
        for _ in 0..3 {
            run_frame(&ctx, &mut session, Vec2::new(320.0, 240.0));
        }
        let camera = session.projection().unwrap().camera();
        assert!(camera.is_following());
        assert_eq!(camera.zoom, 1.0);
    }
}
