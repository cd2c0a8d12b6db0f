//! Geolocation input
//!
//! The platform geolocation service is an external collaborator that delivers
//! fixes or errors asynchronously. [`GpsSubscription`] runs such a stream on
//! the async runtime and hands the events to the single thread that owns the
//! engine state; dropping or unsubscribing it stops delivery.

use crate::core::{config::GeolocationOptions, geo::GeoPosition};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// One event from the geolocation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeolocationEvent {
    Fix(GeoPosition),
    Error(String),
}

/// A long-lived source of position events
pub trait GeolocationSource: Send + Sync {
    /// Starts watching with the given request policy. The stream ends when
    /// the source stops producing events.
    fn watch(&self, options: &GeolocationOptions) -> BoxStream<'static, GeolocationEvent>;
}

#[cfg(feature = "tokio-runtime")]
pub use self::subscription::{GpsSubscription, SimulatedWalk};

#[cfg(feature = "tokio-runtime")]
mod subscription {
    use super::*;
    use crate::prelude::Duration;
    use crossbeam_channel::{Receiver, TryRecvError};
    use futures::StreamExt;
    use tokio::task::JoinHandle;

    /// Handle to a running geolocation watch
    pub struct GpsSubscription {
        handle: Option<JoinHandle<()>>,
        events: Receiver<GeolocationEvent>,
    }

    impl GpsSubscription {
        /// Spawns the watch on the tokio runtime. Must be called from within a
        /// runtime context.
        pub fn start(source: &dyn GeolocationSource, options: &GeolocationOptions) -> Self {
            let mut stream = source.watch(options);
            let (tx, rx) = crossbeam_channel::unbounded();

            log::info!(
                "starting geolocation watch (high accuracy: {}, max age: {:?}, timeout: {:?})",
                options.enable_high_accuracy,
                options.maximum_age(),
                options.timeout()
            );

            let handle = tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                log::debug!("geolocation watch ended");
            });

            Self {
                handle: Some(handle),
                events: rx,
            }
        }

        /// Next pending event without blocking
        pub fn try_next(&self) -> Option<GeolocationEvent> {
            if self.handle.is_none() {
                return None;
            }
            match self.events.try_recv() {
                Ok(event) => Some(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
            }
        }

        /// All pending events, oldest first
        pub fn drain(&self) -> Vec<GeolocationEvent> {
            if self.handle.is_none() {
                return Vec::new();
            }
            self.events.try_iter().collect()
        }

        /// Whether the watch is still running
        pub fn is_active(&self) -> bool {
            self.handle
                .as_ref()
                .map(|handle| !handle.is_finished())
                .unwrap_or(false)
        }

        /// Stops the watch and discards anything not yet delivered
        pub fn unsubscribe(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.abort();
                log::info!("geolocation watch unsubscribed");
            }
            while self.events.try_recv().is_ok() {}
        }
    }

    impl Drop for GpsSubscription {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.abort();
            }
        }
    }

    /// Simulated GPS that walks back and forth along waypoints
    #[derive(Debug, Clone)]
    pub struct SimulatedWalk {
        waypoints: Vec<GeoPosition>,
        steps_per_leg: usize,
        tick: Duration,
        looping: bool,
    }

    impl SimulatedWalk {
        pub fn new(waypoints: Vec<GeoPosition>, tick: Duration) -> Self {
            Self {
                waypoints,
                steps_per_leg: 20,
                tick,
                looping: false,
            }
        }

        pub fn with_steps_per_leg(mut self, steps: usize) -> Self {
            self.steps_per_leg = steps.max(1);
            self
        }

        /// Walk the route again in reverse once the end is reached, forever
        pub fn looping(mut self, looping: bool) -> Self {
            self.looping = looping;
            self
        }

        /// Every position the walk visits on one pass
        pub fn path(&self) -> Vec<GeoPosition> {
            let mut path = Vec::new();
            let Some(first) = self.waypoints.first() else {
                return path;
            };
            path.push(*first);
            for leg in self.waypoints.windows(2) {
                let (from, to) = (leg[0], leg[1]);
                for step in 1..=self.steps_per_leg {
                    let t = step as f64 / self.steps_per_leg as f64;
                    path.push(GeoPosition::new(
                        from.lat + (to.lat - from.lat) * t,
                        from.lng + (to.lng - from.lng) * t,
                    ));
                }
            }
            path
        }
    }

    impl GeolocationSource for SimulatedWalk {
        fn watch(&self, _options: &GeolocationOptions) -> BoxStream<'static, GeolocationEvent> {
            let mut path = self.path();
            if self.looping && path.len() > 1 {
                let back: Vec<_> = path.iter().rev().skip(1).take(path.len() - 2).copied().collect();
                path.extend(back);
            }
            let tick = self.tick;
            let looping = self.looping;

            futures::stream::unfold(0usize, move |index| {
                let path = path.clone();
                async move {
                    if path.is_empty() || (!looping && index >= path.len()) {
                        return None;
                    }
                    tokio::time::sleep(tick).await;
                    let position = path[index % path.len()];
                    Some((GeolocationEvent::Fix(position), index + 1))
                }
            })
            .boxed()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        struct ScriptedSource(Vec<GeolocationEvent>);

        impl GeolocationSource for ScriptedSource {
            fn watch(&self, _options: &GeolocationOptions) -> BoxStream<'static, GeolocationEvent> {
                futures::stream::iter(self.0.clone()).boxed()
            }
        }

        struct SilentSource;

        impl GeolocationSource for SilentSource {
            fn watch(&self, _options: &GeolocationOptions) -> BoxStream<'static, GeolocationEvent> {
                futures::stream::pending().boxed()
            }
        }

        async fn wait_for(subscription: &GpsSubscription, count: usize) -> Vec<GeolocationEvent> {
            let mut events = Vec::new();
            for _ in 0..200 {
                events.extend(subscription.drain());
                if events.len() >= count {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            events
        }

        #[tokio::test]
        async fn test_subscription_forwards_events_in_order() {
            let source = ScriptedSource(vec![
                GeolocationEvent::Fix(GeoPosition::new(1.0, 2.0)),
                GeolocationEvent::Error("timeout".to_string()),
                GeolocationEvent::Fix(GeoPosition::new(1.5, 2.5)),
            ]);
            let subscription = GpsSubscription::start(&source, &GeolocationOptions::default());
            let events = wait_for(&subscription, 3).await;
            assert_eq!(events, source.0);
        }

        #[tokio::test]
        async fn test_unsubscribe_stops_delivery() {
            let mut subscription =
                GpsSubscription::start(&SilentSource, &GeolocationOptions::default());
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(subscription.is_active());

            subscription.unsubscribe();
            assert!(!subscription.is_active());
            assert!(subscription.try_next().is_none());
        }

        #[tokio::test]
        async fn test_simulated_walk_visits_every_step() {
            let walk = SimulatedWalk::new(
                vec![GeoPosition::new(0.0, 0.0), GeoPosition::new(1.0, 1.0)],
                Duration::from_millis(1),
            )
            .with_steps_per_leg(4);
            assert_eq!(walk.path().len(), 5);

            let subscription = GpsSubscription::start(&walk, &GeolocationOptions::default());
            let events = wait_for(&subscription, 5).await;
            assert_eq!(events.len(), 5);
            assert_eq!(events[4], GeolocationEvent::Fix(GeoPosition::new(1.0, 1.0)));
        }
    }
}
