//! Narration gating
//!
//! Tracks the last play of each POI and decides whether narration may start.
//! A POI is either never played or cooling down; once the cooldown has
//! elapsed it is eligible again. The cooldown is checked lazily against the
//! clock whenever [`NarrationEngine::can_play`] is asked, nothing is scheduled.

use crate::{
    core::constants::DEFAULT_COOLDOWN_MINUTES,
    engine::clock::{Clock, SystemClock},
    prelude::HashMap,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Last play of a POI. One entry per POI; a new play overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationLogEntry {
    pub poi_id: i64,
    pub audio_id: i64,
    pub played_at_epoch_millis: i64,
}

pub struct NarrationEngine {
    logs: HashMap<i64, NarrationLogEntry>,
    cooldown_millis: i64,
    clock: Arc<dyn Clock>,
}

impl NarrationEngine {
    /// Engine on the system clock with the default five minute cooldown
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_COOLDOWN_MINUTES)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, cooldown_minutes: f64) -> Self {
        Self {
            logs: HashMap::default(),
            cooldown_millis: minutes_to_millis(cooldown_minutes),
            clock,
        }
    }

    /// Whether narration for `poi_id` may start now.
    ///
    /// Always `false` while something else is playing.
    pub fn can_play(&self, poi_id: i64, is_currently_playing: bool) -> bool {
        if is_currently_playing {
            return false;
        }

        match self.logs.get(&poi_id) {
            None => true,
            Some(entry) => {
                let elapsed = self
                    .clock
                    .now_millis()
                    .saturating_sub(entry.played_at_epoch_millis);
                elapsed >= self.cooldown_millis
            }
        }
    }

    /// Records a play of `poi_id` at the current time, replacing any earlier
    /// entry. Call before starting playback.
    pub fn log_play(&mut self, poi_id: i64, audio_id: i64) -> NarrationLogEntry {
        let entry = NarrationLogEntry {
            poi_id,
            audio_id,
            played_at_epoch_millis: self.clock.now_millis(),
        };
        self.logs.insert(poi_id, entry);
        entry
    }

    /// Changes the cooldown for every later `can_play`. Negative or
    /// non-finite values mean no cooldown.
    pub fn set_cooldown_minutes(&mut self, minutes: f64) {
        self.cooldown_millis = minutes_to_millis(minutes);
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_millis as u64)
    }

    /// Time left before `poi_id` may replay; `None` if it is eligible now
    pub fn remaining_cooldown(&self, poi_id: i64) -> Option<Duration> {
        let entry = self.logs.get(&poi_id)?;
        let elapsed = self
            .clock
            .now_millis()
            .saturating_sub(entry.played_at_epoch_millis)
            .max(0);
        let remaining = self.cooldown_millis.saturating_sub(elapsed);
        (remaining > 0).then(|| Duration::from_millis(remaining as u64))
    }

    pub fn log_for(&self, poi_id: i64) -> Option<&NarrationLogEntry> {
        self.logs.get(&poi_id)
    }

    /// All entries, most recent first
    pub fn logs(&self) -> Vec<NarrationLogEntry> {
        let mut entries: Vec<_> = self.logs.values().copied().collect();
        entries.sort_by(|a, b| {
            b.played_at_epoch_millis
                .cmp(&a.played_at_epoch_millis)
                .then_with(|| a.poi_id.cmp(&b.poi_id))
        });
        entries
    }

    pub fn clear_log(&mut self, poi_id: i64) {
        self.logs.remove(&poi_id);
    }

    pub fn clear_all_logs(&mut self) {
        self.logs.clear();
    }

    /// Drops entries whose cooldown ended more than `grace` ago. Such entries
    /// no longer affect `can_play`; evicting them bounds the map over very
    /// long sessions. Returns the number removed.
    pub fn evict_expired(&mut self, grace: Duration) -> usize {
        let now = self.clock.now_millis();
        let grace = i64::try_from(grace.as_millis()).unwrap_or(i64::MAX);
        let horizon = self.cooldown_millis.saturating_add(grace);
        let before = self.logs.len();
        self.logs
            .retain(|_, entry| now.saturating_sub(entry.played_at_epoch_millis) < horizon);
        let removed = before - self.logs.len();
        if removed > 0 {
            log::debug!("evicted {} expired narration log entries", removed);
        }
        removed
    }
}

impl Default for NarrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NarrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationEngine")
            .field("logs", &self.logs)
            .field("cooldown_millis", &self.cooldown_millis)
            .finish()
    }
}

fn minutes_to_millis(minutes: f64) -> i64 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 0;
    }
    (minutes * 60_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;

    fn engine() -> (NarrationEngine, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let engine = NarrationEngine::with_clock(Arc::new(clock.clone()), 5.0);
        (engine, clock)
    }

    #[test]
    fn test_fresh_poi_can_play() {
        let (engine, _) = engine();
        assert!(engine.can_play(1, false));
        assert!(engine.log_for(1).is_none());
    }

    #[test]
    fn test_cooldown_gating() {
        let (mut engine, clock) = engine();
        engine.log_play(1, 99);
        assert!(!engine.can_play(1, false));

        clock.advance(Duration::from_millis(5 * 60_000 - 1));
        assert!(!engine.can_play(1, false));

        clock.advance(Duration::from_millis(1));
        assert!(engine.can_play(1, false));
    }

    #[test]
    fn test_playing_blocks_everything() {
        let (mut engine, clock) = engine();
        assert!(!engine.can_play(1, true));
        engine.log_play(2, 2);
        clock.advance(Duration::from_secs(3600));
        assert!(!engine.can_play(2, true));
    }

    #[test]
    fn test_log_is_per_poi_and_overwrites() {
        let (mut engine, clock) = engine();
        engine.log_play(1, 10);
        assert!(engine.can_play(2, false));

        clock.advance(Duration::from_secs(60));
        let entry = engine.log_play(1, 11);
        assert_eq!(engine.log_for(1), Some(&entry));
        assert_eq!(engine.logs().len(), 1);
        assert_eq!(engine.log_for(1).unwrap().audio_id, 11);
    }

    #[test]
    fn test_cooldown_change_applies_to_existing_entries() {
        let (mut engine, clock) = engine();
        engine.log_play(1, 1);
        clock.advance(Duration::from_secs(90));
        assert!(!engine.can_play(1, false));

        engine.set_cooldown_minutes(1.0);
        assert!(engine.can_play(1, false));
        assert_eq!(engine.cooldown(), Duration::from_secs(60));
    }

    #[test]
    fn test_negative_cooldown_means_no_cooldown() {
        let (mut engine, _) = engine();
        engine.set_cooldown_minutes(-2.0);
        engine.log_play(1, 1);
        assert!(engine.can_play(1, false));

        engine.set_cooldown_minutes(f64::NAN);
        assert_eq!(engine.cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_remaining_cooldown() {
        let (mut engine, clock) = engine();
        assert_eq!(engine.remaining_cooldown(1), None);
        engine.log_play(1, 1);
        clock.advance(Duration::from_secs(60));
        assert_eq!(engine.remaining_cooldown(1), Some(Duration::from_secs(240)));
        clock.advance(Duration::from_secs(240));
        assert_eq!(engine.remaining_cooldown(1), None);
    }

    #[test]
    fn test_clear_logs() {
        let (mut engine, _) = engine();
        engine.log_play(1, 1);
        engine.log_play(2, 2);
        engine.clear_log(1);
        assert!(engine.can_play(1, false));
        assert!(!engine.can_play(2, false));
        engine.clear_all_logs();
        assert!(engine.can_play(2, false));
        assert!(engine.logs().is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let (mut engine, clock) = engine();
        engine.log_play(1, 1);
        clock.advance(Duration::from_secs(4 * 60));
        engine.log_play(2, 2);
        clock.advance(Duration::from_secs(2 * 60));

        // POI 1 cooled down a minute ago, POI 2 is still cooling
        assert_eq!(engine.evict_expired(Duration::from_secs(120)), 0);
        assert_eq!(engine.evict_expired(Duration::from_secs(30)), 1);
        assert!(engine.log_for(1).is_none());
        assert!(engine.log_for(2).is_some());
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        let clock = ManualClock::new(1_000);
        let mut engine = NarrationEngine::with_clock(Arc::new(clock.clone()), f64::MAX);
        engine.log_play(1, 1);
        clock.advance(Duration::from_secs(365 * 24 * 3600));

        assert_eq!(engine.evict_expired(Duration::from_secs(1)), 0);
        assert_eq!(engine.evict_expired(Duration::MAX), 0);
        assert!(engine.log_for(1).is_some());
        assert!(!engine.can_play(1, false));
        assert!(engine.remaining_cooldown(1).is_some());
    }

    #[test]
    fn test_extreme_clock_values_do_not_overflow() {
        let (mut engine, clock) = engine();
        clock.set(i64::MAX);
        engine.log_play(1, 1);
        clock.set(i64::MIN);

        assert!(!engine.can_play(1, false));
        assert_eq!(engine.remaining_cooldown(1), Some(Duration::from_secs(5 * 60)));
        assert_eq!(engine.evict_expired(Duration::ZERO), 0);
    }

    #[test]
    fn test_logs_most_recent_first() {
        let (mut engine, clock) = engine();
        engine.log_play(1, 1);
        clock.advance(Duration::from_secs(1));
        engine.log_play(2, 2);
        let ids: Vec<_> = engine.logs().iter().map(|e| e.poi_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
