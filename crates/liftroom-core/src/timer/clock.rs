//! Pausable elapsed-time clock for a workout.
//!
//! Operates on wall-clock instants handed in by the caller. Pausing freezes
//! the reading without discarding what has accumulated so far.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElapsedClock {
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    paused_at: Option<DateTime<Utc>>,
    #[serde(default)]
    stopped_at: Option<DateTime<Utc>>,
    /// Total milliseconds spent paused, excluding an ongoing pause.
    #[serde(default)]
    paused_ms: i64,
}

impl ElapsedClock {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none() && self.stopped_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Whole seconds elapsed, excluding paused time.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let end = self.stopped_at.or(self.paused_at).unwrap_or(now);
        let ms = (end - start).num_milliseconds() - self.paused_ms;
        (ms.max(0) / 1000) as u64
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) {
        *self = Self {
            started_at: Some(now),
            ..Self::default()
        };
    }

    /// Returns `false` if the clock was not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Returns `false` if the clock was not paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        match self.paused_at.take() {
            Some(paused_at) => {
                self.paused_ms += (now - paused_at).num_milliseconds().max(0);
                true
            }
            None => false,
        }
    }

    /// Freeze the reading for good.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() || self.stopped_at.is_some() {
            return;
        }
        self.resume(now);
        self.stopped_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn idle_clock_reads_zero() {
        let clock = ElapsedClock::new();
        assert_eq!(clock.elapsed_seconds(t0()), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn truncates_to_whole_seconds() {
        let mut clock = ElapsedClock::new();
        clock.start(t0());
        assert_eq!(clock.elapsed_seconds(t0() + Duration::milliseconds(1999)), 1);
    }

    #[test]
    fn pause_excludes_paused_time() {
        let mut clock = ElapsedClock::new();
        clock.start(t0());
        assert!(clock.pause(t0() + Duration::seconds(10)));
        assert_eq!(clock.elapsed_seconds(t0() + Duration::seconds(70)), 10);
        assert!(clock.resume(t0() + Duration::seconds(70)));
        assert_eq!(clock.elapsed_seconds(t0() + Duration::seconds(75)), 15);
    }

    #[test]
    fn double_pause_and_stray_resume_are_rejected() {
        let mut clock = ElapsedClock::new();
        assert!(!clock.pause(t0()));
        clock.start(t0());
        assert!(!clock.resume(t0()));
        assert!(clock.pause(t0()));
        assert!(!clock.pause(t0()));
    }

    #[test]
    fn stop_freezes_reading_even_while_paused() {
        let mut clock = ElapsedClock::new();
        clock.start(t0());
        clock.pause(t0() + Duration::seconds(20));
        clock.stop(t0() + Duration::seconds(50));
        assert!(clock.is_stopped());
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_seconds(t0() + Duration::seconds(500)), 20);
    }
}
