//! Time sources injected into the session controller.
//!
//! The engine never reads the system clock on its own; every command takes
//! its notion of "now" from a [`TimeSource`]. Tests drive a
//! [`ManualTimeSource`], the async runner uses [`TokioTimeSource`] so that
//! paused tokio time also pauses the workout clocks.

use std::fmt::Debug;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

pub trait TimeSource: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time anchored once, then advanced by the tokio clock.
#[derive(Debug, Clone)]
pub struct TokioTimeSource {
    wall_anchor: DateTime<Utc>,
    instant_anchor: tokio::time::Instant,
}

impl TokioTimeSource {
    pub fn new() -> Self {
        Self {
            wall_anchor: Utc::now(),
            instant_anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.instant_anchor.elapsed();
        let elapsed = Duration::from_std(elapsed).unwrap_or_else(|_| Duration::zero());
        self.wall_anchor + elapsed
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
