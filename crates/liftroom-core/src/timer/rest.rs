//! Rest countdown.
//!
//! A plain countdown with no policy of its own: the session controller
//! decides when to call [`RestTimer::begin`] and only calls
//! [`RestTimer::advance`] while the session is not paused.

use serde::{Deserialize, Serialize};

/// Observable rest state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestState {
    pub is_resting: bool,
    pub remaining_secs: u32,
    /// Exercise whose completion started this rest.
    pub exercise_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    state: RestState,
    /// Length of the current (or last) rest.
    #[serde(default)]
    duration_secs: u32,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RestState {
        self.state
    }

    pub fn is_resting(&self) -> bool {
        self.state.is_resting
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Start (or restart) a countdown. A zero duration does not rest.
    pub fn begin(&mut self, duration_secs: u32, exercise_index: usize) -> bool {
        self.duration_secs = duration_secs;
        if duration_secs == 0 {
            self.clear();
            return false;
        }
        self.state = RestState {
            is_resting: true,
            remaining_secs: duration_secs,
            exercise_index: Some(exercise_index),
        };
        true
    }

    /// One second passes. Returns `true` when the countdown ends on this tick.
    pub fn tick(&mut self) -> bool {
        self.advance(1)
    }

    /// Apply `secs` one-second ticks. Returns `true` when the countdown ends.
    pub fn advance(&mut self, secs: u64) -> bool {
        if !self.state.is_resting || secs == 0 {
            return false;
        }
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(secs);
        if self.state.remaining_secs == 0 {
            self.clear();
            return true;
        }
        false
    }

    /// Cancel the countdown. Returns `false` if there was nothing to skip.
    pub fn skip(&mut self) -> bool {
        if !self.state.is_resting {
            return false;
        }
        self.clear();
        true
    }

    fn clear(&mut self) {
        self.state = RestState::default();
    }
}
