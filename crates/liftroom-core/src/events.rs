use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionPhase;
use crate::timer::RestState;
use crate::workout::WorkoutSession;

/// Every state change of the session controller produces an Event.
/// The CLI prints them; runner subscribers receive them over a broadcast
/// channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        workout_name: String,
        total_sets: usize,
        at: DateTime<Utc>,
    },
    SetToggled {
        exercise_index: usize,
        exercise_name: String,
        set_number: u32,
        completed: bool,
        duration_secs: Option<u64>,
        completion_pct: u8,
        /// Length of the rest this completion started, if any.
        rest_started_secs: Option<u32>,
        at: DateTime<Utc>,
    },
    RestEnded {
        exercise_index: Option<usize>,
        skipped: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        rest_remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        rest_remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionFinished {
        session_id: String,
        workout_name: String,
        completion_pct: u8,
        completed_sets: usize,
        total_sets: usize,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Roughly once per second while a session runs unpaused.
    Tick {
        elapsed_secs: u64,
        rest: RestState,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: SessionPhase,
        elapsed_secs: u64,
        rest: RestState,
        session: Option<Box<WorkoutSession>>,
        at: DateTime<Utc>,
    },
}
