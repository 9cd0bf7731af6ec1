use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Everything the mirror surface shows about the running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub workout_name: String,
    /// Completed flags, one row per exercise.
    pub set_grid: Vec<Vec<bool>>,
    pub progress_pct: u8,
    pub elapsed_display: String,
    pub current_exercise: String,
    pub next_exercise: Option<String>,
    pub rest_display: String,
    pub is_resting: bool,
    pub is_paused: bool,
    pub updated_at: DateTime<Utc>,
}

/// Events the mirror surface can send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteEvent {
    /// Complete the first incomplete set.
    MarkNextSet,
    SkipRest,
}

impl RemoteEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteEvent::MarkNextSet => "MARK_NEXT_SET",
            RemoteEvent::SkipRest => "SKIP_REST",
        }
    }
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteEvent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"').to_ascii_uppercase().replace('-', "_").as_str() {
            "MARK_NEXT_SET" => Ok(RemoteEvent::MarkNextSet),
            "SKIP_REST" => Ok(RemoteEvent::SkipRest),
            other => Err(ValidationError::InvalidValue {
                field: "remote_event".into(),
                message: format!("unknown remote event '{other}'"),
            }),
        }
    }
}
