//! Per-set completion ledger for one session.
//!
//! Holds the exercise/set tree copied out of a plan and the derived
//! completion percentage. Un-marking a set keeps its last completion
//! timestamp and duration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::{ExerciseTemplate, RestDefaults, RestTrigger};
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    /// 1-based, unique within its exercise.
    pub set_number: u32,
    pub target_reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds since the previous completion (or workout start).
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub name: String,
    #[serde(default)]
    pub muscle_group: String,
    pub rest_seconds: u32,
    pub rest_trigger: RestTrigger,
    pub sets: Vec<SetLog>,
}

impl ExerciseLog {
    /// One pending set per target set, pre-filled with the targets.
    pub fn from_template(template: &ExerciseTemplate, defaults: &RestDefaults) -> Self {
        let (rest_seconds, rest_trigger) = template.resolved_rest(defaults);
        let sets = (1..=template.target_sets)
            .map(|set_number| SetLog {
                set_number,
                target_reps: template.target_reps.clone(),
                target_weight: template.target_weight,
                completed: false,
                completed_at: None,
                duration_secs: None,
            })
            .collect();
        Self {
            name: template.name.clone(),
            muscle_group: template.muscle_group.clone(),
            rest_seconds,
            rest_trigger,
            sets,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    pub fn is_complete(&self) -> bool {
        self.sets.iter().all(|s| s.completed)
    }
}

/// Outcome of a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetToggle {
    pub exercise_index: usize,
    pub set_index: usize,
    pub set_number: u32,
    pub total_sets: u32,
    /// New value of the completed flag.
    pub completed: bool,
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLedger {
    exercises: Vec<ExerciseLog>,
    /// Instant of the latest false -> true transition, or workout start.
    last_completion_at: DateTime<Utc>,
    completion_pct: u8,
}

impl SetLedger {
    pub fn new(exercises: Vec<ExerciseLog>, started_at: DateTime<Utc>) -> Self {
        let mut ledger = Self {
            exercises,
            last_completion_at: started_at,
            completion_pct: 0,
        };
        ledger.recompute();
        ledger
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn exercises(&self) -> &[ExerciseLog] {
        &self.exercises
    }

    pub fn exercise(&self, index: usize) -> Option<&ExerciseLog> {
        self.exercises.get(index)
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(ExerciseLog::completed_count).sum()
    }

    /// `round(completed / total * 100)`; zero for an empty ledger.
    pub fn completion_pct(&self) -> u8 {
        self.completion_pct
    }

    /// First incomplete set, scanning exercises then sets in order.
    pub fn first_incomplete(&self) -> Option<(usize, usize)> {
        self.exercises.iter().enumerate().find_map(|(ei, exercise)| {
            exercise
                .sets
                .iter()
                .position(|s| !s.completed)
                .map(|si| (ei, si))
        })
    }

    /// Completed flags, one row per exercise.
    pub fn status_grid(&self) -> Vec<Vec<bool>> {
        self.exercises
            .iter()
            .map(|e| e.sets.iter().map(|s| s.completed).collect())
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Flip one set's completed flag.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSetReference`] for coordinates outside
    /// the ledger; the ledger is left untouched.
    pub fn toggle(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        now: DateTime<Utc>,
    ) -> Result<SetToggle, SessionError> {
        let invalid = SessionError::InvalidSetReference {
            exercise_index,
            set_index,
        };
        let exercise = self.exercises.get_mut(exercise_index).ok_or(invalid.clone())?;
        let total_sets = exercise.sets.len() as u32;
        let set = exercise.sets.get_mut(set_index).ok_or(invalid)?;

        set.completed = !set.completed;
        if set.completed {
            let duration = (now - self.last_completion_at).num_seconds().max(0) as u64;
            set.completed_at = Some(now);
            set.duration_secs = Some(duration);
            self.last_completion_at = now;
        }

        let toggle = SetToggle {
            exercise_index,
            set_index,
            set_number: set.set_number,
            total_sets,
            completed: set.completed,
            duration_secs: set.duration_secs,
        };
        self.recompute();
        Ok(toggle)
    }

    fn recompute(&mut self) {
        let total = self.total_sets();
        self.completion_pct = if total == 0 {
            0
        } else {
            (self.completed_sets() as f64 / total as f64 * 100.0).round() as u8
        };
    }
}
