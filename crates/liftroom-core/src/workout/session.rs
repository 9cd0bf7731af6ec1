use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ledger::{ExerciseLog, SetLedger};
use super::plan::{RestDefaults, WorkoutPlan};

/// One performance of a plan, in progress or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    #[serde(default)]
    pub plan_id: String,
    pub workout_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Active (unpaused) seconds, recorded on finish.
    #[serde(default)]
    pub active_secs: Option<u64>,
    pub ledger: SetLedger,
    pub completed: bool,
}

impl WorkoutSession {
    /// Copy the plan's exercises into a fresh session.
    pub fn from_plan(plan: &WorkoutPlan, defaults: &RestDefaults, now: DateTime<Utc>) -> Self {
        let exercises = plan
            .exercises
            .iter()
            .map(|t| ExerciseLog::from_template(t, defaults))
            .collect();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plan_id: plan.id.clone(),
            workout_name: plan.name.clone(),
            started_at: now,
            finished_at: None,
            active_secs: None,
            ledger: SetLedger::new(exercises, now),
            completed: false,
        }
    }

    pub fn exercises(&self) -> &[ExerciseLog] {
        self.ledger.exercises()
    }

    pub fn completion_pct(&self) -> u8 {
        self.ledger.completion_pct()
    }

    /// Exercise the user is working on: the first one with a pending set,
    /// or the last exercise once everything is done.
    pub fn current_exercise_index(&self) -> Option<usize> {
        self.ledger
            .first_incomplete()
            .map(|(ei, _)| ei)
            .or_else(|| self.exercises().len().checked_sub(1))
    }
}
