//! User-authored workout plans.
//!
//! A plan is a template only. Sessions copy everything they need out of it
//! when they start, so editing a plan never touches a session in progress.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_REST_SECONDS: u32 = 90;

/// When a completed set starts a rest countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestTrigger {
    /// After every set, including the exercise's last.
    #[default]
    AfterSet,
    /// Only after the exercise's last set.
    AfterExercise,
}

impl RestTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestTrigger::AfterSet => "after_set",
            RestTrigger::AfterExercise => "after_exercise",
        }
    }

    /// Whether completing `set_number` of `total_sets` should start a rest.
    pub fn fires(&self, set_number: u32, total_sets: u32) -> bool {
        match self {
            RestTrigger::AfterSet => true,
            RestTrigger::AfterExercise => set_number == total_sets,
        }
    }
}

impl fmt::Display for RestTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestTrigger {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "after_set" | "set" | "each_set" => Ok(RestTrigger::AfterSet),
            "after_exercise" | "exercise" | "last_set" => Ok(RestTrigger::AfterExercise),
            _ => Err(ValidationError::InvalidValue {
                field: "rest_trigger".into(),
                message: format!("expected after_set or after_exercise, got '{s}'"),
            }),
        }
    }
}

/// Rest settings applied when an exercise carries none of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDefaults {
    pub seconds: u32,
    pub trigger: RestTrigger,
}

impl Default for RestDefaults {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_REST_SECONDS,
            trigger: RestTrigger::AfterSet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub name: String,
    pub target_sets: u32,
    /// Free-form descriptor such as "10", "8-12" or "AMRAP".
    pub target_reps: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_trigger: Option<RestTrigger>,
}

impl ExerciseTemplate {
    pub fn new(name: &str, target_sets: u32, target_reps: &str) -> Self {
        Self {
            name: name.to_string(),
            target_sets,
            target_reps: target_reps.to_string(),
            muscle_group: String::new(),
            target_weight: None,
            rest_seconds: None,
            rest_trigger: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.target_weight = Some(weight);
        self
    }

    pub fn with_muscle_group(mut self, group: &str) -> Self {
        self.muscle_group = group.to_string();
        self
    }

    pub fn with_rest(mut self, seconds: u32, trigger: RestTrigger) -> Self {
        self.rest_seconds = Some(seconds);
        self.rest_trigger = Some(trigger);
        self
    }

    /// Rest seconds and trigger, falling back to `defaults` per field.
    pub fn resolved_rest(&self, defaults: &RestDefaults) -> (u32, RestTrigger) {
        (
            self.rest_seconds.unwrap_or(defaults.seconds),
            self.rest_trigger.unwrap_or(defaults.trigger),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    pub exercises: Vec<ExerciseTemplate>,
    pub created_at: DateTime<Utc>,
}

impl WorkoutPlan {
    pub fn new(name: &str, exercises: Vec<ExerciseTemplate>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            exercises,
            created_at: Utc::now(),
        }
    }

    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.target_sets).sum()
    }

    /// # Errors
    /// Returns an error for an unnamed plan, a plan without exercises, or an
    /// exercise without a name or without sets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "plan name is empty".into(),
            });
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "plan '{}' has no exercises",
                self.name
            )));
        }
        for (i, exercise) in self.exercises.iter().enumerate() {
            if exercise.name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("exercises[{i}].name"),
                    message: "exercise name is empty".into(),
                });
            }
            if exercise.target_sets == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("exercises[{i}].target_sets"),
                    message: format!("'{}' needs at least one set", exercise.name),
                });
            }
        }
        Ok(())
    }
}
