//! Plans, finished sessions and the in-flight controller state, stored as
//! JSON blobs in the kv table.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::Database;
use crate::error::{CoreError, DatabaseError, SessionError};
use crate::session::ControllerState;
use crate::workout::{WorkoutPlan, WorkoutSession};

pub const PLANS_KEY: &str = "workout_plans";
pub const HISTORY_KEY: &str = "workout_history";
pub const ACTIVE_SESSION_KEY: &str = "active_session";

pub struct WorkoutStore {
    db: Database,
}

impl WorkoutStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::new(Database::open()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, CoreError> {
        match self.db.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                DatabaseError::CorruptValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => Ok(T::default()),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let raw = serde_json::to_string(value)?;
        self.db.kv_set(key, &raw)?;
        debug!(key, bytes = raw.len(), "stored");
        Ok(())
    }

    // ── Plans ────────────────────────────────────────────────────────

    pub fn plans(&self) -> Result<Vec<WorkoutPlan>, CoreError> {
        self.read(PLANS_KEY)
    }

    pub fn save_plans(&self, plans: &[WorkoutPlan]) -> Result<(), CoreError> {
        self.write(PLANS_KEY, plans)
    }

    /// Validate and append a plan. A plan with the same id is replaced.
    pub fn add_plan(&self, plan: WorkoutPlan) -> Result<(), CoreError> {
        plan.validate()?;
        let mut plans = self.plans()?;
        plans.retain(|p| p.id != plan.id);
        plans.push(plan);
        self.save_plans(&plans)
    }

    /// Find a plan by exact id, then by case-insensitive name.
    pub fn find_plan(&self, id_or_name: &str) -> Result<WorkoutPlan, CoreError> {
        let plans = self.plans()?;
        plans
            .iter()
            .find(|p| p.id.to_string() == id_or_name)
            .or_else(|| plans.iter().find(|p| p.name.eq_ignore_ascii_case(id_or_name)))
            .cloned()
            .ok_or_else(|| SessionError::PlanNotFound(id_or_name.to_string()).into())
    }

    /// Remove a plan by id or name. Finished sessions keep their copy.
    pub fn remove_plan(&self, id_or_name: &str) -> Result<WorkoutPlan, CoreError> {
        let plan = self.find_plan(id_or_name)?;
        let mut plans = self.plans()?;
        plans.retain(|p| p.id != plan.id);
        self.save_plans(&plans)?;
        Ok(plan)
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn history(&self) -> Result<Vec<WorkoutSession>, CoreError> {
        self.read(HISTORY_KEY)
    }

    pub fn append_history(&self, finished: &[WorkoutSession]) -> Result<(), CoreError> {
        if finished.is_empty() {
            return Ok(());
        }
        let mut history = self.history()?;
        history.extend_from_slice(finished);
        self.write(HISTORY_KEY, &history)
    }

    // ── Active session ───────────────────────────────────────────────

    pub fn load_active(&self) -> Result<ControllerState, CoreError> {
        self.read(ACTIVE_SESSION_KEY)
    }

    /// Persist the controller state, dropping the key once nothing is running.
    pub fn save_active(&self, state: &ControllerState) -> Result<(), CoreError> {
        if state.is_active() {
            self.write(ACTIVE_SESSION_KEY, state)
        } else {
            self.db.kv_delete(ACTIVE_SESSION_KEY)?;
            Ok(())
        }
    }
}
