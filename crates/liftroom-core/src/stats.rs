//! Aggregates over finished workout sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workout::WorkoutSession;

/// Muscle group used for exercises imported without one.
pub const UNGROUPED: &str = "other";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub sets_completed: u64,
    pub sets_planned: u64,
    pub total_active_secs: u64,
    /// Mean of each session's completion percent, one decimal place.
    pub average_completion_pct: f64,
    pub today_sessions: u64,
    pub today_sets_completed: u64,
    /// Completed sets per muscle group.
    pub muscle_groups: BTreeMap<String, u64>,
}

impl HistoryStats {
    /// Summarize `history`. "Today" is the UTC calendar day of `now`.
    pub fn from_history(history: &[WorkoutSession], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut stats = Self::default();
        let mut pct_sum = 0u64;

        for session in history {
            let completed = session.ledger.completed_sets() as u64;
            stats.total_sessions += 1;
            stats.sets_completed += completed;
            stats.sets_planned += session.ledger.total_sets() as u64;
            stats.total_active_secs += session.active_secs.unwrap_or(0);
            pct_sum += u64::from(session.completion_pct());

            let day = session.finished_at.unwrap_or(session.started_at).date_naive();
            if day == today {
                stats.today_sessions += 1;
                stats.today_sets_completed += completed;
            }

            for exercise in session.exercises() {
                let done = exercise.completed_count() as u64;
                if done == 0 {
                    continue;
                }
                let group = match exercise.muscle_group.trim() {
                    "" => UNGROUPED.to_string(),
                    g => g.to_lowercase(),
                };
                *stats.muscle_groups.entry(group).or_insert(0) += done;
            }
        }

        if stats.total_sessions > 0 {
            let avg = pct_sum as f64 / stats.total_sessions as f64;
            stats.average_completion_pct = (avg * 10.0).round() / 10.0;
        }
        stats
    }
}
