use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;

use super::{print_json, CliResult};
use liftroom_core::{HistoryStats, WorkoutSession, WorkoutStore};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List finished sessions, newest first
    List {
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Totals across all finished sessions
    Stats,
}

#[derive(Serialize)]
struct SessionRow<'a> {
    id: &'a str,
    workout_name: &'a str,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    active_secs: Option<u64>,
    completed_sets: usize,
    total_sets: usize,
    completion_pct: u8,
}

impl<'a> From<&'a WorkoutSession> for SessionRow<'a> {
    fn from(s: &'a WorkoutSession) -> Self {
        Self {
            id: &s.id,
            workout_name: &s.workout_name,
            started_at: s.started_at,
            finished_at: s.finished_at,
            active_secs: s.active_secs,
            completed_sets: s.ledger.completed_sets(),
            total_sets: s.ledger.total_sets(),
            completion_pct: s.completion_pct(),
        }
    }
}

pub fn run(action: HistoryAction) -> CliResult {
    let store = WorkoutStore::open()?;
    let history = store.history()?;

    match action {
        HistoryAction::List { limit } => {
            let rows: Vec<SessionRow> = history
                .iter()
                .rev()
                .take(limit.unwrap_or(usize::MAX))
                .map(SessionRow::from)
                .collect();
            print_json(&rows)?;
        }
        HistoryAction::Stats => {
            print_json(&HistoryStats::from_history(&history, Utc::now()))?;
        }
    }
    Ok(())
}
