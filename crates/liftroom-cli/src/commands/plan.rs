use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

use super::{print_json, CliResult};
use liftroom_core::workout::parse_plan;
use liftroom_core::{WorkoutPlan, WorkoutStore};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Import a plan from a text or CSV/TSV file
    Import {
        /// File to read
        file: PathBuf,
        /// Plan name (overrides any title in the file)
        #[arg(long)]
        name: Option<String>,
    },
    /// List saved plans
    List,
    /// Show a plan as JSON
    Show {
        /// Plan ID or name
        plan: String,
    },
    /// Delete a plan
    Remove {
        /// Plan ID or name
        plan: String,
    },
}

#[derive(Serialize)]
struct PlanRow<'a> {
    id: &'a str,
    name: &'a str,
    exercises: usize,
    total_sets: u32,
}

impl<'a> From<&'a WorkoutPlan> for PlanRow<'a> {
    fn from(plan: &'a WorkoutPlan) -> Self {
        Self {
            id: &plan.id,
            name: &plan.name,
            exercises: plan.exercises.len(),
            total_sets: plan.total_sets(),
        }
    }
}

pub fn run(action: PlanAction) -> CliResult {
    let store = WorkoutStore::open()?;

    match action {
        PlanAction::Import { file, name } => {
            let input = std::fs::read_to_string(&file)?;
            let plan = parse_plan(&input, name.as_deref())?;
            store.add_plan(plan.clone())?;
            tracing::info!(plan = %plan.name, exercises = plan.exercises.len(), "plan imported");
            print_json(&plan)?;
        }
        PlanAction::List => {
            let plans = store.plans()?;
            let rows: Vec<PlanRow> = plans.iter().map(PlanRow::from).collect();
            print_json(&rows)?;
        }
        PlanAction::Show { plan } => {
            print_json(&store.find_plan(&plan)?)?;
        }
        PlanAction::Remove { plan } => {
            let removed = store.remove_plan(&plan)?;
            print_json(&PlanRow::from(&removed))?;
        }
    }
    Ok(())
}
