mod ledger;
mod parser;
mod plan;
mod reps;
mod session;

pub use ledger::{ExerciseLog, SetLedger, SetLog, SetToggle};
pub use parser::{parse_plan, PlanParser};
pub use plan::{ExerciseTemplate, RestDefaults, RestTrigger, WorkoutPlan, DEFAULT_REST_SECONDS};
pub use reps::RepsTarget;
pub use session::WorkoutSession;
