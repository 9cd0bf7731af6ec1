mod controller;
mod runner;

pub use controller::{ControllerState, SessionController, SessionPhase, HISTORY_LIMIT};
pub use runner::{SessionHandle, SessionRunner};
