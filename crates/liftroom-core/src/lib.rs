//! # Liftroom Core Library
//!
//! This library provides the core logic for timing a strength workout: an
//! elapsed clock for the whole session, a rest countdown between sets, and a
//! ledger of which sets are done. The `liftroom` CLI is a thin layer over the
//! same types.
//!
//! ## Architecture
//!
//! - **Timer**: Wall-clock-based clocks that require the caller to periodically
//!   invoke `tick()`; time is read through an injected [`TimeSource`]
//! - **Workout**: Plans, the per-session set ledger and the plan importer
//! - **Session**: The [`SessionController`] state machine and an async
//!   [`SessionRunner`] that owns it on a single tokio task
//! - **Sync**: Publish-and-forget mirroring to a lock-screen / widget surface
//! - **Storage**: SQLite key-value persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Session state machine
//! - [`SyncPublisher`]: Wraps a [`SyncBoundary`] and swallows its failures
//! - [`WorkoutStore`]: Plans, history and in-flight state
//! - [`Config`]: Application configuration management

pub mod timer;
pub mod workout;
pub mod session;
pub mod sync;
pub mod storage;
pub mod events;
pub mod stats;
pub mod error;

pub use timer::{ElapsedClock, ManualTimeSource, RestState, RestTimer, SystemTimeSource, TimeSource, TokioTimeSource};
pub use workout::{ExerciseTemplate, RestDefaults, RestTrigger, WorkoutPlan, WorkoutSession};
pub use session::{
    ControllerState, SessionController, SessionHandle, SessionPhase, SessionRunner, HISTORY_LIMIT,
};
pub use sync::{FileBoundary, NullBoundary, RemoteEvent, SyncBoundary, SyncPublisher, SyncSnapshot};
pub use storage::{Config, Database, WorkoutStore};
pub use events::Event;
pub use stats::HistoryStats;
pub use error::{CoreError, ConfigError, DatabaseError, ParseError, SessionError, SyncError, ValidationError};
