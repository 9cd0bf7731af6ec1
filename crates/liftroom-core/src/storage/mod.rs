mod config;
pub mod database;
pub mod workout_store;

pub use config::{Config, RestConfig, SyncConfig, TickerConfig};
pub use database::Database;
pub use workout_store::{WorkoutStore, ACTIVE_SESSION_KEY, HISTORY_KEY, PLANS_KEY};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `LIFTROOM_DATA_DIR` wins when set. Otherwise `~/.config/liftroom[-dev]/`
/// based on `LIFTROOM_ENV` (set `LIFTROOM_ENV=dev` for the development
/// directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LIFTROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LIFTROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("liftroom-dev")
            } else {
                base_dir.join("liftroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
