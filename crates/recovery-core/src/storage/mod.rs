mod config;
pub mod database;
mod memory;
pub mod migrations;
mod store;

pub use config::{AnalyticsConfig, Config, PlansConfig, ReminderConfig, UserConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use store::{KvStore, PlanStore};

use std::path::PathBuf;

/// Returns the data directory, `~/.config/recovery[-dev]/` by default.
///
/// `RECOVERY_DATA_DIR` overrides the location outright. Otherwise set
/// `RECOVERY_ENV=dev` to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("RECOVERY_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("RECOVERY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("recovery-dev")
            } else {
                base_dir.join("recovery")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
