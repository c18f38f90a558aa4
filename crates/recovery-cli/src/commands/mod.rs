pub mod catalog;
pub mod checkin;
pub mod config;
pub mod plan;
pub mod reminder;

use recovery_core::{Catalog, Config, Database, Event, PermissionStatus, StaticPermission};
use serde::Serialize;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Forward engine events to the log as JSON lines.
pub fn log_events(events: Vec<Event>) {
    for event in events {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "recovery::events", "{json}"),
            Err(e) => tracing::warn!("unserializable event: {e}"),
        }
    }
}

/// Configuration, behavior catalog and the on-disk plan database.
pub struct Session {
    pub config: Config,
    pub catalog: Catalog,
    pub db: Database,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let catalog = Catalog::load()?;
        let db = Database::open()?;
        Ok(Self {
            config,
            catalog,
            db,
        })
    }

    /// The terminal cannot show a permission dialog, so the answer comes
    /// from `reminder.notifications`.
    pub fn permission(&self) -> StaticPermission {
        if self.config.reminder.notifications {
            StaticPermission(PermissionStatus::Granted)
        } else {
            StaticPermission(PermissionStatus::Denied)
        }
    }
}
