//! # Recovery Core Library
//!
//! This library provides the business logic behind recovery plans: time-boxed
//! behavior-change commitments with one check-in per day, adherence
//! analytics and a self-expiring daily reminder. All operations are
//! available via the standalone CLI binary; any UI is a thin layer over the
//! same library.
//!
//! ## Architecture
//!
//! - **Plan Manager**: creates plans, derives their status from the
//!   calendar and records daily check-ins
//! - **Analytics**: pure functions computing adherence, streaks and the
//!   end-of-plan summary from check-in history
//! - **Reminder Scheduler**: a cooperative state machine that requires the
//!   caller to periodically invoke `tick()`
//! - **Storage**: `PlanStore`/`KvStore` interfaces with SQLite and in-memory
//!   implementations, plus TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PlanManager`]: plan lifecycle and check-in recorder
//! - [`ReminderScheduler`]: daily reminder state machine
//! - [`Database`]: plan, check-in and reminder persistence
//! - [`Config`]: application configuration management

pub mod analytics;
pub mod calendar;
pub mod catalog;
pub mod error;
pub mod events;
pub mod plan;
pub mod reminder;
pub mod storage;

pub use analytics::{finalize, summarize, AdherenceSummary, PlanSummary, SuggestionPolicy};
pub use calendar::ClockTime;
pub use catalog::{BehaviorCatalogEntry, Catalog};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use plan::{is_active, CheckIn, Plan, PlanManager, PlanStatus, Progress};
pub use reminder::{
    NotificationPermission, PermissionStatus, ReminderDelivery, ReminderPhase, ReminderScheduler,
    ReminderState, StaticPermission, TickOutcome,
};
pub use storage::{Config, Database, KvStore, MemoryStore, PlanStore};
