use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use recovery_core::{
    Database, KvStore, NotificationPermission, Plan, PlanManager, ReminderScheduler,
};
use serde_json::json;

use super::{log_events, print_json, CommandResult, Session};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Start a plan for a behavior, beginning today
    Start {
        /// Behavior key from the catalog
        key: String,
        /// Plan length in days (default: catalog suggestion)
        #[arg(long)]
        days: Option<u32>,
        /// Daily reminder time, HH:MM (default: plans.default_reminder_time)
        #[arg(long)]
        at: Option<String>,
        /// Do not arm the daily reminder
        #[arg(long)]
        no_reminder: bool,
    },
    /// Show the most recent plan with today's progress
    Current {
        /// Restrict to one behavior
        key: Option<String>,
    },
    /// List all plans, newest first
    List {
        /// Restrict to one behavior
        key: Option<String>,
    },
    /// Check-in history and adherence for a plan
    Progress {
        /// Plan ID
        plan_id: i64,
    },
    /// Final summary of a completed plan
    Summary {
        /// Plan ID
        plan_id: i64,
    },
}

pub fn run(action: PlanAction, now: NaiveDateTime) -> CommandResult {
    let session = Session::open()?;
    let mut manager = PlanManager::new(&session.db).with_catalog(session.catalog.clone());
    let result = dispatch(action, &session, &mut manager, now.date());
    log_events(manager.take_events());
    result
}

/// Arm the reminder of a freshly started plan.
///
/// The plan is already stored at this point, so an arming failure is
/// reported next to it rather than failing the command; `reminder arm`
/// can retry later.
fn arm_after_start<K: KvStore>(
    scheduler: &mut ReminderScheduler<K>,
    plan: &Plan,
    permission: &dyn NotificationPermission,
) -> serde_json::Value {
    match scheduler.arm(plan, permission) {
        Ok(state) => json!({ "plan": plan, "reminder": state }),
        Err(e) => {
            tracing::warn!(plan_id = plan.id, "reminder not armed: {e}");
            json!({ "plan": plan, "reminder": null, "reminder_error": e.to_string() })
        }
    }
}

fn dispatch(
    action: PlanAction,
    session: &Session,
    manager: &mut PlanManager<&Database>,
    today: NaiveDate,
) -> CommandResult {
    let user = session.config.user.id.as_str();
    match action {
        PlanAction::Start {
            key,
            days,
            at,
            no_reminder,
        } => {
            let days = days
                .or_else(|| session.catalog.get(&key).map(|e| e.suggested_duration_days))
                .unwrap_or(session.config.plans.default_duration_days);
            let at = at.unwrap_or_else(|| session.config.default_reminder_time().to_string());

            let plan = manager.start_plan(user, &key, days, &at, today)?;
            if no_reminder {
                return print_json(&json!({ "plan": plan, "reminder": null }));
            }
            let mut scheduler = ReminderScheduler::new(&session.db);
            let report = arm_after_start(&mut scheduler, &plan, &session.permission());
            log_events(scheduler.take_events());
            print_json(&report)
        }
        PlanAction::Current { key } => {
            let Some(plan) = manager.current_plan(user, key.as_deref(), today)? else {
                return print_json(&serde_json::Value::Null);
            };
            let progress = manager.progress(plan.id, today)?;
            let summary = if plan.is_active(today) {
                None
            } else {
                Some(manager.final_summary(plan.id, today, &session.config.suggestion_policy())?)
            };
            print_json(&json!({
                "plan": plan,
                "progress": progress.summary,
                "final_summary": summary,
            }))
        }
        PlanAction::List { key } => {
            let plans = manager.plans(user, key.as_deref(), today)?;
            print_json(&plans)
        }
        PlanAction::Progress { plan_id } => {
            let progress = manager.progress(plan_id, today)?;
            print_json(&progress)
        }
        PlanAction::Summary { plan_id } => {
            let summary =
                manager.final_summary(plan_id, today, &session.config.suggestion_policy())?;
            print_json(&summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recovery_core::plan::NewPlan;
    use recovery_core::{ClockTime, PermissionStatus, StaticPermission, StoreError};

    struct ReadOnlyKv;

    impl KvStore for ReadOnlyKv {
        fn kv_get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn kv_set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Locked)
        }
        fn kv_remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Locked)
        }
        fn kv_keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn plan() -> Plan {
        NewPlan {
            user_id: "local".into(),
            addiction_key: "sugar".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            duration_days: 3,
            daily_reminder_time: ClockTime::parse("20:30").unwrap(),
        }
        .into_plan(7)
    }

    #[test]
    fn arm_failure_still_reports_the_plan() {
        let mut scheduler = ReminderScheduler::new(ReadOnlyKv);
        let report = arm_after_start(
            &mut scheduler,
            &plan(),
            &StaticPermission(PermissionStatus::Granted),
        );

        assert_eq!(report["plan"]["id"], 7);
        assert!(report["reminder"].is_null());
        assert!(report["reminder_error"]
            .as_str()
            .unwrap()
            .contains("locked"));
        assert!(scheduler.take_events().is_empty());
    }

    #[test]
    fn arm_success_includes_reminder_state() {
        let kv = recovery_core::MemoryStore::new();
        let mut scheduler = ReminderScheduler::new(&kv);
        let report = arm_after_start(
            &mut scheduler,
            &plan(),
            &StaticPermission(PermissionStatus::Denied),
        );

        assert_eq!(report["reminder"]["daily_reminder_time"], "20:30");
        assert_eq!(report["reminder"]["delivery"], "in_app");
        assert!(report.get("reminder_error").is_none());
    }
}
