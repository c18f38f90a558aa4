use std::time::Duration;

use chrono::NaiveDateTime;
use clap::Subcommand;
use recovery_core::{PlanManager, ReminderScheduler, TickOutcome};
use serde_json::json;

use super::{log_events, print_json, CommandResult, Session};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Arm (or re-arm) the daily reminder for a plan
    Arm {
        /// Plan ID
        plan_id: i64,
    },
    /// Stop reminders for a plan
    Disarm {
        /// Plan ID
        plan_id: i64,
    },
    /// Show every armed reminder and its phase
    Status,
    /// Run one scheduler tick and print the prompts due
    Tick,
    /// Tick every `reminder.tick_interval_secs` until interrupted
    Watch,
}

pub fn run(action: ReminderAction, now: NaiveDateTime) -> CommandResult {
    let session = Session::open()?;
    let mut scheduler = ReminderScheduler::new(&session.db);

    match action {
        ReminderAction::Arm { plan_id } => {
            let plan = PlanManager::new(&session.db).plan(plan_id, now.date())?;
            if !plan.is_active(now.date()) {
                return Err(format!("plan {plan_id} ended on {}", plan.end_date).into());
            }
            let state = scheduler.arm(&plan, &session.permission())?;
            log_events(scheduler.take_events());
            print_json(&state)
        }
        ReminderAction::Disarm { plan_id } => {
            scheduler.disarm(plan_id)?;
            log_events(scheduler.take_events());
            print_json(&json!({ "plan_id": plan_id, "armed": false }))
        }
        ReminderAction::Status => {
            let mut rows = Vec::new();
            for state in scheduler.armed()? {
                let phase = scheduler.phase(state.plan_id, now)?;
                rows.push(json!({ "reminder": state, "phase": phase }));
            }
            print_json(&rows)
        }
        ReminderAction::Tick => {
            let prompts = scheduler.tick_all(now)?;
            log_events(scheduler.take_events());
            print_json(&prompts)
        }
        ReminderAction::Watch => {
            let interval = Duration::from_secs(session.config.reminder.tick_interval_secs);
            tracing::info!(?interval, "watching reminders");
            loop {
                let now = chrono::Local::now().naive_local();
                match scheduler.tick_all(now) {
                    Ok(prompts) => {
                        for prompt in prompts {
                            if let TickOutcome::FirePrompt { plan_id, delivery } = prompt {
                                println!(
                                    "{}",
                                    json!({ "plan_id": plan_id, "delivery": delivery, "at": now })
                                );
                            }
                        }
                    }
                    Err(e) => tracing::warn!("reminder tick failed: {e}"),
                }
                log_events(scheduler.take_events());
                std::thread::sleep(interval);
            }
        }
    }
}
