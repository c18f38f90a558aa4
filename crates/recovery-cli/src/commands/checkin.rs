use chrono::NaiveDateTime;
use clap::{ArgGroup, Args};
use recovery_core::PlanManager;
use serde_json::json;

use super::{log_events, print_json, CommandResult, Session};

#[derive(Args)]
#[command(group(ArgGroup::new("answer").required(true).args(["followed", "missed"])))]
pub struct CheckinArgs {
    /// Plan ID
    pub plan_id: i64,
    /// Today's steps were followed
    #[arg(long)]
    pub followed: bool,
    /// Today's steps were not followed
    #[arg(long)]
    pub missed: bool,
    /// Free-text note for the day
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run(args: CheckinArgs, now: NaiveDateTime) -> CommandResult {
    let session = Session::open()?;
    let today = now.date();
    let mut manager = PlanManager::new(&session.db);

    let checkin = manager.record_checkin(args.plan_id, today, args.followed, args.notes.as_deref())?;
    let progress = manager.progress(args.plan_id, today)?;
    log_events(manager.take_events());
    print_json(&json!({ "checkin": checkin, "summary": progress.summary }))
}
