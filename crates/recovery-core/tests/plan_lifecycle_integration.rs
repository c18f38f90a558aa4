//! Integration tests for the plan lifecycle.
//!
//! Drives start -> check-ins -> reminders -> completion -> final summary
//! through the SQLite store, the way the CLI does.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use recovery_core::{
    CoreError, Database, PermissionStatus, PlanManager, PlanStatus, ReminderPhase,
    ReminderScheduler, StaticPermission, SuggestionPolicy, TickOutcome,
};

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(n)
}

fn at(n: i64, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    day(n).and_hms_opt(hh, mm, ss).unwrap()
}

#[test]
fn test_summary_after_missed_day() {
    let db = Database::open_memory().unwrap();
    let mut manager = PlanManager::new(&db);

    let plan = manager.start_plan("local", "smoking", 5, "09:00", day(0)).unwrap();
    assert_eq!(plan.end_date, day(4));

    for n in 0..3 {
        manager.record_checkin(plan.id, day(n), true, None).unwrap();
    }

    let progress = manager.progress(plan.id, day(4)).unwrap();
    assert_eq!(progress.checkins.len(), 3);
    assert_eq!(progress.summary.total_days, 5);
    assert_eq!(progress.summary.completed_days, 3);
    assert_eq!(progress.summary.adherence, 60);
    assert_eq!(progress.summary.streak, 0);
}

#[test]
fn test_checkin_after_end_date_is_out_of_range() {
    let db = Database::open_memory().unwrap();
    let mut manager = PlanManager::new(&db);
    let plan = manager.start_plan("local", "smoking", 5, "09:00", day(0)).unwrap();

    match manager.record_checkin(plan.id, day(10), true, None) {
        Err(CoreError::OutOfRange { date, start, end }) => {
            assert_eq!(date, day(10));
            assert_eq!(start, day(0));
            assert_eq!(end, day(4));
        }
        other => panic!("expected OutOfRange, got {other:?}"),
    }
}

#[test]
fn test_repeated_checkin_keeps_latest_answer() {
    let db = Database::open_memory().unwrap();
    let mut manager = PlanManager::new(&db);
    let plan = manager.start_plan("local", "alcohol", 10, "20:00", day(0)).unwrap();

    manager.record_checkin(plan.id, day(1), false, Some("party")).unwrap();
    manager.record_checkin(plan.id, day(1), true, Some("skipped the drinks")).unwrap();

    let progress = manager.progress(plan.id, day(1)).unwrap();
    assert_eq!(progress.checkins.len(), 1);
    assert!(progress.checkins[0].followed_steps);
    assert_eq!(progress.checkins[0].notes.as_deref(), Some("skipped the drinks"));
}

#[test]
fn test_full_plan_lifecycle_with_reminders() {
    let db = Database::open_memory().unwrap();
    let mut manager = PlanManager::new(&db);
    let mut scheduler = ReminderScheduler::new(&db);

    let plan = manager.start_plan("local", "sugar", 3, "21:00", day(0)).unwrap();
    scheduler
        .arm(&plan, &StaticPermission(PermissionStatus::Granted))
        .unwrap();

    let mut prompts = 0;
    for n in 0..5 {
        // Tick every 20 seconds around the reminder minute.
        let mut now = at(n, 20, 59, 0);
        while now <= at(n, 21, 1, 0) {
            if let TickOutcome::FirePrompt { plan_id, .. } = scheduler.tick(plan.id, now).unwrap() {
                assert_eq!(plan_id, plan.id);
                prompts += 1;
                if n < 3 {
                    manager.record_checkin(plan.id, now.date(), n != 1, None).unwrap();
                }
            }
            now += Duration::seconds(20);
        }
    }

    // One prompt per plan day, none after the end date.
    assert_eq!(prompts, 3);
    assert_eq!(scheduler.phase(plan.id, at(4, 22, 0, 0)).unwrap(), ReminderPhase::Unarmed);
    assert!(scheduler.state(plan.id).unwrap().is_none());

    let current = manager.current_plan("local", Some("sugar"), day(3)).unwrap().unwrap();
    assert_eq!(current.status, PlanStatus::Completed);

    let summary = manager
        .final_summary(plan.id, day(3), &SuggestionPolicy::default())
        .unwrap();
    assert_eq!(summary.completed_days, 2);
    assert_eq!(summary.total_days, 3);
    assert_eq!(summary.success_rate, 67);
    assert_eq!(summary.longest_streak, 1);
    assert!(!summary.suggestions.is_empty());
}

#[test]
fn test_conflicting_plan_then_restart() {
    let db = Database::open_memory().unwrap();
    let mut manager = PlanManager::new(&db);

    let first = manager.start_plan("local", "caffeine", 14, "08:00", day(0)).unwrap();
    let err = manager
        .start_plan("local", "caffeine", 7, "08:00", day(5))
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { plan_id, .. } if plan_id == first.id));
    assert!(!err.is_retryable());

    let second = manager.start_plan("local", "caffeine", 7, "08:00", day(14)).unwrap();
    let plans = manager.plans("local", Some("caffeine"), day(14)).unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].id, second.id);
    assert_eq!(plans[1].status, PlanStatus::Completed);
}
