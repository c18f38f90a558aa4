//! Adherence analytics over a plan's check-in history.
//!
//! Everything here is a pure function of `(plan, check-ins, today)`:
//! nothing is cached or stored, so callers recompute on every read.
//!
//! - **Adherence**: followed days as a percentage of elapsed plan days
//! - **Streak**: consecutive followed days ending at the latest counted day;
//!   a day without a check-in breaks it
//! - **Final summary**: success rate over the whole plan, longest streak and
//!   rule-based coaching suggestions

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::plan::{CheckIn, Plan};

/// Progress of a plan as of some day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdherenceSummary {
    pub plan_id: i64,

    /// Plan days elapsed so far, capped at the plan length
    pub total_days: u32,

    /// Elapsed days with `followed_steps = true`
    pub completed_days: u32,

    /// round(100 * completed_days / total_days), 0 before the plan starts
    pub adherence: u32,

    /// Trailing run of consecutive followed days
    pub streak: u32,

    pub days_remaining: u32,

    pub checked_in_today: bool,
}

/// End-of-plan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan_id: i64,
    pub addiction_key: String,

    /// round(100 * completed_days / total_days)
    pub success_rate: u32,

    pub longest_streak: u32,
    pub completed_days: u32,

    /// Always the plan's `duration_days`
    pub total_days: u32,

    pub suggestions: Vec<String>,
}

/// Success-rate thresholds that pick coaching suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionPolicy {
    /// Below this rate suggest a shorter plan or professional support
    pub low_threshold: u32,
    /// At or above this rate suggest a maintenance phase
    pub high_threshold: u32,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            low_threshold: 50,
            high_threshold: 80,
        }
    }
}

/// Minimum run worth calling a routine.
const ROUTINE_STREAK: u32 = 3;

/// Follow state per day inside `[plan.start_date, last_day]`.
///
/// Check-ins for other plans or outside the window are ignored. If the
/// history holds several records for one day the last one wins.
fn days_in_window(plan: &Plan, checkins: &[CheckIn], last_day: NaiveDate) -> BTreeMap<NaiveDate, bool> {
    checkins
        .iter()
        .filter(|c| c.plan_id == plan.id)
        .filter(|c| plan.covers(c.checkin_date) && c.checkin_date <= last_day)
        .map(|c| (c.checkin_date, c.followed_steps))
        .collect()
}

/// round(100 * part / whole), halves rounded up.
fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    ((200 * part + whole) / (2 * whole)) as u32
}

/// Summarize progress as of `today`.
pub fn summarize(plan: &Plan, checkins: &[CheckIn], today: NaiveDate) -> AdherenceSummary {
    let last_counted = today.min(plan.end_date);
    let total_days = if last_counted < plan.start_date {
        0
    } else {
        (calendar::elapsed_days(plan.start_date, last_counted) + 1) as u32
    };

    let days = days_in_window(plan, checkins, last_counted);
    let completed_days = days.values().filter(|followed| **followed).count() as u32;

    let anchor = days
        .keys()
        .next_back()
        .copied()
        .map_or(last_counted, |last| last.max(last_counted));
    let streak = trailing_streak(&days, anchor, plan.start_date);

    AdherenceSummary {
        plan_id: plan.id,
        total_days,
        completed_days,
        adherence: percent(completed_days, total_days),
        streak,
        days_remaining: plan.days_remaining(today),
        checked_in_today: days.contains_key(&today),
    }
}

fn trailing_streak(days: &BTreeMap<NaiveDate, bool>, anchor: NaiveDate, first_day: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = anchor;
    while day >= first_day && days.get(&day) == Some(&true) {
        streak += 1;
        day = calendar::add_days(day, -1);
    }
    streak
}

/// Longest run of consecutive followed days anywhere in the history.
fn longest_streak(days: &BTreeMap<NaiveDate, bool>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for (&day, &followed) in days {
        if !followed {
            run = 0;
            previous = None;
            continue;
        }
        run = match previous {
            Some(prev) if calendar::elapsed_days(prev, day) == 1 => run + 1,
            _ => 1,
        };
        previous = Some(day);
        longest = longest.max(run);
    }
    longest
}

/// Final report for a finished plan.
pub fn finalize(plan: &Plan, checkins: &[CheckIn], policy: &SuggestionPolicy) -> PlanSummary {
    let days = days_in_window(plan, checkins, plan.end_date);
    let completed_days = days.values().filter(|followed| **followed).count() as u32;
    let total_days = plan.duration_days;
    let success_rate = percent(completed_days, total_days);
    let longest_streak = longest_streak(&days);

    PlanSummary {
        plan_id: plan.id,
        addiction_key: plan.addiction_key.clone(),
        success_rate,
        longest_streak,
        completed_days,
        total_days,
        suggestions: suggestions(policy, success_rate, longest_streak, total_days),
    }
}

fn suggestions(
    policy: &SuggestionPolicy,
    success_rate: u32,
    longest_streak: u32,
    total_days: u32,
) -> Vec<String> {
    let mut out = Vec::new();

    if success_rate < policy.low_threshold {
        let shorter = (total_days / 2).max(7).min(total_days.max(1));
        out.push(format!(
            "Try a shorter plan next time, around {shorter} days, to build momentum."
        ));
        out.push(
            "Consider reaching out to a healthcare professional or a support group for extra help."
                .to_string(),
        );
    } else if success_rate >= policy.high_threshold {
        out.push(
            "Great consistency. Extend into a maintenance phase with a lighter daily check-in."
                .to_string(),
        );
        out.push(
            "Keep the routines that worked and plan ahead for high-risk situations.".to_string(),
        );
    } else {
        out.push(
            "Good progress. Repeat the plan and focus on the days that were hardest to follow."
                .to_string(),
        );
    }

    if longest_streak < ROUTINE_STREAK.min(total_days) {
        out.push(
            "Aim for three followed days in a row by tying the new habit to an existing daily routine."
                .to_string(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ClockTime;
    use crate::plan::NewPlan;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn plan(start: NaiveDate, days: u32) -> Plan {
        NewPlan {
            user_id: "u".into(),
            addiction_key: "smoking".into(),
            start_date: start,
            duration_days: days,
            daily_reminder_time: ClockTime::parse("09:00").unwrap(),
        }
        .into_plan(7)
    }

    fn checkin(day: NaiveDate, followed: bool) -> CheckIn {
        CheckIn {
            id: 0,
            plan_id: 7,
            checkin_date: day,
            followed_steps: followed,
            notes: None,
        }
    }

    #[test]
    fn missing_day_breaks_streak() {
        let p = plan(d(1), 5);
        let history = vec![checkin(d(1), true), checkin(d(2), true), checkin(d(3), true)];

        let summary = summarize(&p, &history, d(5));

        assert_eq!(summary.total_days, 5);
        assert_eq!(summary.completed_days, 3);
        assert_eq!(summary.adherence, 60);
        assert_eq!(summary.streak, 0);
        assert!(!summary.checked_in_today);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let p = plan(d(1), 10);
        let history = vec![
            checkin(d(1), true),
            checkin(d(2), false),
            checkin(d(3), true),
            checkin(d(4), true),
        ];

        let summary = summarize(&p, &history, d(4));
        assert_eq!(summary.streak, 2);
        assert_eq!(summary.total_days, 4);
        assert_eq!(summary.adherence, 75);
        assert!(summary.checked_in_today);
        assert_eq!(summary.days_remaining, 6);
    }

    #[test]
    fn negative_latest_day_zeroes_streak() {
        let p = plan(d(1), 10);
        let history = vec![checkin(d(1), true), checkin(d(2), false)];
        assert_eq!(summarize(&p, &history, d(2)).streak, 0);
    }

    #[test]
    fn total_days_capped_at_end_date() {
        let p = plan(d(1), 3);
        let history = vec![checkin(d(1), true), checkin(d(2), true), checkin(d(3), true)];

        let summary = summarize(&p, &history, d(20));
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.adherence, 100);
        assert_eq!(summary.streak, 3);
        assert_eq!(summary.days_remaining, 0);
    }

    #[test]
    fn before_start_everything_is_zero() {
        let p = plan(d(10), 3);
        let summary = summarize(&p, &[], d(5));
        assert_eq!(summary.total_days, 0);
        assert_eq!(summary.adherence, 0);
        assert_eq!(summary.streak, 0);
        assert_eq!(summary.days_remaining, 3);
    }

    #[test]
    fn ignores_foreign_and_out_of_window_checkins() {
        let p = plan(d(5), 3);
        let mut foreign = checkin(d(5), true);
        foreign.plan_id = 99;
        let history = vec![foreign, checkin(d(4), true), checkin(d(9), true)];

        let summary = summarize(&p, &history, d(7));
        assert_eq!(summary.completed_days, 0);
        assert_eq!(summary.streak, 0);
    }

    #[test]
    fn adherence_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn summarize_is_deterministic() {
        let p = plan(d(1), 7);
        let history = vec![checkin(d(3), true), checkin(d(1), true), checkin(d(2), false)];
        assert_eq!(summarize(&p, &history, d(3)), summarize(&p, &history, d(3)));
    }

    #[test]
    fn longest_streak_scans_whole_history() {
        let p = plan(d(1), 10);
        let history = vec![
            checkin(d(1), true),
            checkin(d(2), true),
            checkin(d(3), true),
            checkin(d(4), true),
            checkin(d(5), false),
            checkin(d(6), true),
            checkin(d(8), true),
            checkin(d(9), true),
        ];

        let summary = finalize(&p, &history, &SuggestionPolicy::default());
        assert_eq!(summary.longest_streak, 4);
        assert_eq!(summary.completed_days, 7);
        assert_eq!(summary.total_days, 10);
        assert_eq!(summary.success_rate, 70);
        assert_eq!(summary.suggestions.len(), 1);
        assert!(summary.suggestions[0].starts_with("Good progress"));
    }

    #[test]
    fn low_success_suggests_shorter_plan_and_support() {
        let p = plan(d(1), 30);
        let history = vec![checkin(d(1), true), checkin(d(3), true)];

        let summary = finalize(&p, &history, &SuggestionPolicy::default());
        assert_eq!(summary.success_rate, 7);
        assert!(summary.suggestions[0].contains("shorter plan"));
        assert!(summary.suggestions[0].contains("15 days"));
        assert!(summary.suggestions[1].contains("professional"));
        assert!(summary.suggestions.last().unwrap().contains("three followed days"));
    }

    #[test]
    fn high_success_suggests_maintenance() {
        let p = plan(d(1), 5);
        let history: Vec<_> = (1..=5).map(|day| checkin(d(day), true)).collect();

        let summary = finalize(&p, &history, &SuggestionPolicy::default());
        assert_eq!(summary.success_rate, 100);
        assert_eq!(summary.longest_streak, 5);
        assert_eq!(summary.suggestions.len(), 2);
        assert!(summary.suggestions[0].contains("maintenance phase"));
    }

    #[test]
    fn thresholds_come_from_policy() {
        let p = plan(d(1), 10);
        let history: Vec<_> = (1..=6).map(|day| checkin(d(day), true)).collect();
        let strict = SuggestionPolicy {
            low_threshold: 70,
            high_threshold: 90,
        };

        let summary = finalize(&p, &history, &strict);
        assert_eq!(summary.success_rate, 60);
        assert!(summary.suggestions[0].contains("shorter plan"));
    }
}
