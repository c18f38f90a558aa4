use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, ClockTime};

/// Lifecycle status of a plan.
///
/// Derived from the calendar: a plan is `Active` while `today <= end_date`.
/// The stored value is only a cache written back on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Completed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PlanStatus::Active),
            "completed" => Some(PlanStatus::Completed),
            _ => None,
        }
    }
}

/// A time-boxed behavior-change commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Assigned by the store
    pub id: i64,

    pub user_id: String,

    /// Catalog key of the targeted behavior
    pub addiction_key: String,

    /// First day of the plan (inclusive)
    pub start_date: NaiveDate,

    /// Plan length in days (>= 1)
    pub duration_days: u32,

    /// Last day of the plan (inclusive)
    pub end_date: NaiveDate,

    pub daily_reminder_time: ClockTime,

    pub status: PlanStatus,
}

impl Plan {
    /// Whether the plan still accepts check-ins on `today`.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        today <= self.end_date
    }

    pub fn status_on(&self, today: NaiveDate) -> PlanStatus {
        if self.is_active(today) {
            PlanStatus::Active
        } else {
            PlanStatus::Completed
        }
    }

    /// Whether `date` falls inside `[start_date, end_date]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Days left after `today`, capped at the plan length.
    pub fn days_remaining(&self, today: NaiveDate) -> u32 {
        let from = today.max(calendar::add_days(self.start_date, -1));
        calendar::elapsed_days(from, self.end_date).clamp(0, i64::from(self.duration_days)) as u32
    }
}

/// Fields needed to create a plan; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlan {
    pub user_id: String,
    pub addiction_key: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    pub daily_reminder_time: ClockTime,
}

impl NewPlan {
    /// Inclusive last day, clamped to `[start_date, NaiveDate::MAX]`.
    ///
    /// [`PlanManager::start_plan`](super::PlanManager::start_plan) rejects
    /// durations outside that range before a plan reaches the store.
    pub fn end_date(&self) -> NaiveDate {
        if self.duration_days == 0 {
            return self.start_date;
        }
        calendar::end_date_for(self.start_date, self.duration_days).unwrap_or(NaiveDate::MAX)
    }

    /// Materialize with a store-assigned id.
    pub fn into_plan(self, id: i64) -> Plan {
        let end_date = self.end_date();
        Plan {
            id,
            user_id: self.user_id,
            addiction_key: self.addiction_key,
            start_date: self.start_date,
            duration_days: self.duration_days,
            end_date,
            daily_reminder_time: self.daily_reminder_time,
            status: PlanStatus::Active,
        }
    }
}

/// One day's self-reported adherence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub plan_id: i64,
    pub checkin_date: NaiveDate,
    pub followed_steps: bool,
    #[serde(default)]
    pub notes: Option<String>,
}
