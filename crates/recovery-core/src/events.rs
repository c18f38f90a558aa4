use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::ClockTime;
use crate::reminder::ReminderDelivery;

/// Every state change in the engine produces an Event.
/// Hosts log them or forward them to their UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PlanStarted {
        plan_id: i64,
        addiction_key: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        at: DateTime<Utc>,
    },
    /// Plan passed its end date and was marked completed.
    PlanCompleted {
        plan_id: i64,
        end_date: NaiveDate,
        at: DateTime<Utc>,
    },
    CheckinRecorded {
        plan_id: i64,
        checkin_date: NaiveDate,
        followed_steps: bool,
        at: DateTime<Utc>,
    },
    ReminderArmed {
        plan_id: i64,
        daily_reminder_time: ClockTime,
        delivery: ReminderDelivery,
        at: DateTime<Utc>,
    },
    /// A check-in prompt should be surfaced.
    ReminderFired {
        plan_id: i64,
        delivery: ReminderDelivery,
        at: DateTime<Utc>,
    },
    ReminderExpired {
        plan_id: i64,
        at: DateTime<Utc>,
    },
    ReminderDisarmed {
        plan_id: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn plan_id(&self) -> i64 {
        match self {
            Event::PlanStarted { plan_id, .. }
            | Event::PlanCompleted { plan_id, .. }
            | Event::CheckinRecorded { plan_id, .. }
            | Event::ReminderArmed { plan_id, .. }
            | Event::ReminderFired { plan_id, .. }
            | Event::ReminderExpired { plan_id, .. }
            | Event::ReminderDisarmed { plan_id, .. } => *plan_id,
        }
    }
}
