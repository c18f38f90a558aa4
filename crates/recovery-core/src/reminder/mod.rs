//! Daily check-in reminder scheduler.
//!
//! The scheduler is a cooperative state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` at a fixed
//! cadence of at most 60 seconds.
//!
//! ## State Transitions
//!
//! ```text
//! Unarmed -> Armed -> Fired(day) -> Armed(next day) -> ... -> Expired
//! ```
//!
//! Each armed plan owns one [`ReminderState`] record in the key-value
//! store under `reminder/<plan_id>`. The persisted `last_fired_date`
//! guarantees at most one prompt per plan and calendar day, across
//! process restarts. Clearing the record (disarm or expiry) stops all
//! further prompts without the caller having to stop ticking.

mod permission;

pub use permission::{NotificationPermission, PermissionStatus, StaticPermission};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, ClockTime};
use crate::error::{Result, StoreError};
use crate::events::Event;
use crate::plan::Plan;
use crate::storage::KvStore;

const KEY_PREFIX: &str = "reminder/";

/// How a prompt reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderDelivery {
    /// System notification (permission granted)
    System,
    /// In-app prompt only (permission denied or not requested)
    InApp,
}

/// Persisted scheduling record for one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderState {
    pub plan_id: i64,
    pub daily_reminder_time: ClockTime,
    pub end_date: NaiveDate,
    /// Last day a prompt was surfaced
    pub last_fired_date: Option<NaiveDate>,
    pub delivery: ReminderDelivery,
}

/// Where a plan's reminder sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ReminderPhase {
    Unarmed,
    Armed,
    Fired { date: NaiveDate },
    Expired,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Surface a check-in prompt for this plan
    FirePrompt {
        plan_id: i64,
        delivery: ReminderDelivery,
    },
    NoOp,
}

fn state_key(plan_id: i64) -> String {
    format!("{KEY_PREFIX}{plan_id}")
}

/// Reminder scheduler over a key-value store.
pub struct ReminderScheduler<K> {
    kv: K,
    events: Vec<Event>,
}

impl<K: KvStore> ReminderScheduler<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            events: Vec::new(),
        }
    }

    /// Drain events queued since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn load(&self, plan_id: i64) -> Result<Option<ReminderState>> {
        let Some(json) = self.kv.kv_get(&state_key(plan_id))? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&json).map_err(|e| {
            tracing::warn!(plan_id, "unreadable reminder record: {e}");
            StoreError::Corrupt(format!("reminder for plan {plan_id}: {e}"))
        })?;
        Ok(Some(state))
    }

    fn save(&self, state: &ReminderState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv.kv_set(&state_key(state.plan_id), &json)?;
        Ok(())
    }

    /// Arm the daily reminder for `plan`.
    ///
    /// A denied permission is not an error: the reminder falls back to
    /// in-app prompts. Re-arming resets `last_fired_date`.
    pub fn arm(
        &mut self,
        plan: &Plan,
        permission: &dyn NotificationPermission,
    ) -> Result<ReminderState> {
        let delivery = match permission.request() {
            PermissionStatus::Granted => ReminderDelivery::System,
            PermissionStatus::Denied => {
                tracing::warn!(plan_id = plan.id, "notification permission denied, using in-app prompts");
                ReminderDelivery::InApp
            }
        };

        let state = ReminderState {
            plan_id: plan.id,
            daily_reminder_time: plan.daily_reminder_time,
            end_date: plan.end_date,
            last_fired_date: None,
            delivery,
        };
        self.save(&state)?;

        tracing::info!(
            plan_id = plan.id,
            at = %plan.daily_reminder_time,
            ?delivery,
            "reminder armed"
        );
        self.events.push(Event::ReminderArmed {
            plan_id: plan.id,
            daily_reminder_time: plan.daily_reminder_time,
            delivery,
            at: Utc::now(),
        });
        Ok(state)
    }

    /// Stop reminders for a plan. Disarming an unarmed plan is a no-op.
    pub fn disarm(&mut self, plan_id: i64) -> Result<()> {
        if self.load(plan_id)?.is_none() {
            return Ok(());
        }
        self.kv.kv_remove(&state_key(plan_id))?;
        tracing::info!(plan_id, "reminder disarmed");
        self.events.push(Event::ReminderDisarmed {
            plan_id,
            at: Utc::now(),
        });
        Ok(())
    }

    pub fn state(&self, plan_id: i64) -> Result<Option<ReminderState>> {
        self.load(plan_id)
    }

    /// All armed reminder records, by plan id.
    pub fn armed(&self) -> Result<Vec<ReminderState>> {
        let mut states = Vec::new();
        for plan_id in self.armed_plan_ids()? {
            if let Some(state) = self.load(plan_id)? {
                states.push(state);
            }
        }
        Ok(states)
    }

    fn armed_plan_ids(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .kv
            .kv_keys(KEY_PREFIX)?
            .iter()
            .filter_map(|key| key[KEY_PREFIX.len()..].parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Lifecycle phase of a plan's reminder at `now`.
    pub fn phase(&self, plan_id: i64, now: NaiveDateTime) -> Result<ReminderPhase> {
        let today = calendar::date_key(now);
        Ok(match self.load(plan_id)? {
            None => ReminderPhase::Unarmed,
            Some(state) if today > state.end_date => ReminderPhase::Expired,
            Some(ReminderState {
                last_fired_date: Some(date),
                ..
            }) if date == today => ReminderPhase::Fired { date },
            Some(_) => ReminderPhase::Armed,
        })
    }

    /// One scheduling step for a plan.
    ///
    /// Fires at most once per calendar day, on the first tick whose clock
    /// label equals the reminder time. Once `now` is past the plan's end
    /// date the record is cleared and every later tick is a no-op. If the
    /// `last_fired_date` write fails no prompt is returned, so the next tick
    /// inside the same minute retries.
    pub fn tick(&mut self, plan_id: i64, now: NaiveDateTime) -> Result<TickOutcome> {
        let Some(mut state) = self.load(plan_id)? else {
            return Ok(TickOutcome::NoOp);
        };
        let today = calendar::date_key(now);

        if today > state.end_date {
            self.kv.kv_remove(&state_key(plan_id))?;
            tracing::info!(plan_id, end_date = %state.end_date, "reminder expired");
            self.events.push(Event::ReminderExpired {
                plan_id,
                at: Utc::now(),
            });
            return Ok(TickOutcome::NoOp);
        }

        if state.daily_reminder_time.matches(now) && state.last_fired_date != Some(today) {
            state.last_fired_date = Some(today);
            self.save(&state)?;

            tracing::info!(plan_id, date = %today, "reminder fired");
            self.events.push(Event::ReminderFired {
                plan_id,
                delivery: state.delivery,
                at: Utc::now(),
            });
            return Ok(TickOutcome::FirePrompt {
                plan_id,
                delivery: state.delivery,
            });
        }

        tracing::trace!(plan_id, label = %calendar::clock_label(now), "reminder idle");
        Ok(TickOutcome::NoOp)
    }

    /// Tick every armed plan and return the prompts to surface.
    ///
    /// A plan whose tick fails is logged and skipped so the others still
    /// fire; it is retried on the next call.
    pub fn tick_all(&mut self, now: NaiveDateTime) -> Result<Vec<TickOutcome>> {
        let mut fired = Vec::new();
        for plan_id in self.armed_plan_ids()? {
            match self.tick(plan_id, now) {
                Ok(TickOutcome::NoOp) => {}
                Ok(outcome) => fired.push(outcome),
                Err(e) => tracing::warn!(plan_id, "reminder tick failed: {e}"),
            }
        }
        Ok(fired)
    }
}
