//! Daily check-ins and the progress views built on them.
//!
//! A check-in is keyed by `(plan_id, date)`: submitting twice on one day
//! replaces the earlier answer. The date always comes from the caller's
//! clock, never from the client payload.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::manager::PlanManager;
use super::model::CheckIn;
use crate::analytics::{self, AdherenceSummary, PlanSummary, SuggestionPolicy};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::PlanStore;

/// Check-in history plus the derived summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub checkins: Vec<CheckIn>,
    pub summary: AdherenceSummary,
}

impl<S: PlanStore> PlanManager<S> {
    /// Record whether the plan's steps were followed on `today`.
    ///
    /// Store failures are returned to the caller rather than retried.
    ///
    /// # Errors
    /// - [`CoreError::NotFound`] for an unknown plan
    /// - [`CoreError::OutOfRange`] if `today` is outside the plan window
    pub fn record_checkin(
        &mut self,
        plan_id: i64,
        today: NaiveDate,
        followed_steps: bool,
        notes: Option<&str>,
    ) -> Result<CheckIn> {
        let plan = self.plan(plan_id, today)?;
        if !plan.covers(today) {
            return Err(CoreError::OutOfRange {
                date: today,
                start: plan.start_date,
                end: plan.end_date,
            });
        }

        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        let checkin = self
            .store
            .upsert_checkin(plan_id, today, followed_steps, notes)?;

        tracing::debug!(plan_id, date = %today, followed_steps, "check-in recorded");
        self.emit(Event::CheckinRecorded {
            plan_id,
            checkin_date: today,
            followed_steps,
            at: Utc::now(),
        });
        Ok(checkin)
    }

    /// History and adherence summary as of `today`.
    pub fn progress(&mut self, plan_id: i64, today: NaiveDate) -> Result<Progress> {
        let plan = self.plan(plan_id, today)?;
        let checkins = self.store.checkins(plan_id)?;
        let summary = analytics::summarize(&plan, &checkins, today);
        Ok(Progress { checkins, summary })
    }

    /// Final report, available once the plan has ended.
    ///
    /// # Errors
    /// [`CoreError::PlanNotCompleted`] while `today <= end_date`.
    pub fn final_summary(
        &mut self,
        plan_id: i64,
        today: NaiveDate,
        policy: &SuggestionPolicy,
    ) -> Result<PlanSummary> {
        let plan = self.plan(plan_id, today)?;
        if plan.is_active(today) {
            return Err(CoreError::PlanNotCompleted {
                plan_id,
                end_date: plan.end_date,
            });
        }
        let checkins = self.store.checkins(plan_id)?;
        Ok(analytics::finalize(&plan, &checkins, policy))
    }
}
