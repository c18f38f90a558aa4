//! Plan lifecycle manager.
//!
//! ## State Transitions
//!
//! ```text
//! (start_plan) -> Active -> Completed      once today > end_date
//! ```
//!
//! Completion is evaluated lazily: every read compares the stored status
//! with the calendar and writes `Completed` back when the plan has ended.
//! At most one plan per user and behavior is active at a time; starting
//! another one is rejected with [`CoreError::Conflict`].

use chrono::{NaiveDate, Utc};

use super::model::{NewPlan, Plan, PlanStatus};
use crate::calendar::{self, ClockTime};
use crate::catalog::Catalog;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::storage::PlanStore;

/// Creates plans, records check-ins and reports progress.
///
/// Mutating calls queue an [`Event`]; drain them with
/// [`PlanManager::take_events`].
pub struct PlanManager<S> {
    pub(super) store: S,
    catalog: Option<Catalog>,
    events: Vec<Event>,
}

impl<S: PlanStore> PlanManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            catalog: None,
            events: Vec::new(),
        }
    }

    /// Reject plans whose key is not in `catalog`.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drain events queued since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub(super) fn emit(&mut self, event: Event) {
        tracing::debug!(?event, "plan event");
        self.events.push(event);
    }

    /// Start a plan beginning `today`.
    ///
    /// # Errors
    /// - [`CoreError::Validation`] for an empty user or key, an unknown
    ///   catalog key, `duration_days == 0`, a duration whose end date is not
    ///   representable or a malformed reminder time
    /// - [`CoreError::Conflict`] if an active plan exists for the same key
    /// - [`CoreError::StoreUnavailable`] if the store fails
    pub fn start_plan(
        &mut self,
        user_id: &str,
        addiction_key: &str,
        duration_days: u32,
        daily_reminder_time: &str,
        today: NaiveDate,
    ) -> Result<Plan> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::invalid("user_id", "must not be empty").into());
        }
        if addiction_key.trim().is_empty() {
            return Err(ValidationError::invalid("addiction_key", "must not be empty").into());
        }
        if let Some(catalog) = &self.catalog {
            if !catalog.contains(addiction_key) {
                return Err(ValidationError::invalid(
                    "addiction_key",
                    format!("'{addiction_key}' is not in the catalog"),
                )
                .into());
            }
        }
        if duration_days < 1 {
            return Err(ValidationError::invalid("duration_days", "must be at least 1").into());
        }
        if calendar::end_date_for(today, duration_days).is_none() {
            return Err(ValidationError::invalid(
                "duration_days",
                format!("{duration_days} days from {today} is past the last supported date"),
            )
            .into());
        }
        let daily_reminder_time = ClockTime::parse(daily_reminder_time)?;

        if let Some(active) = self
            .plans(user_id, Some(addiction_key), today)?
            .into_iter()
            .find(|p| p.is_active(today))
        {
            return Err(CoreError::Conflict {
                user_id: user_id.to_string(),
                addiction_key: addiction_key.to_string(),
                plan_id: active.id,
            });
        }

        let plan = self.store.insert_plan(NewPlan {
            user_id: user_id.to_string(),
            addiction_key: addiction_key.to_string(),
            start_date: today,
            duration_days,
            daily_reminder_time,
        })?;

        tracing::info!(
            plan_id = plan.id,
            addiction_key = %plan.addiction_key,
            end_date = %plan.end_date,
            "plan started"
        );
        self.emit(Event::PlanStarted {
            plan_id: plan.id,
            addiction_key: plan.addiction_key.clone(),
            start_date: plan.start_date,
            end_date: plan.end_date,
            at: Utc::now(),
        });
        Ok(plan)
    }

    /// Most recently started plan, optionally for one behavior.
    pub fn current_plan(
        &mut self,
        user_id: &str,
        addiction_key: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<Plan>> {
        Ok(self.plans(user_id, addiction_key, today)?.into_iter().next())
    }

    /// All plans of a user, newest first, with status refreshed for `today`.
    pub fn plans(
        &mut self,
        user_id: &str,
        addiction_key: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<Plan>> {
        let plans = self.store.plans_for_user(user_id, addiction_key)?;
        plans
            .into_iter()
            .map(|plan| self.refresh_status(plan, today))
            .collect()
    }

    /// Fetch one plan with status refreshed for `today`.
    ///
    /// # Errors
    /// [`CoreError::NotFound`] if no plan has this id.
    pub fn plan(&mut self, plan_id: i64, today: NaiveDate) -> Result<Plan> {
        let plan = self
            .store
            .plan(plan_id)?
            .ok_or(CoreError::NotFound { plan_id })?;
        self.refresh_status(plan, today)
    }

    /// Write back `Completed` once the plan has ended.
    pub(super) fn refresh_status(&mut self, mut plan: Plan, today: NaiveDate) -> Result<Plan> {
        let derived = plan.status_on(today);
        if derived == plan.status {
            return Ok(plan);
        }

        self.store.set_plan_status(plan.id, derived)?;
        plan.status = derived;

        if derived == PlanStatus::Completed {
            tracing::info!(plan_id = plan.id, end_date = %plan.end_date, "plan completed");
            self.emit(Event::PlanCompleted {
                plan_id: plan.id,
                end_date: plan.end_date,
                at: Utc::now(),
            });
        }
        Ok(plan)
    }
}

/// Whether `plan` accepts check-ins on `today`.
pub fn is_active(plan: &Plan, today: NaiveDate) -> bool {
    plan.is_active(today)
}
