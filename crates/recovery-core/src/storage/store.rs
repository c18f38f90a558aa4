//! Store abstractions the engine reads and writes through.
//!
//! [`PlanStore`] is the durable record of plans and check-ins. [`KvStore`]
//! is the host's small key-value capability used for client-local state
//! such as reminder records. Methods take `&self`; implementations
//! serialize writes internally.

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::plan::{CheckIn, NewPlan, Plan, PlanStatus};

pub trait PlanStore {
    /// Insert a plan and return it with its assigned id.
    fn insert_plan(&self, plan: NewPlan) -> Result<Plan, StoreError>;

    fn plan(&self, plan_id: i64) -> Result<Option<Plan>, StoreError>;

    /// Plans of a user, newest first (start date, then id).
    fn plans_for_user(
        &self,
        user_id: &str,
        addiction_key: Option<&str>,
    ) -> Result<Vec<Plan>, StoreError>;

    fn set_plan_status(&self, plan_id: i64, status: PlanStatus) -> Result<(), StoreError>;

    /// Insert or replace the check-in for `(plan_id, date)`.
    ///
    /// An existing record keeps its id.
    fn upsert_checkin(
        &self,
        plan_id: i64,
        date: NaiveDate,
        followed_steps: bool,
        notes: Option<&str>,
    ) -> Result<CheckIn, StoreError>;

    /// Check-ins of a plan, oldest first.
    fn checkins(&self, plan_id: i64) -> Result<Vec<CheckIn>, StoreError>;
}

pub trait KvStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn kv_remove(&self, key: &str) -> Result<(), StoreError>;

    /// Keys starting with `prefix`, sorted.
    fn kv_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

impl<T: PlanStore + ?Sized> PlanStore for &T {
    fn insert_plan(&self, plan: NewPlan) -> Result<Plan, StoreError> {
        (**self).insert_plan(plan)
    }

    fn plan(&self, plan_id: i64) -> Result<Option<Plan>, StoreError> {
        (**self).plan(plan_id)
    }

    fn plans_for_user(
        &self,
        user_id: &str,
        addiction_key: Option<&str>,
    ) -> Result<Vec<Plan>, StoreError> {
        (**self).plans_for_user(user_id, addiction_key)
    }

    fn set_plan_status(&self, plan_id: i64, status: PlanStatus) -> Result<(), StoreError> {
        (**self).set_plan_status(plan_id, status)
    }

    fn upsert_checkin(
        &self,
        plan_id: i64,
        date: NaiveDate,
        followed_steps: bool,
        notes: Option<&str>,
    ) -> Result<CheckIn, StoreError> {
        (**self).upsert_checkin(plan_id, date, followed_steps, notes)
    }

    fn checkins(&self, plan_id: i64) -> Result<Vec<CheckIn>, StoreError> {
        (**self).checkins(plan_id)
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).kv_get(key)
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).kv_set(key, value)
    }

    fn kv_remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).kv_remove(key)
    }

    fn kv_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).kv_keys(prefix)
    }
}
