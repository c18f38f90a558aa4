//! In-process store backed by ordered maps.
//!
//! Used by tests and by hosts that keep their own persistence. A single
//! mutex serializes every write, so two upserts for the same day resolve
//! as last-writer-wins.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::store::{KvStore, PlanStore};
use crate::error::StoreError;
use crate::plan::{CheckIn, NewPlan, Plan, PlanStatus};

#[derive(Debug, Default)]
struct Inner {
    next_plan_id: i64,
    next_checkin_id: i64,
    plans: BTreeMap<i64, Plan>,
    checkins: BTreeMap<(i64, NaiveDate), CheckIn>,
    kv: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Locked)
    }
}

impl PlanStore for MemoryStore {
    fn insert_plan(&self, plan: NewPlan) -> Result<Plan, StoreError> {
        let mut inner = self.lock()?;
        inner.next_plan_id += 1;
        let plan = plan.into_plan(inner.next_plan_id);
        inner.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    fn plan(&self, plan_id: i64) -> Result<Option<Plan>, StoreError> {
        Ok(self.lock()?.plans.get(&plan_id).cloned())
    }

    fn plans_for_user(
        &self,
        user_id: &str,
        addiction_key: Option<&str>,
    ) -> Result<Vec<Plan>, StoreError> {
        let inner = self.lock()?;
        let mut plans: Vec<Plan> = inner
            .plans
            .values()
            .filter(|p| p.user_id == user_id)
            .filter(|p| addiction_key.map_or(true, |k| p.addiction_key == k))
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(plans)
    }

    fn set_plan_status(&self, plan_id: i64, status: PlanStatus) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if let Some(plan) = inner.plans.get_mut(&plan_id) {
            plan.status = status;
        }
        Ok(())
    }

    fn upsert_checkin(
        &self,
        plan_id: i64,
        date: NaiveDate,
        followed_steps: bool,
        notes: Option<&str>,
    ) -> Result<CheckIn, StoreError> {
        let mut inner = self.lock()?;
        let id = match inner.checkins.get(&(plan_id, date)) {
            Some(existing) => existing.id,
            None => {
                inner.next_checkin_id += 1;
                inner.next_checkin_id
            }
        };
        let checkin = CheckIn {
            id,
            plan_id,
            checkin_date: date,
            followed_steps,
            notes: notes.map(str::to_string),
        };
        inner.checkins.insert((plan_id, date), checkin.clone());
        Ok(checkin)
    }

    fn checkins(&self, plan_id: i64) -> Result<Vec<CheckIn>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .checkins
            .range((plan_id, NaiveDate::MIN)..=(plan_id, NaiveDate::MAX))
            .map(|(_, c)| c.clone())
            .collect())
    }
}

impl KvStore for MemoryStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.kv.get(key).cloned())
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn kv_remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.kv.remove(key);
        Ok(())
    }

    fn kv_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()?
            .kv
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
