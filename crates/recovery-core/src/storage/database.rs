//! SQLite-based plan storage.
//!
//! Provides persistent storage for:
//! - Recovery plans
//! - Daily check-ins (one row per plan and day)
//! - Key-value store for client-local state (reminder records)

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::data_dir;
use super::migrations;
use super::store::{KvStore, PlanStore};
use crate::calendar::ClockTime;
use crate::error::StoreError;
use crate::plan::{CheckIn, NewPlan, Plan, PlanStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PLAN_COLUMNS: &str =
    "id, user_id, addiction_key, start_date, duration_days, end_date, daily_reminder_time, status";

/// SQLite database for plans, check-ins and reminder state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/recovery.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unusable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("recovery.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    fn checkin_on(&self, plan_id: i64, date: NaiveDate) -> Result<Option<CheckIn>, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, plan_id, checkin_date, followed_steps, notes
                 FROM checkins WHERE plan_id = ?1 AND checkin_date = ?2",
                params![plan_id, format_date(date)],
                RawCheckIn::from_row,
            )
            .optional()?;
        raw.map(RawCheckIn::decode).transpose()
    }
}

/// Plan row before date/time decoding.
struct RawPlan {
    id: i64,
    user_id: String,
    addiction_key: String,
    start_date: String,
    duration_days: u32,
    end_date: String,
    daily_reminder_time: String,
    status: String,
}

impl RawPlan {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            addiction_key: row.get(2)?,
            start_date: row.get(3)?,
            duration_days: row.get(4)?,
            end_date: row.get(5)?,
            daily_reminder_time: row.get(6)?,
            status: row.get(7)?,
        })
    }

    fn decode(self) -> Result<Plan, StoreError> {
        let daily_reminder_time = ClockTime::parse(&self.daily_reminder_time)
            .map_err(|e| StoreError::Corrupt(format!("plan {}: {e}", self.id)))?;
        let status = PlanStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Corrupt(format!("plan {}: unknown status '{}'", self.id, self.status))
        })?;
        Ok(Plan {
            id: self.id,
            user_id: self.user_id,
            addiction_key: self.addiction_key,
            start_date: parse_date(&self.start_date)?,
            duration_days: self.duration_days,
            end_date: parse_date(&self.end_date)?,
            daily_reminder_time,
            status,
        })
    }
}

struct RawCheckIn {
    id: i64,
    plan_id: i64,
    checkin_date: String,
    followed_steps: bool,
    notes: Option<String>,
}

impl RawCheckIn {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            checkin_date: row.get(2)?,
            followed_steps: row.get(3)?,
            notes: row.get(4)?,
        })
    }

    fn decode(self) -> Result<CheckIn, StoreError> {
        Ok(CheckIn {
            id: self.id,
            plan_id: self.plan_id,
            checkin_date: parse_date(&self.checkin_date)?,
            followed_steps: self.followed_steps,
            notes: self.notes,
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("bad date '{s}': {e}")))
}

impl PlanStore for Database {
    fn insert_plan(&self, plan: NewPlan) -> Result<Plan, StoreError> {
        self.conn.execute(
            "INSERT INTO plans (user_id, addiction_key, start_date, duration_days, end_date, daily_reminder_time, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                plan.user_id,
                plan.addiction_key,
                format_date(plan.start_date),
                plan.duration_days,
                format_date(plan.end_date()),
                plan.daily_reminder_time.to_string(),
                PlanStatus::Active.as_str(),
            ],
        )?;
        Ok(plan.into_plan(self.conn.last_insert_rowid()))
    }

    fn plan(&self, plan_id: i64) -> Result<Option<Plan>, StoreError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1"),
                params![plan_id],
                RawPlan::from_row,
            )
            .optional()?;
        raw.map(RawPlan::decode).transpose()
    }

    fn plans_for_user(
        &self,
        user_id: &str,
        addiction_key: Option<&str>,
    ) -> Result<Vec<Plan>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans
             WHERE user_id = ?1 AND (?2 IS NULL OR addiction_key = ?2)
             ORDER BY start_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id, addiction_key], RawPlan::from_row)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?.decode()?);
        }
        Ok(plans)
    }

    fn set_plan_status(&self, plan_id: i64, status: PlanStatus) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE plans SET status = ?1 WHERE id = ?2",
            params![status.as_str(), plan_id],
        )?;
        Ok(())
    }

    fn upsert_checkin(
        &self,
        plan_id: i64,
        date: NaiveDate,
        followed_steps: bool,
        notes: Option<&str>,
    ) -> Result<CheckIn, StoreError> {
        self.conn.execute(
            "INSERT INTO checkins (plan_id, checkin_date, followed_steps, notes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(plan_id, checkin_date) DO UPDATE SET
                followed_steps = excluded.followed_steps,
                notes = excluded.notes",
            params![plan_id, format_date(date), followed_steps, notes],
        )?;
        self.checkin_on(plan_id, date)?
            .ok_or_else(|| StoreError::QueryFailed(format!("check-in for plan {plan_id} on {date} vanished")))
    }

    fn checkins(&self, plan_id: i64) -> Result<Vec<CheckIn>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, plan_id, checkin_date, followed_steps, notes
             FROM checkins WHERE plan_id = ?1
             ORDER BY checkin_date ASC",
        )?;
        let rows = stmt.query_map(params![plan_id], RawCheckIn::from_row)?;

        let mut checkins = Vec::new();
        for row in rows {
            checkins.push(row?.decode()?);
        }
        Ok(checkins)
    }
}

impl KvStore for Database {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn kv_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn new_plan(key: &str, start: NaiveDate, days: u32) -> NewPlan {
        NewPlan {
            user_id: "local".into(),
            addiction_key: key.into(),
            start_date: start,
            duration_days: days,
            daily_reminder_time: ClockTime::parse("08:30").unwrap(),
        }
    }

    #[test]
    fn insert_and_fetch_plan() {
        let db = Database::open_memory().unwrap();
        let plan = db.insert_plan(new_plan("smoking", d(1), 5)).unwrap();
        assert_eq!(plan.end_date, d(5));

        let fetched = db.plan(plan.id).unwrap().unwrap();
        assert_eq!(fetched, plan);
        assert!(db.plan(plan.id + 100).unwrap().is_none());
    }

    #[test]
    fn plans_filter_and_order() {
        let db = Database::open_memory().unwrap();
        let first = db.insert_plan(new_plan("smoking", d(1), 5)).unwrap();
        let second = db.insert_plan(new_plan("smoking", d(10), 5)).unwrap();
        db.insert_plan(new_plan("sugar", d(2), 5)).unwrap();

        let smoking = db.plans_for_user("local", Some("smoking")).unwrap();
        assert_eq!(
            smoking.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert_eq!(db.plans_for_user("local", None).unwrap().len(), 3);
        assert!(db.plans_for_user("someone-else", None).unwrap().is_empty());
    }

    #[test]
    fn status_update_persists() {
        let db = Database::open_memory().unwrap();
        let plan = db.insert_plan(new_plan("alcohol", d(1), 2)).unwrap();
        db.set_plan_status(plan.id, PlanStatus::Completed).unwrap();
        assert_eq!(db.plan(plan.id).unwrap().unwrap().status, PlanStatus::Completed);
    }

    #[test]
    fn checkin_upsert_replaces_same_day() {
        let db = Database::open_memory().unwrap();
        let plan = db.insert_plan(new_plan("smoking", d(1), 5)).unwrap();

        let a = db.upsert_checkin(plan.id, d(2), true, Some("easy")).unwrap();
        let b = db.upsert_checkin(plan.id, d(2), false, None).unwrap();
        db.upsert_checkin(plan.id, d(1), true, None).unwrap();

        assert_eq!(a.id, b.id);
        let all = db.checkins(plan.id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].checkin_date, d(1));
        assert_eq!(all[1].checkin_date, d(2));
        assert!(!all[1].followed_steps);
        assert_eq!(all[1].notes, None);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("reminder/2", "x").unwrap();
        db.kv_set("reminder/1", "y").unwrap();
        assert_eq!(db.kv_keys("reminder/").unwrap(), vec!["reminder/1", "reminder/2"]);
        db.kv_remove("reminder/1").unwrap();
        assert_eq!(db.kv_keys("reminder/").unwrap(), vec!["reminder/2"]);
    }

    #[test]
    fn reopening_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.db");
        let id = {
            let db = Database::open_at(&path).unwrap();
            db.insert_plan(new_plan("caffeine", d(3), 14)).unwrap().id
        };
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.plan(id).unwrap().unwrap().duration_days, 14);
    }
}
