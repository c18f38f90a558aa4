//! Calendar helpers: date keys, "HH:MM" clock labels and day arithmetic.
//!
//! All functions operate on local wall-clock time (`NaiveDateTime`). The
//! caller decides which time zone "now" is taken in; the engine only ever
//! compares calendar dates and minute labels.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Calendar date of a timestamp.
pub fn date_key(now: NaiveDateTime) -> NaiveDate {
    now.date()
}

/// Zero-padded 24-hour "HH:MM" label of a timestamp.
pub fn clock_label(now: NaiveDateTime) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

pub fn same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}

/// Signed number of calendar days from `from` to `to`.
pub fn elapsed_days(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Inclusive last day of a plan starting on `start` lasting `duration_days`.
///
/// `None` for a zero duration or when the end falls past [`NaiveDate::MAX`].
pub fn end_date_for(start: NaiveDate, duration_days: u32) -> Option<NaiveDate> {
    let span = duration_days.checked_sub(1)?;
    start.checked_add_days(Days::new(u64::from(span)))
}

/// A validated minute of the day, written "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// 09:00
    pub const DEFAULT_REMINDER: ClockTime = ClockTime { hour: 9, minute: 0 };

    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidClockTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Parse a strict "HH:MM" label (two digits each side).
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidClockTime(label.to_string());

        let (h, m) = label.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// True when `now` falls inside this minute.
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        now.hour() == u32::from(self.hour) && now.minute() == u32::from(self.minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}
