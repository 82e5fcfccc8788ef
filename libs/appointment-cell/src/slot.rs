use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::BookingError;

/// Canonical identity of a booking slot: one doctor, one calendar date,
/// and optionally one time of day at minute precision. Two inputs that
/// denote the same wall-clock slot compare equal after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub doctor_id: i64,
    pub date: NaiveDate,
    /// `None` is the sentinel for a date-only booking, which occupies
    /// the doctor's single untimed slot for that day.
    pub time: Option<NaiveTime>,
}

impl SlotKey {
    pub fn new(doctor_id: i64, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self {
            doctor_id,
            date,
            time: time.map(truncate_to_minute),
        }
    }

    /// Canonicalize raw booking input. Dates are compared as calendar
    /// dates: when the input is a full timestamp, its own calendar day is
    /// kept — no timezone conversion may move the date.
    pub fn normalize(
        doctor_id: i64,
        date: &str,
        time: Option<&str>,
    ) -> Result<Self, BookingError> {
        let date = parse_date(date)?;
        let time = time.map(parse_time).transpose()?;

        Ok(Self::new(doctor_id, date, time))
    }

    pub fn date_iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn time_hhmm(&self) -> Option<String> {
        self.time.map(|t| t.format("%H:%M").to_string())
    }
}

/// Accepted calendar-date forms: `YYYY-MM-DD`, `YYYY/MM/DD`, or a full
/// timestamp (with or without offset) whose literal date component is
/// used.
pub fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BookingError::InvalidSlot(
            "appointment date is required".to_string(),
        ));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y/%m/%d") {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        // date_naive is the stamp's own calendar day, not a UTC shift
        return Ok(stamp.date_naive());
    }
    if let Ok(stamp) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(stamp.date());
    }

    Err(BookingError::InvalidSlot(format!(
        "unrecognized appointment date: {raw}"
    )))
}

/// Accepted time forms: `HH:MM` or `HH:MM:SS`, 24-hour clock. Seconds
/// are dropped; slots are keyed at minute precision.
pub fn parse_time(raw: &str) -> Result<NaiveTime, BookingError> {
    let raw = raw.trim();

    let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| BookingError::InvalidSlot(format!("unrecognized appointment time: {raw}")))?;

    Ok(truncate_to_minute(parsed))
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
