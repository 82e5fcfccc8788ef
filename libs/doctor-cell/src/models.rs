use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A provider identity. Doctors partition the appointment space — the
/// booking invariant is keyed per doctor — but carry no scheduling
/// state of their own beyond the availability declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub is_available: bool,
    pub working_days: Option<String>,
    pub working_hours_start: Option<NaiveTime>,
    pub working_hours_end: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
