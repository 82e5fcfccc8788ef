// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slot::SlotKey;
use crate::store::StoreError;

pub const DEFAULT_APPOINTMENT_TYPE: &str = "Consultation";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One scheduled encounter between exactly one patient and one doctor.
///
/// Invariant: for a fixed (doctor_id, appointment_date, appointment_time)
/// at most one record with a status other than `cancelled` exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    /// `None` marks a date-only booking.
    pub appointment_time: Option<NaiveTime>,
    pub status: AppointmentStatus,
    pub appointment_type: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The canonical slot this record occupies.
    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.doctor_id, self.appointment_date, self.appointment_time)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    CheckedIn,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::CheckedIn => "checked-in",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Cancelled appointments release their slot; every other status
    /// holds it.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "checked-in" => Ok(AppointmentStatus::CheckedIn),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(BookingError::InvalidStatus(other.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking input as the clients send it. Date and time arrive as text in
/// whatever accepted form the caller uses; normalization owns parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub appointment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentListQuery {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Appointment slot is already booked")]
    SlotConflict,

    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Invalid appointment status: {0}")]
    InvalidStatus(String),

    #[error("Cannot change appointment status from {0} to {1}")]
    InvalidStatusTransition(AppointmentStatus, AppointmentStatus),

    #[error("Only completed appointments can be permanently removed")]
    HardDeletePrecondition,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store constraint and the advisory pre-check surface as
            // one conflict outcome; callers cannot tell which layer fired.
            StoreError::DuplicateSlot => BookingError::SlotConflict,
            StoreError::Unavailable(msg) => BookingError::Storage(msg),
        }
    }
}
