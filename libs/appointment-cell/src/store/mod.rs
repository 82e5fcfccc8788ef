use async_trait::async_trait;
use thiserror::Error;

use shared_database::postgrest::DbError;

use crate::models::{Appointment, AppointmentStatus};
use crate::slot::SlotKey;

mod memory;
mod postgrest;

pub use memory::MemoryAppointmentStore;
pub use postgrest::PostgrestAppointmentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The write lost against the uniqueness guarantee: an active
    /// appointment already occupies the slot.
    #[error("an active appointment already occupies this slot")]
    DuplicateSlot,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if err.is_conflict() {
            StoreError::DuplicateSlot
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Insert payload. The slot key carries the doctor; the record is born
/// `scheduled`.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub slot: SlotKey,
    pub appointment_type: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Field-wise patch; `None` leaves a column untouched. Patient and
/// doctor references are immutable after creation, so no patch field
/// exists for them — a reschedule moves the slot under the same doctor.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub slot: Option<SlotKey>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
            && self.status.is_none()
            && self.reason.is_none()
            && self.notes.is_none()
    }
}

/// Persistence seam for appointments. Handlers and services receive a
/// store handle explicitly; nothing reaches for ambient connection
/// state. Implementations must uphold the slot-uniqueness guarantee on
/// every write: among concurrent writers targeting one free slot,
/// exactly one wins and the rest observe `StoreError::DuplicateSlot`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    async fn fetch(&self, id: i64) -> Result<Option<Appointment>, StoreError>;

    /// Apply a patch; `Ok(None)` when no such record exists. Moving the
    /// slot re-enters the uniqueness guarantee.
    async fn update(
        &self,
        id: i64,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Permanent removal; `Ok(false)` when no such record exists.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// All non-cancelled appointments occupying the slot, optionally
    /// ignoring one record (a reschedule checks against *other*
    /// bookings, not itself).
    async fn find_active_in_slot(
        &self,
        slot: &SlotKey,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError>;

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError>;
}
