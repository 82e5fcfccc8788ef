// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info};

use doctor_cell::store::DoctorStore;
use patient_cell::store::PatientStore;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingError,
    UpdateAppointmentRequest, DEFAULT_APPOINTMENT_TYPE,
};
use crate::slot::{self, SlotKey};
use crate::services::conflict::ConflictChecker;
use crate::services::lifecycle::StatusLifecycle;
use crate::store::{AppointmentPatch, AppointmentStore, NewAppointment};

/// The booking transaction and its sibling mutations. Holds explicit
/// store handles; every operation is a short round-trip against the
/// shared store, and slot uniqueness under concurrency is ultimately the
/// store's guarantee, not this service's.
pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    doctors: Arc<dyn DoctorStore>,
    patients: Arc<dyn PatientStore>,
    conflicts: ConflictChecker,
    lifecycle: StatusLifecycle,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        doctors: Arc<dyn DoctorStore>,
        patients: Arc<dyn PatientStore>,
    ) -> Self {
        let conflicts = ConflictChecker::new(Arc::clone(&store));

        Self {
            store,
            doctors,
            patients,
            conflicts,
            lifecycle: StatusLifecycle::new(),
        }
    }

    pub fn conflicts(&self) -> &ConflictChecker {
        &self.conflicts
    }

    /// Create a new appointment without letting two concurrent callers
    /// both claim the same slot.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, BookingError> {
        // **Step 1: Canonical slot key**
        let slot = SlotKey::normalize(request.doctor_id, &request.date, request.time.as_deref())?;

        // **Step 2: Referenced parties must exist**
        self.verify_patient_exists(request.patient_id).await?;
        self.verify_doctor_exists(slot.doctor_id).await?;

        // **Step 3: Advisory pre-check** - fail early without a write
        if self.conflicts.is_slot_taken(&slot, None).await? {
            return Err(BookingError::SlotConflict);
        }

        // **Step 4: Constrained insert** - the store serializes racing
        // winners of step 3; losers surface the same conflict error.
        let appointment = self
            .store
            .insert(NewAppointment {
                patient_id: request.patient_id,
                slot,
                appointment_type: request
                    .appointment_type
                    .unwrap_or_else(|| DEFAULT_APPOINTMENT_TYPE.to_string()),
                reason: request.reason,
                notes: request.notes,
            })
            .await?;

        info!(
            "appointment {} booked for patient {} with doctor {} on {}",
            appointment.id,
            appointment.patient_id,
            appointment.doctor_id,
            appointment.appointment_date
        );

        Ok(appointment)
    }

    pub async fn get(&self, id: i64) -> Result<Appointment, BookingError> {
        self.store
            .fetch(id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// Update date/time/status/text fields. A slot move re-runs the
    /// conflict check excluding the appointment itself, then relies on
    /// the store constraint for the authoritative answer.
    pub async fn update(
        &self,
        id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        debug!("updating appointment {}", id);

        let current = self.get(id).await?;
        let mut patch = AppointmentPatch::default();

        if let Some(raw) = request.status.as_deref() {
            let next: AppointmentStatus = raw.parse()?;
            self.lifecycle.validate_transition(current.status, next)?;
            patch.status = Some(next);
        }

        if request.date.is_some() || request.time.is_some() {
            let date = match request.date.as_deref() {
                Some(raw) => slot::parse_date(raw)?,
                None => current.appointment_date,
            };
            let time = match request.time.as_deref() {
                Some(raw) => Some(slot::parse_time(raw)?),
                None => current.appointment_time,
            };
            // The doctor reference is immutable; a reschedule moves the
            // slot under the same doctor.
            let slot = SlotKey::new(current.doctor_id, date, time);

            if slot != current.slot() {
                if self.conflicts.is_slot_taken(&slot, Some(id)).await? {
                    return Err(BookingError::SlotConflict);
                }
                patch.slot = Some(slot);
            }
        }

        patch.reason = request.reason;
        patch.notes = request.notes;

        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or(BookingError::NotFound)?;

        info!("appointment {} updated", id);
        Ok(updated)
    }

    /// Soft-cancel: the record survives with status `cancelled` and its
    /// slot is immediately free for rebooking.
    pub async fn cancel(&self, id: i64) -> Result<Appointment, BookingError> {
        let current = self.get(id).await?;
        self.lifecycle
            .validate_transition(current.status, AppointmentStatus::Cancelled)?;

        let cancelled = self
            .store
            .update(
                id,
                AppointmentPatch {
                    status: Some(AppointmentStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(BookingError::NotFound)?;

        info!("appointment {} cancelled, slot released", id);
        Ok(cancelled)
    }

    /// Hard-delete: permanent removal, only for `completed` records.
    /// Ownership is the boundary's concern; the precondition is checked
    /// here.
    pub async fn hard_delete(&self, id: i64) -> Result<(), BookingError> {
        let current = self.get(id).await?;

        if !self.lifecycle.can_hard_delete(&current) {
            return Err(BookingError::HardDeletePrecondition);
        }

        if !self.store.delete(id).await? {
            return Err(BookingError::NotFound);
        }

        info!("appointment {} permanently removed", id);
        Ok(())
    }

    pub async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, BookingError> {
        Ok(self.store.list_for_patient(patient_id).await?)
    }

    pub async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, BookingError> {
        Ok(self.store.list_for_doctor(doctor_id).await?)
    }

    async fn verify_patient_exists(&self, patient_id: i64) -> Result<(), BookingError> {
        self.patients
            .fetch(patient_id)
            .await
            .map_err(|e| BookingError::Storage(e.to_string()))?
            .map(|_| ())
            .ok_or(BookingError::PatientNotFound)
    }

    async fn verify_doctor_exists(&self, doctor_id: i64) -> Result<(), BookingError> {
        self.doctors
            .fetch(doctor_id)
            .await
            .map_err(|e| BookingError::Storage(e.to_string()))?
            .map(|_| ())
            .ok_or(BookingError::DoctorNotFound)
    }
}
