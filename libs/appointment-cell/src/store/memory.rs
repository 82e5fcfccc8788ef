use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Appointment, AppointmentStatus};
use crate::slot::SlotKey;

use super::{AppointmentPatch, AppointmentStore, NewAppointment, StoreError};

/// In-memory appointment store. Check-and-write happens under one lock,
/// which is the whole uniqueness guarantee here: concurrent writers are
/// serialized exactly as the database index serializes them in
/// production. Used by tests and local development.
#[derive(Default)]
pub struct MemoryAppointmentStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Appointment>,
    next_id: i64,
}

impl Inner {
    fn slot_occupied(&self, slot: &SlotKey, exclude_id: Option<i64>) -> bool {
        self.rows.iter().any(|row| {
            row.is_active() && row.slot() == *slot && Some(row.id) != exclude_id
        })
    }
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row, active or not.
    pub fn all(&self) -> Vec<Appointment> {
        self.inner.lock().unwrap().rows.clone()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.slot_occupied(&new.slot, None) {
            return Err(StoreError::DuplicateSlot);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let appointment = Appointment {
            id: inner.next_id,
            patient_id: new.patient_id,
            doctor_id: new.slot.doctor_id,
            appointment_date: new.slot.date,
            appointment_time: new.slot.time,
            status: AppointmentStatus::Scheduled,
            appointment_type: new.appointment_type,
            reason: new.reason,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(appointment.clone());

        Ok(appointment)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(index) = inner.rows.iter().position(|row| row.id == id) else {
            return Ok(None);
        };

        // Build the prospective row first so the constraint check sees
        // the post-patch slot and status together.
        let mut next = inner.rows[index].clone();
        if let Some(slot) = &patch.slot {
            next.appointment_date = slot.date;
            next.appointment_time = slot.time;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(reason) = patch.reason {
            next.reason = Some(reason);
        }
        if let Some(notes) = patch.notes {
            next.notes = Some(notes);
        }
        next.updated_at = Utc::now();

        if next.is_active() && inner.slot_occupied(&next.slot(), Some(id)) {
            return Err(StoreError::DuplicateSlot);
        }

        inner.rows[index] = next.clone();
        Ok(Some(next))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|row| row.id != id);
        Ok(inner.rows.len() < before)
    }

    async fn find_active_in_slot(
        &self,
        slot: &SlotKey,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .iter()
            .filter(|row| {
                row.is_active() && row.slot() == *slot && Some(row.id) != exclude_id
            })
            .cloned()
            .collect())
    }

    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Appointment> = inner
            .rows
            .iter()
            .filter(|row| row.doctor_id == doctor_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.appointment_date, row.appointment_time));
        Ok(rows)
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Appointment> = inner
            .rows
            .iter()
            .filter(|row| row.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.appointment_date, row.appointment_time));
        Ok(rows)
    }
}
