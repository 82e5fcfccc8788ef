use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::models::{Appointment, BookingError};
use crate::slot::SlotKey;
use crate::store::AppointmentStore;

/// Answers "is this slot occupied?" against live store state. Purely
/// advisory on the write path — the store constraint is the arbiter
/// under races — and authoritative for the read-only projections.
pub struct ConflictChecker {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictChecker {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Active appointments occupying the slot, excluding `exclude_id`
    /// when a reschedule checks against other bookings rather than
    /// itself. A `checked-in` record still holds its slot.
    pub async fn find_conflicts(
        &self,
        slot: &SlotKey,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Appointment>, BookingError> {
        debug!(
            "checking conflicts for doctor {} on {} at {:?}",
            slot.doctor_id,
            slot.date_iso(),
            slot.time_hhmm()
        );

        let conflicts = self.store.find_active_in_slot(slot, exclude_id).await?;

        if !conflicts.is_empty() {
            warn!(
                "slot conflict for doctor {} on {}: {} active booking(s)",
                slot.doctor_id,
                slot.date_iso(),
                conflicts.len()
            );
        }

        Ok(conflicts)
    }

    pub async fn is_slot_taken(
        &self,
        slot: &SlotKey,
        exclude_id: Option<i64>,
    ) -> Result<bool, BookingError> {
        Ok(!self.find_conflicts(slot, exclude_id).await?.is_empty())
    }

    /// Distinct calendar dates on which the doctor has at least one
    /// active appointment, ascending. Cancelled bookings free their day.
    pub async fn booked_dates(&self, doctor_id: i64) -> Result<Vec<NaiveDate>, BookingError> {
        let appointments = self.store.list_for_doctor(doctor_id).await?;

        let mut dates: Vec<NaiveDate> = appointments
            .into_iter()
            .filter(|apt| apt.is_active())
            .map(|apt| apt.appointment_date)
            .collect();
        dates.sort();
        dates.dedup();

        Ok(dates)
    }

    /// Times already taken for the doctor on one date, ascending.
    /// Date-only bookings have no time to report and are skipped here.
    pub async fn booked_times(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let appointments = self.store.list_for_doctor(doctor_id).await?;

        let mut times: Vec<NaiveTime> = appointments
            .into_iter()
            .filter(|apt| apt.is_active() && apt.appointment_date == date)
            .filter_map(|apt| apt.appointment_time)
            .collect();
        times.sort();
        times.dedup();

        Ok(times)
    }
}
