// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentStatus, BookingError};

/// Governs legal status transitions for an appointment record.
pub struct StatusLifecycle;

impl StatusLifecycle {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed. Re-asserting the
    /// current status is a no-op and passes.
    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("validating status transition {} -> {}", current, next);

        if current == next {
            return Ok(());
        }

        if !self.valid_transitions(current).contains(&next) {
            warn!("invalid status transition attempted: {} -> {}", current, next);
            return Err(BookingError::InvalidStatusTransition(current, next));
        }

        Ok(())
    }

    /// All legal next statuses for a given current status.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::CheckedIn,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::CheckedIn => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - the only way out of completed is the
            // hard-delete path, which removes the record entirely.
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Hard deletion is reserved for records whose encounter already
    /// happened; everything else goes through soft-cancel.
    pub fn can_hard_delete(&self, appointment: &Appointment) -> bool {
        appointment.status == AppointmentStatus::Completed
    }
}

impl Default for StatusLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
