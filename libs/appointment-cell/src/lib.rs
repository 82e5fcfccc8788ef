pub mod handlers;
pub mod models;
pub mod router;
pub mod slot;
pub mod store;

pub mod services;

pub use models::{Appointment, AppointmentStatus, BookingError};
pub use router::AppointmentState;
pub use slot::SlotKey;
pub use store::{AppointmentStore, MemoryAppointmentStore, PostgrestAppointmentStore};
