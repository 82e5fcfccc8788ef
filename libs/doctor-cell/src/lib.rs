pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use models::Doctor;
pub use store::{DoctorStore, MemoryDoctorStore, PostgrestDoctorStore};
