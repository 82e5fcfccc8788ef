pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use models::Patient;
pub use store::{MemoryPatientStore, PatientStore, PostgrestPatientStore};
