use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, availability_routes, AppointmentState};
use appointment_cell::store::PostgrestAppointmentStore;
use doctor_cell::router::{doctor_routes, DoctorState};
use doctor_cell::store::PostgrestDoctorStore;
use patient_cell::router::{patient_routes, PatientState};
use patient_cell::store::PostgrestPatientStore;
use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    // One store client, explicit handles everywhere downstream
    let db = Arc::new(PostgrestClient::new(&config));

    let appointment_state = AppointmentState {
        config: config.clone(),
        appointments: Arc::new(PostgrestAppointmentStore::new(db.clone())),
        doctors: Arc::new(PostgrestDoctorStore::new(db.clone())),
        patients: Arc::new(PostgrestPatientStore::new(db.clone())),
    };

    let doctor_state = DoctorState {
        config: config.clone(),
        doctors: Arc::new(PostgrestDoctorStore::new(db.clone())),
    };

    let patient_state = PatientState {
        config: config.clone(),
        patients: Arc::new(PostgrestPatientStore::new(db)),
    };

    // Booked-slot projections live beside the doctor directory routes.
    let doctors = doctor_routes(doctor_state).merge(availability_routes(appointment_state.clone()));

    Router::new()
        .route("/", get(|| async { "Hospital Management API is running!" }))
        .nest("/appointments", appointment_routes(appointment_state))
        .nest("/doctors", doctors)
        .nest("/patients", patient_routes(patient_state))
}
