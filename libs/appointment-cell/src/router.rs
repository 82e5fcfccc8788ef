// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    routing::post,
    Router,
};

use doctor_cell::store::DoctorStore;
use patient_cell::store::PatientStore;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::store::AppointmentStore;

/// Explicit handles to everything the appointment handlers touch.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub doctors: Arc<dyn DoctorStore>,
    pub patients: Arc<dyn PatientStore>,
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route(
            "/",
            post(handlers::book_appointment).get(handlers::list_appointments),
        )
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}

/// Read-only projections of booked slots, nested under `/doctors` by the
/// API composition.
pub fn availability_routes(state: AppointmentState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/{doctor_id}/booked-dates", get(handlers::get_booked_dates))
        .route("/{doctor_id}/booked-times", get(handlers::get_booked_times))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
