use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::store::PatientStore;

#[derive(Clone)]
pub struct PatientState {
    pub config: Arc<AppConfig>,
    pub patients: Arc<dyn PatientStore>,
}

pub fn patient_routes(state: PatientState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/{patient_id}", get(handlers::get_patient))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
