use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::store::DoctorStore;

#[derive(Clone)]
pub struct DoctorState {
    pub config: Arc<AppConfig>,
    pub doctors: Arc<dyn DoctorStore>,
}

pub fn doctor_routes(state: DoctorState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
