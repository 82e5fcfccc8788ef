use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::router::PatientState;

/// Profile read. Patients see their own record; staff and the treating
/// doctor role see any.
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<PatientState>,
    Path(patient_id): Path<i64>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let is_self = user.numeric_id() == Some(patient_id);
    let is_clinical = user.has_role("doctor");

    if !is_self && !is_clinical && !user.is_staff() {
        return Err(AppError::Forbidden(
            "Not authorized to view this patient".to_string(),
        ));
    }

    let patient = state
        .patients
        .fetch(patient_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

    Ok(Json(json!(patient)))
}
