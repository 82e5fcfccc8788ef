// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentListQuery, BookAppointmentRequest, BookingError, UpdateAppointmentRequest,
};
use crate::router::AppointmentState;
use crate::services::booking::BookingService;
use crate::slot;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub hard: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BookedTimesQuery {
    pub date: String,
}

/// One translation table from the booking core's errors to the HTTP
/// taxonomy, so every handler surfaces the same stable messages.
fn to_app_error(err: BookingError) -> AppError {
    match err {
        BookingError::InvalidSlot(msg) => AppError::BadRequest(msg),
        BookingError::SlotConflict => {
            AppError::Conflict("Appointment slot is already booked".to_string())
        }
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BookingError::InvalidStatus(value) => {
            AppError::BadRequest(format!("Invalid appointment status: {}", value))
        }
        BookingError::InvalidStatusTransition(from, to) => {
            AppError::BadRequest(format!("Cannot change appointment status from {} to {}", from, to))
        }
        BookingError::HardDeletePrecondition => AppError::BadRequest(
            "Only completed appointments can be permanently removed".to_string(),
        ),
        BookingError::Storage(msg) => AppError::Database(msg),
    }
}

fn booking_service(state: &AppointmentState) -> BookingService {
    BookingService::new(
        state.appointments.clone(),
        state.doctors.clone(),
        state.patients.clone(),
    )
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

/// Booking is patient-initiated (for themselves) or staff-initiated.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let is_own_booking =
        user.has_role("patient") && user.numeric_id() == Some(request.patient_id);

    if !is_own_booking && !user.is_staff() {
        return Err(AppError::Forbidden(
            "Not authorized to book an appointment for this patient".to_string(),
        ));
    }

    let appointment = booking_service(&state)
        .book(request)
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<i64>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state)
        .get(appointment_id)
        .await
        .map_err(to_app_error)?;

    let is_owner = user.numeric_id() == Some(appointment.patient_id);
    let is_assigned_doctor =
        user.has_role("doctor") && user.numeric_id() == Some(appointment.doctor_id);

    if !is_owner && !is_assigned_doctor && !user.is_staff() {
        return Err(AppError::Forbidden(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Query(params): Query<AppointmentListQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);

    // Non-staff callers only ever see their own appointments.
    let appointments = if user.is_staff() {
        match (params.patient_id, params.doctor_id) {
            (Some(patient_id), _) => service.list_for_patient(patient_id).await,
            (None, Some(doctor_id)) => service.list_for_doctor(doctor_id).await,
            (None, None) => {
                return Err(AppError::BadRequest(
                    "Provide patient_id or doctor_id to list appointments".to_string(),
                ))
            }
        }
    } else if user.has_role("doctor") {
        let doctor_id = user
            .numeric_id()
            .ok_or_else(|| AppError::BadRequest("Invalid doctor ID".to_string()))?;
        service.list_for_doctor(doctor_id).await
    } else {
        let patient_id = user
            .numeric_id()
            .ok_or_else(|| AppError::BadRequest("Invalid patient ID".to_string()))?;
        service.list_for_patient(patient_id).await
    }
    .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<i64>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);

    let appointment = service
        .get(appointment_id)
        .await
        .map_err(to_app_error)?;

    let is_owner = user.numeric_id() == Some(appointment.patient_id);
    let is_assigned_doctor =
        user.has_role("doctor") && user.numeric_id() == Some(appointment.doctor_id);
    let is_staff = user.is_staff();

    if !is_owner && !is_assigned_doctor && !is_staff {
        return Err(AppError::Forbidden(
            "Not authorized to update this appointment".to_string(),
        ));
    }

    // Owning patients reschedule or cancel; they do not write clinical
    // notes or drive the clinical status flow.
    if is_owner && !is_assigned_doctor && !is_staff {
        if request.notes.is_some() {
            return Err(AppError::Forbidden(
                "Patients cannot update appointment notes".to_string(),
            ));
        }
        if let Some(status) = request.status.as_deref() {
            if status != "cancelled" {
                return Err(AppError::Forbidden(
                    "Patients can only cancel their appointments".to_string(),
                ));
            }
        }
    }

    // Assigned doctors update status and notes; rescheduling belongs to
    // the patient or the front desk.
    if is_assigned_doctor && !is_owner && !is_staff {
        if request.date.is_some() || request.time.is_some() {
            return Err(AppError::Forbidden(
                "Doctors cannot reschedule appointments".to_string(),
            ));
        }
    }

    let updated = service
        .update(appointment_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
        "message": "Appointment updated successfully"
    })))
}

/// Soft-cancel by default; `?hard=true` permanently removes the record,
/// which only the owning patient may do and only once the appointment is
/// completed.
#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<i64>,
    Query(params): Query<DeleteParams>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);

    let appointment = service
        .get(appointment_id)
        .await
        .map_err(to_app_error)?;

    let is_owner = user.numeric_id() == Some(appointment.patient_id);
    let is_assigned_doctor =
        user.has_role("doctor") && user.numeric_id() == Some(appointment.doctor_id);

    if params.hard.unwrap_or(false) {
        if !is_owner {
            return Err(AppError::Forbidden(
                "Only the owning patient can permanently remove an appointment".to_string(),
            ));
        }

        service
            .hard_delete(appointment_id)
            .await
            .map_err(to_app_error)?;

        return Ok(Json(json!({
            "success": true,
            "message": "Appointment permanently removed"
        })));
    }

    if !is_owner && !is_assigned_doctor && !user.is_staff() {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this appointment".to_string(),
        ));
    }

    let cancelled = service
        .cancel(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": cancelled,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// BOOKED-SLOT PROJECTIONS (mounted under /doctors)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_booked_dates(
    State(state): State<AppointmentState>,
    Path(doctor_id): Path<i64>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_doctor_exists(&state, doctor_id).await?;

    let dates = booking_service(&state)
        .conflicts()
        .booked_dates(doctor_id)
        .await
        .map_err(to_app_error)?;

    let booked_dates: Vec<String> = dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "booked_dates": booked_dates
    })))
}

#[axum::debug_handler]
pub async fn get_booked_times(
    State(state): State<AppointmentState>,
    Path(doctor_id): Path<i64>,
    Query(params): Query<BookedTimesQuery>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_doctor_exists(&state, doctor_id).await?;

    let date = slot::parse_date(&params.date).map_err(to_app_error)?;

    let times = booking_service(&state)
        .conflicts()
        .booked_times(doctor_id, date)
        .await
        .map_err(to_app_error)?;

    let booked_times: Vec<String> = times
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": date.format("%Y-%m-%d").to_string(),
        "booked_times": booked_times
    })))
}

async fn ensure_doctor_exists(state: &AppointmentState, doctor_id: i64) -> Result<(), AppError> {
    state
        .doctors
        .fetch(doctor_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))
}
