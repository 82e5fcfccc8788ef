use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::postgrest::{return_representation, PostgrestClient};

use crate::models::{Appointment, AppointmentStatus};
use crate::slot::SlotKey;

use super::{AppointmentPatch, AppointmentStore, NewAppointment, StoreError};

/// Appointment persistence over the relational store's REST API.
///
/// The uniqueness guarantee lives in the database as a partial unique
/// index over (doctor_id, appointment_date, appointment_time) scoped to
/// `status <> 'cancelled'`; a racing insert or reschedule comes back as
/// a 409, which `StoreError::from` turns into `DuplicateSlot`.
pub struct PostgrestAppointmentStore {
    db: Arc<PostgrestClient>,
}

impl PostgrestAppointmentStore {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }

    fn slot_filter_parts(slot: &SlotKey, exclude_id: Option<i64>) -> Vec<String> {
        let mut parts = vec![
            format!("doctor_id=eq.{}", slot.doctor_id),
            format!("appointment_date=eq.{}", slot.date_iso()),
        ];

        match slot.time {
            Some(time) => {
                let value = time.format("%H:%M:%S").to_string();
                parts.push(format!("appointment_time=eq.{}", urlencoding::encode(&value)));
            }
            None => parts.push("appointment_time=is.null".to_string()),
        }

        parts.push(format!(
            "status=neq.{}",
            AppointmentStatus::Cancelled.as_str()
        ));

        if let Some(id) = exclude_id {
            parts.push(format!("id=neq.{}", id));
        }

        parts
    }

    fn decode_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Unavailable(format!("malformed appointment row: {e}")))
            })
            .collect()
    }

    fn decode_single(rows: Vec<Value>) -> Result<Option<Appointment>, StoreError> {
        Ok(Self::decode_rows(rows)?.into_iter().next())
    }
}

#[async_trait]
impl AppointmentStore for PostgrestAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Utc::now();
        let body = json!({
            "patient_id": new.patient_id,
            "doctor_id": new.slot.doctor_id,
            "appointment_date": new.slot.date_iso(),
            "appointment_time": new.slot.time,
            "status": AppointmentStatus::Scheduled.as_str(),
            "appointment_type": new.appointment_type,
            "reason": new.reason,
            "notes": new.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let rows: Vec<Value> = self
            .db
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(StoreError::from)?;

        Self::decode_single(rows)?
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".to_string()))
    }

    async fn fetch(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(StoreError::from)?;

        Self::decode_single(rows)
    }

    async fn update(
        &self,
        id: i64,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut body = serde_json::Map::new();

        if let Some(slot) = &patch.slot {
            body.insert("appointment_date".to_string(), json!(slot.date_iso()));
            body.insert("appointment_time".to_string(), json!(slot.time));
        }
        if let Some(status) = patch.status {
            body.insert("status".to_string(), json!(status.as_str()));
        }
        if let Some(reason) = patch.reason {
            body.insert("reason".to_string(), json!(reason));
        }
        if let Some(notes) = patch.notes {
            body.insert("notes".to_string(), json!(notes));
        }
        body.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        debug!("patching appointment {}", id);

        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self
            .db
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(body)),
                Some(return_representation()),
            )
            .await
            .map_err(StoreError::from)?;

        Self::decode_single(rows)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self
            .db
            .request_with_headers(Method::DELETE, &path, None, Some(return_representation()))
            .await
            .map_err(StoreError::from)?;

        Ok(!rows.is_empty())
    }

    async fn find_active_in_slot(
        &self,
        slot: &SlotKey,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let parts = Self::slot_filter_parts(slot, exclude_id);
        let path = format!("/rest/v1/appointments?{}", parts.join("&"));

        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(StoreError::from)?;

        Self::decode_rows(rows)
    }

    async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.asc",
            doctor_id
        );
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(StoreError::from)?;

        Self::decode_rows(rows)
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.asc",
            patient_id
        );
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(StoreError::from)?;

        Self::decode_rows(rows)
    }
}
