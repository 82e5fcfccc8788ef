use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_database::postgrest::{DbError, PostgrestClient};

use crate::models::Doctor;

/// Read access to the doctor directory. Booking only needs existence
/// lookups; the directory handlers also serve profile listings.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<Option<Doctor>, DbError>;
    async fn list(&self) -> Result<Vec<Doctor>, DbError>;
}

pub struct PostgrestDoctorStore {
    db: Arc<PostgrestClient>,
}

impl PostgrestDoctorStore {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DoctorStore for PostgrestDoctorStore {
    async fn fetch(&self, id: i64) -> Result<Option<Doctor>, DbError> {
        debug!("fetching doctor {}", id);

        let path = format!("/rest/v1/doctors?id=eq.{}", id);
        let rows: Vec<Value> = self.db.request(Method::GET, &path, None).await?;

        match rows.into_iter().next() {
            Some(row) => {
                let doctor =
                    serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string()))?;
                Ok(Some(doctor))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Doctor>, DbError> {
        let path = "/rest/v1/doctors?order=last_name.asc";
        let rows: Vec<Value> = self.db.request(Method::GET, path, None).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string())))
            .collect()
    }
}

/// In-memory directory for tests.
#[derive(Default)]
pub struct MemoryDoctorStore {
    rows: Mutex<Vec<Doctor>>,
}

impl MemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doctor: Doctor) {
        self.rows.lock().unwrap().push(doctor);
    }
}

#[async_trait]
impl DoctorStore for MemoryDoctorStore {
    async fn fetch(&self, id: i64) -> Result<Option<Doctor>, DbError> {
        Ok(self.rows.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Doctor>, DbError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(rows)
    }
}
