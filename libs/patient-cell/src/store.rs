use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use shared_database::postgrest::{DbError, PostgrestClient};

use crate::models::Patient;

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<Option<Patient>, DbError>;
}

pub struct PostgrestPatientStore {
    db: Arc<PostgrestClient>,
}

impl PostgrestPatientStore {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PatientStore for PostgrestPatientStore {
    async fn fetch(&self, id: i64) -> Result<Option<Patient>, DbError> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let rows: Vec<Value> = self.db.request(Method::GET, &path, None).await?;

        match rows.into_iter().next() {
            Some(row) => {
                let patient =
                    serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string()))?;
                Ok(Some(patient))
            }
            None => Ok(None),
        }
    }
}

/// In-memory directory for tests.
#[derive(Default)]
pub struct MemoryPatientStore {
    rows: Mutex<Vec<Patient>>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, patient: Patient) {
        self.rows.lock().unwrap().push(patient);
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn fetch(&self, id: i64) -> Result<Option<Patient>, DbError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
}
