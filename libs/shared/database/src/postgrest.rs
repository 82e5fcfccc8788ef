use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Error from the relational store's REST API. The upstream status is
/// kept so callers can tell a constraint rejection apart from an outage.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("store unreachable: {0}")]
    Transport(String),

    #[error("store returned malformed data: {0}")]
    Decode(String),
}

impl DbError {
    /// True when the store rejected a write against a uniqueness
    /// constraint (PostgREST answers 409 for duplicate keys).
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Api { status: 409, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::Api { status: 404, .. })
    }
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        DbError::Transport(err.to_string())
    }
}

/// Thin client over a PostgREST-style relational store API. All access
/// goes through an explicit handle to this client; there is no ambient
/// connection state.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_api_url.trim_end_matches('/').to_string(),
            service_key: config.database_service_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    /// Like `request`, with extra headers merged in. Writes that need the
    /// created/updated row back pass `Prefer: return=representation`.
    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("store request: {} {}", method, url);

        let mut headers = self.headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status != StatusCode::CONFLICT {
                error!("store API error ({}): {}", status, message);
            }
            return Err(DbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The `Prefer` header PostgREST needs to echo mutated rows back.
pub fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
