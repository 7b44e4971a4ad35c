//! Alcove Networking
//!
//! Gateway client for the remote scraping API. Every call resolves to
//! a uniform [`ApiResult`]; transport failures never surface as errors
//! past this crate.

mod client;
mod endpoints;
mod models;

pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, ClientPatch, Method, RequestOptions};
pub use endpoints::{Endpoint, EndpointMap};
pub use models::{
    HealthReport, HealthState, JobStatus, ResultQuery, ResultsPage, ScrapeConfig, ScraperStats,
    SearchQuery, TriggerResponse,
};

/// Uniform result of every gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub status: u16,
    pub status_text: String,
    pub error: Option<String>,
}

impl ApiResult {
    /// Transport-level failure (DNS, refused connection, timeout).
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            status: 0,
            status_text: "Network Error".into(),
            error: Some(message.into()),
        }
    }

    /// Request cancelled before completion (instance destroyed).
    pub fn cancelled() -> Self {
        Self {
            success: false,
            data: None,
            status: 0,
            status_text: "Cancelled".into(),
            error: Some("request cancelled".into()),
        }
    }

    /// Deserialize the payload into a typed model.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Map a raw HTTP response onto the uniform result shape.
///
/// Non-JSON bodies are tolerated (`{"message": <raw>}`); on non-2xx
/// the error message comes from the body's `error`/`message` field,
/// falling back to the HTTP status text.
pub fn normalize_response(status: u16, status_text: &str, body: &str) -> ApiResult {
    let data = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(_) => serde_json::json!({ "message": body }),
    };

    let success = (200..300).contains(&status);
    let error = if success {
        None
    } else {
        let from_body = data
            .get("error")
            .and_then(|v| v.as_str())
            .or_else(|| data.get("message").and_then(|v| v.as_str()))
            .map(|s| s.to_string());
        Some(from_body.unwrap_or_else(|| status_text.to_string()))
    };

    ApiResult {
        success,
        data: Some(data),
        status,
        status_text: status_text.to_string(),
        error,
    }
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),
}
