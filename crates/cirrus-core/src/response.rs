//! API gateway response envelope.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorEnvelope;

/// Permissive CORS headers attached to every HTTP response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
    ),
    (
        "Access-Control-Allow-Methods",
        "OPTIONS,POST,GET,PUT,DELETE,PATCH",
    ),
];

/// A proxy-integration HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// HTTP status.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Always false; bodies are JSON text.
    pub is_base64_encoded: bool,
    /// JSON-serialized body.
    pub body: String,
}

impl HttpResponse {
    /// Builds a response with the CORS headers.
    #[must_use]
    pub fn new(status: StatusCode, body: &Value) -> Self {
        let headers = CORS_HEADERS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            status_code: status.as_u16(),
            headers,
            is_base64_encoded: false,
            body: body.to_string(),
        }
    }

    /// A 200 response carrying `body`.
    #[must_use]
    pub fn ok(body: &Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// A response carrying a surfaced error with its status.
    #[must_use]
    pub fn from_error(envelope: &ErrorEnvelope) -> Self {
        let status =
            StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, &envelope.to_value())
    }

    /// Converts the response to the JSON value returned to the gateway.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::json!(self)
    }
}
