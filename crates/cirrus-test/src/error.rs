//! Test error types.

use thiserror::Error;

/// Errors raised while reading a test response.
#[derive(Debug, Error)]
pub enum TestError {
    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response is not an HTTP envelope.
    #[error("response is not an HTTP envelope: {0}")]
    NotHttp(String),

    /// The response is not an error envelope.
    #[error("response carries no error: {0}")]
    NotError(String),
}
