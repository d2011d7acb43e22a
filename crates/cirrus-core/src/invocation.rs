//! Invocation metadata.
//!
//! The [`InvocationContext`] is the mutable bag that travels alongside the
//! raw event through middleware and into handlers. Unlike the
//! [`ExecutionContext`](crate::ExecutionContext) it is passed explicitly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cirrus_router::Params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unique identifier for each invocation, using UUID v7.
///
/// # Example
///
/// ```
/// use cirrus_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of one invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    request_id: String,
    function_arn: Option<String>,
    raw_event: bool,
    path_params: Params,
    extensions: HashMap<String, Value>,
    started_at: Instant,
}

impl InvocationContext {
    /// Creates a context with a generated request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new().to_string())
    }

    /// Creates a context with the request ID supplied by the host.
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            function_arn: None,
            raw_event: false,
            path_params: Params::new(),
            extensions: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Sets the ARN of the invoked function.
    #[must_use]
    pub fn with_function_arn(mut self, arn: impl Into<String>) -> Self {
        self.function_arn = Some(arn.into());
        self
    }

    /// The request ID.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The ARN of the invoked function, if known.
    #[must_use]
    pub fn function_arn(&self) -> Option<&str> {
        self.function_arn.as_deref()
    }

    /// Marks this invocation as a raw platform event.
    ///
    /// The dispatcher then bypasses RPC and HTTP handling and passes the
    /// event unmodified to the controller's event handler.
    pub fn mark_raw_event(&mut self) {
        self.raw_event = true;
    }

    /// Returns true when a middleware marked the invocation as a raw event.
    #[must_use]
    pub fn is_raw_event(&self) -> bool {
        self.raw_event
    }

    /// Path parameters extracted by the router.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Replaces the router-extracted path parameters.
    pub fn set_path_params(&mut self, params: Params) {
        self.path_params = params;
    }

    /// Returns an extension value.
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Sets an extension value, returning the previous one.
    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.extensions.insert(key.into(), value)
    }

    /// Removes an extension value.
    pub fn remove_extension(&mut self, key: &str) -> Option<Value> {
        self.extensions.remove(key)
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}
