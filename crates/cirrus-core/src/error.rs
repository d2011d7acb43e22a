//! Error types for Cirrus.
//!
//! [`InvocationError`] is the single error type that crosses the dispatcher
//! boundary. Every variant maps to an HTTP status and a machine-readable
//! error code:
//!
//! | Variant | Status | Code |
//! |---|---|---|
//! | `NoActionGiven`, `ActionNotFound`, `Validation` | 400 | `VALIDATION_ERROR` |
//! | `MissingAuthContext` | 401 | `AUTHENTICATION_ERROR` |
//! | `MissingRoleClaim` | 403 | `AUTHORIZATION_ERROR` |
//! | `Forbidden` | 403 | `FORBIDDEN` |
//! | `RouteNotFound` | 500 | `ROUTE_NOT_FOUND` |
//! | `Handler` | declared or 500 | declared or `INTERNAL_ERROR` |
//! | `Internal`, `Context` | 500 | `INTERNAL_ERROR` |
//!
//! An unmatched route is reported as 500, not 404: a request reaching a
//! function whose gateway forwarded it is a deployment mistake.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::execution::ContextError;

/// Result type alias using [`InvocationError`].
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Default error code for errors that do not declare one.
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

/// Categories of errors for classification and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or incomplete input.
    Validation,
    /// Missing or unreadable authentication context.
    Authentication,
    /// Caller lacks a required role.
    Authorization,
    /// No route matched.
    Routing,
    /// Error raised by application code.
    Application,
    /// Internal failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the category name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Routing => "routing",
            Self::Application => "application",
            Self::Internal => "internal",
        }
    }
}

/// An error declared by application code.
///
/// Carries an optional status, code and structured data that are surfaced
/// to the caller after sanitization.
///
/// # Example
///
/// ```
/// use cirrus_core::AppError;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let err = AppError::new("Invalid username")
///     .with_status(StatusCode::BAD_REQUEST)
///     .with_code("INVALID_USERNAME")
///     .with_data(json!({ "field": "username" }));
/// assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    message: String,
    status: Option<StatusCode>,
    code: Option<String>,
    data: Option<Value>,
}

impl AppError {
    /// Creates an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            data: None,
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches structured error data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The declared status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The declared code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The attached data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

/// Standard error type for an invocation.
///
/// The `Display` output is the message shown to callers (subject to
/// sanitization by [`ErrorSanitizer`](crate::ErrorSanitizer)).
#[derive(Error, Debug)]
pub enum InvocationError {
    /// An RPC event carried no action name.
    #[error("No action given")]
    NoActionGiven,

    /// The RPC action is not registered on the controller.
    #[error("Action not found")]
    ActionNotFound {
        /// The requested action.
        action: String,
    },

    /// Input failed validation.
    #[error("{message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Structured details for the caller.
        data: Option<Value>,
    },

    /// The event carries no usable authorizer context.
    #[error("{message}")]
    MissingAuthContext {
        /// Which part of the context was missing.
        message: &'static str,
    },

    /// The configured role claim is absent or malformed.
    #[error("No role claim found in {claim}")]
    MissingRoleClaim {
        /// The configured claim name.
        claim: String,
    },

    /// The caller holds none of the roles the route requires.
    #[error("Unauthorized access (REST)")]
    Forbidden,

    /// No route matched the request.
    #[error(transparent)]
    RouteNotFound(#[from] cirrus_router::RouteNotFound),

    /// Error declared by application code.
    #[error(transparent)]
    Handler(#[from] AppError),

    /// Internal failure.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (never exposed to callers).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The execution context was unavailable.
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl InvocationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            data: None,
        }
    }

    /// Creates a validation error with structured details.
    #[must_use]
    pub fn validation_with_data(message: impl Into<String>, data: Value) -> Self {
        Self::Validation {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates an action-not-found error.
    #[must_use]
    pub fn action_not_found(action: impl Into<String>) -> Self {
        Self::ActionNotFound {
            action: action.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Converts a caught panic payload into an internal error.
    #[must_use]
    pub fn from_panic(stage: &str, payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Internal {
            message: format!("{stage} panicked: {detail}"),
            source: None,
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoActionGiven | Self::ActionNotFound { .. } | Self::Validation { .. } => {
                ErrorCategory::Validation
            }
            Self::MissingAuthContext { .. } => ErrorCategory::Authentication,
            Self::MissingRoleClaim { .. } | Self::Forbidden => ErrorCategory::Authorization,
            Self::RouteNotFound(_) => ErrorCategory::Routing,
            Self::Handler(_) => ErrorCategory::Application,
            Self::Internal { .. } | Self::Context(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoActionGiven | Self::ActionNotFound { .. } | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingAuthContext { .. } => StatusCode::UNAUTHORIZED,
            Self::MissingRoleClaim { .. } | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Handler(err) => err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::RouteNotFound(_) | Self::Internal { .. } | Self::Context(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> String {
        match self {
            Self::NoActionGiven | Self::ActionNotFound { .. } | Self::Validation { .. } => {
                "VALIDATION_ERROR"
            }
            Self::MissingAuthContext { .. } => "AUTHENTICATION_ERROR",
            Self::MissingRoleClaim { .. } => "AUTHORIZATION_ERROR",
            Self::Forbidden => "FORBIDDEN",
            Self::RouteNotFound(_) => "ROUTE_NOT_FOUND",
            Self::Handler(err) => err.code().unwrap_or(INTERNAL_ERROR_CODE),
            Self::Internal { .. } | Self::Context(_) => INTERNAL_ERROR_CODE,
        }
        .to_string()
    }

    /// Returns structured data attached to the error, before sanitization.
    #[must_use]
    pub fn error_data(&self) -> Option<&Value> {
        match self {
            Self::Validation { data, .. } => data.as_ref(),
            Self::Handler(err) => err.data(),
            _ => None,
        }
    }

    /// Returns true for errors surfaced with a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// Wire shape of a surfaced error.
///
/// RPC and raw-event invocations return this object directly; HTTP
/// invocations carry it as the JSON body of the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Message safe to show to the caller.
    pub error_message: String,
    /// Machine-readable code.
    pub error_code: String,
    /// HTTP status.
    pub status_code: u16,
    /// Sanitized structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Value>,
}

impl ErrorEnvelope {
    /// Converts the envelope to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rpc_errors_are_validation() {
        assert_eq!(InvocationError::NoActionGiven.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(InvocationError::NoActionGiven.to_string(), "No action given");

        let err = InvocationError::action_not_found("missing");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Action not found");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_forbidden_message_names_no_roles() {
        let err = InvocationError::Forbidden;
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Unauthorized access (REST)");
    }

    #[test]
    fn test_missing_role_claim_message() {
        let err = InvocationError::MissingRoleClaim {
            claim: "custom:role".to_string(),
        };
        assert_eq!(err.to_string(), "No role claim found in custom:role");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_route_not_found_is_server_error() {
        let err: InvocationError = cirrus_router::RouteNotFound {
            method: http::Method::GET,
            path: "/nope".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Route /nope not found");
        assert_eq!(err.category(), ErrorCategory::Routing);
    }

    #[test]
    fn test_handler_error_defaults() {
        let err: InvocationError = AppError::new("boom").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), INTERNAL_ERROR_CODE);
        assert!(err.error_data().is_none());
    }

    #[test]
    fn test_handler_error_declared_fields() {
        let err: InvocationError = AppError::new("Invalid username")
            .with_status(StatusCode::BAD_REQUEST)
            .with_code("INVALID_INPUT")
            .with_data(json!({ "field": "username" }))
            .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(err.error_data(), Some(&json!({ "field": "username" })));
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_internal_with_source_keeps_message() {
        let err = InvocationError::internal_with_source(
            "database unavailable",
            std::io::Error::new(std::io::ErrorKind::Other, "connection refused"),
        );
        assert_eq!(err.to_string(), "database unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = InvocationError::from_panic("handler", &"boom");
        assert_eq!(err.to_string(), "handler panicked: boom");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = InvocationError::from_panic("setup", &String::from("bad state"));
        assert_eq!(err.to_string(), "setup panicked: bad state");

        let err = InvocationError::from_panic("teardown", &42_u8);
        assert_eq!(err.to_string(), "teardown panicked: non-string panic payload");
    }

    #[test]
    fn test_envelope_serialization_skips_missing_data() {
        let envelope = ErrorEnvelope {
            error_message: "nope".to_string(),
            error_code: "FORBIDDEN".to_string(),
            status_code: 403,
            error_data: None,
        };
        let value = envelope.to_value();
        assert_eq!(value["errorMessage"], "nope");
        assert_eq!(value["statusCode"], 403);
        assert!(value.get("errorData").is_none());
    }
}
