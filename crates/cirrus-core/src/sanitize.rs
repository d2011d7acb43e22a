//! Outbound error sanitization and inbound payload escaping.

use serde_json::Value;

use crate::error::{ErrorEnvelope, InvocationError};
use crate::mask::{mask_sensitive_data, mask_text, strip_sensitive_fields};

/// Message shown in place of server errors in production.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Converts errors into caller-safe [`ErrorEnvelope`]s.
///
/// Every error is logged in full (after masking) before conversion. In
/// production, server errors (5xx) are reduced to a generic message with no
/// data; client errors (4xx) keep their message, code and sanitized data.
/// Outside production, data is always included after sensitive fields are
/// stripped.
///
/// # Example
///
/// ```
/// use cirrus_core::{ErrorSanitizer, InvocationError};
///
/// let sanitizer = ErrorSanitizer::new(true);
/// let envelope = sanitizer.handle(&InvocationError::internal("db password rejected"));
/// assert_eq!(envelope.error_message, "An unexpected error occurred");
/// assert_eq!(envelope.status_code, 500);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorSanitizer {
    production: bool,
    generic_message: String,
}

impl ErrorSanitizer {
    /// Creates a sanitizer; `production` enables message hiding.
    #[must_use]
    pub fn new(production: bool) -> Self {
        Self {
            production,
            generic_message: GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Overrides the generic server-error message.
    #[must_use]
    pub fn with_generic_message(mut self, message: impl Into<String>) -> Self {
        self.generic_message = message.into();
        self
    }

    /// Returns true when production rules apply.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Logs `error` and builds its envelope.
    #[must_use]
    pub fn handle(&self, error: &InvocationError) -> ErrorEnvelope {
        self.log(error);

        let status = error.status_code();
        let server_error = status.is_server_error();

        let error_message = if self.production && server_error {
            self.generic_message.clone()
        } else {
            error.to_string()
        };

        let error_data = if self.production && server_error {
            None
        } else {
            error.error_data().map(strip_sensitive_fields)
        };

        ErrorEnvelope {
            error_message,
            error_code: error.error_code(),
            status_code: status.as_u16(),
            error_data,
        }
    }

    fn log(&self, error: &InvocationError) {
        let message = mask_text(&error.to_string());
        let data = error.error_data().map(mask_sensitive_data).unwrap_or_default();
        let cause = std::error::Error::source(error)
            .map(|source| mask_text(&source.to_string()))
            .unwrap_or_default();
        let status = error.status_code().as_u16();

        if error.is_server_error() {
            tracing::error!(
                status,
                code = %error.error_code(),
                category = error.category().as_str(),
                data = %data,
                cause = %cause,
                "{message}"
            );
        } else {
            tracing::warn!(
                status,
                code = %error.error_code(),
                category = error.category().as_str(),
                data = %data,
                "{message}"
            );
        }
    }
}

impl Default for ErrorSanitizer {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Escapes inbound RPC payloads.
///
/// Every string, including object keys, is HTML-escaped at every depth.
/// Numbers, booleans and nulls pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadSanitizer;

impl PayloadSanitizer {
    /// Returns the escaped copy of `value`.
    #[must_use]
    pub fn sanitize(&self, value: Value) -> Value {
        sanitize_payload(value)
    }
}

/// Recursively HTML-escapes every string and key of `value`.
#[must_use]
pub fn sanitize_payload(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(html_escape(&text)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_payload).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (html_escape(&key), sanitize_payload(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use http::StatusCode;
    use serde_json::json;

    fn bad_username() -> InvocationError {
        AppError::new("Invalid username")
            .with_status(StatusCode::BAD_REQUEST)
            .with_data(json!({ "field": "username", "password": "hunter2" }))
            .into()
    }

    #[test]
    fn test_development_keeps_server_message_and_data() {
        let err: InvocationError = AppError::new("Something went wrong")
            .with_data(json!({ "user": { "username": "testuser", "password": "secret123" } }))
            .into();
        let envelope = ErrorSanitizer::new(false).handle(&err);

        assert_eq!(envelope.error_message, "Something went wrong");
        assert_eq!(envelope.error_code, "INTERNAL_ERROR");
        assert_eq!(envelope.status_code, 500);
        assert_eq!(
            envelope.error_data,
            Some(json!({ "user": { "username": "testuser" } }))
        );
    }

    #[test]
    fn test_production_hides_server_errors() {
        let err: InvocationError = AppError::new("Database connection failed")
            .with_data(json!({ "host": "db.internal" }))
            .into();
        let envelope = ErrorSanitizer::new(true).handle(&err);

        assert_eq!(envelope.error_message, GENERIC_ERROR_MESSAGE);
        assert_eq!(envelope.error_code, "INTERNAL_ERROR");
        assert!(envelope.error_data.is_none());
    }

    #[test]
    fn test_production_keeps_client_errors() {
        let envelope = ErrorSanitizer::new(true).handle(&bad_username());

        assert_eq!(envelope.error_message, "Invalid username");
        assert_eq!(envelope.status_code, 400);
        assert_eq!(envelope.error_data, Some(json!({ "field": "username" })));
    }

    #[test]
    fn test_custom_generic_message() {
        let sanitizer = ErrorSanitizer::new(true).with_generic_message("Try again later");
        let envelope = sanitizer.handle(&InvocationError::internal("boom"));
        assert_eq!(envelope.error_message, "Try again later");
    }

    #[test]
    fn test_route_not_found_hidden_in_production() {
        let err: InvocationError = cirrus_router::RouteNotFound {
            method: http::Method::GET,
            path: "/admin".to_string(),
        }
        .into();

        let dev = ErrorSanitizer::new(false).handle(&err);
        assert_eq!(dev.error_message, "Route /admin not found");

        let prod = ErrorSanitizer::new(true).handle(&err);
        assert_eq!(prod.error_message, GENERIC_ERROR_MESSAGE);
        assert_eq!(prod.error_code, "ROUTE_NOT_FOUND");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_sanitize_payload_escapes_keys_and_values() {
        let sanitized = PayloadSanitizer.sanitize(json!({
            "key<script>": "value<script>",
            "nested": { "list": ["<b>", 1, null, true] },
            "n": 123
        }));

        assert_eq!(
            sanitized,
            json!({
                "key&lt;script&gt;": "value&lt;script&gt;",
                "nested": { "list": ["&lt;b&gt;", 1, null, true] },
                "n": 123
            })
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_sanitized_strings_contain_no_markup(text in ".*") {
                let mut map = serde_json::Map::new();
                map.insert(text.clone(), Value::String(text.clone()));
                let sanitized = sanitize_payload(Value::Object(map));
                let obj = sanitized.as_object().unwrap();
                prop_assert_eq!(obj.len(), 1);
                for (key, value) in obj {
                    prop_assert!(!key.contains('<') && !key.contains('>'));
                    let s = value.as_str().unwrap();
                    prop_assert!(!s.contains('<') && !s.contains('>'));
                    prop_assert_eq!(key.as_str(), s);
                }
            }

            #[test]
            fn prop_plain_text_is_untouched(text in "[A-Za-z0-9 _.,-]*") {
                prop_assert_eq!(sanitize_payload(Value::String(text.clone())), Value::String(text));
            }
        }
    }
}
