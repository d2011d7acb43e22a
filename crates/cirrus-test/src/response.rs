//! Test response wrapper.

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A dispatcher response with helpers for assertions.
///
/// Works for both HTTP envelopes (`{statusCode, headers, body}`) and plain
/// RPC/raw values. Error accessors read the error envelope from the HTTP
/// body or from the value itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResponse {
    value: Value,
}

impl TestResponse {
    /// Wraps a response value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The raw response value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns true for an API gateway envelope.
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.value.get("statusCode").is_some_and(Value::is_u64)
            && self.value.get("body").is_some_and(Value::is_string)
    }

    /// The HTTP status, or the `statusCode` of an RPC error envelope.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.value
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
    }

    /// Gets an HTTP response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.value
            .get("headers")?
            .as_object()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_str())
    }

    /// The HTTP body text.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::NotHttp`] for non-HTTP responses.
    pub fn text(&self) -> Result<&str, TestError> {
        if !self.is_http() {
            return Err(TestError::NotHttp(self.value.to_string()));
        }
        self.value["body"]
            .as_str()
            .ok_or_else(|| TestError::NotHttp(self.value.to_string()))
    }

    /// The decoded payload: the parsed HTTP body, or the value itself.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP body is not valid JSON.
    pub fn json_value(&self) -> Result<Value, TestError> {
        if self.is_http() {
            Ok(serde_json::from_str(self.text()?)?)
        } else {
            Ok(self.value.clone())
        }
    }

    /// Deserializes the payload.
    ///
    /// # Errors
    ///
    /// Fails if the payload does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_value(self.json_value()?)?)
    }

    /// The error envelope carried by this response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::NotError`] when the payload has no
    /// `errorMessage`.
    pub fn error(&self) -> Result<Value, TestError> {
        let payload = self.json_value()?;
        if payload.get("errorMessage").is_some() {
            Ok(payload)
        } else {
            Err(TestError::NotError(payload.to_string()))
        }
    }

    /// The `errorMessage` of the error envelope, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error_field("errorMessage")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// The `errorCode` of the error envelope, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        self.error_field("errorCode")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// The `errorData` of the error envelope, if any.
    #[must_use]
    pub fn error_data(&self) -> Option<Value> {
        self.error_field("errorData")
    }

    fn error_field(&self, name: &str) -> Option<Value> {
        self.error().ok()?.get(name).cloned()
    }

    // Assertion methods

    /// Asserts the HTTP status.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: u16) -> &Self {
        let actual = self.status().map(|s| s.as_u16());
        assert_eq!(
            actual,
            Some(expected),
            "Expected status {expected}, got {actual:?} in {}",
            self.value
        );
        self
    }

    /// Asserts a response header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}': expected '{expected}', got '{actual}'");
        self
    }

    /// Asserts the error code.
    ///
    /// # Panics
    ///
    /// Panics if the response carries no error or the code differs.
    pub fn assert_error_code(&self, expected: &str) -> &Self {
        let actual = self.error_code();
        assert_eq!(
            actual.as_deref(),
            Some(expected),
            "Expected error code {expected} in {}",
            self.value
        );
        self
    }

    /// Asserts the decoded payload.
    ///
    /// # Panics
    ///
    /// Panics if the payload cannot be decoded or differs.
    pub fn assert_json(&self, expected: &Value) -> &Self {
        let actual = self.json_value().expect("decodable payload");
        assert_eq!(&actual, expected, "Payload mismatch");
        self
    }
}

impl From<Value> for TestResponse {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
