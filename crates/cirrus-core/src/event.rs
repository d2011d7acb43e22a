//! The raw invocation event.
//!
//! Events arrive as arbitrary JSON. An [`Event`] keeps the original value and
//! offers typed views for the two shapes the dispatcher understands: API
//! gateway HTTP events and internal RPC calls.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::{InvocationError, InvocationResult};

/// How an event is classified by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// API gateway HTTP request.
    Http,
    /// Internal `{action, payload}` call.
    Rpc,
    /// Arbitrary platform event passed through unmodified.
    Raw,
}

impl InvocationMode {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Rpc => "rpc",
            Self::Raw => "raw",
        }
    }
}

/// An RPC call resolved from an event.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    /// Name of the action to invoke.
    pub action: String,
    /// Unsanitized payload (`null` when absent).
    pub payload: Value,
}

/// A raw invocation event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event(Value);

impl Event {
    /// Wraps a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Mutable access for middleware that rewrites the event.
    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// Unwraps the underlying value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn object_field(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    /// The `httpMethod` field. Its presence makes the event an HTTP event.
    #[must_use]
    pub fn http_method(&self) -> Option<&str> {
        self.str_field("httpMethod")
    }

    /// Returns true when the event looks like an API gateway request.
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.http_method().is_some()
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.str_field("path")
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.object_field("headers")
    }

    /// Looks up a header by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_str())
    }

    /// The raw body string.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.str_field("body")
    }

    /// Whether the gateway base64-encoded the body.
    #[must_use]
    pub fn is_base64_encoded(&self) -> bool {
        self.0
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The body as text, decoding base64 when flagged.
    pub fn decoded_body(&self) -> InvocationResult<Option<String>> {
        let Some(body) = self.body() else {
            return Ok(None);
        };
        if !self.is_base64_encoded() {
            return Ok(Some(body.to_string()));
        }
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| InvocationError::validation(format!("Invalid base64 body: {e}")))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| InvocationError::validation("Body is not valid UTF-8"))
    }

    /// The body parsed as JSON, or an empty object when it is missing or
    /// malformed.
    #[must_use]
    pub fn json_body(&self) -> Value {
        self.decoded_body()
            .ok()
            .flatten()
            .map_or_else(empty_object, |body| safe_json_parse(&body, empty_object()))
    }

    /// The `queryStringParameters` map.
    #[must_use]
    pub fn query_params(&self) -> Option<&Map<String, Value>> {
        self.object_field("queryStringParameters")
    }

    /// A single query string parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params()?.get(name).and_then(Value::as_str)
    }

    /// A gateway-supplied `pathParameters` entry.
    #[must_use]
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.object_field("pathParameters")?
            .get(name)
            .and_then(Value::as_str)
    }

    /// The `requestContext` object.
    #[must_use]
    pub fn request_context(&self) -> Option<&Map<String, Value>> {
        self.object_field("requestContext")
    }

    /// The deployment stage from `requestContext.stage`.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.request_context()?.get("stage").and_then(Value::as_str)
    }

    /// Resolves `{action, payload}` from the JSON body, falling back to
    /// top-level event fields.
    ///
    /// Fails with [`InvocationError::NoActionGiven`] when neither source
    /// names a non-empty action.
    pub fn rpc_call(&self) -> InvocationResult<RpcCall> {
        let from_body = self
            .body()
            .and_then(|body| serde_json::from_str::<Value>(body).ok())
            .filter(Value::is_object);
        let source = from_body.as_ref().unwrap_or(&self.0);

        let action = source
            .get("action")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .ok_or(InvocationError::NoActionGiven)?;

        Ok(RpcCall {
            action: action.to_string(),
            payload: source.get("payload").cloned().unwrap_or(Value::Null),
        })
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        event.0
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Parses `text` as JSON, returning `default` on failure.
#[must_use]
pub fn safe_json_parse(text: &str, default: Value) -> Value {
    serde_json::from_str(text).unwrap_or(default)
}
