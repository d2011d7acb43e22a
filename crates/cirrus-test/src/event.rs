//! Test event building.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::Method;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Builder for invocation events.
///
/// HTTP events follow the API gateway proxy shape; RPC events are
/// `{action, payload}` objects; raw events are passed through as given.
///
/// # Example
///
/// ```
/// use cirrus_test::TestEvent;
///
/// let event = TestEvent::get("/dev/users/42")
///     .stage("dev")
///     .header("X-Trace", "abc")
///     .query("verbose", "true")
///     .groups(["ADMIN"])
///     .build();
///
/// assert_eq!(event["httpMethod"], "GET");
/// assert_eq!(event["requestContext"]["stage"], "dev");
/// assert_eq!(event["requestContext"]["authorizer"]["claims"]["cognito:groups"][0], "ADMIN");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TestEvent {
    value: Value,
}

impl TestEvent {
    /// An HTTP event.
    pub fn http(method: Method, path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            value: json!({
                "httpMethod": method.as_str(),
                "path": path,
                "headers": {},
                "queryStringParameters": null,
                "pathParameters": null,
                "requestContext": {},
                "body": null,
                "isBase64Encoded": false,
            }),
        }
    }

    /// A GET event.
    pub fn get(path: impl Into<String>) -> Self {
        Self::http(Method::GET, path)
    }

    /// A POST event.
    pub fn post(path: impl Into<String>) -> Self {
        Self::http(Method::POST, path)
    }

    /// A PUT event.
    pub fn put(path: impl Into<String>) -> Self {
        Self::http(Method::PUT, path)
    }

    /// A PATCH event.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::http(Method::PATCH, path)
    }

    /// A DELETE event.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::http(Method::DELETE, path)
    }

    /// An RPC event with top-level `action` and `payload`.
    pub fn rpc(action: impl Into<String>, payload: Value) -> Self {
        let action: String = action.into();
        Self {
            value: json!({ "action": action, "payload": payload }),
        }
    }

    /// An RPC event carrying `{action, payload}` as a JSON string body.
    pub fn rpc_in_body(action: impl Into<String>, payload: Value) -> Self {
        let action: String = action.into();
        let body = json!({ "action": action, "payload": payload }).to_string();
        Self {
            value: json!({ "body": body }),
        }
    }

    /// A raw platform event.
    pub fn raw(value: Value) -> Self {
        Self { value }
    }

    /// Sets a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.object("headers")
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Sets a query string parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.object("queryStringParameters")
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Sets a gateway path parameter.
    pub fn path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.object("pathParameters")
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Sets a plain-text body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.value["body"] = Value::String(body.into());
        self.value["isBase64Encoded"] = Value::Bool(false);
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let body = serde_json::to_string(value).expect("serializable test body");
        self.body(body).header("Content-Type", "application/json")
    }

    /// Sets a base64-encoded body.
    pub fn base64_body(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.value["body"] = Value::String(STANDARD.encode(bytes));
        self.value["isBase64Encoded"] = Value::Bool(true);
        self
    }

    /// Sets `requestContext.stage`.
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.object("requestContext")
            .insert("stage".to_string(), Value::String(stage.into()));
        self
    }

    /// Replaces the authorizer claims.
    pub fn claims(mut self, claims: Value) -> Self {
        let context = self.object("requestContext");
        context.insert("authorizer".to_string(), json!({ "claims": claims }));
        self
    }

    /// Sets a single authorizer claim.
    pub fn claim(mut self, name: impl Into<String>, value: Value) -> Self {
        let context = self.object("requestContext");
        let authorizer = context
            .entry("authorizer")
            .or_insert_with(|| json!({ "claims": {} }));
        if !authorizer["claims"].is_object() {
            authorizer["claims"] = Value::Object(Map::new());
        }
        if let Some(claims) = authorizer["claims"].as_object_mut() {
            claims.insert(name.into(), value);
        }
        self
    }

    /// Sets `cognito:groups` to `roles`.
    pub fn groups<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<Value> = roles.into_iter().map(|r| Value::String(r.into())).collect();
        self.claim("cognito:groups", Value::Array(roles))
    }

    /// Sets an arbitrary top-level field.
    pub fn field(mut self, name: &str, value: Value) -> Self {
        if let Some(object) = self.value.as_object_mut() {
            object.insert(name.to_string(), value);
        }
        self
    }

    /// Returns the event value.
    #[must_use]
    pub fn build(self) -> Value {
        self.value
    }

    fn object(&mut self, field: &str) -> &mut Map<String, Value> {
        let slot = &mut self.value[field];
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        slot.as_object_mut().expect("slot holds an object")
    }
}

impl From<TestEvent> for Value {
    fn from(event: TestEvent) -> Self {
        event.value
    }
}
