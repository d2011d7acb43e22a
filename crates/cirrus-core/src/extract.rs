//! Request value extraction for HTTP handlers.
//!
//! | Function | Source |
//! |---|---|
//! | [`path_param`] / [`path_param_as`] | router params, then gateway `pathParameters` |
//! | [`query_param`] / [`query_param_as`] | `queryStringParameters` |
//! | [`query_params`] | whole query map |
//! | [`body`] / [`body_value`] | JSON body, base64-decoded when flagged |
//! | [`validated_body`] | JSON body checked against a [`PayloadSchema`] first |
//!
//! Missing values yield `None`; values that fail to convert yield a 400
//! [`InvocationError::Validation`] naming the field.

use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{InvocationError, InvocationResult};
use crate::event::Event;
use crate::invocation::InvocationContext;
use crate::validate::PayloadSchema;

/// A path parameter, preferring the router's match over the gateway's.
#[must_use]
pub fn path_param(event: &Event, context: &InvocationContext, name: &str) -> Option<String> {
    context
        .path_params()
        .get(name)
        .or_else(|| event.path_parameter(name))
        .map(str::to_string)
}

/// A path parameter converted with [`FromStr`].
pub fn path_param_as<T>(
    event: &Event,
    context: &InvocationContext,
    name: &str,
) -> InvocationResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    path_param(event, context, name)
        .map(|raw| convert(name, &raw))
        .transpose()
}

/// A query string parameter.
#[must_use]
pub fn query_param(event: &Event, name: &str) -> Option<String> {
    event.query_param(name).map(str::to_string)
}

/// A query string parameter converted with [`FromStr`].
pub fn query_param_as<T>(event: &Event, name: &str) -> InvocationResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    event
        .query_param(name)
        .map(|raw| convert(name, raw))
        .transpose()
}

/// All string-valued query parameters.
#[must_use]
pub fn query_params(event: &Event) -> HashMap<String, String> {
    event
        .query_params()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// The JSON body, or `{}` when missing or malformed.
#[must_use]
pub fn body_value(event: &Event) -> Value {
    event.json_body()
}

/// The JSON body deserialized into `T`.
///
/// A missing or malformed body is treated as `{}`, so `T` decides whether
/// that is acceptable.
pub fn body<T: DeserializeOwned>(event: &Event) -> InvocationResult<T> {
    serde_json::from_value(event.json_body()).map_err(|e| {
        InvocationError::validation_with_data(
            "Invalid request body",
            json!({ "validationErrors": [e.to_string()] }),
        )
    })
}

/// The JSON body checked against `schema`, then deserialized into `T`.
///
/// Schema violations are reported with the offending field in
/// `errorData.field` before serde sees the body.
pub fn validated_body<T: DeserializeOwned>(
    event: &Event,
    schema: &PayloadSchema,
) -> InvocationResult<T> {
    schema.validate(&event.json_body())?;
    body(event)
}

fn convert<T>(name: &str, raw: &str) -> InvocationResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        InvocationError::validation_with_data(
            format!("Invalid value for parameter '{name}'"),
            json!({ "field": name, "reason": e.to_string() }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_router::Params;
    use serde::Deserialize;

    fn event() -> Event {
        Event::new(json!({
            "httpMethod": "GET",
            "path": "/users/42",
            "pathParameters": { "id": "from-gateway", "org": "acme" },
            "queryStringParameters": { "age": "30", "name": "bob", "bad": "x1" },
            "body": "{\"name\":\"alice\",\"age\":7}"
        }))
    }

    fn context_with_id(id: &str) -> InvocationContext {
        let mut ctx = InvocationContext::new();
        let mut params = Params::new();
        params.push("id", id);
        ctx.set_path_params(params);
        ctx
    }

    #[test]
    fn test_router_params_take_precedence() {
        let ctx = context_with_id("42");
        assert_eq!(path_param(&event(), &ctx, "id").as_deref(), Some("42"));
        assert_eq!(path_param(&event(), &ctx, "org").as_deref(), Some("acme"));
        assert_eq!(path_param(&event(), &ctx, "missing"), None);
    }

    #[test]
    fn test_path_param_transform() {
        let ctx = context_with_id("42");
        assert_eq!(path_param_as::<u64>(&event(), &ctx, "id").unwrap(), Some(42));
        assert_eq!(path_param_as::<u64>(&event(), &ctx, "missing").unwrap(), None);
    }

    #[test]
    fn test_path_param_transform_failure() {
        let ctx = context_with_id("abc");
        let err = path_param_as::<u64>(&event(), &ctx, "id").unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error_data().unwrap()["field"], "id");
    }

    #[test]
    fn test_query_params() {
        let event = event();
        assert_eq!(query_param(&event, "name").as_deref(), Some("bob"));
        assert_eq!(query_param_as::<u32>(&event, "age").unwrap(), Some(30));
        assert_eq!(query_param_as::<u32>(&event, "none").unwrap(), None);
        assert!(query_param_as::<u32>(&event, "bad").is_err());
        assert_eq!(query_params(&event).len(), 3);
    }

    #[test]
    fn test_query_params_absent() {
        let event = Event::new(json!({ "httpMethod": "GET" }));
        assert!(query_params(&event).is_empty());
    }

    #[test]
    fn test_typed_body() {
        #[derive(Deserialize)]
        struct Person {
            name: String,
            age: u8,
        }

        let person: Person = body(&event()).unwrap();
        assert_eq!(person.name, "alice");
        assert_eq!(person.age, 7);
    }

    #[test]
    fn test_validated_body() {
        use crate::validate::FieldRule;

        #[derive(Debug, Deserialize)]
        struct Person {
            name: String,
        }

        let schema = PayloadSchema::new()
            .field("name", FieldRule::string().required())
            .field("age", FieldRule::integer().max(5.0));

        let err = validated_body::<Person>(&event(), &schema).unwrap_err();
        assert_eq!(err.to_string(), "\"age\" must be less than or equal to 5");
        assert_eq!(err.error_data().unwrap()["field"], "age");

        let relaxed = PayloadSchema::new()
            .field("name", FieldRule::string().required())
            .allow_unknown();
        let person: Person = validated_body(&event(), &relaxed).unwrap();
        assert_eq!(person.name, "alice");
    }

    #[test]
    fn test_typed_body_validation_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            email: String,
        }

        let err = body::<Strict>(&event()).unwrap_err();
        assert!(matches!(err, InvocationError::Validation { .. }));
        assert!(err.error_data().unwrap()["validationErrors"].is_array());
    }
}
