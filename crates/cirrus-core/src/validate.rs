//! Declarative payload validation.
//!
//! A [`PayloadSchema`] lists the fields an RPC payload (or JSON body) may
//! carry and the rule each one follows. Checking stops at nothing: every
//! violation is collected, the first one becomes the error message and the
//! full list is attached as `errorData`.
//!
//! # Example
//!
//! ```
//! use cirrus_core::validate::{FieldRule, PayloadSchema};
//! use serde_json::json;
//!
//! let schema = PayloadSchema::new()
//!     .field("name", FieldRule::string().required())
//!     .field("age", FieldRule::integer().min(0.0).max(150.0));
//!
//! assert!(schema.validate(&json!({ "name": "Ada", "age": 36 })).is_ok());
//!
//! let err = schema.validate(&json!({ "age": 200 })).unwrap_err();
//! assert_eq!(err.to_string(), "\"name\" is required");
//! assert_eq!(err.error_data().unwrap()["field"], "name");
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{InvocationError, InvocationResult};

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value.
    Any,
    /// A string; bounds apply to its length in characters.
    String,
    /// Any number; bounds apply to its value.
    Number,
    /// A whole number; bounds apply to its value.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array; bounds apply to its length.
    Array,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Any => "a value",
            Self::String => "a string",
            Self::Number => "a number",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::Object => "of type object",
            Self::Array => "an array",
        }
    }
}

/// The rule for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldRule {
    const fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            min: None,
            max: None,
        }
    }

    /// Any value.
    #[must_use]
    pub const fn any() -> Self {
        Self::of(FieldKind::Any)
    }

    /// A string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldKind::String)
    }

    /// A numeric field.
    #[must_use]
    pub const fn number() -> Self {
        Self::of(FieldKind::Number)
    }

    /// An integer field.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    /// A boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    /// An object field.
    #[must_use]
    pub const fn object() -> Self {
        Self::of(FieldKind::Object)
    }

    /// An array field.
    #[must_use]
    pub const fn array() -> Self {
        Self::of(FieldKind::Array)
    }

    /// The field must be present and not null.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    fn check(&self, name: &str, value: Option<&Value>) -> Option<FieldViolation> {
        let violation = |message: String| {
            Some(FieldViolation {
                field: name.to_string(),
                message,
            })
        };

        let value = match value {
            None | Some(Value::Null) if self.required => {
                return violation(format!("\"{name}\" is required"));
            }
            None | Some(Value::Null) => return None,
            Some(value) => value,
        };

        if !self.kind.accepts(value) {
            return violation(format!("\"{name}\" must be {}", self.kind.describe()));
        }

        let (measure, unit) = match (self.kind, value) {
            (FieldKind::String, Value::String(text)) => (text.chars().count() as f64, Some("characters")),
            (FieldKind::Array, Value::Array(items)) => (items.len() as f64, Some("items")),
            (FieldKind::Number | FieldKind::Integer, Value::Number(n)) => (n.as_f64()?, None),
            _ => return None,
        };

        if let Some(min) = self.min.filter(|min| measure < *min) {
            return violation(match unit {
                Some(unit) => format!("\"{name}\" must contain at least {min} {unit}"),
                None => format!("\"{name}\" must be greater than or equal to {min}"),
            });
        }
        if let Some(max) = self.max.filter(|max| measure > *max) {
            return violation(match unit {
                Some(unit) => format!("\"{name}\" must contain at most {max} {unit}"),
                None => format!("\"{name}\" must be less than or equal to {max}"),
            });
        }
        None
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Field name.
    pub field: String,
    /// Caller-facing message.
    pub message: String,
}

/// Field rules for an object payload.
///
/// Fields not listed are rejected unless [`allow_unknown`](Self::allow_unknown)
/// is set. A null payload is checked as an empty object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadSchema {
    fields: Vec<(String, FieldRule)>,
    allow_unknown: bool,
}

impl PayloadSchema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field rule.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    /// Accepts fields the schema does not list.
    #[must_use]
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Lists every violation in `payload`, in field order.
    #[must_use]
    pub fn violations(&self, payload: &Value) -> Vec<FieldViolation> {
        let empty = Map::new();
        let object = match payload {
            Value::Object(object) => object,
            Value::Null => &empty,
            _ => {
                return vec![FieldViolation {
                    field: "value".to_string(),
                    message: "\"value\" must be of type object".to_string(),
                }]
            }
        };

        let mut violations: Vec<FieldViolation> = self
            .fields
            .iter()
            .filter_map(|(name, rule)| rule.check(name, object.get(name)))
            .collect();

        if !self.allow_unknown {
            violations.extend(
                object
                    .keys()
                    .filter(|key| !self.fields.iter().any(|(name, _)| name == *key))
                    .map(|key| FieldViolation {
                        field: key.clone(),
                        message: format!("\"{key}\" is not allowed"),
                    }),
            );
        }

        violations
    }

    /// Checks `payload`, failing with a 400 [`InvocationError::Validation`].
    ///
    /// The error message is the first violation; `errorData` carries its
    /// `field` and the full `validationErrors` list.
    pub fn validate(&self, payload: &Value) -> InvocationResult<()> {
        let violations = self.violations(payload);
        let Some(first) = violations.first() else {
            return Ok(());
        };

        tracing::debug!(
            field = %first.field,
            violations = violations.len(),
            "payload rejected"
        );

        Err(InvocationError::validation_with_data(
            first.message.clone(),
            json!({
                "field": first.field,
                "validationErrors": violations,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> PayloadSchema {
        PayloadSchema::new()
            .field("username", FieldRule::string().required().min(3.0))
            .field("age", FieldRule::integer().min(0.0).max(150.0))
            .field("tags", FieldRule::array().max(2.0))
    }

    #[test]
    fn test_valid_payload() {
        let schema = user_schema();
        assert!(schema
            .validate(&json!({ "username": "ada", "age": 36, "tags": ["a"] }))
            .is_ok());
        assert!(schema.validate(&json!({ "username": "ada", "age": null })).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let err = user_schema().validate(&json!({ "age": 3 })).unwrap_err();

        assert_eq!(err.to_string(), "\"username\" is required");
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(err.error_data().unwrap()["field"], "username");
    }

    #[test]
    fn test_null_payload_checked_as_empty_object() {
        let violations = user_schema().violations(&Value::Null);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "username");
    }

    #[test]
    fn test_type_and_bounds() {
        let violations = user_schema().violations(&json!({
            "username": "al",
            "age": 3.5,
            "tags": ["a", "b", "c"]
        }));
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();

        assert_eq!(
            messages,
            vec![
                "\"username\" must contain at least 3 characters",
                "\"age\" must be an integer",
                "\"tags\" must contain at most 2 items",
            ]
        );
    }

    #[test]
    fn test_number_bounds() {
        let schema = PayloadSchema::new().field("age", FieldRule::integer().min(0.0).max(150.0));
        let err = schema.validate(&json!({ "age": 200 })).unwrap_err();
        assert_eq!(err.to_string(), "\"age\" must be less than or equal to 150");

        let err = schema.validate(&json!({ "age": -1 })).unwrap_err();
        assert_eq!(err.to_string(), "\"age\" must be greater than or equal to 0");
    }

    #[test]
    fn test_unknown_fields() {
        let schema = PayloadSchema::new().field("name", FieldRule::any());
        let err = schema.validate(&json!({ "name": 1, "admin": true })).unwrap_err();
        assert_eq!(err.to_string(), "\"admin\" is not allowed");

        assert!(schema
            .allow_unknown()
            .validate(&json!({ "name": 1, "admin": true }))
            .is_ok());
    }

    #[test]
    fn test_non_object_payload() {
        let err = user_schema().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "\"value\" must be of type object");
    }

    #[test]
    fn test_all_violations_reported() {
        let err = user_schema()
            .validate(&json!({ "age": "old", "extra": 1 }))
            .unwrap_err();
        let data = err.error_data().unwrap();

        assert_eq!(data["field"], "username");
        assert_eq!(data["validationErrors"].as_array().unwrap().len(), 3);
        assert_eq!(data["validationErrors"][2]["field"], "extra");
    }
}
