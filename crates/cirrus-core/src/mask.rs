//! Sensitive-data masking for logs and error data.
//!
//! Two operations exist:
//!
//! - masking ([`mask_sensitive_data`], [`mask_text`]) renders data for a
//!   log line with secrets replaced by `********`, card numbers reduced to
//!   their first and last four digits and SSNs blanked
//! - stripping ([`strip_sensitive_fields`]) removes sensitive fields from
//!   structured data before it is returned to a caller

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Replacement for masked values.
pub const MASK: &str = "********";

/// Field names whose values are always masked (compared ignoring ASCII case).
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "pass",
    "token",
    "accessToken",
    "refreshToken",
    "idToken",
    "authorization",
    "apiKey",
    "api_key",
    "x-api-key",
    "secret",
    "secretKey",
    "secret_key",
];

/// Additional fields removed from caller-visible error data.
const STRIPPED_KEYS: &[&str] = &["creditCard", "cardNumber", "ssn"];

fn card_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{4})[- ]?\d{4}[- ]?\d{4}[- ]?(\d{4})\b").expect("valid regex")
    })
}

fn ssn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid regex"))
}

fn json_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let keys = SENSITIVE_KEYS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r#"(?i)"({keys})"\s*:\s*"(?:[^"\\]|\\.)*""#)).expect("valid regex")
    })
}

/// Returns true if `key` names a secret.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn is_stripped_key(key: &str) -> bool {
    is_sensitive_key(key) || STRIPPED_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Masks card numbers, SSNs and quoted secret fields in free text.
#[must_use]
pub fn mask_text(text: &str) -> String {
    let masked = json_field_regex().replace_all(text, |caps: &regex::Captures<'_>| {
        format!("\"{}\":\"{MASK}\"", &caps[1])
    });
    let masked = card_regex().replace_all(&masked, "${1}-****-****-${2}");
    ssn_regex().replace_all(&masked, "***-**-****").into_owned()
}

/// Returns a copy of `value` with secret fields replaced by [`MASK`] and
/// every string run through [`mask_text`].
#[must_use]
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let masked = if is_sensitive_key(key) {
                        Value::String(MASK.to_string())
                    } else {
                        mask_value(v)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_value).collect()),
        Value::String(text) => Value::String(mask_text(text)),
        other => other.clone(),
    }
}

/// Renders `value` for a log line with sensitive data masked.
///
/// `null` renders as an empty string. A string holding serialized JSON is
/// parsed and masked structurally.
#[must_use]
pub fn mask_sensitive_data(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => mask_value(&parsed).to_string(),
            _ => mask_text(text),
        },
        other => mask_value(other).to_string(),
    }
}

/// Returns a copy of `value` without sensitive fields, at any depth.
#[must_use]
pub fn strip_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let stripped: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !is_stripped_key(key))
                .map(|(key, v)| (key.clone(), strip_sensitive_fields(v)))
                .collect();
            Value::Object(stripped)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_sensitive_fields).collect()),
        other => other.clone(),
    }
}
