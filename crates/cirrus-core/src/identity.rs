//! Caller identity resolved from authorizer claims.
//!
//! API gateway authorizers place the verified token claims under
//! `requestContext.authorizer.claims`. [`resolve_identity`] turns those
//! claims into an [`Identity`] once per invocation; [`Auth`] reads and
//! augments the identity held in the execution context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{InvocationError, InvocationResult};
use crate::event::Event;
use crate::execution::{ContextError, ExecutionContext};

/// Execution-context key holding the resolved [`Identity`].
pub const IDENTITY_KEY: &str = "cirrus.identity";

/// Claim read for roles when no role claim is configured.
pub const DEFAULT_GROUPS_CLAIM: &str = "cognito:groups";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Subject identifier (`sub`).
    pub subject_id: Option<String>,
    /// Username (`cognito:username` or `username`).
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Roles in claim order.
    pub roles: Vec<String>,
    /// Custom attributes added by middleware.
    pub attributes: HashMap<String, Value>,
}

impl Identity {
    /// Returns true if the identity holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Options for [`resolve_identity`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOptions {
    /// Claim to read roles from instead of `cognito:groups`.
    pub role_claim: Option<String>,
}

impl IdentityOptions {
    /// Reads roles from `claim`.
    #[must_use]
    pub fn with_role_claim(claim: impl Into<String>) -> Self {
        Self {
            role_claim: Some(claim.into()),
        }
    }
}

/// Builds an [`Identity`] from the authorizer claims of `event`.
pub fn resolve_identity(event: &Event, options: &IdentityOptions) -> InvocationResult<Identity> {
    let request_context = event
        .request_context()
        .ok_or(InvocationError::MissingAuthContext {
            message: "No requestContext found",
        })?;
    let authorizer = request_context
        .get("authorizer")
        .and_then(Value::as_object)
        .ok_or(InvocationError::MissingAuthContext {
            message: "No authorizer found",
        })?;
    let claims = authorizer
        .get("claims")
        .and_then(Value::as_object)
        .ok_or(InvocationError::MissingAuthContext {
            message: "No claims found",
        })?;

    let roles = match &options.role_claim {
        Some(claim) => claims
            .get(claim)
            .and_then(normalize_roles)
            .ok_or_else(|| InvocationError::MissingRoleClaim {
                claim: claim.clone(),
            })?,
        None => claims
            .get(DEFAULT_GROUPS_CLAIM)
            .and_then(normalize_roles)
            .unwrap_or_default(),
    };

    Ok(Identity {
        subject_id: claim_str(claims, "sub"),
        username: claim_str(claims, "cognito:username").or_else(|| claim_str(claims, "username")),
        email: claim_str(claims, "email"),
        roles,
        attributes: HashMap::new(),
    })
}

fn claim_str(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Normalizes a role claim into a list.
///
/// Accepts a single role, a comma-separated list, a JSON-encoded array,
/// the bracketed space-separated form some gateways produce, or a native
/// array. Returns `None` for any other shape.
#[must_use]
pub fn normalize_roles(claim: &Value) -> Option<Vec<String>> {
    match claim {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
                    return normalize_roles(&Value::Array(items));
                }
                let inner = text.trim_start_matches('[').trim_end_matches(']');
                return Some(split_roles(inner, |c: char| c == ',' || c.is_whitespace()));
            }
            Some(split_roles(text, |c: char| c == ','))
        }
        _ => None,
    }
}

fn split_roles(text: &str, separator: impl Fn(char) -> bool) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Access to the identity of the current invocation.
///
/// All accessors read the [`ExecutionContext`], so they only work inside
/// an invocation scope.
#[derive(Debug, Clone, Copy)]
pub struct Auth;

impl Auth {
    /// Stores `identity` for the current invocation.
    pub fn set_identity(identity: Identity) -> Result<(), ContextError> {
        ExecutionContext::set(IDENTITY_KEY, identity)
    }

    /// The resolved identity, if an authorizer ran.
    pub fn identity() -> Result<Option<Identity>, ContextError> {
        ExecutionContext::get(IDENTITY_KEY)
    }

    /// The caller's roles, empty when no identity was resolved.
    pub fn roles() -> Result<Vec<String>, ContextError> {
        Ok(Self::identity()?.map(|i| i.roles).unwrap_or_default())
    }

    /// Reads a custom attribute.
    pub fn attribute(key: &str) -> Result<Option<Value>, ContextError> {
        Ok(Self::identity()?.and_then(|i| i.attributes.get(key).cloned()))
    }

    /// Adds or replaces a custom attribute on the identity.
    ///
    /// Fails with [`ContextError::MissingValue`] when no identity exists.
    pub fn set_attribute(key: impl Into<String>, value: Value) -> Result<(), ContextError> {
        let mut identity: Identity = ExecutionContext::require(IDENTITY_KEY)?;
        identity.attributes.insert(key.into(), value);
        Self::set_identity(identity)
    }
}
