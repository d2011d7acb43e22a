//! Route-level access control.

use std::collections::BTreeSet;

use crate::error::{InvocationError, InvocationResult};
use crate::identity::Identity;

/// Checks `identity` against the roles a route requires.
///
/// No required set, or an empty one, allows every caller. Otherwise the
/// caller must hold at least one of the required roles.
pub fn enforce(required_roles: Option<&BTreeSet<String>>, identity: &Identity) -> InvocationResult<()> {
    let Some(required) = required_roles.filter(|r| !r.is_empty()) else {
        return Ok(());
    };

    if identity.roles.iter().any(|role| required.contains(role)) {
        Ok(())
    } else {
        tracing::debug!(
            required = ?required,
            held = identity.roles.len(),
            "route access denied"
        );
        Err(InvocationError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[&str]) -> Identity {
        Identity {
            roles: roles.iter().map(ToString::to_string).collect(),
            ..Identity::default()
        }
    }

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_unrestricted_route_allows_anyone() {
        assert!(enforce(None, &identity(&[])).is_ok());
        assert!(enforce(Some(&roles(&[])), &identity(&[])).is_ok());
    }

    #[test]
    fn test_matching_role_allowed() {
        let required = roles(&["ADMIN", "OPS"]);
        assert!(enforce(Some(&required), &identity(&["USER", "OPS"])).is_ok());
    }

    #[test]
    fn test_no_matching_role_forbidden() {
        let required = roles(&["ADMIN"]);
        let err = enforce(Some(&required), &identity(&["USER"])).unwrap_err();
        assert!(matches!(err, InvocationError::Forbidden));
        assert_eq!(err.status_code(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_roles_are_case_sensitive() {
        let required = roles(&["ADMIN"]);
        assert!(enforce(Some(&required), &identity(&["admin"])).is_err());
    }
}
