//! Helpers for running code inside an execution context.
//!
//! Handlers and middleware that read [`ExecutionContext`] can be unit tested
//! without a dispatcher by wrapping the call in one of these.

use std::future::Future;

use cirrus_core::{ContextSeed, ExecutionContext, Identity, IDENTITY_KEY};

/// Runs `future` inside a scope seeded with `seed`.
pub async fn with_context<F: Future>(seed: ContextSeed, future: F) -> F::Output {
    ExecutionContext::run_scoped_with(seed, future).await
}

/// Runs `future` inside a scope where `identity` is already resolved.
pub async fn with_identity<F: Future>(identity: Identity, future: F) -> F::Output {
    with_context(ContextSeed::new().with(IDENTITY_KEY, identity), future).await
}

/// Builds an identity holding `roles`.
pub fn identity_with_roles<I, S>(roles: I) -> Identity
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Identity {
        roles: roles.into_iter().map(Into::into).collect(),
        ..Identity::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::Auth;

    #[tokio::test]
    async fn test_with_identity() {
        let roles = with_identity(identity_with_roles(["ADMIN"]), async { Auth::roles() }).await;
        assert_eq!(roles, Ok(vec!["ADMIN".to_string()]));
    }

    #[tokio::test]
    async fn test_with_context_seed() {
        let seed = ContextSeed::new().with("tenant", "acme".to_string());
        let tenant = with_context(seed, async { ExecutionContext::get::<String>("tenant") }).await;
        assert_eq!(tenant, Ok(Some("acme".to_string())));
        assert!(!ExecutionContext::is_active());
    }
}
