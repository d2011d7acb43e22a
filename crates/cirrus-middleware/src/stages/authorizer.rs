//! Identity resolution from API gateway authorizer claims.
//!
//! The gateway authorizer has already verified the caller's token; this
//! stage only reads the claims it forwarded and stores an [`Identity`] in
//! the execution context, where the dispatcher's ACL check and application
//! code (through [`Auth`]) find it.
//!
//! Non-HTTP invocations and raw events pass through untouched.
//!
//! [`Identity`]: cirrus_core::Identity

use cirrus_core::{resolve_identity, Auth, Event, IdentityOptions, InvocationContext, InvocationResult};
use cirrus_telemetry::Timer;

use crate::middleware::{BoxFuture, Middleware};

/// Middleware that resolves the caller identity of HTTP invocations.
///
/// # Example
///
/// ```
/// use cirrus_middleware::stages::AuthorizerMiddleware;
///
/// let default_claims = AuthorizerMiddleware::new();
/// let custom = AuthorizerMiddleware::with_role_claim("custom:roles");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthorizerMiddleware {
    options: IdentityOptions,
}

impl AuthorizerMiddleware {
    /// Reads roles from `cognito:groups`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads roles from `claim`; a missing claim rejects the invocation.
    #[must_use]
    pub fn with_role_claim(claim: impl Into<String>) -> Self {
        Self {
            options: IdentityOptions::with_role_claim(claim),
        }
    }

    /// Uses the given options.
    #[must_use]
    pub const fn with_options(options: IdentityOptions) -> Self {
        Self { options }
    }

    /// The identity options.
    #[must_use]
    pub const fn options(&self) -> &IdentityOptions {
        &self.options
    }

    fn authorize(&self, event: &Event, ctx: &InvocationContext) -> InvocationResult<()> {
        if ctx.is_raw_event() || !event.is_http() {
            return Ok(());
        }

        let timer = Timer::start("cirrus.auth");
        let identity = resolve_identity(event, &self.options)?;
        tracing::debug!(
            request_id = ctx.request_id(),
            roles = ?identity.roles,
            "identity resolved"
        );
        Auth::set_identity(identity)?;
        timer.finish();
        Ok(())
    }
}

impl Middleware for AuthorizerMiddleware {
    fn name(&self) -> &'static str {
        "authorizer"
    }

    fn setup<'a>(
        &'a self,
        event: &'a mut Event,
        ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<()>> {
        let outcome = self.authorize(event, ctx);
        Box::pin(async move { outcome })
    }
}
