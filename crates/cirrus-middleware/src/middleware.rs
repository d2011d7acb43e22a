//! Core middleware trait.
//!
//! A middleware contributes two hooks to every invocation:
//!
//! - `setup` runs before the handler, in registration order. It may rewrite
//!   the event and the invocation metadata. An error stops the remaining
//!   setups and the handler.
//! - `teardown` runs after the handler (or after a failed setup), in reverse
//!   registration order. It sees the current result and error and may
//!   replace the result.
//!
//! # Example
//!
//! ```
//! use cirrus_core::{Event, InvocationContext, InvocationError, InvocationResult};
//! use cirrus_middleware::{BoxFuture, Middleware};
//! use serde_json::{json, Value};
//!
//! struct Envelope;
//!
//! impl Middleware for Envelope {
//!     fn name(&self) -> &'static str {
//!         "envelope"
//!     }
//!
//!     fn teardown<'a>(
//!         &'a self,
//!         _event: &'a Event,
//!         _ctx: &'a mut InvocationContext,
//!         result: &'a Value,
//!         _error: Option<&'a InvocationError>,
//!     ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
//!         Box::pin(async move { Ok(Some(json!({ "data": result }))) })
//!     }
//! }
//! ```

use cirrus_core::{Event, InvocationContext, InvocationError, InvocationResult};
use serde_json::Value;

pub use cirrus_core::BoxFuture;

/// The core middleware trait.
///
/// Both hooks default to no-ops, so a middleware implements only what it
/// needs.
///
/// # Invariants
///
/// - `teardown` runs for every registered middleware on every invocation,
///   including middleware whose `setup` never ran
/// - A `teardown` error is logged and does not stop the remaining teardowns
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Runs before the handler.
    fn setup<'a>(
        &'a self,
        event: &'a mut Event,
        ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<()>> {
        let _ = (event, ctx);
        Box::pin(async { Ok(()) })
    }

    /// Runs after the handler.
    ///
    /// Returning `Some(value)` replaces the result passed to the next
    /// teardown and, eventually, to the caller.
    fn teardown<'a>(
        &'a self,
        event: &'a Event,
        ctx: &'a mut InvocationContext,
        result: &'a Value,
        error: Option<&'a InvocationError>,
    ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
        let _ = (event, ctx, result, error);
        Box::pin(async { Ok(None) })
    }
}

/// A setup-only middleware built from a synchronous closure.
///
/// ```
/// use cirrus_core::{Event, InvocationContext};
/// use cirrus_middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new("tag", |_event: &mut Event, ctx: &mut InvocationContext| {
///     ctx.set_extension("tagged", serde_json::json!(true));
///     Ok(())
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut Event, &mut InvocationContext) -> InvocationResult<()> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Event, &mut InvocationContext) -> InvocationResult<()> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn setup<'a>(
        &'a self,
        event: &'a mut Event,
        ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<()>> {
        let outcome = (self.func)(event, ctx);
        Box::pin(async move { outcome })
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}
