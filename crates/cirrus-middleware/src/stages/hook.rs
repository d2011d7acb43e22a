//! Opaque per-invocation lifecycle hooks.
//!
//! Resources that live for exactly one invocation (a tracing segment, a
//! pooled connection checkout, a scratch directory) implement
//! [`InvocationHook`]. [`HookMiddleware`] calls `start` during setup and
//! hands the resulting handle back to `stop` during teardown. The handle
//! is parked in the execution context under a key unique to the
//! middleware instance, so neither concurrent invocations nor two hooks
//! sharing a name see each other's handles.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cirrus_core::{
    Event, ExecutionContext, InvocationContext, InvocationError, InvocationResult,
};
use parking_lot::Mutex;
use serde_json::Value;

use crate::middleware::{BoxFuture, Middleware};

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(0);

/// A start/stop pair bracketing one invocation.
pub trait InvocationHook: Send + Sync + 'static {
    /// State carried from `start` to `stop`.
    type Handle: Send + 'static;

    /// Name used for logs and the context key.
    fn name(&self) -> &'static str;

    /// Called before the handler.
    fn start(&self, event: &Event, ctx: &InvocationContext) -> InvocationResult<Self::Handle>;

    /// Called after the handler with the invocation's error, if any.
    fn stop(&self, handle: Self::Handle, error: Option<&InvocationError>);
}

type Slot<H> = Arc<Mutex<Option<H>>>;

/// Adapts an [`InvocationHook`] into a [`Middleware`].
///
/// `stop` is only called when `start` succeeded for this invocation. A
/// disabled hook stays in the chain but never starts.
pub struct HookMiddleware<H: InvocationHook> {
    hook: H,
    key: String,
    enabled: bool,
    _handle: PhantomData<fn() -> H::Handle>,
}

impl<H: InvocationHook> HookMiddleware<H> {
    /// Wraps `hook`.
    pub fn new(hook: H) -> Self {
        let id = NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed);
        let key = format!("cirrus.hook.{}.{id}", hook.name());
        Self {
            hook,
            key,
            enabled: true,
            _handle: PhantomData,
        }
    }

    /// Enables or disables the hook.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns true if the hook runs.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn begin(&self, event: &Event, ctx: &InvocationContext) -> InvocationResult<()> {
        if !self.enabled {
            return Ok(());
        }

        // Park the empty slot first so a started handle always has a home.
        let slot: Slot<H::Handle> = Arc::new(Mutex::new(None));
        ExecutionContext::set(self.key.clone(), Arc::clone(&slot))?;

        let handle = self.hook.start(event, ctx)?;
        *slot.lock() = Some(handle);
        Ok(())
    }

    fn end(&self, error: Option<&InvocationError>) -> InvocationResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let slot = ExecutionContext::get::<Slot<H::Handle>>(&self.key)?;
        let handle = slot.and_then(|slot| slot.lock().take());
        if let Some(handle) = handle {
            self.hook.stop(handle, error);
        }
        Ok(())
    }
}

impl<H: InvocationHook> std::fmt::Debug for HookMiddleware<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMiddleware")
            .field("hook", &self.hook.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<H: InvocationHook> Middleware for HookMiddleware<H> {
    fn name(&self) -> &'static str {
        self.hook.name()
    }

    fn setup<'a>(
        &'a self,
        event: &'a mut Event,
        ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<()>> {
        let outcome = self.begin(event, ctx);
        Box::pin(async move { outcome })
    }

    fn teardown<'a>(
        &'a self,
        _event: &'a Event,
        _ctx: &'a mut InvocationContext,
        _result: &'a Value,
        error: Option<&'a InvocationError>,
    ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
        let outcome = self.end(error).map(|()| None);
        Box::pin(async move { outcome })
    }
}
