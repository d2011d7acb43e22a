//! Raw-event marker.

use cirrus_core::{Event, InvocationContext, InvocationResult};

use crate::middleware::{BoxFuture, Middleware};

/// Marks every invocation as a raw platform event.
///
/// The dispatcher then hands the untouched event to the controller's event
/// handler instead of routing it. Register it first so later stages see
/// the mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawEventMiddleware;

impl Middleware for RawEventMiddleware {
    fn name(&self) -> &'static str {
        "raw_event"
    }

    fn setup<'a>(
        &'a self,
        _event: &'a mut Event,
        ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<()>> {
        ctx.mark_raw_event();
        Box::pin(async { Ok(()) })
    }
}
