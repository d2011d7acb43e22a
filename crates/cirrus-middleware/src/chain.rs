//! Ordered middleware chain.
//!
//! ```text
//! setup:    mw[0] → mw[1] → … → mw[n-1] → handler
//! teardown: mw[n-1] → … → mw[1] → mw[0] → caller
//! ```
//!
//! Setup stops at the first failure. Teardown always visits every entry,
//! whatever happened before, and threads the result through each one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cirrus_core::{Event, InvocationContext, InvocationError, InvocationResult};
use futures_util::FutureExt;
use serde_json::Value;

use crate::middleware::Middleware;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, cheaply cloneable list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Arc<[BoxedMiddleware]>,
}

impl MiddlewareChain {
    /// Creates a chain from middleware in registration order.
    #[must_use]
    pub fn new(entries: Vec<BoxedMiddleware>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the middleware in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|mw| mw.name()).collect()
    }

    /// Runs every setup in order, stopping at the first error.
    ///
    /// A panicking setup is reported as an internal error.
    pub async fn run_setup(
        &self,
        event: &mut Event,
        ctx: &mut InvocationContext,
    ) -> InvocationResult<()> {
        for mw in self.entries.iter() {
            let outcome = AssertUnwindSafe(async { mw.setup(event, ctx).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(middleware = mw.name(), error = %err, "setup failed");
                    return Err(err);
                }
                Err(panic) => {
                    let stage = format!("middleware '{}' setup", mw.name());
                    return Err(InvocationError::from_panic(&stage, panic.as_ref()));
                }
            }
        }
        Ok(())
    }

    /// Runs every teardown in reverse order and returns the final result.
    ///
    /// A teardown that fails or panics is logged and skipped; the running
    /// result is left unchanged and the remaining teardowns still run.
    pub async fn run_teardown(
        &self,
        event: &Event,
        ctx: &mut InvocationContext,
        result: Value,
        error: Option<&InvocationError>,
    ) -> Value {
        let mut current = result;

        for mw in self.entries.iter().rev() {
            let outcome = AssertUnwindSafe(async { mw.teardown(event, ctx, &current, error).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Some(replacement))) => current = replacement,
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    tracing::warn!(middleware = mw.name(), error = %err, "teardown failed");
                }
                Err(panic) => {
                    let stage = format!("middleware '{}' teardown", mw.name());
                    let err = InvocationError::from_panic(&stage, panic.as_ref());
                    tracing::warn!(middleware = mw.name(), error = %err, "teardown panicked");
                }
            }
        }

        current
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("entries", &self.names())
            .finish()
    }
}

impl FromIterator<BoxedMiddleware> for MiddlewareChain {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BoxFuture;
    use parking_lot::Mutex;
    use serde_json::json;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        fail_setup: bool,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn setup<'a>(
            &'a self,
            _event: &'a mut Event,
            _ctx: &'a mut InvocationContext,
        ) -> BoxFuture<'a, InvocationResult<()>> {
            Box::pin(async move {
                self.log.lock().push(format!("setup:{}", self.name));
                if self.fail_setup {
                    Err(InvocationError::validation("setup failed"))
                } else {
                    Ok(())
                }
            })
        }

        fn teardown<'a>(
            &'a self,
            _event: &'a Event,
            _ctx: &'a mut InvocationContext,
            _result: &'a Value,
            _error: Option<&'a InvocationError>,
        ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
            Box::pin(async move {
                self.log.lock().push(format!("teardown:{}", self.name));
                Ok(None)
            })
        }
    }

    fn recorder(name: &'static str, log: &Log, fail_setup: bool) -> BoxedMiddleware {
        Arc::new(Recorder {
            name,
            log: Arc::clone(log),
            fail_setup,
        })
    }

    struct Replace(Value);

    impl Middleware for Replace {
        fn name(&self) -> &'static str {
            "replace"
        }

        fn teardown<'a>(
            &'a self,
            _event: &'a Event,
            _ctx: &'a mut InvocationContext,
            _result: &'a Value,
            _error: Option<&'a InvocationError>,
        ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
            Box::pin(async move { Ok(Some(self.0.clone())) })
        }
    }

    struct FailingTeardown;

    impl Middleware for FailingTeardown {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn teardown<'a>(
            &'a self,
            _event: &'a Event,
            _ctx: &'a mut InvocationContext,
            _result: &'a Value,
            _error: Option<&'a InvocationError>,
        ) -> BoxFuture<'a, InvocationResult<Option<Value>>> {
            Box::pin(async { Err(InvocationError::internal("teardown broke")) })
        }
    }

    struct PanickingSetup;

    impl Middleware for PanickingSetup {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn setup<'a>(
            &'a self,
            _event: &'a mut Event,
            _ctx: &'a mut InvocationContext,
        ) -> BoxFuture<'a, InvocationResult<()>> {
            panic!("setup exploded")
        }
    }

    #[tokio::test]
    async fn test_setup_forward_teardown_reverse() {
        let log = Log::default();
        let chain = MiddlewareChain::new(vec![
            recorder("a", &log, false),
            recorder("b", &log, false),
            recorder("c", &log, false),
        ]);

        let mut event = Event::default();
        let mut ctx = InvocationContext::new();
        chain.run_setup(&mut event, &mut ctx).await.unwrap();
        chain.run_teardown(&event, &mut ctx, Value::Null, None).await;

        assert_eq!(
            *log.lock(),
            vec![
                "setup:a",
                "setup:b",
                "setup:c",
                "teardown:c",
                "teardown:b",
                "teardown:a"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_setup_stops_but_all_teardowns_run() {
        let log = Log::default();
        let chain = MiddlewareChain::new(vec![
            recorder("a", &log, false),
            recorder("b", &log, true),
            recorder("c", &log, false),
        ]);

        let mut event = Event::default();
        let mut ctx = InvocationContext::new();
        let err = chain.run_setup(&mut event, &mut ctx).await.unwrap_err();
        chain.run_teardown(&event, &mut ctx, Value::Null, Some(&err)).await;

        let log = log.lock();
        assert_eq!(log.iter().filter(|l| l.starts_with("setup")).count(), 2);
        assert_eq!(log.iter().filter(|l| l.starts_with("teardown")).count(), 3);
    }

    #[tokio::test]
    async fn test_teardown_result_is_threaded() {
        let chain = MiddlewareChain::new(vec![
            Arc::new(Replace(json!("outer"))),
            Arc::new(Replace(json!("inner"))),
        ]);

        let mut ctx = InvocationContext::new();
        let result = chain
            .run_teardown(&Event::default(), &mut ctx, json!("handler"), None)
            .await;

        assert_eq!(result, json!("outer"));
    }

    #[tokio::test]
    async fn test_failing_teardown_does_not_stop_chain() {
        let log = Log::default();
        let chain = MiddlewareChain::new(vec![
            recorder("first", &log, false),
            Arc::new(FailingTeardown),
            Arc::new(Replace(json!("replaced"))),
        ]);

        let mut ctx = InvocationContext::new();
        let result = chain
            .run_teardown(&Event::default(), &mut ctx, json!("handler"), None)
            .await;

        assert_eq!(result, json!("replaced"));
        assert_eq!(*log.lock(), vec!["teardown:first"]);
    }

    #[tokio::test]
    async fn test_panicking_setup_becomes_internal_error() {
        let chain = MiddlewareChain::new(vec![Arc::new(PanickingSetup)]);

        let mut event = Event::default();
        let mut ctx = InvocationContext::new();
        let err = chain.run_setup(&mut event, &mut ctx).await.unwrap_err();

        assert!(matches!(err, InvocationError::Internal { .. }));
        assert!(err.to_string().contains("setup exploded"));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = MiddlewareChain::default();
        let mut event = Event::default();
        let mut ctx = InvocationContext::new();

        assert!(chain.is_empty());
        chain.run_setup(&mut event, &mut ctx).await.unwrap();
        let result = chain.run_teardown(&event, &mut ctx, json!(1), None).await;
        assert_eq!(result, json!(1));
    }

    #[test]
    fn test_names_in_order() {
        let log = Log::default();
        let chain: MiddlewareChain = vec![recorder("x", &log, false), recorder("y", &log, false)]
            .into_iter()
            .collect();
        assert_eq!(chain.names(), vec!["x", "y"]);
        assert_eq!(chain.len(), 2);
    }
}
