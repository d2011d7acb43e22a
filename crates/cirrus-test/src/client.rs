//! In-process client for loaded handlers.

use cirrus::LoadedHandler;
use cirrus_core::InvocationContext;
use serde_json::Value;

use crate::event::TestEvent;
use crate::response::TestResponse;

/// Sends events straight into a [`LoadedHandler`].
///
/// No runtime adapter or network is involved; every call goes through
/// the full middleware chain and dispatcher.
///
/// # Example
///
/// ```
/// use cirrus::prelude::*;
/// use cirrus_test::{TestClient, TestEvent};
/// use http::Method;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let controller = Controller::builder("health")
///     .route(Method::GET, "/health", "health", |_event, _ctx| {
///         Box::pin(async { Ok(json!({ "ok": true })) })
///     })
///     .build()
///     .unwrap();
/// let client = TestClient::new(Dispatcher::builder(CirrusConfig::default()).load(controller));
///
/// let response = client.send(TestEvent::get("/health")).await;
/// response.assert_status(200).assert_json(&json!({ "ok": true }));
/// # });
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TestClient {
    handler: LoadedHandler,
}

impl TestClient {
    /// Wraps a loaded handler.
    pub fn new(handler: LoadedHandler) -> Self {
        Self { handler }
    }

    /// The wrapped handler.
    #[must_use]
    pub fn handler(&self) -> &LoadedHandler {
        &self.handler
    }

    /// Invokes the handler with a fresh invocation context.
    pub async fn send(&self, event: impl Into<Value>) -> TestResponse {
        self.send_with(event, InvocationContext::new()).await
    }

    /// Invokes the handler with the given invocation context.
    pub async fn send_with(&self, event: impl Into<Value>, ctx: InvocationContext) -> TestResponse {
        TestResponse::new(self.handler.invoke(event.into(), ctx).await)
    }

    /// Invokes an RPC action.
    pub async fn call(&self, action: &str, payload: Value) -> TestResponse {
        self.send(TestEvent::rpc(action, payload)).await
    }
}
