//! Invocation dispatcher.
//!
//! A [`DispatcherBuilder`] collects middleware; [`DispatcherBuilder::load`]
//! freezes a snapshot of that list together with a [`Controller`] into a
//! [`LoadedHandler`]. Each call to [`LoadedHandler::invoke`] then runs:
//!
//! ```text
//! run_scoped {
//!     setup (in order) → classify → RPC action | raw handler | HTTP route
//!                                        ↓
//!                       sanitize error / wrap response
//!                                        ↓
//!     teardown (reverse) → metrics
//! }
//! ```
//!
//! Errors from any stage are converted exactly once, here, and never
//! escape as panics or `Err` values: the platform always receives a
//! response value.

use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cirrus_config::CirrusConfig;
use cirrus_core::mask::mask_sensitive_data;
use cirrus_core::{
    acl, Auth, BoxFuture, Controller, ErrorSanitizer, Event, ExecutionContext, HttpResponse,
    InvocationContext, InvocationError, InvocationMode, InvocationResult, PayloadSanitizer,
};
use cirrus_middleware::stages::{
    AuthorizerMiddleware, HookMiddleware, InvocationHook, RawEventMiddleware,
};
use cirrus_middleware::{BoxedMiddleware, Middleware, MiddlewareChain};
use cirrus_router::{strip_stage_prefix, RouteMatch};
use cirrus_telemetry::{record_acl_denial, record_invocation, Outcome, Timer};
use futures_util::FutureExt;
use http::Method;
use serde_json::Value;

/// Entry point for assembling a [`LoadedHandler`].
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher;

impl Dispatcher {
    /// Starts a builder using `config`.
    #[must_use]
    pub fn builder(config: CirrusConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config: Arc::new(config),
            middleware: Vec::new(),
        }
    }
}

/// Immutable-by-value builder for [`LoadedHandler`]s.
///
/// Every method consumes the builder and returns a new one, so a handler
/// loaded earlier never observes middleware added later.
///
/// # Example
///
/// ```
/// use cirrus::prelude::*;
/// use http::Method;
/// use serde_json::json;
///
/// let controller = Controller::builder("health")
///     .route(Method::GET, "/health", "health", |_event, _ctx| {
///         Box::pin(async { Ok(json!({ "ok": true })) })
///     })
///     .build()
///     .unwrap();
///
/// let handler = Dispatcher::builder(CirrusConfig::default())
///     .with_authorizer()
///     .load(controller);
/// assert_eq!(handler.middleware_names(), vec!["authorizer"]);
/// ```
#[derive(Clone)]
pub struct DispatcherBuilder {
    config: Arc<CirrusConfig>,
    middleware: Vec<BoxedMiddleware>,
}

impl DispatcherBuilder {
    /// Appends a middleware.
    #[must_use]
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware.
    #[must_use]
    pub fn with_shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends an [`AuthorizerMiddleware`] reading the configured role claim.
    #[must_use]
    pub fn with_authorizer(self) -> Self {
        let authorizer = match &self.config.auth.role_claim {
            Some(claim) => AuthorizerMiddleware::with_role_claim(claim.clone()),
            None => AuthorizerMiddleware::new(),
        };
        self.with(authorizer)
    }

    /// Appends a lifecycle hook.
    ///
    /// The hook is disabled for local runs (`deployment.local`), where the
    /// resources it brackets are usually absent.
    #[must_use]
    pub fn with_hook<H: InvocationHook>(self, hook: H) -> Self {
        let enabled = !self.config.deployment.local;
        if !enabled {
            tracing::debug!(hook = hook.name(), "hook disabled for local run");
        }
        self.with(HookMiddleware::new(hook).with_enabled(enabled))
    }

    /// Treats every invocation as a raw platform event.
    ///
    /// The marker is placed first so later middleware already see it.
    #[must_use]
    pub fn for_raw_events(mut self) -> Self {
        self.middleware.insert(0, Arc::new(RawEventMiddleware));
        self
    }

    /// The configuration handlers will be loaded with.
    #[must_use]
    pub fn config(&self) -> &CirrusConfig {
        &self.config
    }

    /// Freezes the current middleware list with `controller`.
    #[must_use]
    pub fn load(&self, controller: Controller) -> LoadedHandler {
        let sanitizer = ErrorSanitizer::new(self.config.is_production())
            .with_generic_message(self.config.errors.internal_error_message.clone());

        tracing::debug!(
            controller = controller.name(),
            middleware = self.middleware.len(),
            stage = %self.config.deployment.stage,
            "handler loaded"
        );

        LoadedHandler {
            inner: Arc::new(Inner {
                controller,
                chain: MiddlewareChain::new(self.middleware.clone()),
                errors: sanitizer,
                payloads: PayloadSanitizer,
            }),
        }
    }
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.middleware.iter().map(|m| m.name()).collect();
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .field("middleware", &names)
            .finish()
    }
}

/// A controller bound to a frozen middleware chain.
///
/// Cheap to clone; clones share the same controller and chain.
#[derive(Clone)]
pub struct LoadedHandler {
    inner: Arc<Inner>,
}

struct Inner {
    controller: Controller,
    chain: MiddlewareChain,
    errors: ErrorSanitizer,
    payloads: PayloadSanitizer,
}

impl LoadedHandler {
    /// The controller this handler serves.
    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.inner.controller
    }

    /// Names of the frozen middleware, in setup order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.inner.chain.names()
    }

    /// Handles one platform invocation.
    ///
    /// Always returns a response: HTTP invocations get an API gateway
    /// envelope, RPC and raw invocations get the handler value or an error
    /// envelope.
    pub async fn invoke(&self, event: Value, ctx: InvocationContext) -> Value {
        ExecutionContext::run_scoped(self.inner.run(Event::new(event), ctx)).await
    }

    /// Converts the handler into a plain function for runtime adapters.
    pub fn into_fn(
        self,
    ) -> impl Fn(Value, InvocationContext) -> BoxFuture<'static, Value> + Clone + Send + Sync + 'static
    {
        move |event, ctx| {
            let handler = self.clone();
            Box::pin(async move { handler.invoke(event, ctx).await })
        }
    }
}

impl std::fmt::Debug for LoadedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedHandler")
            .field("controller", &self.inner.controller)
            .field("chain", &self.inner.chain)
            .finish()
    }
}

impl Inner {
    async fn run(&self, mut event: Event, mut ctx: InvocationContext) -> Value {
        let load = Timer::start("cirrus.load");
        let setup = self.chain.run_setup(&mut event, &mut ctx).await;
        load.finish();

        let mode = classify(&event, &ctx);
        log_event(&event, mode, &ctx);

        let outcome = match setup {
            Ok(()) => self.execute(mode, &event, &mut ctx).await,
            Err(err) => Err(err),
        };

        let (result, error) = match outcome {
            Ok(value) => (render_success(mode, &value), None),
            Err(err) => (self.render_error(mode, &err), Some(err)),
        };

        let result = self
            .chain
            .run_teardown(&event, &mut ctx, result, error.as_ref())
            .await;

        let outcome = match &error {
            None => Outcome::Success,
            Some(err) if err.is_server_error() => Outcome::ServerError,
            Some(_) => Outcome::ClientError,
        };
        record_invocation(mode.as_str(), outcome, ctx.elapsed());

        result
    }

    /// Runs the controller, converting a panic into an internal error.
    async fn execute(
        &self,
        mode: InvocationMode,
        event: &Event,
        ctx: &mut InvocationContext,
    ) -> InvocationResult<Value> {
        let timer = Timer::start("controller exec");
        let outcome = AssertUnwindSafe(self.dispatch(mode, event, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(InvocationError::from_panic("controller", panic.as_ref())));
        timer.finish();
        outcome
    }

    async fn dispatch(
        &self,
        mode: InvocationMode,
        event: &Event,
        ctx: &mut InvocationContext,
    ) -> InvocationResult<Value> {
        match mode {
            InvocationMode::Rpc => self.dispatch_rpc(event, ctx).await,
            InvocationMode::Raw => self.dispatch_raw(event, ctx).await,
            InvocationMode::Http => self.dispatch_http(event, ctx).await,
        }
    }

    async fn dispatch_rpc(&self, event: &Event, ctx: &mut InvocationContext) -> InvocationResult<Value> {
        let call = event.rpc_call()?;
        let action = self
            .controller
            .action(&call.action)
            .ok_or_else(|| InvocationError::action_not_found(&call.action))?;

        tracing::debug!(request_id = ctx.request_id(), action = %call.action, "dispatching action");
        let payload = self.payloads.sanitize(call.payload);
        if let Some(validate) = self.controller.validator(&call.action) {
            validate(&payload)?;
        }
        action(payload, ctx).await
    }

    async fn dispatch_raw(&self, event: &Event, ctx: &mut InvocationContext) -> InvocationResult<Value> {
        let handler = self.controller.event_handler().ok_or_else(|| {
            InvocationError::internal(format!(
                "controller '{}' has no raw event handler",
                self.controller.name()
            ))
        })?;
        handler(event, ctx).await
    }

    async fn dispatch_http(&self, event: &Event, ctx: &mut InvocationContext) -> InvocationResult<Value> {
        let method_name = event.http_method().unwrap_or_default();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| InvocationError::validation(format!("Unsupported method {method_name}")))?;

        let raw_path = event.path().unwrap_or("/");
        let path = match event.stage() {
            Some(stage) => strip_stage_prefix(raw_path, stage),
            None => Cow::Borrowed(raw_path),
        };

        let RouteMatch { route, params } = self.controller.routes().resolve(&method, &path)?;

        if let Some(identity) = Auth::identity()? {
            if let Err(err) = acl::enforce(route.required_roles.as_ref(), &identity) {
                record_acl_denial(&route.handler_name);
                return Err(err);
            }
        }

        let handler = self.controller.handler(&route.handler_name).ok_or_else(|| {
            InvocationError::internal(format!("no handler registered for '{}'", route.handler_name))
        })?;

        tracing::debug!(
            request_id = ctx.request_id(),
            method = %method,
            path = %path,
            handler = %route.handler_name,
            "route resolved"
        );

        ctx.set_path_params(params);
        handler(event, ctx).await
    }

    fn render_error(&self, mode: InvocationMode, error: &InvocationError) -> Value {
        let envelope = self.errors.handle(error);
        match mode {
            InvocationMode::Http => HttpResponse::from_error(&envelope).into_value(),
            InvocationMode::Rpc | InvocationMode::Raw => envelope.to_value(),
        }
    }
}

/// Decides the invocation mode once, after setup.
fn classify(event: &Event, ctx: &InvocationContext) -> InvocationMode {
    if ctx.is_raw_event() {
        InvocationMode::Raw
    } else if event.is_http() {
        InvocationMode::Http
    } else {
        InvocationMode::Rpc
    }
}

fn render_success(mode: InvocationMode, value: &Value) -> Value {
    match mode {
        InvocationMode::Http => HttpResponse::ok(value).into_value(),
        InvocationMode::Rpc | InvocationMode::Raw => value.clone(),
    }
}

/// Logs the incoming event with sensitive data masked.
fn log_event(event: &Event, mode: InvocationMode, ctx: &InvocationContext) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let masked = match mode {
        InvocationMode::Http => event
            .body()
            .map(|body| mask_sensitive_data(&Value::String(body.to_string())))
            .unwrap_or_default(),
        InvocationMode::Rpc | InvocationMode::Raw => mask_sensitive_data(event.as_value()),
    };

    tracing::debug!(
        request_id = ctx.request_id(),
        mode = mode.as_str(),
        event = %masked,
        "invocation received"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::{FieldRule, PayloadSchema};
    use parking_lot::Mutex;
    use serde_json::json;

    fn controller() -> Controller {
        Controller::builder("test")
            .route(Method::GET, "/ping", "ping", |_event, _ctx| {
                Box::pin(async { Ok(json!("pong")) })
            })
            .action("echo", |payload, _ctx| Box::pin(async move { Ok(payload) }))
            .action_with_schema(
                "rename",
                PayloadSchema::new().field("name", FieldRule::string().required().max(8.0)),
                |payload, _ctx| Box::pin(async move { Ok(json!({ "renamed": payload["name"] })) }),
            )
            .build()
            .unwrap()
    }

    struct Counted {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl InvocationHook for Counted {
        type Handle = ();

        fn name(&self) -> &'static str {
            "counted"
        }

        fn start(&self, _event: &Event, _ctx: &InvocationContext) -> InvocationResult<()> {
            self.log.lock().push("start");
            Ok(())
        }

        fn stop(&self, _handle: (), _error: Option<&InvocationError>) {
            self.log.lock().push("stop");
        }
    }

    #[test]
    fn test_classify() {
        let mut ctx = InvocationContext::new();
        let http = Event::new(json!({ "httpMethod": "GET", "path": "/" }));
        let rpc = Event::new(json!({ "action": "echo" }));

        assert_eq!(classify(&http, &ctx), InvocationMode::Http);
        assert_eq!(classify(&rpc, &ctx), InvocationMode::Rpc);

        ctx.mark_raw_event();
        assert_eq!(classify(&http, &ctx), InvocationMode::Raw);
    }

    #[test]
    fn test_load_snapshots_middleware() {
        let builder = Dispatcher::builder(CirrusConfig::default()).with_authorizer();
        let first = builder.load(controller());
        let builder = builder.for_raw_events();
        let second = builder.load(controller());

        assert_eq!(first.middleware_names(), vec!["authorizer"]);
        assert_eq!(second.middleware_names(), vec!["raw_event", "authorizer"]);
    }

    #[tokio::test]
    async fn test_http_success_envelope() {
        let handler = Dispatcher::builder(CirrusConfig::default()).load(controller());
        let response = handler
            .invoke(json!({ "httpMethod": "GET", "path": "/ping" }), InvocationContext::new())
            .await;

        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["body"], "\"pong\"");
        assert_eq!(response["isBase64Encoded"], false);
        assert_eq!(response["headers"]["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_rpc_value_unwrapped() {
        let handler = Dispatcher::builder(CirrusConfig::default()).load(controller());
        let response = handler
            .invoke(
                json!({ "action": "echo", "payload": { "n": 1 } }),
                InvocationContext::new(),
            )
            .await;
        assert_eq!(response, json!({ "n": 1 }));
    }

    #[tokio::test]
    async fn test_rpc_payload_rejected_before_action() {
        let handler = Dispatcher::builder(CirrusConfig::production()).load(controller());
        let response = handler
            .invoke(
                json!({ "action": "rename", "payload": { "name": "a-very-long-name" } }),
                InvocationContext::new(),
            )
            .await;

        assert_eq!(response["statusCode"], 400);
        assert_eq!(response["errorCode"], "VALIDATION_ERROR");
        assert_eq!(
            response["errorMessage"],
            "\"name\" must contain at most 8 characters"
        );
        assert_eq!(response["errorData"]["field"], "name");
    }

    #[tokio::test]
    async fn test_rpc_payload_accepted() {
        let handler = Dispatcher::builder(CirrusConfig::default()).load(controller());
        let response = handler
            .invoke(
                json!({ "action": "rename", "payload": { "name": "ada" } }),
                InvocationContext::new(),
            )
            .await;

        assert_eq!(response, json!({ "renamed": "ada" }));
    }

    #[tokio::test]
    async fn test_hooks_skipped_for_local_runs() {
        let event = json!({ "httpMethod": "GET", "path": "/ping" });

        let log = Arc::new(Mutex::new(Vec::new()));
        let local = Dispatcher::builder(CirrusConfig::development())
            .with_hook(Counted { log: Arc::clone(&log) })
            .load(controller());
        let response = local.invoke(event.clone(), InvocationContext::new()).await;
        assert_eq!(response["statusCode"], 200);
        assert!(log.lock().is_empty());

        let deployed = Dispatcher::builder(CirrusConfig::production())
            .with_hook(Counted { log: Arc::clone(&log) })
            .load(controller());
        deployed.invoke(event, InvocationContext::new()).await;
        assert_eq!(*log.lock(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn test_raw_without_handler_is_internal_error() {
        let handler = Dispatcher::builder(CirrusConfig::production())
            .for_raw_events()
            .load(controller());
        let response = handler
            .invoke(json!({ "source": "aws.events" }), InvocationContext::new())
            .await;

        assert_eq!(response["statusCode"], 500);
        assert_eq!(response["errorCode"], "INTERNAL_ERROR");
        assert_eq!(response["errorMessage"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_into_fn() {
        let handler = Dispatcher::builder(CirrusConfig::default()).load(controller());
        let func = handler.into_fn();
        let response = func(json!({ "action": "echo", "payload": 7 }), InvocationContext::new()).await;
        assert_eq!(response, json!(7));
    }
}
