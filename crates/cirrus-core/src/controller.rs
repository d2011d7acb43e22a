//! Controllers: HTTP routes, RPC actions and a raw-event handler.
//!
//! A [`Controller`] is assembled once with [`Controller::builder`] and is
//! immutable afterwards. The dispatcher only reads it.
//!
//! # Example
//!
//! ```
//! use cirrus_core::{Controller, InvocationContext, Event, InvocationResult};
//! use http::Method;
//! use serde_json::{json, Value};
//!
//! let controller = Controller::builder("users")
//!     .route(Method::GET, "/users/:id", "getUser", |_event, ctx| {
//!         Box::pin(async move {
//!             let id = ctx.path_params().get("id").unwrap_or_default().to_string();
//!             Ok(json!({ "id": id }))
//!         })
//!     })
//!     .acl("getUser", ["ADMIN"])
//!     .action("ping", |_payload, _ctx| Box::pin(async { Ok(json!("pong")) }))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(controller.routes().len(), 1);
//! assert!(controller.action("ping").is_some());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cirrus_router::{Route, RouteError, RouteTable};
use http::Method;
use serde_json::Value;
use thiserror::Error;

use crate::error::InvocationResult;
use crate::event::Event;
use crate::invocation::InvocationContext;
use crate::validate::PayloadSchema;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler for an HTTP route or a raw event.
pub type RouteHandler = Arc<
    dyn for<'a> Fn(&'a Event, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
        + Send
        + Sync,
>;

/// Handler for an RPC action; receives the sanitized payload.
pub type ActionHandler = Arc<
    dyn for<'a> Fn(Value, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
        + Send
        + Sync,
>;

/// Check run on a sanitized RPC payload before its action.
pub type PayloadValidator = Arc<dyn Fn(&Value) -> InvocationResult<()> + Send + Sync>;

/// Errors raised while assembling a controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The route table rejected a route.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Two routes registered the same handler name.
    #[error("handler '{0}' is registered twice")]
    DuplicateHandler(String),

    /// Two actions share a name.
    #[error("action '{0}' is registered twice")]
    DuplicateAction(String),

    /// An ACL names a handler that has no route.
    #[error("acl targets unknown handler '{0}'")]
    UnknownAclTarget(String),
}

/// Immutable set of handlers served by one loaded function.
#[derive(Clone)]
pub struct Controller {
    name: String,
    routes: RouteTable,
    handlers: HashMap<String, RouteHandler>,
    actions: HashMap<String, ActionHandler>,
    validators: HashMap<String, PayloadValidator>,
    event_handler: Option<RouteHandler>,
}

impl Controller {
    /// Starts building a controller.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder {
            name: name.into(),
            routes: Vec::new(),
            acl: Vec::new(),
            handlers: HashMap::new(),
            actions: HashMap::new(),
            validators: HashMap::new(),
            event_handler: None,
            errors: Vec::new(),
        }
    }

    /// The controller name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The handler registered under `name`.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&RouteHandler> {
        self.handlers.get(name)
    }

    /// The RPC action registered under `name`.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionHandler> {
        self.actions.get(name)
    }

    /// The payload validator attached to action `name`.
    #[must_use]
    pub fn validator(&self, name: &str) -> Option<&PayloadValidator> {
        self.validators.get(name)
    }

    /// The raw-event handler, if any.
    #[must_use]
    pub fn event_handler(&self) -> Option<&RouteHandler> {
        self.event_handler.as_ref()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("routes", &self.routes.len())
            .field("actions", &actions)
            .field("validated", &self.validators.len())
            .field("event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`Controller`].
///
/// Registration errors are collected and reported by [`build`](Self::build).
pub struct ControllerBuilder {
    name: String,
    routes: Vec<Route>,
    acl: Vec<(String, BTreeSet<String>)>,
    handlers: HashMap<String, RouteHandler>,
    actions: HashMap<String, ActionHandler>,
    validators: HashMap<String, PayloadValidator>,
    event_handler: Option<RouteHandler>,
    errors: Vec<ControllerError>,
}

impl ControllerBuilder {
    /// Registers an HTTP route served by `handler`.
    #[must_use]
    pub fn route<F>(
        mut self,
        method: Method,
        pattern: impl Into<String>,
        handler_name: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a Event, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
            + Send
            + Sync
            + 'static,
    {
        let handler_name = handler_name.into();
        if self.handlers.contains_key(&handler_name) {
            self.errors
                .push(ControllerError::DuplicateHandler(handler_name));
            return self;
        }
        self.routes
            .push(Route::new(method, pattern, handler_name.clone()));
        self.handlers.insert(handler_name, Arc::new(handler));
        self
    }

    /// Restricts the route served by `handler_name` to `roles`.
    #[must_use]
    pub fn acl<I, S>(mut self, handler_name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acl.push((
            handler_name.into(),
            roles.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Registers an RPC action.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: for<'a> Fn(Value, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.actions.contains_key(&name) {
            self.errors.push(ControllerError::DuplicateAction(name));
            return self;
        }
        self.actions.insert(name, Arc::new(handler));
        self
    }

    /// Registers an RPC action whose payload must pass `validator` first.
    ///
    /// A rejected payload never reaches `handler`; the validator's error is
    /// returned to the caller instead.
    #[must_use]
    pub fn action_with_validator<V, F>(self, name: impl Into<String>, validator: V, handler: F) -> Self
    where
        V: Fn(&Value) -> InvocationResult<()> + Send + Sync + 'static,
        F: for<'a> Fn(Value, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let duplicate = self.actions.contains_key(&name);
        let mut builder = self.action(name.clone(), handler);
        if !duplicate {
            builder.validators.insert(name, Arc::new(validator));
        }
        builder
    }

    /// Registers an RPC action whose payload must match `schema`.
    #[must_use]
    pub fn action_with_schema<F>(self, name: impl Into<String>, schema: PayloadSchema, handler: F) -> Self
    where
        F: for<'a> Fn(Value, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.action_with_validator(name, move |payload| schema.validate(payload), handler)
    }

    /// Registers the handler for raw platform events.
    #[must_use]
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a Event, &'a mut InvocationContext) -> BoxFuture<'a, InvocationResult<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.event_handler = Some(Arc::new(handler));
        self
    }

    /// Validates registrations and freezes the controller.
    pub fn build(self) -> Result<Controller, ControllerError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut routes = self.routes;
        for (handler_name, roles) in self.acl {
            let mut found = false;
            for route in routes.iter_mut().filter(|r| r.handler_name == handler_name) {
                route
                    .required_roles
                    .get_or_insert_with(BTreeSet::new)
                    .extend(roles.iter().cloned());
                found = true;
            }
            if !found {
                return Err(ControllerError::UnknownAclTarget(handler_name));
            }
        }

        let table = routes
            .into_iter()
            .fold(RouteTable::builder(), |builder, route| builder.route(route))
            .build()?;

        tracing::debug!(
            controller = %self.name,
            routes = table.len(),
            actions = self.actions.len(),
            "controller built"
        );

        Ok(Controller {
            name: self.name,
            routes: table,
            handlers: self.handlers,
            actions: self.actions,
            validators: self.validators,
            event_handler: self.event_handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_name<'a>(
        event: &'a Event,
        _ctx: &'a mut InvocationContext,
    ) -> BoxFuture<'a, InvocationResult<Value>> {
        let path = event.path().unwrap_or_default().to_string();
        Box::pin(async move { Ok(json!(path)) })
    }

    #[test]
    fn test_builds_routes_in_order() {
        let controller = Controller::builder("c")
            .route(Method::GET, "/a", "a", echo_name)
            .route(Method::GET, "/b", "b", echo_name)
            .build()
            .unwrap();

        let names: Vec<_> = controller.routes().routes().map(|r| r.handler_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(controller.handler("a").is_some());
        assert!(controller.event_handler().is_none());
    }

    #[test]
    fn test_acl_attaches_roles() {
        let controller = Controller::builder("c")
            .route(Method::DELETE, "/users/:id", "deleteUser", echo_name)
            .acl("deleteUser", ["ADMIN"])
            .acl("deleteUser", ["OPS"])
            .build()
            .unwrap();

        let route = controller.routes().routes().next().unwrap();
        let roles: Vec<_> = route.required_roles.as_ref().unwrap().iter().cloned().collect();
        assert_eq!(roles, vec!["ADMIN", "OPS"]);
    }

    #[test]
    fn test_acl_unknown_handler() {
        let err = Controller::builder("c")
            .route(Method::GET, "/", "root", echo_name)
            .acl("missing", ["ADMIN"])
            .build()
            .unwrap_err();
        assert_eq!(err, ControllerError::UnknownAclTarget("missing".to_string()));
    }

    #[test]
    fn test_duplicate_handler_name() {
        let err = Controller::builder("c")
            .route(Method::GET, "/a", "same", echo_name)
            .route(Method::GET, "/b", "same", echo_name)
            .build()
            .unwrap_err();
        assert_eq!(err, ControllerError::DuplicateHandler("same".to_string()));
    }

    #[test]
    fn test_duplicate_route_pattern() {
        let err = Controller::builder("c")
            .route(Method::GET, "/a", "first", echo_name)
            .route(Method::GET, "/a", "second", echo_name)
            .build()
            .unwrap_err();
        assert!(matches!(err, ControllerError::Route(RouteError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_duplicate_action() {
        let err = Controller::builder("c")
            .action("ping", |_p, _c| Box::pin(async { Ok(Value::Null) }))
            .action("ping", |_p, _c| Box::pin(async { Ok(Value::Null) }))
            .build()
            .unwrap_err();
        assert_eq!(err, ControllerError::DuplicateAction("ping".to_string()));
    }

    #[test]
    fn test_action_validator_is_kept() {
        use crate::validate::FieldRule;

        let controller = Controller::builder("c")
            .action("plain", |p, _c| Box::pin(async move { Ok(p) }))
            .action_with_schema(
                "create",
                PayloadSchema::new().field("name", FieldRule::string().required()),
                |p, _c| Box::pin(async move { Ok(p) }),
            )
            .build()
            .unwrap();

        assert!(controller.validator("plain").is_none());
        let validate = controller.validator("create").unwrap();
        assert!(validate(&json!({ "name": "x" })).is_ok());
        assert_eq!(validate(&json!({})).unwrap_err().status_code().as_u16(), 400);
    }

    #[test]
    fn test_duplicate_validated_action() {
        let err = Controller::builder("c")
            .action("ping", |_p, _c| Box::pin(async { Ok(Value::Null) }))
            .action_with_validator("ping", |_p: &Value| Ok(()), |_p, _c| {
                Box::pin(async { Ok(Value::Null) })
            })
            .build()
            .unwrap_err();
        assert_eq!(err, ControllerError::DuplicateAction("ping".to_string()));
    }

    #[tokio::test]
    async fn test_handlers_are_callable() {
        let controller = Controller::builder("c")
            .route(Method::GET, "/x", "x", echo_name)
            .action("double", |payload, _ctx| {
                Box::pin(async move { Ok(json!(payload.as_i64().unwrap_or(0) * 2)) })
            })
            .on_event(|event, ctx| {
                ctx.set_extension("seen", json!(true));
                let source = event.as_value()["source"].clone();
                Box::pin(async move { Ok(source) })
            })
            .build()
            .unwrap();

        let mut ctx = InvocationContext::new();
        let event = Event::new(json!({ "path": "/x", "source": "aws.events" }));

        let handler = controller.handler("x").unwrap();
        assert_eq!(handler(&event, &mut ctx).await.unwrap(), json!("/x"));

        let action = controller.action("double").unwrap();
        assert_eq!(action(json!(21), &mut ctx).await.unwrap(), json!(42));

        let on_event = controller.event_handler().unwrap();
        assert_eq!(on_event(&event, &mut ctx).await.unwrap(), json!("aws.events"));
        assert_eq!(ctx.extension("seen"), Some(&json!(true)));
    }
}
