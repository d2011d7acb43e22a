//! # Cirrus
//!
//! **Request-lifecycle engine for serverless functions**
//!
//! One function entry point serves three kinds of invocation:
//!
//! - **HTTP** – API gateway proxy events are routed by method and path,
//!   checked against per-route role ACLs and wrapped in a CORS-enabled
//!   response envelope
//! - **RPC** – `{action, payload}` calls invoke a named action with an
//!   HTML-escaped payload
//! - **Raw events** – queue, schedule or storage notifications go to a
//!   single event handler untouched
//!
//! Every invocation runs inside its own [`ExecutionContext`](prelude::ExecutionContext)
//! scope, passes through setup/teardown middleware, and has its errors
//! sanitized once before they leave the process.
//!
//! ## Quick Start
//!
//! ```rust
//! use cirrus::prelude::*;
//! use http::Method;
//! use serde_json::json;
//!
//! # async fn run() {
//! let controller = Controller::builder("users")
//!     .route(Method::GET, "/users/:id", "getUser", |_event, ctx| {
//!         let id = ctx.path_params().get("id").unwrap_or_default().to_string();
//!         Box::pin(async move { Ok(json!({ "id": id })) })
//!     })
//!     .acl("getUser", ["ADMIN"])
//!     .build()
//!     .unwrap();
//!
//! let handler = Dispatcher::builder(CirrusConfig::default())
//!     .with_authorizer()
//!     .load(controller);
//!
//! let response = handler
//!     .invoke(json!({ "action": "ping" }), InvocationContext::new())
//!     .await;
//! assert_eq!(response["errorMessage"], "Action not found");
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/cirrus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;

pub use dispatcher::{Dispatcher, DispatcherBuilder, LoadedHandler};

// Re-export member crates
pub use cirrus_config as config;
pub use cirrus_core as core;
pub use cirrus_middleware as middleware;
pub use cirrus_router as router;
pub use cirrus_telemetry as telemetry;

/// Installs logging from `config` and registers metric descriptions.
///
/// Call once per process, before loading handlers.
///
/// # Errors
///
/// Fails if the log level is invalid or a global subscriber is already set.
pub fn init(config: &cirrus_config::CirrusConfig) -> Result<(), cirrus_telemetry::TelemetryError> {
    cirrus_telemetry::init_logging(&config.logging.to_log_config())?;
    cirrus_telemetry::describe_metrics();
    Ok(())
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use cirrus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Dispatcher, DispatcherBuilder, LoadedHandler};
    pub use cirrus_config::{CirrusConfig, ConfigLoader, DeploymentStage};
    pub use cirrus_core::extract;
    pub use cirrus_core::{
        AppError, Auth, BoxFuture, Controller, Event, ExecutionContext, FieldRule, Identity,
        InvocationContext, InvocationError, InvocationResult, PayloadSchema,
    };
    pub use cirrus_middleware::stages::{
        AuthorizerMiddleware, HookMiddleware, InvocationHook, RawEventMiddleware,
    };
    pub use cirrus_middleware::{FnMiddleware, Middleware};
}
