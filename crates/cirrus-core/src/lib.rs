//! # Cirrus Core
//!
//! Core types for the Cirrus invocation engine.
//!
//! - [`ExecutionContext`] - Per-invocation isolated key/value store
//! - [`Event`] / [`InvocationContext`] - The raw event and its mutable metadata
//! - [`Controller`] - HTTP routes, RPC actions and a raw-event handler
//! - [`Identity`] / [`Auth`] - Caller identity and role checks
//! - [`InvocationError`] - Standard error type
//! - [`ErrorSanitizer`] / [`PayloadSanitizer`] - Data-leak boundary
//! - [`PayloadSchema`] - Declarative payload validation
//! - [`HttpResponse`] - API gateway response envelope

#![doc(html_root_url = "https://docs.rs/cirrus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod acl;
mod controller;
mod error;
mod event;
mod execution;
pub mod extract;
mod identity;
mod invocation;
pub mod mask;
mod response;
mod sanitize;
pub mod validate;

pub use controller::{
    ActionHandler, BoxFuture, Controller, ControllerBuilder, ControllerError, PayloadValidator,
    RouteHandler,
};
pub use error::{
    AppError, ErrorCategory, ErrorEnvelope, InvocationError, InvocationResult, INTERNAL_ERROR_CODE,
};
pub use event::{safe_json_parse, Event, InvocationMode, RpcCall};
pub use execution::{ContextError, ContextSeed, ContextValue, ExecutionContext};
pub use identity::{
    normalize_roles, resolve_identity, Auth, Identity, IdentityOptions, DEFAULT_GROUPS_CLAIM,
    IDENTITY_KEY,
};
pub use invocation::{InvocationContext, RequestId};
pub use response::{HttpResponse, CORS_HEADERS};
pub use sanitize::{
    html_escape, sanitize_payload, ErrorSanitizer, PayloadSanitizer, GENERIC_ERROR_MESSAGE,
};
pub use validate::{FieldRule, PayloadSchema};
