//! Built-in middleware stages.
//!
//! - [`authorizer`] - Resolve the caller identity from authorizer claims
//! - [`raw_event`] - Mark invocations as raw platform events
//! - [`hook`] - Bracket each invocation with an opaque start/stop hook

pub mod authorizer;
pub mod hook;
pub mod raw_event;

pub use authorizer::AuthorizerMiddleware;
pub use hook::{HookMiddleware, InvocationHook};
pub use raw_event::RawEventMiddleware;
