//! # Cirrus Middleware
//!
//! Ordered setup/teardown middleware for Cirrus invocations.
//!
//! ```text
//! Event → setup[0] → setup[1] → … → handler
//!                                      ↓
//! Result ← teardown[0] ← teardown[1] ← ┘
//! ```
//!
//! Unlike an onion-style `next()` chain, setup and teardown are separate
//! passes: a failed setup skips the rest of setup and the handler, yet every
//! registered teardown still runs.
//!
//! ## Stages
//!
//! | Middleware | Purpose |
//! |------------|---------|
//! | [`AuthorizerMiddleware`](stages::AuthorizerMiddleware) | Resolve caller identity from claims |
//! | [`RawEventMiddleware`](stages::RawEventMiddleware) | Route every event to the raw handler |
//! | [`HookMiddleware`](stages::HookMiddleware) | Opaque per-invocation start/stop hook |

#![doc(html_root_url = "https://docs.rs/cirrus-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::{BoxedMiddleware, MiddlewareChain};
pub use middleware::{BoxFuture, FnMiddleware, Middleware};
