//! Ordered first-match route table for Cirrus controllers.
//!
//! Each controller declares its HTTP routes once. The resulting
//! [`RouteTable`] is immutable and shared by every invocation of the loaded
//! handler.
//!
//! # Features
//!
//! - **Declaration-Order Matching**: the first route whose pattern matches wins
//! - **Path Parameters**: `:id` and `{id}` segments, percent-decoded
//! - **Wildcards**: trailing catch-all segments (`/files/*path`)
//! - **Per-Route ACL**: optional role sets carried on each [`Route`]
//! - **Stage Prefixes**: [`strip_stage_prefix`] removes `/{stage}` segments
//!
//! # Example
//!
//! ```rust
//! use cirrus_router::{strip_stage_prefix, Route, RouteTable};
//! use http::Method;
//!
//! let table = RouteTable::builder()
//!     .route(Route::new(Method::GET, "/users/:id", "getUser"))
//!     .route(Route::new(Method::GET, "/files/*path", "serveFile"))
//!     .build()
//!     .unwrap();
//!
//! let path = strip_stage_prefix("/dev/users/123", "dev");
//! let m = table.resolve(&Method::GET, &path).unwrap();
//! assert_eq!(m.handler_name(), "getUser");
//! assert_eq!(m.params.get("id"), Some("123"));
//! ```

#![doc(html_root_url = "https://docs.rs/cirrus-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod params;
mod pattern;
mod stage;
mod table;

pub use error::{RouteError, RouteNotFound};
pub use params::Params;
pub use pattern::{PathPattern, SegmentKind};
pub use stage::strip_stage_prefix;
pub use table::{resolve, Route, RouteMatch, RouteTable, RouteTableBuilder};
