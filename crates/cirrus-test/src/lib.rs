//! # Cirrus Test
//!
//! Test utilities for Cirrus handlers. Events are built in memory and fed
//! directly to a [`cirrus::LoadedHandler`], so the whole middleware chain
//! and dispatcher run exactly as they would on the platform.
//!
//! ## Key Features
//!
//! - **Event Builder**: API gateway, RPC and raw event shapes
//! - **Response Assertions**: status, headers and error envelope helpers
//! - **Scoped Context**: run handler code with a seeded execution context
//!
//! ## Example
//!
//! ```ignore
//! use cirrus_test::{TestClient, TestEvent};
//!
//! #[tokio::test]
//! async fn test_admin_only() {
//!     let client = TestClient::new(handler());
//!
//!     client
//!         .send(TestEvent::get("/admin").groups(["USER"]))
//!         .await
//!         .assert_status(403);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/cirrus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod context;
mod error;
mod event;
mod response;

pub use client::TestClient;
pub use context::{identity_with_roles, with_context, with_identity};
pub use error::TestError;
pub use event::TestEvent;
pub use response::TestResponse;
