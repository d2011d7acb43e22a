//! Observability for Cirrus.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output
//! - **Timers**: debug-level section timings
//! - **Metrics**: invocation counters and durations via the `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `cirrus_invocations_total` | Counter | `mode`, `outcome` | Invocation count |
//! | `cirrus_invocation_duration_seconds` | Histogram | `mode` | Invocation latency |
//! | `cirrus_acl_denials_total` | Counter | `handler` | ACL rejections |

#![doc(html_root_url = "https://docs.rs/cirrus-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;
mod timer;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, record_acl_denial, record_invocation, Outcome};
pub use timer::Timer;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
