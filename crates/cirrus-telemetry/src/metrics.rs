//! Invocation metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `cirrus_invocations_total` | Counter | `mode`, `outcome` |
//! | `cirrus_invocation_duration_seconds` | Histogram | `mode` |
//! | `cirrus_acl_denials_total` | Counter | `handler` |
//!
//! No exporter is installed here. Without a recorder the macros are no-ops,
//! so the host decides where metrics go.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Invocation counter name.
pub const INVOCATIONS_TOTAL: &str = "cirrus_invocations_total";

/// Invocation duration histogram name.
pub const INVOCATION_DURATION: &str = "cirrus_invocation_duration_seconds";

/// ACL denial counter name.
pub const ACL_DENIALS_TOTAL: &str = "cirrus_acl_denials_total";

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned a value.
    Success,
    /// A 4xx error.
    ClientError,
    /// A 5xx error.
    ServerError,
}

impl Outcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
        }
    }
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(INVOCATIONS_TOTAL, "Total invocations by mode and outcome");
    describe_histogram!(INVOCATION_DURATION, "Invocation duration in seconds");
    describe_counter!(ACL_DENIALS_TOTAL, "Requests rejected by route ACLs");
}

/// Records a completed invocation.
pub fn record_invocation(mode: &str, outcome: Outcome, duration: Duration) {
    counter!(
        INVOCATIONS_TOTAL,
        "mode" => mode.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(INVOCATION_DURATION, "mode" => mode.to_string()).record(duration.as_secs_f64());
}

/// Records a request rejected by a route ACL.
pub fn record_acl_denial(handler: &str) {
    counter!(ACL_DENIALS_TOTAL, "handler" => handler.to_string()).increment(1);
}
