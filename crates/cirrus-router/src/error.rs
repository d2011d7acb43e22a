//! Router error types.

use http::Method;
use thiserror::Error;

/// Errors raised while building a [`RouteTable`](crate::RouteTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Two routes share the same method and pattern.
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute {
        /// HTTP method of the duplicated route
        method: Method,
        /// Pattern declared twice
        pattern: String,
    },

    /// The pattern could not be compiled.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// No route of the requested method matched the path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Route {path} not found")]
pub struct RouteNotFound {
    /// Method of the request
    pub method: Method,
    /// Path after stage stripping
    pub path: String,
}
