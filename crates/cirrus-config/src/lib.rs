//! Typed configuration for Cirrus functions.
//!
//! - TOML and JSON configuration files
//! - Strict parsing (unknown fields are rejected)
//! - Platform conventions (`LAMBDA_ENV`, `LOG_LEVEL`)
//! - Structured environment overrides (`CIRRUS__LOGGING__LEVEL=debug`)
//!
//! # Configuration File Format
//!
//! ```toml
//! [deployment]
//! stage = "prod"     # dev | staging | prod
//! local = false
//!
//! [logging]
//! level = "info"
//! format = "json"    # json | pretty
//!
//! [errors]
//! internal_error_message = "An unexpected error occurred"
//!
//! [auth]
//! role_claim = "custom:roles"
//! ```

#![doc(html_root_url = "https://docs.rs/cirrus-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CirrusConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX, LAMBDA_ENV, LOG_LEVEL};
pub use schema::{
    AuthConfig, DeploymentConfig, DeploymentStage, ErrorConfig, LogFormat, LoggingConfig,
    DEFAULT_INTERNAL_ERROR_MESSAGE,
};
