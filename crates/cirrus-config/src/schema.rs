//! Configuration section types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Message returned for server errors in production.
pub const DEFAULT_INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Deployment stage of the function.
///
/// Only `prod` and `staging` are recognised from the platform; anything
/// else is treated as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStage {
    /// Local or development deployment.
    #[default]
    Dev,
    /// Pre-production deployment.
    Staging,
    /// Production deployment.
    Prod,
}

impl DeploymentStage {
    /// Interprets a `LAMBDA_ENV` value.
    #[must_use]
    pub fn from_lambda_env(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    /// Returns true only for [`DeploymentStage::Prod`].
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Prod)
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Deployment stage.
    #[serde(default)]
    pub stage: DeploymentStage,

    /// Running outside the platform (local emulator or tests).
    #[serde(default)]
    pub local: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    #[default]
    Json,
    /// Human-readable pretty format.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Converts into the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> cirrus_telemetry::LogConfig {
        let format = match self.format {
            LogFormat::Json => cirrus_telemetry::LogFormat::Json,
            LogFormat::Pretty => cirrus_telemetry::LogFormat::Pretty,
        };
        cirrus_telemetry::LogConfig::new(self.level.clone()).with_format(format)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error surfacing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ErrorConfig {
    /// Message that replaces server error details in production.
    #[serde(default = "default_internal_error_message")]
    pub internal_error_message: String,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            internal_error_message: default_internal_error_message(),
        }
    }
}

fn default_internal_error_message() -> String {
    DEFAULT_INTERNAL_ERROR_MESSAGE.to_string()
}

/// Authorizer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Claim holding the caller's roles. Defaults to `cognito:groups`.
    #[serde(default)]
    pub role_claim: Option<String>,
}
