//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{AuthConfig, ConfigError, DeploymentConfig, DeploymentStage, ErrorConfig, LogFormat, LoggingConfig};

/// Complete Cirrus function configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and the
/// environment over these defaults.
///
/// # Example
///
/// ```
/// use cirrus_config::CirrusConfig;
///
/// let config = CirrusConfig::default();
/// assert!(!config.is_production());
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CirrusConfig {
    /// Deployment stage and locality.
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Error surfacing settings.
    #[serde(default)]
    pub errors: ErrorConfig,

    /// Authorizer settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl CirrusConfig {
    /// Development preset: debug level, pretty logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            deployment: DeploymentConfig {
                stage: DeploymentStage::Dev,
                local: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            ..Self::default()
        }
    }

    /// Production preset: prod stage, JSON logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            deployment: DeploymentConfig {
                stage: DeploymentStage::Prod,
                local: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
            ..Self::default()
        }
    }

    /// Returns true when server error details must be hidden from callers.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        self.deployment.stage.is_production()
    }

    /// Validates field values that serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }
        cirrus_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if self.errors.internal_error_message.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "errors.internal_error_message",
                "must not be empty",
            ));
        }

        if let Some(claim) = &self.auth.role_claim {
            if claim.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "auth.role_claim",
                    "must not be empty when set",
                ));
            }
        }

        Ok(())
    }
}
