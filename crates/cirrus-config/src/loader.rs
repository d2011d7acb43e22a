//! Layered configuration loader.
//!
//! Layers, later overriding earlier:
//! 1. Defaults (or a preset)
//! 2. A TOML or JSON file or string
//! 3. Host conventions: `LAMBDA_ENV` and `LOG_LEVEL`
//! 4. Prefixed overrides: `PREFIX__SECTION__KEY`

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{CirrusConfig, ConfigError, DeploymentStage};

/// Variable naming the deployment stage.
pub const LAMBDA_ENV: &str = "LAMBDA_ENV";

/// Variable overriding the log level.
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Default prefix for structured overrides.
pub const DEFAULT_ENV_PREFIX: &str = "CIRRUS";

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use cirrus_config::ConfigLoader;
///
/// # fn main() -> Result<(), cirrus_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("cirrus.toml")?
///     .with_env_prefix("CIRRUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CirrusConfig,
    env_prefix: Option<String>,
    env_source: Option<BTreeMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`CirrusConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CirrusConfig::default(),
            env_prefix: None,
            env_source: None,
        }
    }

    /// Starts from [`CirrusConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = CirrusConfig::development();
        self
    }

    /// Starts from [`CirrusConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = CirrusConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed, or has an
    /// unsupported extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), skipping a missing file.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`toml` or `json`).
    ///
    /// ```
    /// use cirrus_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[logging]\nlevel = \"warn\"", "toml")
    ///     .unwrap()
    ///     .with_env_vars(std::iter::empty::<(String, String)>())
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.logging.level, "warn");
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on malformed content or an unknown format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_source = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Loads `.env` into the process environment if present.
    ///
    /// # Errors
    ///
    /// Fails if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Applies environment layers and validates.
    ///
    /// # Errors
    ///
    /// Fails on a malformed override or an invalid final configuration.
    pub fn load(self) -> Result<CirrusConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment layers without validating.
    ///
    /// # Errors
    ///
    /// Fails on a malformed override.
    pub fn load_unvalidated(mut self) -> Result<CirrusConfig, ConfigError> {
        let vars = self
            .env_source
            .take()
            .unwrap_or_else(|| env::vars().collect());

        if let Some(stage) = vars.get(LAMBDA_ENV) {
            self.config.deployment.stage = DeploymentStage::from_lambda_env(stage);
        }
        if let Some(level) = vars.get(LOG_LEVEL).filter(|l| !l.is_empty()) {
            self.config.logging.level = level.clone();
        }

        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            for (key, value) in &vars {
                if let Some(path) = key.strip_prefix(&marker) {
                    self.apply_override(key, path, value)?;
                }
            }
        }

        Ok(self.config)
    }

    fn apply_override(&mut self, var: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();

        match parts.as_slice() {
            ["DEPLOYMENT", "STAGE"] => {
                self.config.deployment.stage = DeploymentStage::from_lambda_env(value);
            }
            ["DEPLOYMENT", "LOCAL"] => {
                self.config.deployment.local = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(var, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env_parse_error(var, reason))?;
            }
            ["ERRORS", "INTERNAL_ERROR_MESSAGE"] => {
                self.config.errors.internal_error_message = value.to_string();
            }
            ["AUTH", "ROLE_CLAIM"] => {
                self.config.auth.role_claim = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<CirrusConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
