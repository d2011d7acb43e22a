//! Errors raised while building a [`CirrusConfig`](crate::CirrusConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source could not be turned into a valid config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// Path that was read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML source is malformed or has unknown keys.
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A JSON source is malformed or has unknown keys.
    #[error("invalid JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Only `toml` and `json` sources are understood.
    #[error("config format '{0}' is not supported (use toml or json)")]
    UnsupportedFormat(String),

    /// A loaded value failed validation.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path, e.g. `logging.level`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable holds an unusable value.
    #[error("environment override {var}: {reason}")]
    EnvParseError {
        /// Variable name including its prefix.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `.env` was found but is malformed.
    #[error("cannot load .env: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
