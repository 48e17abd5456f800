//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating a system configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML, or a field of the wrong shape (unknown operator, device type)
    #[error("cannot parse configuration {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A single field holds an unusable value
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Fields conflict with each other
    #[error("configuration rejected: {message}")]
    ValidationFailed { message: String },
}
