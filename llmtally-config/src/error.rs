//! Configuration error types.

use thiserror::Error;

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Platform name not registered with any handler.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// A required credential field is not configured anywhere.
    #[error("{platform} requires {field}; set the {hint} environment variable or the independent config file")]
    MissingCredential {
        /// Platform name.
        platform: String,
        /// The missing credential field.
        field: &'static str,
        /// Environment variable that would satisfy it.
        hint: String,
    },

    /// A configuration key or value was rejected.
    #[error("Invalid configuration value for `{key}`: {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Filesystem error reading or writing a config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML in a config file.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
