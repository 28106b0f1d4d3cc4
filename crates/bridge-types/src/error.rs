//! Configuration error type.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying loader failure (file, env, deserialization)
    #[error("Configuration error: {0}")]
    Load(String),

    /// A loaded value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
