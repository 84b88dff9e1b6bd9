//! Error types for the ignite bootstrap initializer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing a bootstrap.
///
/// `Bootstrap::initialize` itself never returns an error; these cover the
/// setup around it (host discovery, config and manifest loading).
#[derive(Error, Debug)]
pub enum Error {
    /// No tokio runtime is available to drive signal delivery
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    /// Package manifest could not be interpreted
    #[error("Invalid package manifest: {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
