//! Error types for the core crate

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A resource file could not be read
    #[error("Failed to read resource file {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A TOML resource file could not be parsed
    #[error("Failed to parse TOML resource file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON resource file could not be parsed
    #[error("Failed to parse JSON resource file: {0}")]
    Json(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed
    #[error("Failed to set tracing subscriber: {0}")]
    Telemetry(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
