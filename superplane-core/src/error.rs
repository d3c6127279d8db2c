//! Error taxonomy shared by the core and every command.

use crate::client::ApiError;
use std::io;
use thiserror::Error;

/// Errors surfaced by the core.
///
/// Every variant becomes the process's terminal error when it reaches the
/// command layer; nothing in the core retries or recovers.
#[derive(Debug, Error)]
pub enum CliError {
    /// Output format other than `text`, `json` or `yaml`.
    #[error("{0}")]
    InvalidFormat(String),

    /// Bad or missing arguments, malformed selection input, malformed resource headers.
    #[error("{0}")]
    Validation(String),

    /// No contexts, no matching selector, empty candidate list.
    #[error("{0}")]
    NotFound(String),

    /// Selection index out of bounds.
    #[error("{0}")]
    Range(String),

    /// Renderer/call-site mismatch, or an interactive flow under structured output.
    #[error("{0}")]
    Unsupported(String),

    /// File read/write failure or interrupted interactive input.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The persisted config file could not be parsed.
    #[error("invalid configuration file {path}: {message}")]
    Config { path: String, message: String },

    /// JSON/YAML encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Errors returned by the remote API, passed through unmodified.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result alias used throughout the core.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CliError::NotFound(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        CliError::Range(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        CliError::Unsupported(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CliError::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}
