//! Error handling for pipwatch

use std::path::PathBuf;
use thiserror::Error;

/// Core error type used throughout pipwatch
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipwatchError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON serialization/deserialization error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        file: Option<PathBuf>,
    },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Installation of '{package}' failed: {message}")]
    Install { package: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PipwatchError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error that remembers which path it happened on
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::Io {
            message: format!("{}: {}", path.display(), source),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file: None,
        }
    }

    /// Create a parse error attributed to a source file
    pub fn parse_in(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new installation error
    pub fn install(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Install {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PipwatchError {
    fn from(err: std::io::Error) -> Self {
        PipwatchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PipwatchError {
    fn from(err: serde_json::Error) -> Self {
        PipwatchError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias for convenience
pub type PipwatchResult<T> = Result<T, PipwatchError>;
