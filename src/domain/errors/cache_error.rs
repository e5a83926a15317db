//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors raised by the media cache tiers.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CacheError {
    #[error("failed to prepare cache directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache I/O error: {message}")]
    Io { message: String },

    #[error("cache task failed: {message}")]
    Task { message: String },
}

impl CacheError {
    /// Creates an I/O error with context.
    #[must_use]
    pub fn io(context: &str, err: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{context}: {err}"),
        }
    }

    /// Creates an error for a failed blocking task.
    #[must_use]
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}
