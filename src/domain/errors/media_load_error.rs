//! Media loading error types.

use thiserror::Error;

/// Result type for loader operations.
pub type MediaLoadResult<T> = std::result::Result<T, MediaLoadError>;

/// Everything that can go wrong while fetching or deriving media.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MediaLoadError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("media too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to decode media: {message}")]
    Decode { message: String },

    #[error("not an image: {url}")]
    NotAnImage { url: String },

    #[error("media loader is closed")]
    Closed,
}

impl MediaLoadError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the failure is transient and worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns whether the failure happened on the wire.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::TooLarge { .. }
        )
    }
}
