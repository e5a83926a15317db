//! Port definition for fetching remote media.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::MediaLoadResult;

/// Fetches the bytes behind a media URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Downloads `url`, failing with [`crate::domain::errors::MediaLoadError::TooLarge`]
    /// once the body exceeds `max_bytes`.
    async fn fetch(&self, url: &str, max_bytes: u64) -> MediaLoadResult<Bytes>;
}
