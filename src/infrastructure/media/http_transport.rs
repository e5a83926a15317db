//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::domain::errors::{MediaLoadError, MediaLoadResult};
use crate::domain::ports::MediaTransport;

const USER_AGENT: &str = concat!("tootles/", env!("CARGO_PKG_VERSION"));

/// Downloads media with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> MediaLoadResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MediaLoadError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaTransport for ReqwestTransport {
    async fn fetch(&self, url: &str, max_bytes: u64) -> MediaLoadResult<Bytes> {
        debug!(url = %url, "Downloading media");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaLoadError::network(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaLoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared = response.content_length();
        if let Some(size) = declared
            && size > max_bytes
        {
            return Err(MediaLoadError::TooLarge {
                size,
                limit: max_bytes,
            });
        }

        let capacity = declared.unwrap_or(0).min(max_bytes);
        let mut body = BytesMut::with_capacity(usize::try_from(capacity).unwrap_or(0));
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaLoadError::network(format!("Failed to read body: {e}")))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(MediaLoadError::TooLarge {
                    size,
                    limit: max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        trace!(url = %url, size = body.len(), "Download complete");
        Ok(body.freeze())
    }
}
