//! Two-tier media cache routing payloads between memory and disk.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::domain::errors::CacheResult;

use super::disk_cache::{DiskCacheStats, DiskMediaCache};
use super::memory_cache::{MemoryCacheStats, MemoryMediaCache};

/// Full payloads smaller than this stay in memory by default.
pub const DEFAULT_MEMORY_THRESHOLD: u64 = 1024 * 1024;

/// Coordinates the memory and disk tiers.
///
/// Thumbnails are kept in memory only. Full payloads below the threshold go to
/// memory, larger ones to disk.
pub struct TieredMediaCache {
    memory: Arc<MemoryMediaCache>,
    disk: Arc<DiskMediaCache>,
    memory_threshold: u64,
}

impl TieredMediaCache {
    /// Creates a coordinator over the given tiers.
    #[must_use]
    pub const fn new(memory: Arc<MemoryMediaCache>, disk: Arc<DiskMediaCache>) -> Self {
        Self {
            memory,
            disk,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
        }
    }

    /// Overrides the memory/disk routing threshold in bytes.
    #[must_use]
    pub const fn with_memory_threshold(mut self, threshold: u64) -> Self {
        self.memory_threshold = threshold;
        self
    }

    /// Returns the memory tier.
    #[must_use]
    pub fn memory(&self) -> &MemoryMediaCache {
        &self.memory
    }

    /// Returns the disk tier.
    #[must_use]
    pub fn disk(&self) -> &DiskMediaCache {
        &self.disk
    }

    /// Returns the cached thumbnail of `url`.
    pub async fn get_thumbnail(&self, url: &str) -> Option<Bytes> {
        self.memory.get(CacheKey::thumbnail(url).as_str()).await
    }

    /// Returns the cached full payload of `url`, checking memory then disk.
    pub async fn get_full(&self, url: &str) -> Option<Bytes> {
        let key = CacheKey::full(url);
        if let Some(data) = self.memory.get(key.as_str()).await {
            return Some(data);
        }
        let data = self.disk.get(key.as_str()).await;
        if data.is_some() {
            trace!(url = %url, "Full payload served from disk");
        }
        data
    }

    /// Stores a thumbnail in memory.
    pub async fn store_thumbnail(&self, url: &str, data: Bytes) {
        self.memory.set(CacheKey::thumbnail(url).as_str(), data).await;
    }

    /// Stores a full payload in the tier chosen by its size.
    ///
    /// # Errors
    /// Returns error if a disk write fails.
    pub async fn store_full(&self, url: &str, data: Bytes) -> CacheResult<()> {
        let key = CacheKey::full(url);
        let size = data.len() as u64;
        if size < self.memory_threshold {
            debug!(url = %url, size, "Caching full payload in memory");
            self.memory.set(key.as_str(), data).await;
            Ok(())
        } else {
            debug!(url = %url, size, "Caching full payload on disk");
            self.disk.set(key.as_str(), data).await
        }
    }

    /// Clears both tiers.
    ///
    /// # Errors
    /// Returns error if the disk tier cannot be cleared. The memory tier is
    /// cleared regardless.
    pub async fn clear_all(&self) -> CacheResult<()> {
        self.memory.clear().await;
        self.disk.clear().await
    }

    /// Returns statistics for both tiers. Disk figures are absent if the
    /// directory cannot be scanned.
    pub async fn stats(&self) -> TieredCacheStats {
        let memory = self.memory.stats().await;
        let disk = match self.disk.usage().await {
            Ok(usage) => Some(usage),
            Err(e) => {
                warn!(error = %e, "Failed to read disk cache usage");
                None
            }
        };
        TieredCacheStats {
            memory,
            disk,
            memory_threshold: self.memory_threshold,
        }
    }
}

/// Statistics for both tiers.
#[derive(Debug, Clone, Serialize)]
pub struct TieredCacheStats {
    /// Memory tier.
    pub memory: MemoryCacheStats,
    /// Disk tier.
    pub disk: Option<DiskCacheStats>,
    /// Routing threshold in bytes.
    pub memory_threshold: u64,
}

impl std::fmt::Display for TieredCacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.memory)?;
        match &self.disk {
            Some(disk) => write!(f, "{disk}"),
            None => write!(f, "Disk: unavailable"),
        }
    }
}
