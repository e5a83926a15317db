//! In-memory LRU media cache bounded by bytes.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Default memory budget in megabytes.
pub const DEFAULT_MEMORY_CACHE_MB: u64 = 50;

struct Inner {
    entries: LruCache<String, Bytes>,
    current_size: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        if let Some(old) = self.entries.pop(key) {
            self.current_size -= old.len() as u64;
            true
        } else {
            false
        }
    }
}

/// In-memory LRU cache for thumbnails and small payloads.
/// Eviction and insertion happen under one lock.
pub struct MemoryMediaCache {
    inner: Mutex<Inner>,
    max_size: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryMediaCache {
    /// Creates a cache with a budget in megabytes.
    #[must_use]
    pub fn new(budget_mb: u64) -> Self {
        Self::with_budget_bytes(budget_mb.saturating_mul(1024 * 1024))
    }

    /// Creates a cache with a budget in bytes.
    #[must_use]
    pub fn with_budget_bytes(max_size: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                current_size: 0,
            }),
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the payload and promotes it to most recently used.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock().await;
        if let Some(data) = inner.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(data.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Returns the payload without touching recency.
    pub async fn peek(&self, key: &str) -> Option<Bytes> {
        let inner = self.inner.lock().await;
        inner.entries.peek(key).cloned()
    }

    /// Stores a payload, evicting least recently used entries until it fits.
    ///
    /// A payload larger than the whole budget is not stored, and any older
    /// entry under the same key is dropped.
    pub async fn set(&self, key: &str, data: Bytes) {
        let size = data.len() as u64;
        let mut inner = self.inner.lock().await;

        inner.remove(key);

        if size > self.max_size {
            debug!(key = %key, size, max_size = self.max_size, "Payload exceeds memory budget, not caching");
            return;
        }

        while inner.current_size + size > self.max_size {
            let Some((evicted, old)) = inner.entries.pop_lru() else {
                break;
            };
            inner.current_size -= old.len() as u64;
            debug!(key = %evicted, size = old.len(), "Evicted from memory cache");
        }

        inner.entries.put(key.to_string(), data);
        inner.current_size += size;
        trace!(key = %key, size, total = inner.current_size, "Stored in memory cache");
    }

    /// Removes a single entry.
    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        if inner.remove(key) {
            debug!(key = %key, "Removed from memory cache");
        }
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.current_size = 0;
        debug!("Cleared memory media cache");
    }

    /// Returns the byte budget.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Returns cache statistics.
    #[allow(clippy::cast_precision_loss)]
    pub async fn stats(&self) -> MemoryCacheStats {
        let (size_bytes, entries) = {
            let inner = self.inner.lock().await;
            (inner.current_size, inner.entries.len())
        };
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        MemoryCacheStats {
            size_bytes,
            max_bytes: self.max_size,
            entries,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Statistics about the memory tier.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCacheStats {
    /// Bytes currently resident.
    pub size_bytes: u64,
    /// Byte budget.
    pub max_bytes: u64,
    /// Number of resident entries.
    pub entries: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
}

impl std::fmt::Display for MemoryCacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Memory: {} entries, {}/{} bytes, {:.1}% hit rate ({} hits, {} misses)",
            self.entries, self.size_bytes, self.max_bytes, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload(len: usize) -> Bytes {
        Bytes::from(vec![7u8; len])
    }

    #[tokio::test]
    async fn test_cache_set_and_get() {
        let cache = MemoryMediaCache::new(1);
        cache.set("k", Bytes::from_static(b"hello")).await;

        assert_eq!(cache.get("k").await, Some(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = MemoryMediaCache::new(1);
        assert!(cache.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected() {
        let cache = MemoryMediaCache::with_budget_bytes(1);
        cache.set("k", Bytes::from_static(b"ab")).await;

        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats().await.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_oversized_replacement_drops_old_value() {
        let cache = MemoryMediaCache::with_budget_bytes(4);
        cache.set("k", payload(2)).await;
        cache.set("k", payload(5)).await;

        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.stats().await.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction_by_bytes() {
        let cache = MemoryMediaCache::with_budget_bytes(10);

        cache.set("a", payload(4)).await;
        cache.set("b", payload(4)).await;
        // touch "a" so "b" becomes least recently used
        let _ = cache.get("a").await;
        cache.set("c", payload(4)).await;

        assert!(cache.peek("b").await.is_none());
        assert!(cache.peek("a").await.is_some());
        assert!(cache.peek("c").await.is_some());
        assert_eq!(cache.stats().await.size_bytes, 8);
    }

    #[tokio::test]
    async fn test_eviction_frees_enough_space() {
        let cache = MemoryMediaCache::with_budget_bytes(10);
        for key in ["a", "b", "c", "d", "e"] {
            cache.set(key, payload(2)).await;
        }
        cache.set("big", payload(9)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size_bytes, 9);
        assert!(cache.peek("big").await.is_some());
    }

    #[tokio::test]
    async fn test_replacing_key_accounts_size() {
        let cache = MemoryMediaCache::with_budget_bytes(10);
        cache.set("a", payload(6)).await;
        cache.set("a", payload(3)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size_bytes, 3);
    }

    #[tokio::test]
    async fn test_peek_does_not_promote() {
        let cache = MemoryMediaCache::with_budget_bytes(4);
        cache.set("a", payload(2)).await;
        cache.set("b", payload(2)).await;

        let _ = cache.peek("a").await;
        cache.set("c", payload(2)).await;

        assert!(cache.peek("a").await.is_none());
        assert!(cache.peek("b").await.is_some());
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let cache = MemoryMediaCache::new(1);
        cache.set("k", payload(10)).await;
        let _ = cache.get("k").await;
        let _ = cache.get("missing").await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);

        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_stay_within_budget() {
        let cache = Arc::new(MemoryMediaCache::with_budget_bytes(64));
        let mut handles = Vec::new();
        for task in 0..16u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for round in 0..20u8 {
                    let key = format!("k{}", (task + round) % 8);
                    cache.set(&key, Bytes::from(vec![task; 8])).await;
                    if let Some(data) = cache.get(&key).await {
                        assert_eq!(data.len(), 8);
                        assert!(data.iter().all(|b| *b == data[0]));
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats().await;
        assert!(stats.size_bytes <= 64);
        assert_eq!(stats.size_bytes, stats.entries as u64 * 8);
    }
}
