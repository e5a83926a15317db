//! Async media loading orchestrator.
//!
//! Resolves a URL through the tiered cache first, then the network, and
//! derives thumbnails for images.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, trace, warn};

use crate::domain::errors::{MediaLoadError, MediaLoadResult};
use crate::domain::ports::MediaTransport;
use crate::domain::services::{FormatClassifier, MediaFormat};
use crate::infrastructure::config::MediaConfig;

use super::thumbnail::derive_thumbnail_blocking;
use super::tiered_cache::TieredMediaCache;

/// Configuration for the media loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Largest accepted payload in bytes.
    pub max_download_bytes: u64,
    /// Bounding box used when preloading thumbnails.
    pub thumbnail_size: (u32, u32),
    /// Upper bound for a whole preload batch.
    pub preload_timeout: Duration,
    /// Decides which URLs are images.
    pub classifier: FormatClassifier,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 5,
            max_download_bytes: 50 * 1024 * 1024,
            thumbnail_size: (150, 150),
            preload_timeout: Duration::from_secs(10),
            classifier: FormatClassifier::default(),
        }
    }
}

impl From<&MediaConfig> for LoaderConfig {
    fn from(config: &MediaConfig) -> Self {
        Self {
            max_concurrent_downloads: config.max_concurrent_downloads,
            max_download_bytes: config.max_download_bytes(),
            thumbnail_size: config.thumbnail_size,
            preload_timeout: config.preload_timeout(),
            classifier: config.classifier(),
        }
    }
}

/// Outcome of a preload batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// URLs submitted.
    pub requested: usize,
    /// URLs now present in the cache.
    pub loaded: usize,
    /// URLs that failed.
    pub failed: usize,
    /// Whether the batch was cut short by the timeout.
    pub timed_out: bool,
}

impl std::fmt::Display for PreloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requested, {} loaded, {} failed",
            self.requested, self.loaded, self.failed
        )?;
        if self.timed_out {
            write!(f, " (timed out)")?;
        }
        Ok(())
    }
}

type UrlLock = Arc<tokio::sync::Mutex<()>>;

/// Orchestrates media loading from cache and network.
pub struct MediaLoader {
    cache: Arc<TieredMediaCache>,
    transport: Arc<dyn MediaTransport>,
    semaphore: Semaphore,
    in_flight: parking_lot::Mutex<HashMap<String, UrlLock>>,
    config: LoaderConfig,
}

impl std::fmt::Debug for MediaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLoader")
            .field("config", &self.config)
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl MediaLoader {
    /// Creates a loader over the given cache and transport.
    #[must_use]
    pub fn new(
        cache: Arc<TieredMediaCache>,
        transport: Arc<dyn MediaTransport>,
        config: LoaderConfig,
    ) -> Self {
        let permits = config.max_concurrent_downloads.max(1);
        Self {
            cache,
            transport,
            semaphore: Semaphore::new(permits),
            in_flight: parking_lot::Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Returns the loader configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn classify(&self, url: &str) -> MediaFormat {
        self.config.classifier.classify(url, None)
    }

    /// Loads the bytes behind `url`.
    ///
    /// With `prefer_thumbnail`, a cached thumbnail is returned when present,
    /// and a freshly downloaded image is shrunk before being returned. If the
    /// thumbnail cannot be derived the full payload is returned instead.
    ///
    /// # Errors
    /// Returns error if the download fails or the loader is closed.
    pub async fn load_media(&self, url: &str, prefer_thumbnail: bool) -> MediaLoadResult<Bytes> {
        self.load_media_as(url, self.classify(url), prefer_thumbnail)
            .await
    }

    /// Like [`Self::load_media`], with the media kind decided by the caller
    /// instead of guessed from the URL.
    ///
    /// # Errors
    /// Returns error if the download fails or the loader is closed.
    pub async fn load_media_as(
        &self,
        url: &str,
        format: MediaFormat,
        prefer_thumbnail: bool,
    ) -> MediaLoadResult<Bytes> {
        if let Some(data) = self.cached(url, prefer_thumbnail).await {
            return Ok(data);
        }

        let slot = self.claim_url(url);
        let _held = slot.lock().await;
        self.load_media_locked(url, format, prefer_thumbnail).await
    }

    async fn load_media_locked(
        &self,
        url: &str,
        format: MediaFormat,
        prefer_thumbnail: bool,
    ) -> MediaLoadResult<Bytes> {
        if let Some(data) = self.cached(url, prefer_thumbnail).await {
            trace!(url = %url, "Served by a concurrent load");
            return Ok(data);
        }

        let data = self.download(url).await?;
        self.store_full(url, data.clone()).await;

        if prefer_thumbnail && format == MediaFormat::Image {
            match derive_thumbnail_blocking(data.clone(), self.config.thumbnail_size).await {
                Ok(thumb) => {
                    self.cache.store_thumbnail(url, thumb.clone()).await;
                    return Ok(thumb);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to derive thumbnail, returning full media");
                }
            }
        }

        Ok(data)
    }

    /// Loads a thumbnail fitting inside `size`.
    ///
    /// Thumbnails are cached per URL regardless of the requested size.
    ///
    /// # Errors
    /// Returns [`MediaLoadError::NotAnImage`] for non-image URLs, or an error
    /// if the download or decode fails.
    pub async fn load_thumbnail(&self, url: &str, size: (u32, u32)) -> MediaLoadResult<Bytes> {
        self.load_thumbnail_as(url, self.classify(url), size).await
    }

    /// Like [`Self::load_thumbnail`], with the media kind decided by the
    /// caller instead of guessed from the URL.
    ///
    /// # Errors
    /// Returns [`MediaLoadError::NotAnImage`] unless `format` is an image, or
    /// an error if the download or decode fails.
    pub async fn load_thumbnail_as(
        &self,
        url: &str,
        format: MediaFormat,
        size: (u32, u32),
    ) -> MediaLoadResult<Bytes> {
        if let Some(thumb) = self.cache.get_thumbnail(url).await {
            return Ok(thumb);
        }
        if format != MediaFormat::Image {
            return Err(MediaLoadError::NotAnImage {
                url: url.to_string(),
            });
        }

        let slot = self.claim_url(url);
        let _held = slot.lock().await;
        self.load_thumbnail_locked(url, size).await
    }

    async fn load_thumbnail_locked(&self, url: &str, size: (u32, u32)) -> MediaLoadResult<Bytes> {
        if let Some(thumb) = self.cache.get_thumbnail(url).await {
            return Ok(thumb);
        }

        let full = match self.cache.get_full(url).await {
            Some(full) => full,
            None => {
                let data = self.download(url).await?;
                self.store_full(url, data.clone()).await;
                data
            }
        };

        let thumb = derive_thumbnail_blocking(full, size).await?;
        self.cache.store_thumbnail(url, thumb.clone()).await;
        debug!(url = %url, size = thumb.len(), "Derived thumbnail");
        Ok(thumb)
    }

    /// Warms the cache for several URLs.
    ///
    /// Images get their thumbnail loaded; other kinds only probe the full
    /// cache. Failures are counted, never raised.
    pub async fn preload_media<I, S>(&self, urls: I) -> PreloadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<(String, MediaFormat)> = urls
            .into_iter()
            .map(|url| {
                let url = url.as_ref();
                (url.to_string(), self.classify(url))
            })
            .collect();
        self.preload_classified(entries).await
    }

    /// Like [`Self::preload_media`], with each URL paired with the media kind
    /// decided by the caller.
    pub async fn preload_classified<I, S>(&self, entries: I) -> PreloadReport
    where
        I: IntoIterator<Item = (S, MediaFormat)>,
        S: AsRef<str>,
    {
        let (urls, formats): (Vec<String>, Vec<MediaFormat>) = entries
            .into_iter()
            .map(|(url, format)| (url.as_ref().to_string(), format))
            .unzip();
        let mut report = PreloadReport {
            requested: urls.len(),
            ..PreloadReport::default()
        };
        if urls.is_empty() {
            return report;
        }

        let tasks = urls.iter().zip(&formats).map(|(url, &format)| async move {
            if format == MediaFormat::Image {
                self.load_thumbnail_as(url, format, self.config.thumbnail_size)
                    .await
                    .map(|_| true)
            } else {
                Ok(self.cache.get_full(url).await.is_some())
            }
        });

        match tokio::time::timeout(self.config.preload_timeout, join_all(tasks)).await {
            Ok(results) => {
                for (url, result) in urls.iter().zip(results) {
                    match result {
                        Ok(true) => report.loaded += 1,
                        Ok(false) => {}
                        Err(e) => {
                            debug!(url = %url, error = %e, "Preload failed");
                            report.failed += 1;
                        }
                    }
                }
            }
            Err(_) => {
                debug!(
                    count = urls.len(),
                    timeout_secs = self.config.preload_timeout.as_secs(),
                    "Preload timed out"
                );
                report.timed_out = true;
            }
        }

        debug!(%report, "Preload finished");
        report
    }

    /// Stops accepting downloads. Cached payloads are still served.
    pub fn close(&self) {
        if !self.semaphore.is_closed() {
            self.semaphore.close();
            info!("Media loader closed");
        }
    }

    /// Returns true once [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Returns the number of free download slots.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    async fn cached(&self, url: &str, prefer_thumbnail: bool) -> Option<Bytes> {
        if prefer_thumbnail && let Some(thumb) = self.cache.get_thumbnail(url).await {
            return Some(thumb);
        }
        self.cache.get_full(url).await
    }

    async fn download(&self, url: &str) -> MediaLoadResult<Bytes> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MediaLoadError::Closed)?;
        let data = self
            .transport
            .fetch(url, self.config.max_download_bytes)
            .await?;
        debug!(url = %url, size = data.len(), "Downloaded media");
        Ok(data)
    }

    async fn store_full(&self, url: &str, data: Bytes) {
        if let Err(e) = self.cache.store_full(url, data).await {
            warn!(url = %url, error = %e, "Failed to cache media");
        }
    }

    fn claim_url<'a>(&'a self, url: &'a str) -> InFlight<'a> {
        let lock = self
            .in_flight
            .lock()
            .entry(url.to_string())
            .or_default()
            .clone();
        InFlight {
            loader: self,
            url,
            lock,
        }
    }
}

/// Claim on the per-URL lock. The map entry is released on drop, so a load
/// cancelled while waiting or downloading leaves nothing behind.
struct InFlight<'a> {
    loader: &'a MediaLoader,
    url: &'a str,
    lock: UrlLock,
}

impl InFlight<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.loader.in_flight.lock();
        // the map and this claim are the only holders left
        let idle = in_flight.get(self.url).is_some_and(|current| {
            Arc::ptr_eq(current, &self.lock) && Arc::strong_count(&self.lock) <= 2
        });
        if idle {
            in_flight.remove(self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockMediaTransport;
    use crate::infrastructure::media::disk_cache::DiskMediaCache;
    use crate::infrastructure::media::memory_cache::MemoryMediaCache;
    use crate::infrastructure::media::thumbnail::tests::png_bytes;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const PNG_URL: &str = "https://files.example/media/a.png";
    const VIDEO_URL: &str = "https://files.example/media/b.mp4";

    async fn tiered(temp: &TempDir) -> Arc<TieredMediaCache> {
        let memory = Arc::new(MemoryMediaCache::new(4));
        let disk = Arc::new(
            DiskMediaCache::new(temp.path().join("media"), 4 * 1024 * 1024)
                .await
                .unwrap(),
        );
        Arc::new(TieredMediaCache::new(memory, disk))
    }

    async fn loader_with(transport: impl MediaTransport + 'static) -> (MediaLoader, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = tiered(&temp).await;
        (
            MediaLoader::new(cache, Arc::new(transport), LoaderConfig::default()),
            temp,
        )
    }

    struct SlowTransport {
        calls: AtomicUsize,
        delay: Duration,
        data: Bytes,
    }

    impl SlowTransport {
        fn new(delay: Duration, data: Bytes) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                data,
            }
        }
    }

    #[async_trait]
    impl MediaTransport for Arc<SlowTransport> {
        async fn fetch(&self, _url: &str, _max_bytes: u64) -> MediaLoadResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.data.clone())
        }
    }

    #[tokio::test]
    async fn test_load_media_downloads_once_then_hits_cache() {
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"video bytes")));
        let (loader, _temp) = loader_with(transport).await;

        let first = loader.load_media(VIDEO_URL, false).await.unwrap();
        let second = loader.load_media(VIDEO_URL, false).await.unwrap();

        assert_eq!(first, Bytes::from_static(b"video bytes"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_load_media_prefers_thumbnail_for_images() {
        let original = png_bytes(600, 300);
        let data = original.clone();
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(move |_, _| Ok(data.clone()));
        let (loader, _temp) = loader_with(transport).await;

        let thumb = loader.load_media(PNG_URL, true).await.unwrap();

        assert_ne!(thumb, original);
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (150, 75));
        assert_eq!(loader.cache.get_full(PNG_URL).await, Some(original));
        assert_eq!(loader.load_media(PNG_URL, true).await.unwrap(), thumb);
    }

    #[tokio::test]
    async fn test_prefer_thumbnail_ignored_for_non_images() {
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"mp4")));
        let (loader, _temp) = loader_with(transport).await;

        let data = loader.load_media(VIDEO_URL, true).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"mp4"));
        assert!(loader.cache.get_thumbnail(VIDEO_URL).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_image_returns_full_payload() {
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"not really a png")));
        let (loader, _temp) = loader_with(transport).await;

        let data = loader.load_media(PNG_URL, true).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"not really a png"));
    }

    #[tokio::test]
    async fn test_http_errors_propagate() {
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(1).returning(|url, _| {
            Err(MediaLoadError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        });
        let (loader, _temp) = loader_with(transport).await;

        let err = loader.load_media(PNG_URL, false).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_cache_store_failure_is_best_effort() {
        let temp = TempDir::new().unwrap();
        let cache_dir = temp.path().join("media");
        let memory = Arc::new(MemoryMediaCache::new(1));
        let disk = Arc::new(DiskMediaCache::new(cache_dir.clone(), 1024).await.unwrap());
        let cache = Arc::new(TieredMediaCache::new(memory, disk).with_memory_threshold(0));
        std::fs::remove_dir_all(&cache_dir).unwrap();

        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"payload")));
        let loader = MediaLoader::new(cache, Arc::new(transport), LoaderConfig::default());

        let data = loader.load_media(VIDEO_URL, false).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_load_thumbnail_rejects_non_images_without_download() {
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let (loader, _temp) = loader_with(transport).await;

        let err = loader.load_thumbnail(VIDEO_URL, (150, 150)).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::NotAnImage { .. }));
    }

    #[tokio::test]
    async fn test_load_thumbnail_from_cached_full() {
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let (loader, _temp) = loader_with(transport).await;
        loader.cache.store_full(PNG_URL, png_bytes(80, 80)).await.unwrap();

        let thumb = loader.load_thumbnail(PNG_URL, (40, 40)).await.unwrap();
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (40, 40));
    }

    #[tokio::test]
    async fn test_load_thumbnail_decode_failure_is_error() {
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"garbage")));
        let (loader, _temp) = loader_with(transport).await;

        let err = loader.load_thumbnail(PNG_URL, (150, 150)).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_close_rejects_downloads_but_serves_cache() {
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let (loader, _temp) = loader_with(transport).await;
        loader.cache.store_full(VIDEO_URL, Bytes::from_static(b"cached")).await.unwrap();

        assert_eq!(loader.available_permits(), 5);
        loader.close();
        loader.close();
        assert!(loader.is_closed());

        let err = loader.load_media(PNG_URL, false).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::Closed));
        assert_eq!(
            loader.load_media(VIDEO_URL, false).await.unwrap(),
            Bytes::from_static(b"cached")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_of_same_url_issue_one_request() {
        let transport = Arc::new(SlowTransport::new(
            Duration::from_millis(50),
            Bytes::from_static(b"shared"),
        ));
        let (loader, _temp) = loader_with(transport.clone()).await;
        let loader = Arc::new(loader);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load_media(VIDEO_URL, false).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), Bytes::from_static(b"shared"));
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(loader.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_loads_release_url_locks() {
        let transport = Arc::new(SlowTransport::new(
            Duration::from_secs(30),
            Bytes::from_static(b"late"),
        ));
        let (loader, _temp) = loader_with(transport).await;

        for i in 0..100 {
            let url = format!("https://files.example/media/{i}.mp4");
            let outcome =
                tokio::time::timeout(Duration::from_millis(1), loader.load_media(&url, false)).await;
            assert!(outcome.is_err());
        }

        assert!(loader.in_flight.lock().is_empty());
        assert_eq!(loader.available_permits(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_waiter_leaves_entry_to_holder() {
        let transport = Arc::new(SlowTransport::new(
            Duration::from_millis(100),
            Bytes::from_static(b"shared"),
        ));
        let (loader, _temp) = loader_with(transport.clone()).await;
        let loader = Arc::new(loader);

        let holder = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_media(VIDEO_URL, false).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter =
            tokio::time::timeout(Duration::from_millis(10), loader.load_media(VIDEO_URL, false)).await;
        assert!(waiter.is_err());
        assert_eq!(loader.in_flight.lock().len(), 1);

        assert_eq!(holder.await.unwrap().unwrap(), Bytes::from_static(b"shared"));
        assert!(loader.in_flight.lock().is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_format_overrides_url_guess() {
        const BARE_URL: &str = "https://files.example/media/abc123";
        let source = png_bytes(300, 150);
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(move |_, _| Ok(source.clone()));
        let (loader, _temp) = loader_with(transport).await;

        let err = loader.load_thumbnail(BARE_URL, (150, 150)).await.unwrap_err();
        assert!(matches!(err, MediaLoadError::NotAnImage { .. }));

        let thumb = loader
            .load_thumbnail_as(BARE_URL, MediaFormat::Image, (150, 150))
            .await
            .unwrap();
        let img = image::load_from_memory(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (150, 75));

        let report = loader
            .preload_classified([(BARE_URL, MediaFormat::Image)])
            .await;
        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_preload_counts_outcomes() {
        let thumb_source = png_bytes(300, 300);
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().returning(move |url, _| {
            if url.ends_with("ok.png") {
                Ok(thumb_source.clone())
            } else {
                Err(MediaLoadError::network("connection reset"))
            }
        });
        let (loader, _temp) = loader_with(transport).await;
        loader.cache.store_full(VIDEO_URL, Bytes::from_static(b"v")).await.unwrap();

        let report = loader
            .preload_media([
                "https://files.example/ok.png",
                "https://files.example/broken.png",
                VIDEO_URL,
                "https://files.example/uncached.mp3",
            ])
            .await;

        assert_eq!(
            report,
            PreloadReport {
                requested: 4,
                loaded: 2,
                failed: 1,
                timed_out: false,
            }
        );
        assert!(loader.cache.get_thumbnail("https://files.example/ok.png").await.is_some());
    }

    #[tokio::test]
    async fn test_preload_times_out() {
        let transport = Arc::new(SlowTransport::new(
            Duration::from_secs(30),
            Bytes::from_static(b"never"),
        ));
        let temp = TempDir::new().unwrap();
        let config = LoaderConfig {
            preload_timeout: Duration::from_millis(50),
            ..LoaderConfig::default()
        };
        let loader = MediaLoader::new(tiered(&temp).await, Arc::new(transport), config);

        let report = loader.preload_media([PNG_URL]).await;
        assert!(report.timed_out);
        assert_eq!(report.requested, 1);
        assert_eq!(report.loaded, 0);
    }

    #[tokio::test]
    async fn test_preload_empty_is_noop() {
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let (loader, _temp) = loader_with(transport).await;

        let report = loader.preload_media(Vec::<String>::new()).await;
        assert_eq!(report, PreloadReport::default());
    }
}
