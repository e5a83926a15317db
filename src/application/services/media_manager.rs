//! Media facade used by the rest of the client.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::entities::{MediaAttachment, MediaView, SizeHint};
use crate::domain::errors::{CacheResult, MediaLoadResult};
use crate::domain::ports::MediaTransport;
use crate::domain::services::{FormatClassifier, MediaFormat};
use crate::infrastructure::config::MediaConfig;
use crate::infrastructure::media::{
    DiskMediaCache, ExternalViewerDispatcher, LoaderConfig, MediaLoader, MemoryMediaCache,
    PreloadReport, ProgramProbe, ReqwestTransport, SystemProbe, TieredCacheStats,
    TieredMediaCache, ViewerCommand,
};

use super::media_renderer::MediaRenderer;

/// Formats the client can show, inline or through a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedFormats {
    /// Kinds drawn inside the terminal.
    pub inline: Vec<MediaFormat>,
    /// Kinds with an external viewer.
    pub external: Vec<MediaFormat>,
    /// Configured extensions per kind.
    pub extensions: BTreeMap<MediaFormat, Vec<String>>,
}

/// Cache and viewer statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MediaCacheStats {
    /// Per-tier figures.
    pub cache: TieredCacheStats,
    /// Registered external viewers.
    pub external_viewers: BTreeMap<MediaFormat, ViewerCommand>,
    /// Whether a loader is currently alive.
    pub loader_active: bool,
}

impl std::fmt::Display for MediaCacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.cache)?;
        if self.external_viewers.is_empty() {
            write!(f, "Viewers: none")
        } else {
            let viewers: Vec<String> = self
                .external_viewers
                .iter()
                .map(|(format, viewer)| format!("{format}={viewer}"))
                .collect();
            write!(f, "Viewers: {}", viewers.join(", "))
        }
    }
}

/// Entry point of the media subsystem.
///
/// Owns the tiered cache, the viewer dispatcher and a lazily created
/// [`MediaLoader`].
pub struct MediaManager {
    config: MediaConfig,
    classifier: FormatClassifier,
    cache: Arc<TieredMediaCache>,
    dispatcher: ExternalViewerDispatcher,
    renderer: MediaRenderer,
    transport: Option<Arc<dyn MediaTransport>>,
    loader: Mutex<Option<Arc<MediaLoader>>>,
}

impl std::fmt::Debug for MediaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaManager")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl MediaManager {
    /// Builds the caches and probes the host for viewers.
    ///
    /// # Errors
    /// Returns error if the disk cache directory cannot be created.
    pub async fn new(config: MediaConfig) -> CacheResult<Self> {
        Self::with_parts(config, None, Arc::new(SystemProbe)).await
    }

    /// Builds a manager with injected collaborators. Without a transport a
    /// `reqwest` one is created on first use.
    ///
    /// # Errors
    /// Returns error if the disk cache directory cannot be created.
    pub async fn with_parts(
        config: MediaConfig,
        transport: Option<Arc<dyn MediaTransport>>,
        probe: Arc<dyn ProgramProbe>,
    ) -> CacheResult<Self> {
        let memory = Arc::new(MemoryMediaCache::with_budget_bytes(
            config.memory_budget_bytes(),
        ));
        let disk = Arc::new(
            DiskMediaCache::new(config.resolved_cache_directory(), config.disk_budget_bytes())
                .await?,
        );
        let cache = Arc::new(
            TieredMediaCache::new(memory, disk)
                .with_memory_threshold(config.full_media_memory_threshold()),
        );
        let classifier = config.classifier();
        let dispatcher = ExternalViewerDispatcher::new(&config.external_viewers, probe)
            .with_classifier(classifier.clone());

        info!(
            previews = config.show_media_previews,
            cache_dir = %config.resolved_cache_directory().display(),
            "Media manager ready"
        );

        Ok(Self {
            renderer: MediaRenderer::new(config.inline_images),
            classifier,
            cache,
            dispatcher,
            transport,
            loader: Mutex::new(None),
            config,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &MediaConfig {
        &self.config
    }

    async fn loader(&self) -> MediaLoadResult<Arc<MediaLoader>> {
        let mut slot = self.loader.lock().await;
        if let Some(loader) = slot.as_ref() {
            return Ok(loader.clone());
        }

        let transport: Arc<dyn MediaTransport> = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new(self.config.request_timeout())?),
        };
        let loader = Arc::new(MediaLoader::new(
            self.cache.clone(),
            transport,
            LoaderConfig::from(&self.config),
        ));
        debug!("Created media loader");
        *slot = Some(loader.clone());
        Ok(loader)
    }

    /// Returns the view to mount for `attachment`. Never fails; problems
    /// degrade to placeholders.
    pub async fn get_media_widget(
        &self,
        attachment: &MediaAttachment,
        size: SizeHint,
        preload: bool,
    ) -> MediaView {
        if !self.config.show_media_previews {
            return MediaRenderer::disabled(attachment);
        }

        let format = self.classifier.classify_attachment(attachment);
        if format == MediaFormat::Unknown {
            return MediaView::Placeholder(MediaRenderer::placeholder(attachment, format));
        }

        let data = if preload {
            match self.prefetch(&attachment.url, format, size).await {
                Ok(data) => Some(data),
                Err(e) => {
                    debug!(url = %attachment.url, error = %e, "Failed to preload media");
                    None
                }
            }
        } else {
            None
        };

        self.renderer.render(attachment, format, data.as_ref())
    }

    async fn prefetch(
        &self,
        url: &str,
        format: MediaFormat,
        size: SizeHint,
    ) -> MediaLoadResult<Bytes> {
        let loader = self.loader().await?;
        match size {
            SizeHint::Thumbnail => {
                loader
                    .load_thumbnail_as(url, format, self.config.thumbnail_size)
                    .await
            }
            SizeHint::Medium | SizeHint::Full => loader.load_media_as(url, format, false).await,
        }
    }

    /// Warms the cache for the supported attachments in `attachments`.
    pub async fn preload_media(&self, attachments: &[MediaAttachment]) -> PreloadReport {
        if !self.config.show_media_previews || attachments.is_empty() {
            return PreloadReport::default();
        }

        let entries: Vec<(&str, MediaFormat)> = attachments
            .iter()
            .map(|a| (a.url.as_str(), self.classifier.classify_attachment(a)))
            .filter(|(_, format)| *format != MediaFormat::Unknown)
            .collect();
        if entries.is_empty() {
            return PreloadReport::default();
        }

        match self.loader().await {
            Ok(loader) => loader.preload_classified(entries).await,
            Err(e) => {
                debug!(error = %e, "Failed to preload media");
                PreloadReport {
                    requested: entries.len(),
                    failed: entries.len(),
                    ..PreloadReport::default()
                }
            }
        }
    }

    /// Runs [`Self::preload_media`] in the background.
    pub fn spawn_preload(
        self: &Arc<Self>,
        attachments: Vec<MediaAttachment>,
    ) -> tokio::task::JoinHandle<PreloadReport> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.preload_media(&attachments).await })
    }

    /// Opens `attachment` in an external viewer. With `use_cached`, the bytes
    /// are fetched first (cache, then network) and handed over as a file.
    /// Returns false on any failure.
    pub async fn open_media_external(&self, attachment: &MediaAttachment, use_cached: bool) -> bool {
        let format = self.classifier.classify_attachment(attachment);
        let data = if use_cached {
            self.full_media(&attachment.url, format).await
        } else {
            None
        };

        match self
            .dispatcher
            .open_media_as(&attachment.url, format, data)
            .await
        {
            Ok(opened) => opened,
            Err(e) => {
                warn!(url = %attachment.url, error = %e, "Failed to open media externally");
                false
            }
        }
    }

    async fn full_media(&self, url: &str, format: MediaFormat) -> Option<Bytes> {
        if let Some(data) = self.cache.get_full(url).await {
            return Some(data);
        }
        let result = match self.loader().await {
            Ok(loader) => loader.load_media_as(url, format, false).await,
            Err(e) => Err(e),
        };
        result
            .map_err(|e| debug!(url = %url, error = %e, "Failed to load media for viewer"))
            .ok()
    }

    /// Returns the bytes behind `url`, or `None` if they cannot be loaded.
    pub async fn get_media_data(&self, url: &str, prefer_thumbnail: bool) -> Option<Bytes> {
        let loader = match self.loader().await {
            Ok(loader) => loader,
            Err(e) => {
                debug!(url = %url, error = %e, "Media loader unavailable");
                return None;
            }
        };
        match loader.load_media(url, prefer_thumbnail).await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(url = %url, error = %e, "Failed to get media data");
                None
            }
        }
    }

    /// Returns true if `attachment` would be drawn inline given bytes.
    #[must_use]
    pub fn can_display_inline(&self, attachment: &MediaAttachment) -> bool {
        self.renderer.inline_enabled()
            && self.classifier.classify_attachment(attachment) == MediaFormat::Image
    }

    /// Returns true if a viewer can open `attachment`.
    #[must_use]
    pub fn is_external_viewer_available(&self, attachment: &MediaAttachment) -> bool {
        self.dispatcher
            .is_viewer_available(self.classifier.classify_attachment(attachment))
    }

    /// Lists the kinds shown inline, the kinds with viewers and the
    /// configured extensions.
    #[must_use]
    pub fn get_supported_formats(&self) -> SupportedFormats {
        let inline = if self.renderer.inline_enabled() {
            vec![MediaFormat::Image]
        } else {
            Vec::new()
        };
        let external: BTreeSet<MediaFormat> =
            self.dispatcher.available_viewers().into_keys().collect();
        let extensions = MediaFormat::VIEWABLE
            .into_iter()
            .map(|format| (format, self.classifier.extensions(format)))
            .collect();

        SupportedFormats {
            inline,
            external: external.into_iter().collect(),
            extensions,
        }
    }

    /// Clears both cache tiers.
    ///
    /// # Errors
    /// Returns error if the disk tier cannot be cleared.
    pub async fn clear_cache(&self) -> CacheResult<()> {
        self.cache.clear_all().await?;
        info!("Cleared media caches");
        Ok(())
    }

    /// Removes disk entries older than `cache_expiry_days`.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn prune_expired(&self) -> CacheResult<usize> {
        self.cache
            .disk()
            .prune_older_than(self.config.cache_expiry())
            .await
    }

    /// Returns cache and viewer statistics.
    pub async fn get_cache_stats(&self) -> MediaCacheStats {
        MediaCacheStats {
            cache: self.cache.stats().await,
            external_viewers: self.dispatcher.available_viewers(),
            loader_active: self.loader.lock().await.is_some(),
        }
    }

    /// Closes the loader and removes temporary files. Safe to call more than
    /// once; a later load creates a fresh loader.
    pub async fn cleanup(&self) {
        if let Some(loader) = self.loader.lock().await.take() {
            loader.close();
        }
        let removed = self.dispatcher.cleanup_temp_files();
        debug!(removed, "Media manager cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AttachmentKind, MediaDimensions, PlaceholderKind};
    use crate::domain::errors::MediaLoadError;
    use crate::domain::ports::MockMediaTransport;
    use crate::infrastructure::media::thumbnail::tests::png_bytes;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> MediaConfig {
        MediaConfig {
            cache_directory: temp.path().join("media"),
            ..MediaConfig::default()
        }
    }

    fn no_programs() -> Arc<dyn ProgramProbe> {
        Arc::new(|_: &str| -> Option<PathBuf> { None })
    }

    async fn manager(config: MediaConfig, transport: MockMediaTransport) -> MediaManager {
        MediaManager::with_parts(config, Some(Arc::new(transport)), no_programs())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_previews_skip_loader() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let config = MediaConfig {
            show_media_previews: false,
            ..config(&temp)
        };
        let manager = manager(config, transport).await;

        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png")
            .with_description("Sunset");
        let view = manager.get_media_widget(&attachment, SizeHint::Thumbnail, true).await;

        let placeholder = view.as_placeholder().unwrap();
        assert_eq!(placeholder.kind, PlaceholderKind::Disabled);
        assert_eq!(view.lines(), vec!["📎 Sunset (previews disabled)"]);
        assert!(!manager.get_cache_stats().await.loader_active);
        assert_eq!(manager.preload_media(&[attachment]).await, PreloadReport::default());
    }

    #[tokio::test]
    async fn test_video_without_preload() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("2", AttachmentKind::Unknown, "video.mp4");
        let view = manager.get_media_widget(&attachment, SizeHint::Thumbnail, false).await;

        let placeholder = view.as_placeholder().unwrap();
        assert_eq!(placeholder.kind, PlaceholderKind::Video);
        assert_eq!(placeholder.dimensions, None);
        assert_eq!(placeholder.hint(), Some("▶️ Press Enter to play"));
    }

    #[tokio::test]
    async fn test_image_thumbnail_renders_inline() {
        let temp = TempDir::new().unwrap();
        let source = png_bytes(400, 200);
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(move |_, _| Ok(source.clone()));
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("3", AttachmentKind::Image, "https://x.example/a.png");
        let view = manager.get_media_widget(&attachment, SizeHint::Thumbnail, true).await;

        let MediaView::Inline(img) = view else {
            panic!("expected inline image");
        };
        assert_eq!((img.width, img.height), (150, 75));
        assert!(manager.get_cache_stats().await.loader_active);
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_placeholder() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .returning(|_, _| Err(MediaLoadError::network("offline")));
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("4", AttachmentKind::Image, "https://x.example/a.jpg")
            .with_original(MediaDimensions {
                width: Some(800),
                height: Some(600),
                ..MediaDimensions::default()
            });
        let view = manager.get_media_widget(&attachment, SizeHint::Full, true).await;

        let placeholder = view.as_placeholder().unwrap();
        assert_eq!(placeholder.kind, PlaceholderKind::Image);
        assert_eq!(placeholder.dimensions, Some((800, 600)));
        assert!(manager.get_media_data("https://x.example/a.jpg", false).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_format_is_generic() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("5", AttachmentKind::Unknown, "https://x.example/file.bin");
        let view = manager.get_media_widget(&attachment, SizeHint::Full, true).await;

        assert_eq!(view.as_placeholder().unwrap().kind, PlaceholderKind::Generic);
        assert!(!manager.can_display_inline(&attachment));
        assert_eq!(manager.preload_media(&[attachment]).await, PreloadReport::default());
    }

    #[tokio::test]
    async fn test_preload_filters_and_reports() {
        let temp = TempDir::new().unwrap();
        let source = png_bytes(10, 10);
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(move |_, _| Ok(source.clone()));
        let manager = Arc::new(manager(config(&temp), transport).await);

        let attachments = vec![
            MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png"),
            MediaAttachment::new("2", AttachmentKind::Unknown, "https://x.example/readme.txt"),
            MediaAttachment::new("3", AttachmentKind::Video, "https://x.example/v.mp4"),
        ];
        let report = manager.spawn_preload(attachments).await.unwrap();

        assert_eq!(report.requested, 2);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed, 0);
        assert!(manager.get_media_data("https://x.example/a.png", true).await.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kind_tag_drives_every_layer_for_bare_urls() {
        let temp = TempDir::new().unwrap();
        let source = png_bytes(400, 200);
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(1)
            .returning(move |_, _| Ok(source.clone()));
        let mut config = config(&temp);
        config
            .external_viewers
            .insert("image".to_string(), "true".to_string());
        let probe: Arc<dyn ProgramProbe> =
            Arc::new(|name: &str| (name == "true").then(|| PathBuf::from("/bin/true")));
        let manager = MediaManager::with_parts(config, Some(Arc::new(transport)), probe)
            .await
            .unwrap();

        let attachment = MediaAttachment::new(
            "6",
            AttachmentKind::Image,
            "https://files.example/media/abc123",
        );
        let view = manager.get_media_widget(&attachment, SizeHint::Thumbnail, true).await;

        assert!(view.is_inline());
        assert!(manager.can_display_inline(&attachment));
        assert!(manager.is_external_viewer_available(&attachment));
        assert!(manager.open_media_external(&attachment, true).await);

        let report = manager.preload_media(&[attachment]).await;
        assert_eq!(report.loaded, 1);
        assert_eq!(report.failed, 0);
        manager.cleanup().await;
    }

    #[tokio::test]
    async fn test_out_of_range_duration_still_renders() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("7", AttachmentKind::Video, "https://x.example/v.mp4")
            .with_original(MediaDimensions {
                duration: Some(1e30),
                ..MediaDimensions::default()
            });
        let view = manager.get_media_widget(&attachment, SizeHint::Full, false).await;

        let placeholder = view.as_placeholder().unwrap();
        assert_eq!(placeholder.kind, PlaceholderKind::Video);
        assert_eq!(placeholder.duration, None);
    }

    #[tokio::test]
    async fn test_open_external_without_viewer_is_false() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport.expect_fetch().times(0);
        let manager = manager(config(&temp), transport).await;

        let attachment = MediaAttachment::new("1", AttachmentKind::Audio, "https://x.example/a.mp3");
        assert!(!manager.is_external_viewer_available(&attachment));
        assert!(!manager.open_media_external(&attachment, false).await);
    }

    #[tokio::test]
    async fn test_supported_formats() {
        let temp = TempDir::new().unwrap();
        let config = MediaConfig {
            external_viewers: [("video".to_string(), "mpv".to_string())].into_iter().collect(),
            ..config(&temp)
        };
        let manager = manager(config, MockMediaTransport::new()).await;

        let formats = manager.get_supported_formats();
        assert_eq!(formats.inline, vec![MediaFormat::Image]);
        assert_eq!(formats.external, vec![MediaFormat::Video]);
        assert!(formats.extensions[&MediaFormat::Audio].contains(&"flac".to_string()));
    }

    #[tokio::test]
    async fn test_cache_maintenance_and_cleanup() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockMediaTransport::new();
        transport
            .expect_fetch()
            .times(2)
            .returning(|_, _| Ok(Bytes::from_static(b"clip")));
        let manager = manager(config(&temp), transport).await;

        let url = "https://x.example/v.mp4";
        assert!(manager.get_media_data(url, false).await.is_some());
        assert_eq!(manager.get_cache_stats().await.cache.memory.entries, 1);

        manager.clear_cache().await.unwrap();
        assert_eq!(manager.get_cache_stats().await.cache.memory.entries, 0);
        assert_eq!(manager.prune_expired().await.unwrap(), 0);

        manager.cleanup().await;
        manager.cleanup().await;
        assert!(!manager.get_cache_stats().await.loader_active);

        assert!(manager.get_media_data(url, false).await.is_some());
    }
}
