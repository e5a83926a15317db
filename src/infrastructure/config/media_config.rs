//! Media preview configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::domain::services::FormatClassifier;
use crate::domain::services::media_format::{
    DEFAULT_AUDIO_EXTENSIONS, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS,
};

use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Settings consumed by the media subsystem (`[media]` table).
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Show previews for attachments at all.
    pub show_media_previews: bool,

    /// Draw images inside the terminal when bytes are available.
    pub inline_images: bool,

    /// Memory tier budget in megabytes.
    pub memory_cache_size: u64,

    /// Disk tier budget in megabytes.
    pub disk_cache_size: u64,

    /// Disk cache directory. A leading `~` is expanded.
    pub cache_directory: PathBuf,

    /// Age after which `prune` removes disk entries.
    pub cache_expiry_days: u64,

    /// Command per media kind (`image`, `video`, `audio`).
    pub external_viewers: BTreeMap<String, String>,

    /// Thumbnail bounding box as `[width, height]`.
    pub thumbnail_size: (u32, u32),

    /// Image file extensions.
    pub supported_image_formats: BTreeSet<String>,

    /// Video file extensions.
    pub supported_video_formats: BTreeSet<String>,

    /// Audio file extensions.
    pub supported_audio_formats: BTreeSet<String>,

    /// Simultaneous downloads.
    pub max_concurrent_downloads: usize,

    /// Largest accepted download in megabytes.
    pub max_download_size_mb: u64,

    /// Upper bound for a preload batch.
    pub preload_timeout_secs: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    /// Full payloads below this many kilobytes stay in memory.
    pub full_media_memory_threshold_kb: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            show_media_previews: true,
            inline_images: true,
            memory_cache_size: 50,
            disk_cache_size: 500,
            cache_directory: default_cache_directory(),
            cache_expiry_days: 7,
            external_viewers: BTreeMap::new(),
            thumbnail_size: (150, 150),
            supported_image_formats: to_set(DEFAULT_IMAGE_EXTENSIONS),
            supported_video_formats: to_set(DEFAULT_VIDEO_EXTENSIONS),
            supported_audio_formats: to_set(DEFAULT_AUDIO_EXTENSIONS),
            max_concurrent_downloads: 5,
            max_download_size_mb: 50,
            preload_timeout_secs: 10,
            request_timeout_secs: 30,
            full_media_memory_threshold_kb: 1024,
        }
    }
}

impl MediaConfig {
    /// Checks values the media subsystem cannot work with.
    ///
    /// # Errors
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thumbnail_size.0 == 0 || self.thumbnail_size.1 == 0 {
            return Err("thumbnail_size must be non-zero in both dimensions".to_string());
        }
        if self.max_concurrent_downloads == 0 {
            return Err("max_concurrent_downloads must be at least 1".to_string());
        }
        if self.max_download_size_mb == 0 {
            return Err("max_download_size_mb must be at least 1".to_string());
        }
        Ok(())
    }

    /// Memory tier budget in bytes.
    #[must_use]
    pub const fn memory_budget_bytes(&self) -> u64 {
        self.memory_cache_size.saturating_mul(BYTES_PER_MB)
    }

    /// Disk tier budget in bytes.
    #[must_use]
    pub const fn disk_budget_bytes(&self) -> u64 {
        self.disk_cache_size.saturating_mul(BYTES_PER_MB)
    }

    /// Download limit in bytes.
    #[must_use]
    pub const fn max_download_bytes(&self) -> u64 {
        self.max_download_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Memory/disk routing threshold for full payloads, in bytes.
    #[must_use]
    pub const fn full_media_memory_threshold(&self) -> u64 {
        self.full_media_memory_threshold_kb.saturating_mul(1024)
    }

    /// Preload timeout.
    #[must_use]
    pub const fn preload_timeout(&self) -> Duration {
        Duration::from_secs(self.preload_timeout_secs)
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Disk entry lifetime used by explicit pruning.
    #[must_use]
    pub const fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_days.saturating_mul(24 * 60 * 60))
    }

    /// Cache directory with `~` expanded.
    #[must_use]
    pub fn resolved_cache_directory(&self) -> PathBuf {
        expand_home(&self.cache_directory)
    }

    /// Builds a classifier from the configured extension sets.
    #[must_use]
    pub fn classifier(&self) -> FormatClassifier {
        FormatClassifier::new(
            &self.supported_image_formats,
            &self.supported_video_formats,
            &self.supported_audio_formats,
        )
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_cache_directory() -> PathBuf {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
        || std::env::temp_dir().join(APP_NAME).join("cache").join("media"),
        |dirs| dirs.cache_dir().join("media"),
    )
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    BaseDirs::new().map_or_else(|| path.to_path_buf(), |dirs| dirs.home_dir().join(rest))
}
