//! Media kind classification from URLs and MIME types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{AttachmentKind, MediaAttachment};

/// Default image file extensions.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tiff"];
/// Default video file extensions.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "m4v", "ogv"];
/// Default audio file extensions.
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "m4a", "aac", "flac", "opus"];

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
];
const VIDEO_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/ogg",
];
const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/ogg",
    "audio/wav",
    "audio/mp4",
    "audio/aac",
    "audio/flac",
    "audio/opus",
];

/// Coarse media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Still or animated image.
    Image,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Not recognised.
    Unknown,
}

impl MediaFormat {
    /// Kinds that can have an external viewer.
    pub const VIEWABLE: [Self; 3] = [Self::Image, Self::Video, Self::Audio];

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a lowercase kind name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    fn from_mime_prefix(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AttachmentKind> for MediaFormat {
    fn from(kind: AttachmentKind) -> Self {
        match kind {
            AttachmentKind::Image => Self::Image,
            AttachmentKind::Video | AttachmentKind::Gifv => Self::Video,
            AttachmentKind::Audio => Self::Audio,
            AttachmentKind::Unknown => Self::Unknown,
        }
    }
}

/// Classifies URLs into [`MediaFormat`]s using per-kind extension sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatClassifier {
    image_extensions: BTreeSet<String>,
    video_extensions: BTreeSet<String>,
    audio_extensions: BTreeSet<String>,
}

impl Default for FormatClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_IMAGE_EXTENSIONS.iter().copied(),
            DEFAULT_VIDEO_EXTENSIONS.iter().copied(),
            DEFAULT_AUDIO_EXTENSIONS.iter().copied(),
        )
    }
}

impl FormatClassifier {
    /// Creates a classifier from extension lists. Leading dots and case are ignored.
    pub fn new<I, V, A, S>(image: I, video: V, audio: A) -> Self
    where
        I: IntoIterator<Item = S>,
        V: IntoIterator<Item = S>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            image_extensions: normalize(image),
            video_extensions: normalize(video),
            audio_extensions: normalize(audio),
        }
    }

    /// Classifies a URL, preferring the declared MIME type when it is known.
    #[must_use]
    pub fn classify(&self, url: &str, mime: Option<&str>) -> MediaFormat {
        if let Some(format) = mime.and_then(classify_mime) {
            return format;
        }

        let extension = file_extension(url);
        if !extension.is_empty() {
            if self.image_extensions.contains(&extension) {
                return MediaFormat::Image;
            }
            if self.video_extensions.contains(&extension) {
                return MediaFormat::Video;
            }
            if self.audio_extensions.contains(&extension) {
                return MediaFormat::Audio;
            }
        }

        mime_guess::from_path(url_path(url))
            .first()
            .map_or(MediaFormat::Unknown, |guess| {
                MediaFormat::from_mime_prefix(guess.essence_str())
            })
    }

    /// Classifies an attachment by URL, falling back to its kind tag.
    #[must_use]
    pub fn classify_attachment(&self, attachment: &MediaAttachment) -> MediaFormat {
        match self.classify(&attachment.url, None) {
            MediaFormat::Unknown => MediaFormat::from(attachment.kind),
            format => format,
        }
    }

    /// Returns true if the format is anything but [`MediaFormat::Unknown`].
    #[must_use]
    pub fn is_supported(&self, url: &str, mime: Option<&str>) -> bool {
        self.classify(url, mime) != MediaFormat::Unknown
    }

    /// Returns true if the media can be drawn inside the terminal. Only images qualify.
    #[must_use]
    pub fn can_display_inline(&self, url: &str, mime: Option<&str>) -> bool {
        self.classify(url, mime) == MediaFormat::Image
    }

    /// Returns the extension set for a kind.
    #[must_use]
    pub fn extensions(&self, format: MediaFormat) -> Vec<String> {
        let set = match format {
            MediaFormat::Image => &self.image_extensions,
            MediaFormat::Video => &self.video_extensions,
            MediaFormat::Audio => &self.audio_extensions,
            MediaFormat::Unknown => return Vec::new(),
        };
        set.iter().cloned().collect()
    }
}

/// Classifies with the default extension sets.
#[must_use]
pub fn get_media_format(url: &str, mime: Option<&str>) -> MediaFormat {
    FormatClassifier::default().classify(url, mime)
}

/// Returns the lowercase extension of the URL path, without the dot.
///
/// Query strings and fragments are ignored. Returns an empty string when the
/// last path segment has no extension.
#[must_use]
pub fn file_extension(url: &str) -> String {
    let path = url_path(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn classify_mime(mime: &str) -> Option<MediaFormat> {
    let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
    if IMAGE_MIME_TYPES.contains(&essence.as_str()) {
        Some(MediaFormat::Image)
    } else if VIDEO_MIME_TYPES.contains(&essence.as_str()) {
        Some(MediaFormat::Video)
    } else if AUDIO_MIME_TYPES.contains(&essence.as_str()) {
        Some(MediaFormat::Audio)
    } else {
        None
    }
}

fn normalize<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
