//! Mastodon media attachment as delivered by the API layer.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Attachment kind tag reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Static image.
    Image,
    /// Video file.
    Video,
    /// Looping silent video standing in for an animated GIF.
    Gifv,
    /// Audio track.
    Audio,
    /// Anything the server could not identify.
    #[default]
    #[serde(other)]
    Unknown,
}

impl AttachmentKind {
    /// Returns the tag as used by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Gifv => "gifv",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }

    /// Parses an API tag. Unrecognised tags map to [`Self::Unknown`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "gifv" => Self::Gifv,
            "audio" => Self::Audio,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimensions and sizes of the original upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDimensions {
    /// Width in pixels.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default)]
    pub height: Option<u32>,
    /// Playback length in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Byte size. Servers that report `"640x480"` here yield `None`.
    #[serde(default, deserialize_with = "deserialize_byte_size")]
    pub size: Option<u64>,
}

impl MediaDimensions {
    /// Returns `(width, height)` when both are known.
    #[must_use]
    pub const fn resolution(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    /// Returns the playback length, ignoring negative, non-finite and
    /// out-of-range values.
    #[must_use]
    pub fn playback_length(&self) -> Option<Duration> {
        self.duration
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Metadata block attached to a media attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    /// Facts about the original upload.
    #[serde(default)]
    pub original: Option<MediaDimensions>,
}

/// A media object referenced by a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// Server-side identifier.
    pub id: String,
    /// Kind tag.
    #[serde(rename = "type", default)]
    pub kind: AttachmentKind,
    /// Full-size media URL.
    pub url: String,
    /// Server-generated preview URL.
    #[serde(default)]
    pub preview_url: Option<String>,
    /// URL on the originating instance for remote media.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Alt text.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional metadata block.
    #[serde(default)]
    pub meta: Option<AttachmentMeta>,
}

impl MediaAttachment {
    /// Creates an attachment with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: AttachmentKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            preview_url: None,
            remote_url: None,
            description: None,
            meta: None,
        }
    }

    /// Sets the alt text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the original-upload metadata.
    #[must_use]
    pub fn with_original(mut self, original: MediaDimensions) -> Self {
        self.meta = Some(AttachmentMeta {
            original: Some(original),
        });
        self
    }

    /// Returns the alt text if it is present and not blank.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Returns the original-upload metadata, if any.
    #[must_use]
    pub fn original(&self) -> Option<&MediaDimensions> {
        self.meta.as_ref().and_then(|m| m.original.as_ref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSize>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawSize::Bytes(n)) => Some(n),
        Some(RawSize::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
