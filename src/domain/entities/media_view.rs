//! Displayable representation of an attachment.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::RgbImage;

/// How the caller asked the attachment to be sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeHint {
    /// Small preview in a timeline.
    #[default]
    Thumbnail,
    /// Expanded status view.
    Medium,
    /// Dedicated media view.
    Full,
}

impl std::str::FromStr for SizeHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thumbnail" | "thumb" => Ok(Self::Thumbnail),
            "medium" => Ok(Self::Medium),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown size hint: {other}")),
        }
    }
}

/// Why a placeholder is shown and what it stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Previews are turned off in configuration.
    Disabled,
    /// Image that could not be shown inline.
    Image,
    /// Video or gifv.
    Video,
    /// Audio track.
    Audio,
    /// Unknown or unsupported media.
    Generic,
}

impl PlaceholderKind {
    /// Leading icon for the title line.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Disabled | Self::Generic => "📎",
            Self::Image => "🖼️",
            Self::Video => "🎬",
            Self::Audio => "🎵",
        }
    }

    /// Title used when the attachment has no description.
    #[must_use]
    pub const fn fallback_title(self) -> &'static str {
        match self {
            Self::Disabled => "Media attachment",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Generic => "Media file",
        }
    }

    /// Call to action shown at the bottom, if any.
    #[must_use]
    pub const fn affordance(self) -> Option<&'static str> {
        match self {
            Self::Disabled => None,
            Self::Image => Some("👁️ Press Enter to view"),
            Self::Video => Some("▶️ Press Enter to play"),
            Self::Audio => Some("🔊 Press Enter to play"),
            Self::Generic => Some("🔗 Press Enter to open"),
        }
    }
}

/// Textual stand-in for media that is not rendered inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Placeholder flavour.
    pub kind: PlaceholderKind,
    /// Alt text or the kind's fallback title.
    pub title: String,
    /// Pixel dimensions, when known.
    pub dimensions: Option<(u32, u32)>,
    /// Playback length, when known.
    pub duration: Option<Duration>,
    /// Byte size, when known.
    pub size_bytes: Option<u64>,
}

impl Placeholder {
    /// Creates a placeholder with no metadata.
    #[must_use]
    pub fn new(kind: PlaceholderKind, description: Option<&str>) -> Self {
        Self {
            kind,
            title: description.unwrap_or(kind.fallback_title()).to_string(),
            dimensions: None,
            duration: None,
            size_bytes: None,
        }
    }

    /// Returns the affordance hint for this placeholder.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.kind.affordance()
    }

    /// Renders the placeholder as display lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);
        if self.kind == PlaceholderKind::Disabled {
            lines.push(format!("{} {} (previews disabled)", self.kind.icon(), self.title));
            return lines;
        }

        lines.push(format!("{} {}", self.kind.icon(), self.title));
        if let Some((w, h)) = self.dimensions {
            lines.push(format!("📐 {w}×{h}"));
        }
        if let Some(duration) = self.duration {
            lines.push(format!("⏱️ {}", format_duration(duration)));
        }
        if let Some(size) = self.size_bytes {
            lines.push(format!("💾 {}", format_size(size, self.kind)));
        }
        if let Some(hint) = self.hint() {
            lines.push(hint.to_string());
        }
        lines
    }
}

/// Image decoded once and ready for inline display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Alt text or "Image".
    pub title: String,
    /// Decoded pixel dimensions.
    pub width: u32,
    /// Decoded pixel dimensions.
    pub height: u32,
    /// Encoded image bytes.
    pub data: Bytes,
    /// Decoded pixels, shared between clones of the view.
    pub pixels: Arc<RgbImage>,
}

impl InlineImage {
    /// Wraps already decoded `pixels`, taking the dimensions from them.
    #[must_use]
    pub fn new(title: impl Into<String>, data: Bytes, pixels: RgbImage) -> Self {
        Self {
            title: title.into(),
            width: pixels.width(),
            height: pixels.height(),
            data,
            pixels: Arc::new(pixels),
        }
    }

    /// Renders the textual caption of the image.
    #[must_use]
    pub fn caption(&self) -> Vec<String> {
        vec![
            format!("🖼️ {}", self.title),
            format!("📐 {}×{}", self.width, self.height),
            format!("💾 {}KB", self.data.len() / 1024),
        ]
    }
}

/// What the UI should mount for an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaView {
    /// Image shown in the terminal.
    Inline(InlineImage),
    /// Text stand-in.
    Placeholder(Placeholder),
}

impl MediaView {
    /// Returns the placeholder, if this view is one.
    #[must_use]
    pub const fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Placeholder(p) => Some(p),
            Self::Inline(_) => None,
        }
    }

    /// Returns true for inline images.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Returns the text lines describing the view.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Inline(img) => img.caption(),
            Self::Placeholder(p) => p.lines(),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn format_size(bytes: u64, kind: PlaceholderKind) -> String {
    match kind {
        PlaceholderKind::Video | PlaceholderKind::Audio => {
            format!("{}MB", bytes / (1024 * 1024))
        }
        _ => format!("{}KB", bytes / 1024),
    }
}
