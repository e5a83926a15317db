//! Chooses how an attachment is displayed.

use bytes::Bytes;
use tracing::debug;

use crate::domain::entities::{
    InlineImage, MediaAttachment, MediaView, Placeholder, PlaceholderKind,
};
use crate::domain::services::MediaFormat;

/// Turns an attachment plus optional bytes into a [`MediaView`].
#[derive(Debug, Clone, Copy)]
pub struct MediaRenderer {
    inline_images: bool,
}

impl MediaRenderer {
    /// Creates a renderer. `inline_images` allows drawing images in the
    /// terminal.
    #[must_use]
    pub const fn new(inline_images: bool) -> Self {
        Self { inline_images }
    }

    /// Returns true if images may be shown inline.
    #[must_use]
    pub const fn inline_enabled(&self) -> bool {
        self.inline_images
    }

    /// Builds the view for `attachment` classified as `format`.
    ///
    /// Images become inline when bytes are present, inline display is
    /// enabled and the bytes decode. The decoded pixels travel with the view
    /// so drawing never decodes again. Everything else becomes a placeholder.
    #[must_use]
    pub fn render(
        &self,
        attachment: &MediaAttachment,
        format: MediaFormat,
        data: Option<&Bytes>,
    ) -> MediaView {
        if format == MediaFormat::Image
            && self.inline_images
            && let Some(data) = data
        {
            match image::load_from_memory(data) {
                Ok(decoded) => {
                    let title = attachment
                        .description()
                        .unwrap_or(PlaceholderKind::Image.fallback_title());
                    return MediaView::Inline(InlineImage::new(
                        title,
                        data.clone(),
                        decoded.into_rgb8(),
                    ));
                }
                Err(e) => {
                    debug!(url = %attachment.url, error = %e, "Image undecodable, using placeholder");
                }
            }
        }

        MediaView::Placeholder(Self::placeholder(attachment, format))
    }

    /// Builds the placeholder for `attachment` from its metadata.
    #[must_use]
    pub fn placeholder(attachment: &MediaAttachment, format: MediaFormat) -> Placeholder {
        let kind = match format {
            MediaFormat::Image => PlaceholderKind::Image,
            MediaFormat::Video => PlaceholderKind::Video,
            MediaFormat::Audio => PlaceholderKind::Audio,
            MediaFormat::Unknown => PlaceholderKind::Generic,
        };
        let mut placeholder = Placeholder::new(kind, attachment.description());

        let Some(original) = attachment.original() else {
            return placeholder;
        };
        match kind {
            PlaceholderKind::Image => {
                placeholder.dimensions = original.resolution();
                placeholder.size_bytes = original.size;
            }
            PlaceholderKind::Video => {
                placeholder.dimensions = original.resolution();
                placeholder.duration = original.playback_length();
                placeholder.size_bytes = original.size;
            }
            PlaceholderKind::Audio => {
                placeholder.duration = original.playback_length();
                placeholder.size_bytes = original.size;
            }
            PlaceholderKind::Generic | PlaceholderKind::Disabled => {}
        }
        placeholder
    }

    /// Placeholder shown when previews are turned off.
    #[must_use]
    pub fn disabled(attachment: &MediaAttachment) -> MediaView {
        MediaView::Placeholder(Placeholder::new(
            PlaceholderKind::Disabled,
            attachment.description(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AttachmentKind, MediaDimensions};
    use std::io::Cursor;
    use std::time::Duration;

    fn png(width: u32, height: u32) -> Bytes {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    #[test]
    fn test_image_with_bytes_is_inline() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png")
            .with_description("A cat");
        let view = MediaRenderer::new(true).render(&attachment, MediaFormat::Image, Some(&png(32, 16)));

        let MediaView::Inline(img) = view else {
            panic!("expected inline image");
        };
        assert_eq!(img.title, "A cat");
        assert_eq!((img.width, img.height), (32, 16));
        assert_eq!(img.pixels.dimensions(), (32, 16));
    }

    #[test]
    fn test_truncated_image_gives_placeholder() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png");
        let mut seed = 0x2545_f491_u32;
        let noise = image::RgbImage::from_fn(64, 64, |_, _| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let [_, a, b, c] = seed.to_le_bytes();
            image::Rgb([a, b, c])
        });
        let mut out = Cursor::new(Vec::new());
        noise.write_to(&mut out, image::ImageFormat::Png).unwrap();
        let full = Bytes::from(out.into_inner());
        let truncated = full.slice(..full.len() / 2);

        let view = MediaRenderer::new(true).render(&attachment, MediaFormat::Image, Some(&truncated));
        assert_eq!(
            view.as_placeholder().map(|p| p.kind),
            Some(PlaceholderKind::Image)
        );
    }

    #[test]
    fn test_cloned_views_share_decoded_pixels() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png");
        let view = MediaRenderer::new(true).render(&attachment, MediaFormat::Image, Some(&png(8, 8)));
        let copy = view.clone();

        let (MediaView::Inline(a), MediaView::Inline(b)) = (&view, &copy) else {
            panic!("expected inline images");
        };
        assert!(std::sync::Arc::ptr_eq(&a.pixels, &b.pixels));
    }

    #[test]
    fn test_inline_disabled_gives_placeholder() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png");
        let view = MediaRenderer::new(false).render(&attachment, MediaFormat::Image, Some(&png(4, 4)));

        let placeholder = view.as_placeholder().unwrap();
        assert_eq!(placeholder.kind, PlaceholderKind::Image);
        assert_eq!(placeholder.hint(), Some("👁️ Press Enter to view"));
    }

    #[test]
    fn test_unreadable_bytes_give_placeholder() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Image, "https://x.example/a.png");
        let view = MediaRenderer::new(true).render(
            &attachment,
            MediaFormat::Image,
            Some(&Bytes::from_static(b"nope")),
        );
        assert!(!view.is_inline());
    }

    #[test]
    fn test_video_placeholder_uses_metadata() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Video, "https://x.example/v.mp4")
            .with_original(MediaDimensions {
                width: Some(1280),
                height: Some(720),
                duration: Some(61.7),
                size: Some(3 * 1024 * 1024),
            });
        let placeholder = MediaRenderer::placeholder(&attachment, MediaFormat::Video);

        assert_eq!(placeholder.title, "Video");
        assert_eq!(placeholder.dimensions, Some((1280, 720)));
        assert_eq!(placeholder.duration.map(|d| d.as_secs()), Some(61));
        assert_eq!(placeholder.size_bytes, Some(3 * 1024 * 1024));
    }

    #[test]
    fn test_audio_placeholder_skips_dimensions() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Audio, "https://x.example/a.mp3")
            .with_original(MediaDimensions {
                width: Some(1),
                height: Some(1),
                duration: Some(30.0),
                size: None,
            });
        let placeholder = MediaRenderer::placeholder(&attachment, MediaFormat::Audio);

        assert_eq!(placeholder.dimensions, None);
        assert_eq!(placeholder.duration, Some(Duration::from_secs(30)));
        assert_eq!(placeholder.hint(), Some("🔊 Press Enter to play"));
    }

    #[test]
    fn test_generic_and_disabled() {
        let attachment = MediaAttachment::new("1", AttachmentKind::Unknown, "https://x.example/f.bin")
            .with_description("  ");
        let generic = MediaRenderer::placeholder(&attachment, MediaFormat::Unknown);
        assert_eq!(generic.lines(), vec!["📎 Media file", "🔗 Press Enter to open"]);

        let disabled = MediaRenderer::disabled(&attachment);
        assert_eq!(
            disabled.lines(),
            vec!["📎 Media attachment (previews disabled)"]
        );
    }
}
