//! Thumbnail derivation.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::domain::errors::{MediaLoadError, MediaLoadResult};

/// JPEG quality used for thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Decodes `data`, shrinks it to fit `(max_width, max_height)` keeping the
/// aspect ratio, and re-encodes it as JPEG. Images already inside the bound
/// keep their size.
///
/// # Errors
/// Returns [`MediaLoadError::Decode`] if the payload is not a decodable image
/// or cannot be encoded.
pub fn derive_thumbnail(data: &[u8], (max_width, max_height): (u32, u32)) -> MediaLoadResult<Bytes> {
    let img = image::load_from_memory(data)
        .map_err(|e| MediaLoadError::decode(format!("Failed to decode image: {e}")))?;

    let img = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.into_rgb8();
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, THUMBNAIL_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MediaLoadError::decode(format!("Failed to encode thumbnail: {e}")))?;

    Ok(Bytes::from(out.into_inner()))
}

/// Runs [`derive_thumbnail`] on the blocking pool.
///
/// # Errors
/// Returns [`MediaLoadError::Decode`] on decode failure or if the task panics.
pub async fn derive_thumbnail_blocking(data: Bytes, size: (u32, u32)) -> MediaLoadResult<Bytes> {
    tokio::task::spawn_blocking(move || derive_thumbnail(&data, size))
        .await
        .map_err(|e| MediaLoadError::decode(format!("Thumbnail task panicked: {e}")))?
}
