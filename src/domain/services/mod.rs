//! Pure domain services.

pub mod media_format;

pub use media_format::{FormatClassifier, MediaFormat, file_extension, get_media_format};
