//! Domain layer with core media entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Domain services.
pub mod services;

pub use entities::{MediaAttachment, MediaView};
pub use errors::{CacheError, ExternalViewerError, MediaLoadError};
pub use services::{FormatClassifier, MediaFormat};
