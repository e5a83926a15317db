//! Application services.

pub mod media_manager;
pub mod media_renderer;

pub use media_manager::{MediaCacheStats, MediaManager, SupportedFormats};
pub use media_renderer::MediaRenderer;
