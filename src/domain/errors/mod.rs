//! Domain error types.

mod cache_error;
mod media_load_error;
mod viewer_error;

pub use cache_error::{CacheError, CacheResult};
pub use media_load_error::{MediaLoadError, MediaLoadResult};
pub use viewer_error::ExternalViewerError;
