//! Media handling infrastructure.
//!
//! This module provides:
//! - Memory caching with byte-bounded LRU eviction
//! - Disk caching for persistence
//! - Tiered routing between the two
//! - Async download and thumbnail pipeline
//! - External viewer dispatch

pub mod disk_cache;
pub mod external_viewer;
pub mod http_transport;
pub mod loader;
pub mod memory_cache;
pub mod thumbnail;
pub mod tiered_cache;

pub use disk_cache::{DiskCacheStats, DiskMediaCache};
pub use external_viewer::{
    ExternalViewerDispatcher, ProgramProbe, SystemProbe, ViewerCommand, ViewerRegistry,
};
pub use http_transport::ReqwestTransport;
pub use loader::{LoaderConfig, MediaLoader, PreloadReport};
pub use memory_cache::{MemoryCacheStats, MemoryMediaCache};
pub use thumbnail::{derive_thumbnail, derive_thumbnail_blocking};
pub use tiered_cache::{TieredCacheStats, TieredMediaCache};
