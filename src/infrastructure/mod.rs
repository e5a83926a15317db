//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Media caching, loading and external viewers.
pub mod media;

pub use config::{AppConfig, CliArgs, Command, LogLevel, MediaConfig, StorageManager};
pub use media::{
    DiskMediaCache, ExternalViewerDispatcher, MediaLoader, MemoryMediaCache, PreloadReport,
    ReqwestTransport, SystemProbe, TieredMediaCache,
};
