//! Application layer orchestrating the media subsystem.

/// Application services.
pub mod services;

pub use services::{MediaCacheStats, MediaManager, MediaRenderer, SupportedFormats};
