//! Application configuration.

pub mod app_config;
pub mod args;
pub mod media_config;
pub mod storage;

pub use app_config::{AppConfig, LogLevel};
pub use args::{CliArgs, Command};
pub use media_config::MediaConfig;
pub use storage::{ConfigError, StorageManager};
