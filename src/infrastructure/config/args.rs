use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "tootles",
    version,
    about = "Media previews for a terminal Mastodon client",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Disable media previews.
    #[arg(long, global = true)]
    pub no_previews: bool,

    /// Override the disk cache directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the preview of a media URL.
    Preview {
        /// Media URL.
        url: String,
        /// Attachment kind tag (image, video, gifv, audio).
        #[arg(long, default_value = "unknown")]
        kind: String,
        /// Alt text.
        #[arg(long)]
        description: Option<String>,
        /// Size hint (thumbnail, medium, full).
        #[arg(long, default_value = "thumbnail")]
        size: String,
        /// Skip fetching the media.
        #[arg(long)]
        no_preload: bool,
        /// Render width in columns.
        #[arg(long, default_value_t = 60)]
        width: u16,
    },
    /// Open a media URL in an external viewer.
    Open {
        /// Media URL.
        url: String,
        /// Let the viewer fetch the URL itself.
        #[arg(long)]
        no_cache: bool,
    },
    /// Warm the cache for several URLs.
    Preload {
        /// Media URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print cache statistics.
    Stats {
        /// Print JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached payload.
    Clear,
    /// Remove disk entries older than the configured expiry.
    Prune,
}
