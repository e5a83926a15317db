use std::io::{self, IsTerminal, Write};

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tootles::application::MediaManager;
use tootles::domain::entities::{AttachmentKind, MediaAttachment, SizeHint};
use tootles::infrastructure::{AppConfig, CliArgs, Command, StorageManager};
use tootles::presentation::{buffer_lines, render_view, write_buffer};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

async fn run(manager: &MediaManager, command: Command) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match command {
        Command::Preview {
            url,
            kind,
            description,
            size,
            no_preload,
            width,
        } => {
            let size = size.parse::<SizeHint>().map_err(|e| eyre!(e))?;
            let mut attachment = MediaAttachment::new("cli", AttachmentKind::from_tag(&kind), url);
            if let Some(description) = description {
                attachment = attachment.with_description(description);
            }

            let view = manager.get_media_widget(&attachment, size, !no_preload).await;
            let buf = render_view(&view, width.max(4));
            if stdout.is_terminal() {
                write_buffer(&buf, &mut stdout)?;
            } else {
                for line in buffer_lines(&buf) {
                    writeln!(stdout, "{line}")?;
                }
            }
        }
        Command::Open { url, no_cache } => {
            let attachment = MediaAttachment::new("cli", AttachmentKind::Unknown, url);
            if !manager.open_media_external(&attachment, !no_cache).await {
                return Err(eyre!("no viewer could open {}", attachment.url));
            }
        }
        Command::Preload { urls } => {
            let attachments: Vec<MediaAttachment> = urls
                .into_iter()
                .enumerate()
                .map(|(i, url)| MediaAttachment::new(i.to_string(), AttachmentKind::Unknown, url))
                .collect();
            let report = manager.preload_media(&attachments).await;
            writeln!(stdout, "{report}")?;
        }
        Command::Stats { json } => {
            let stats = manager.get_cache_stats().await;
            if json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&stats)?)?;
            } else {
                write!(stdout, "{stats}")?;
            }
        }
        Command::Clear => {
            manager.clear_cache().await?;
            writeln!(stdout, "Media cache cleared")?;
        }
        Command::Prune => {
            let removed = manager.prune_expired().await?;
            writeln!(stdout, "Removed {removed} expired entries")?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = tootles::VERSION, "Starting {}", tootles::NAME);

    let manager = MediaManager::new(config.media).await?;
    let result = run(&manager, args.command).await;
    manager.cleanup().await;

    result
}
