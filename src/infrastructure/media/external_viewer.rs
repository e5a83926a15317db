//! Hands media to external programs.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tempfile::TempPath;
use tracing::{debug, error, info, warn};

use crate::domain::errors::ExternalViewerError;
use crate::domain::services::{FormatClassifier, MediaFormat, file_extension};

const IMAGE_VIEWERS: &[&str] = &["feh", "eog", "xviewer", "gwenview", "ristretto"];
const PLAYER_VIEWERS: &[&str] = &["mpv", "vlc", "mplayer", "totem"];
const TARGET_PLACEHOLDER: &str = "{}";
const TEMP_PREFIX: &str = "tootles-";

/// Resolves program names on the host.
pub trait ProgramProbe: Send + Sync {
    /// Returns the full path of `program` if it can be executed.
    fn resolve(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ProgramProbe for SystemProbe {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

impl<F> ProgramProbe for F
where
    F: Fn(&str) -> Option<PathBuf> + Send + Sync,
{
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self(program)
    }
}

/// How a media kind is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerCommand {
    /// A program with extra arguments. A `{}` argument is replaced by the
    /// target, otherwise the target is appended.
    Program {
        /// Executable name or path.
        program: String,
        /// Arguments before or around the target.
        args: Vec<String>,
    },
    /// The platform's default opener.
    SystemOpener,
}

impl ViewerCommand {
    /// Parses a whitespace separated command line. Returns `None` when blank.
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::Program {
            program,
            args: parts.collect(),
        })
    }

    /// Creates a command for a bare program name.
    #[must_use]
    pub fn program(name: impl Into<String>) -> Self {
        Self::Program {
            program: name.into(),
            args: Vec::new(),
        }
    }

    fn arguments_for(args: &[String], target: &str) -> Vec<String> {
        if args.iter().any(|a| a == TARGET_PLACEHOLDER) {
            args.iter()
                .map(|a| {
                    if a == TARGET_PLACEHOLDER {
                        target.to_string()
                    } else {
                        a.clone()
                    }
                })
                .collect()
        } else {
            let mut all = args.to_vec();
            all.push(target.to_string());
            all
        }
    }
}

impl fmt::Display for ViewerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program { program, args } if args.is_empty() => f.write_str(program),
            Self::Program { program, args } => write!(f, "{program} {}", args.join(" ")),
            Self::SystemOpener => f.write_str("system opener"),
        }
    }
}

/// Media kind to viewer mapping, built by probing the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerRegistry {
    entries: BTreeMap<MediaFormat, ViewerCommand>,
}

impl ViewerRegistry {
    /// Builds the registry. Configured commands win over probed programs;
    /// kinds with neither fall back to the system opener when present.
    #[must_use]
    pub fn probe(overrides: &BTreeMap<String, String>, probe: &dyn ProgramProbe) -> Self {
        let mut entries = BTreeMap::new();

        for (kind, command) in overrides {
            let Some(format) = MediaFormat::from_name(kind) else {
                warn!(kind = %kind, "Ignoring viewer for unknown media kind");
                continue;
            };
            match ViewerCommand::parse(command) {
                Some(viewer) => {
                    entries.insert(format, viewer);
                }
                None => warn!(kind = %kind, "Ignoring empty viewer command"),
            }
        }

        let opener = system_opener_available(probe);
        for format in MediaFormat::VIEWABLE {
            if entries.contains_key(&format) {
                continue;
            }
            let probed = ranked_programs(format)
                .iter()
                .find(|name| probe.resolve(name).is_some())
                .map(|name| ViewerCommand::program(*name));
            if let Some(viewer) = probed.or_else(|| opener.then_some(ViewerCommand::SystemOpener)) {
                entries.insert(format, viewer);
            }
        }

        debug!(viewers = entries.len(), "Probed external viewers");
        Self { entries }
    }

    /// Returns the viewer for a media kind.
    #[must_use]
    pub fn get(&self, format: MediaFormat) -> Option<&ViewerCommand> {
        self.entries.get(&format)
    }

    /// Returns every configured entry.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<MediaFormat, ViewerCommand> {
        &self.entries
    }
}

const fn ranked_programs(format: MediaFormat) -> &'static [&'static str] {
    match format {
        MediaFormat::Image => IMAGE_VIEWERS,
        MediaFormat::Video | MediaFormat::Audio => PLAYER_VIEWERS,
        MediaFormat::Unknown => &[],
    }
}

#[cfg(windows)]
fn system_opener_available(_probe: &dyn ProgramProbe) -> bool {
    true
}

#[cfg(not(windows))]
fn system_opener_available(probe: &dyn ProgramProbe) -> bool {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    probe.resolve(opener).is_some()
}

/// Launches external viewers and owns the temporary files handed to them.
///
/// Temporary files are removed by [`Self::cleanup_temp_files`] or when the
/// dispatcher is dropped.
pub struct ExternalViewerDispatcher {
    registry: RwLock<ViewerRegistry>,
    probe: Arc<dyn ProgramProbe>,
    classifier: FormatClassifier,
    temp_files: Mutex<Vec<TempPath>>,
}

impl fmt::Debug for ExternalViewerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalViewerDispatcher")
            .field("registry", &*self.registry.read())
            .field("temp_files", &self.temp_files.lock().len())
            .finish_non_exhaustive()
    }
}

impl ExternalViewerDispatcher {
    /// Probes the host and builds the viewer registry.
    #[must_use]
    pub fn new(overrides: &BTreeMap<String, String>, probe: Arc<dyn ProgramProbe>) -> Self {
        let registry = ViewerRegistry::probe(overrides, probe.as_ref());
        Self {
            registry: RwLock::new(registry),
            probe,
            classifier: FormatClassifier::default(),
            temp_files: Mutex::new(Vec::new()),
        }
    }

    /// Uses `classifier` to map URLs to media kinds.
    #[must_use]
    pub fn with_classifier(mut self, classifier: FormatClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Rebuilds the registry from new overrides.
    pub fn reconfigure(&self, overrides: &BTreeMap<String, String>) {
        let registry = ViewerRegistry::probe(overrides, self.probe.as_ref());
        *self.registry.write() = registry;
        info!("Reconfigured external viewers");
    }

    /// Returns the viewer that would open `url`.
    #[must_use]
    pub fn viewer_for_url(&self, url: &str) -> Option<ViewerCommand> {
        let format = self.classifier.classify(url, None);
        self.registry.read().get(format).cloned()
    }

    /// Returns true if a viewer is registered for `format` and its program
    /// can still be resolved.
    #[must_use]
    pub fn is_viewer_available(&self, format: MediaFormat) -> bool {
        let Some(viewer) = self.registry.read().get(format).cloned() else {
            return false;
        };
        match viewer {
            ViewerCommand::Program { program, .. } => self.probe.resolve(&program).is_some(),
            ViewerCommand::SystemOpener => system_opener_available(self.probe.as_ref()),
        }
    }

    /// Returns a snapshot of the registry.
    #[must_use]
    pub fn available_viewers(&self) -> BTreeMap<MediaFormat, ViewerCommand> {
        self.registry.read().entries().clone()
    }

    /// Opens `url` in its viewer.
    ///
    /// With `data`, the bytes are written to a temporary file and the viewer
    /// gets its path; otherwise the viewer gets the URL. Returns `Ok(false)`
    /// when no viewer handles the URL's kind.
    ///
    /// # Errors
    /// Returns error if the temporary file cannot be written or the viewer
    /// cannot be started.
    pub async fn open_media(
        &self,
        url: &str,
        data: Option<Bytes>,
    ) -> Result<bool, ExternalViewerError> {
        let format = self.classifier.classify(url, None);
        self.open_media_as(url, format, data).await
    }

    /// Like [`Self::open_media`], with the media kind already decided by the
    /// caller.
    ///
    /// # Errors
    /// Returns error if the temporary file cannot be written or the viewer
    /// cannot be started.
    pub async fn open_media_as(
        &self,
        url: &str,
        format: MediaFormat,
        data: Option<Bytes>,
    ) -> Result<bool, ExternalViewerError> {
        let Some(viewer) = self.registry.read().get(format).cloned() else {
            warn!(url = %url, %format, "No external viewer available");
            return Ok(false);
        };

        let Some(data) = data else {
            launch(&viewer, url).await?;
            return Ok(true);
        };

        let temp = write_temp_file(url, data).await?;
        let target = temp.to_string_lossy().into_owned();
        match launch(&viewer, &target).await {
            Ok(()) => {
                self.temp_files.lock().push(temp);
                Ok(true)
            }
            Err(e) => {
                // dropping the path removes the file
                drop(temp);
                Err(e)
            }
        }
    }

    /// Removes every temporary file created so far. Returns how many were
    /// removed.
    pub fn cleanup_temp_files(&self) -> usize {
        let files = std::mem::take(&mut *self.temp_files.lock());
        let mut removed = 0;
        for file in files {
            let path = file.to_path_buf();
            match file.close() {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
            }
        }
        if removed > 0 {
            info!(removed, "Removed temporary media files");
        }
        removed
    }
}

async fn write_temp_file(url: &str, data: Bytes) -> Result<TempPath, ExternalViewerError> {
    let ext = file_extension(url);
    let suffix = if ext.is_empty() {
        ".tmp".to_string()
    } else {
        format!(".{ext}")
    };

    tokio::task::spawn_blocking(move || -> Result<TempPath, ExternalViewerError> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| ExternalViewerError::temp_file(e.to_string()))?;
        file.write_all(&data)
            .and_then(|()| file.flush())
            .map_err(|e| ExternalViewerError::temp_file(e.to_string()))?;
        Ok(file.into_temp_path())
    })
    .await
    .map_err(|e| ExternalViewerError::temp_file(e.to_string()))?
}

async fn launch(viewer: &ViewerCommand, target: &str) -> Result<(), ExternalViewerError> {
    match viewer {
        ViewerCommand::Program { program, args } => {
            let mut command = tokio::process::Command::new(program);
            command
                .args(ViewerCommand::arguments_for(args, target))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            #[cfg(unix)]
            command.process_group(0);

            command.spawn().map_err(|e| {
                error!(program = %program, error = %e, "Failed to launch external viewer");
                ExternalViewerError::launch(program.as_str(), e.to_string())
            })?;
            info!(program = %program, target = %target, "Launched external viewer");
            Ok(())
        }
        ViewerCommand::SystemOpener => {
            let target = target.to_string();
            tokio::task::spawn_blocking(move || opener::open(&target))
                .await
                .map_err(|e| ExternalViewerError::launch("system opener", e.to_string()))?
                .map_err(|e| {
                    error!(error = %e, "System opener failed");
                    ExternalViewerError::launch("system opener", e.to_string())
                })?;
            info!("Opened media with system opener");
            Ok(())
        }
    }
}
