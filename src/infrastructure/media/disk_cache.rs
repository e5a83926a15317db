//! Disk-based media cache for persistence across sessions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{CACHE_FILE_EXTENSION, disk_file_name};
use crate::domain::errors::{CacheError, CacheResult};

/// Default disk budget in megabytes.
pub const DEFAULT_DISK_CACHE_MB: u64 = 500;

const STAGED_PREFIX: &str = ".staged-";
const STAGED_SUFFIX: &str = ".partial";

struct CacheFile {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
}

/// Disk cache storing one file per key, named by the key's SHA-256.
pub struct DiskMediaCache {
    cache_dir: PathBuf,
    max_size: u64,
    write_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DiskMediaCache {
    /// Creates a disk cache in `cache_dir`, creating it with parents.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|source| CacheError::Directory {
                path: cache_dir.clone(),
                source,
            })?;

        debug!(path = %cache_dir.display(), max_size, "Opened disk media cache");

        Ok(Self {
            cache_dir,
            max_size,
            write_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the byte budget.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    pub(crate) fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(disk_file_name(key))
    }

    /// Reads a payload. A hit refreshes the file's modification time.
    ///
    /// An unreadable file is deleted and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                let touch_path = path.clone();
                match tokio::task::spawn_blocking(move || touch(&touch_path)).await {
                    Ok(Err(e)) => trace!(path = %path.display(), error = %e, "Failed to refresh mtime"),
                    Err(e) => trace!(error = %e, "Touch task failed"),
                    Ok(Ok(())) => {}
                }
                Some(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key = %key, "Disk cache miss");
                None
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, path = %path.display(), error = %e, "Unreadable cache file, removing");
                let _ = fs::remove_file(&path).await;
                None
            }
        }
    }

    /// Returns true if a file exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        fs::try_exists(self.entry_path(key)).await.unwrap_or(false)
    }

    /// Stores a payload, evicting the least recently used files until it fits.
    ///
    /// A payload larger than the whole budget is not written and any older
    /// file for the key is removed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be scanned or the file cannot be
    /// written.
    pub async fn set(&self, key: &str, data: Bytes) -> CacheResult<()> {
        let size = data.len() as u64;
        let path = self.entry_path(key);
        let _guard = self.write_lock.lock().await;

        if size > self.max_size {
            debug!(key = %key, size, max_size = self.max_size, "Payload exceeds disk budget, not caching");
            remove_quietly(&path).await;
            return Ok(());
        }

        self.make_room(&path, size).await?;

        let staged = self.stage(data).await?;
        staged.commit(&path).await?;

        debug!(key = %key, path = %path.display(), size, "Stored in disk cache");
        Ok(())
    }

    async fn make_room(&self, replacing: &Path, incoming: u64) -> CacheResult<()> {
        let mut files: Vec<CacheFile> = self
            .scan()
            .await?
            .into_iter()
            .filter(|f| f.path != replacing)
            .collect();

        let mut current: u64 = files.iter().map(|f| f.size).sum();
        if current + incoming <= self.max_size {
            return Ok(());
        }

        debug!(current, incoming, max_size = self.max_size, "Disk cache over limit, evicting");
        files.sort_by_key(|f| f.modified);

        for file in files {
            if current + incoming <= self.max_size {
                break;
            }
            match fs::remove_file(&file.path).await {
                Ok(()) => {
                    current -= file.size;
                    debug!(path = %file.path.display(), size = file.size, "Evicted from disk cache");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => current -= file.size,
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to evict cache file");
                }
            }
        }
        Ok(())
    }

    /// Writes a payload to a hidden sibling file that only becomes visible on
    /// [`StagedEntry::commit`].
    pub(crate) async fn stage(&self, data: Bytes) -> CacheResult<StagedEntry> {
        let dir = self.cache_dir.clone();
        tokio::task::spawn_blocking(move || -> CacheResult<StagedEntry> {
            let mut temp = tempfile::Builder::new()
                .prefix(STAGED_PREFIX)
                .suffix(STAGED_SUFFIX)
                .tempfile_in(&dir)
                .map_err(|e| CacheError::io("Failed to create staged file", &e))?;
            temp.write_all(&data)
                .and_then(|()| temp.flush())
                .map_err(|e| CacheError::io("Failed to write staged file", &e))?;
            Ok(StagedEntry { temp })
        })
        .await
        .map_err(|e| CacheError::task(e.to_string()))?
    }

    /// Removes the file for `key`.
    pub async fn remove(&self, key: &str) {
        let path = self.entry_path(key);
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => debug!(key = %key, "Removed from disk cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key = %key, error = %e, "Failed to remove from disk cache"),
        }
    }

    /// Removes every cache file, including abandoned staged files.
    ///
    /// # Errors
    /// Returns error if the directory cannot be read.
    pub async fn clear(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::io("Failed to read cache dir", &e))?;

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io("Failed to read entry", &e))?
        {
            let path = entry.path();
            if !is_cache_file(&path) && !is_staged_file(&path) {
                continue;
            }
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove cache file");
            } else {
                removed += 1;
            }
        }
        info!(removed, "Cleared disk media cache");
        Ok(())
    }

    /// Removes files whose last access is older than `max_age`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be read.
    pub async fn prune_older_than(&self, max_age: Duration) -> CacheResult<usize> {
        let _guard = self.write_lock.lock().await;
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut pruned = 0usize;
        for file in self.scan().await? {
            if file.modified >= cutoff {
                continue;
            }
            match fs::remove_file(&file.path).await {
                Ok(()) => pruned += 1,
                Err(e) => warn!(path = %file.path.display(), error = %e, "Failed to prune cache file"),
            }
        }
        info!(pruned, max_age_secs = max_age.as_secs(), "Pruned expired disk cache entries");
        Ok(pruned)
    }

    /// Returns usage figures obtained by scanning the directory.
    ///
    /// # Errors
    /// Returns error if the directory cannot be read.
    pub async fn usage(&self) -> CacheResult<DiskCacheStats> {
        let files = self.scan().await?;
        Ok(DiskCacheStats {
            directory: self.cache_dir.clone(),
            size_bytes: files.iter().map(|f| f.size).sum(),
            max_bytes: self.max_size,
            files: files.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }

    async fn scan(&self) -> CacheResult<Vec<CacheFile>> {
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::io("Failed to read cache dir", &e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io("Failed to read entry", &e))?
        {
            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                files.push(CacheFile {
                    path,
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    size: meta.len(),
                });
            }
        }
        Ok(files)
    }
}

/// A payload written to a hidden temporary file. Dropping it without
/// committing deletes the file.
pub(crate) struct StagedEntry {
    temp: NamedTempFile,
}

impl StagedEntry {
    /// Atomically renames the staged file to `path`.
    pub(crate) async fn commit(self, path: &Path) -> CacheResult<()> {
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            self.temp
                .persist(&target)
                .map(|_| ())
                .map_err(|e| CacheError::io("Failed to persist cache file", &e.error))
        })
        .await
        .map_err(|e| CacheError::task(e.to_string()))?
    }
}

/// Statistics about the disk tier.
#[derive(Debug, Clone, Serialize)]
pub struct DiskCacheStats {
    /// Cache directory.
    pub directory: PathBuf,
    /// Bytes on disk.
    pub size_bytes: u64,
    /// Byte budget.
    pub max_bytes: u64,
    /// Number of cache files.
    pub files: usize,
    /// Number of hits since startup.
    pub hits: u64,
    /// Number of misses since startup.
    pub misses: u64,
}

impl std::fmt::Display for DiskCacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Disk: {} files, {}/{} bytes in {} ({} hits, {} misses)",
            self.files,
            self.size_bytes,
            self.max_bytes,
            self.directory.display(),
            self.hits,
            self.misses
        )
    }
}

fn is_cache_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CACHE_FILE_EXTENSION)
}

fn is_staged_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(STAGED_PREFIX) && name.ends_with(STAGED_SUFFIX))
}

fn touch(path: &Path) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed stale cache file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache file"),
    }
}
