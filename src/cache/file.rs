//! Durable Local Store
//!
//! One JSON record per key inside a dedicated directory. Record names are the
//! key in URL-safe base64, so they stay filesystem-safe and can be decoded
//! back for pattern invalidation. Expired records are removed lazily on read
//! and periodically by the sweep task.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, CacheStore, KeyPattern, StoreUsage, TTL_MISSING};
use crate::config::FileCacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweep_task;

const RECORD_SUFFIX: &str = ".json";
const TEMP_PREFIX: &str = ".record-";
const TEMP_SUFFIX: &str = ".tmp";

/// Longest record name we are willing to create (most filesystems cap at 255).
pub const MAX_RECORD_NAME_LEN: usize = 240;

// == Key Encoding ==
/// Maps a key to its filesystem-safe record stem.
pub fn encode_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

/// Inverse of [`encode_key`]; `None` for stems that are not valid encodings.
pub fn decode_key(stem: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

fn is_record_name(name: &str) -> bool {
    name.ends_with(RECORD_SUFFIX) && !name.starts_with('.')
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

// == File Cache ==
/// File-backed cache store.
pub struct FileCache {
    dir: PathBuf,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl FileCache {
    // == Constructor ==
    /// Opens the store, creating its directory on a cold start, and starts
    /// the background sweep.
    pub async fn open(config: &FileCacheConfig) -> Result<Self> {
        let dir = config.dir.clone();

        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {
                info!(dir = %dir.display(), "File cache initialized");
            }
            Ok(_) => {
                return Err(CacheError::Config(format!(
                    "{} exists and is not a directory",
                    dir.display()
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&dir).await?;
                info!(dir = %dir.display(), "File cache directory created");
            }
            Err(e) => return Err(e.into()),
        }

        remove_stale_temp_files(&dir).await;

        let sweeper = spawn_sweep_task(dir.clone(), config.sweep_interval);

        Ok(Self {
            dir,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs one sweep immediately and returns the number of records removed.
    pub async fn sweep(&self) -> Result<usize> {
        sweep_expired(&self.dir).await
    }

    /// True while the background sweep task is alive.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn stop_sweeper(&self) {
        if let Ok(mut guard) = self.sweeper.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
                debug!(dir = %self.dir.display(), "File cache sweep stopped");
            }
        }
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
        }

        let name = format!("{}{}", encode_key(key), RECORD_SUFFIX);
        if name.len() > MAX_RECORD_NAME_LEN {
            return Err(CacheError::InvalidKey(format!(
                "key of {} bytes is too long for a record name",
                key.len()
            )));
        }

        Ok(self.dir.join(name))
    }

    /// Reads a record, evicting it if it has expired.
    async fn load_live(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.record_path(key)?;

        let Some(entry) = read_record(&path).await? else {
            return Ok(None);
        };

        if entry.is_expired() {
            remove_record(&path).await?;
            debug!(key, "Expired entry evicted");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Writes through a temp file and renames it over the record, so readers
    /// only ever see a complete record.
    async fn write_record(&self, path: PathBuf, entry: &CacheEntry) -> Result<()> {
        let bytes = entry.encode()?;
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&path)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Internal(format!("record write task failed: {e}")))??;

        Ok(())
    }

    async fn remove_matching(&self, pattern: &KeyPattern) -> Result<usize> {
        let mut deleted = 0;

        for path in record_files(&self.dir).await? {
            let Some(key) = record_key(&path) else {
                continue;
            };
            if !pattern.matches(&key) {
                continue;
            }
            match remove_record(&path).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to remove matching record"),
            }
        }

        Ok(deleted)
    }

    async fn remove_all(&self) -> Result<usize> {
        let mut removed = 0;
        for path in record_files(&self.dir).await? {
            match remove_record(&path).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove record"),
            }
        }
        Ok(removed)
    }

    async fn measure(&self) -> Result<StoreUsage> {
        let mut entries = 0;
        let mut bytes = 0;

        for path in record_files(&self.dir).await? {
            // Records can vanish between listing and stat.
            if let Ok(meta) = fs::metadata(&path).await {
                entries += 1;
                bytes += meta.len();
            }
        }

        Ok(StoreUsage {
            entries,
            bytes: Some(bytes),
        })
    }
}

impl Drop for FileCache {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

#[async_trait]
impl CacheStore for FileCache {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.load_live(key).await {
            Ok(Some(entry)) => {
                debug!(key, "Cache hit");
                Some(entry.value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "File cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<bool> {
        let ttl = ttl.ok_or_else(|| CacheError::MissingTtl(key.to_string()))?;
        let path = self.record_path(key)?;
        let entry = CacheEntry::new(value, ttl);

        match self.write_record(path, &entry).await {
            Ok(()) => {
                debug!(key, ttl_ms = ttl.as_millis() as u64, "Cache set");
                Ok(true)
            }
            Err(e) => {
                error!(key, error = %e, "File cache set failed");
                Ok(false)
            }
        }
    }

    async fn del(&self, key: &str) {
        let Ok(path) = self.record_path(key) else {
            return;
        };

        match remove_record(&path).await {
            Ok(true) => debug!(key, "Cache deleted"),
            Ok(false) => {}
            Err(e) => error!(key, error = %e, "File cache del failed"),
        }
    }

    async fn del_pattern(&self, pattern: &KeyPattern) -> usize {
        match self.remove_matching(pattern).await {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(pattern = pattern.as_str(), deleted, "Cache pattern deleted");
                }
                deleted
            }
            Err(e) => {
                error!(pattern = pattern.as_str(), error = %e, "File cache delPattern failed");
                0
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        matches!(self.load_live(key).await, Ok(Some(_)))
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self.load_live(key).await {
            Ok(Some(entry)) => i64::try_from(entry.ttl_remaining_secs()).unwrap_or(i64::MAX),
            _ => TTL_MISSING,
        }
    }

    async fn flush(&self) {
        match self.remove_all().await {
            Ok(removed) => info!(removed, "Cache flushed"),
            Err(e) => error!(error = %e, "File cache flush failed"),
        }
    }

    async fn is_ready(&self) -> bool {
        fs::metadata(&self.dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn usage(&self) -> StoreUsage {
        self.measure().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to measure file cache");
            StoreUsage::default()
        })
    }

    async fn shutdown(&self) {
        self.stop_sweeper();
    }
}

// == Record Helpers ==
/// Lists record files (not temp files) in the directory.
async fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_str().is_some_and(is_record_name) {
            files.push(entry.path());
        }
    }

    Ok(files)
}

/// Recovers the logical key from a record path.
fn record_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    decode_key(name.strip_suffix(RECORD_SUFFIX)?)
}

async fn read_record(path: &Path) -> Result<Option<CacheEntry>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(CacheEntry::decode(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Removes a record; `Ok(false)` if it was already gone.
async fn remove_record(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn remove_stale_temp_files(dir: &Path) {
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_str().is_some_and(is_temp_name) {
            debug!(path = %entry.path().display(), "Removing stale temp file");
            let _ = fs::remove_file(entry.path()).await;
        }
    }
}

// == Sweep ==
/// Removes expired and unreadable records from `dir`.
///
/// Returns the number of records removed.
pub async fn sweep_expired(dir: &Path) -> Result<usize> {
    let mut removed = 0;

    for path in record_files(dir).await? {
        let evict = match read_record(&path).await {
            Ok(Some(entry)) => entry.is_expired(),
            Ok(None) => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Removing corrupt cache record");
                true
            }
        };

        if evict {
            match remove_record(&path).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to sweep record"),
            }
        }
    }

    Ok(removed)
}
