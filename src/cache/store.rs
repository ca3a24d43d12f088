//! On-disk cache storage.
//!
//! Each cache entry is a plain file at `<root>/<CachePath>`, mirroring
//! the URL path hierarchy. There is no metadata, no index and no TTL;
//! a file existing at the mapped location is the entire cache signal.
//!
//! Writes are atomic with respect to readers: content goes to a
//! uniquely-named temp file under `<root>/.tmp/` first, is fsynced, and
//! is then renamed into place. `read`/`exists` therefore never observe
//! a partially written entry, and a failed write leaves nothing behind.
//!
//! All blocking file I/O runs under `tokio::task::spawn_blocking` so the
//! async runtime's worker threads are never stalled on disk.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::task;
use tracing::{info, warn};

use super::path::CachePath;
use crate::{Error, Result};

/// Directory under the cache root holding in-progress writes. Path
/// validation reserves this name so no entry can map into it.
pub(crate) const TMP_DIR: &str = ".tmp";

/// Disk-backed store mapping a [`CachePath`] to a file under the root.
pub struct LocalStore {
    root: PathBuf,
    next_temp_id: AtomicU64,
}

impl LocalStore {
    /// Open a store rooted at `root`.
    ///
    /// Creates the root and its temp directory if missing, and sweeps
    /// orphaned temp files left behind by interrupted writes.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let tmp = root.join(TMP_DIR);
        fs::create_dir_all(&tmp)
            .map_err(|e| Error::Storage(format!("failed to create {}: {e}", tmp.display())))?;
        sweep_orphaned_tmp(&tmp);

        info!(root = %root.display(), "local store opened");

        Ok(Self {
            root,
            next_temp_id: AtomicU64::new(1),
        })
    }

    /// The configured cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a regular file exists at the mapped location.
    pub fn exists(&self, path: &CachePath) -> bool {
        self.entry_path(path).is_file()
    }

    /// Read an entry's content. `Ok(None)` when no entry exists, so a
    /// caller racing an out-of-band removal sees a miss, not an error.
    pub async fn read(&self, path: &CachePath) -> Result<Option<Bytes>> {
        let full = self.entry_path(path);
        run_blocking(move || match fs::read(&full) {
            Ok(buf) => Ok(Some(Bytes::from(buf))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // A directory at the mapped location is not an entry
            Err(e) if e.kind() == ErrorKind::IsADirectory => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "failed to read {}: {e}",
                full.display()
            ))),
        })
        .await
    }

    /// Durably write an entry, creating missing parent directories.
    ///
    /// Publishes atomically via temp-file-then-rename. On any failure the
    /// temp file is removed and the target path is untouched.
    pub async fn write(&self, path: &CachePath, content: Bytes) -> Result<()> {
        let full = self.entry_path(path);
        let temp = self.root.join(TMP_DIR).join(format!(
            "{:016x}.tmp",
            self.next_temp_id.fetch_add(1, Ordering::Relaxed)
        ));
        run_blocking(move || {
            let result = write_then_rename(&full, &temp, &content);
            if result.is_err() {
                // Target was never touched; only the temp needs cleanup.
                let _ = fs::remove_file(&temp);
            }
            result
        })
        .await
    }

    fn entry_path(&self, path: &CachePath) -> PathBuf {
        // CachePath construction already rejected traversal, so the join
        // stays inside the root.
        self.root.join(path.as_str())
    }
}

fn write_then_rename(target: &Path, temp: &Path, content: &[u8]) -> Result<()> {
    let io_err = |e: std::io::Error| {
        Error::Storage(format!("failed to write {}: {e}", target.display()))
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = fs::File::create(temp).map_err(io_err)?;
    file.write_all(content).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(temp, target).map_err(io_err)
}

/// Remove `*.tmp` leftovers from interrupted writes in a previous run.
fn sweep_orphaned_tmp(tmp_dir: &Path) {
    let entries = match fs::read_dir(tmp_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    let mut swept = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tmp") {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to sweep orphaned temp file");
            } else {
                swept += 1;
            }
        }
    }
    if swept > 0 {
        info!(dir = %tmp_dir.display(), swept, "swept orphaned temp files");
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Storage(format!("storage task aborted: {e}")))?
}
