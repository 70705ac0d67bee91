//! File-based locking to prevent concurrent runs.
//!
//! Two runs sharing a cache directory and output path would race on the
//! rename sequences, so `update` holds an exclusive flock for its duration.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// A guard that holds an exclusive lock on the lock file.
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Attempt to acquire an exclusive lock on `path` without blocking.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Open without truncating so the lock target is never recreated
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another blackhole run holds {:?}.\n\
                 Wait for it to complete, or remove the file if no run is active.",
                path
            )
        })?;

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock file guarding the cache and output of `config`
pub fn lock_path(config: &Config) -> PathBuf {
    config
        .cachedir
        .join(format!(".{}lock", config.cacheprefix))
}
