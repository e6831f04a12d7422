//! Scoped exclusive locks on cache targets
//!
//! Each target path has a lock file under `<root>/.locks`, named by the
//! SHA256 of the source URL. Locks are advisory OS file locks, so they are
//! honored by other threads and by other processes sharing the filesystem.
//! The lock is released when the guard is dropped; the lock file itself stays.

use super::layout::LOCKS_DIR;
use crate::error::{CacheError, CacheResult};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Lock file guarding the cache target of `url`
pub fn lock_path(root: &Path, url: &Url) -> PathBuf {
    let digest = Sha256::digest(url.as_str().as_bytes());
    root.join(LOCKS_DIR)
        .join(format!("{}.lock", hex::encode(digest)))
}

/// Exclusive lock held until dropped
#[derive(Debug)]
pub struct TargetLock {
    file: File,
    path: PathBuf,
}

impl TargetLock {
    /// Block until the lock at `path` is held
    pub fn acquire(path: &Path) -> CacheResult<Self> {
        let file = open_lock_file(path)?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| CacheError::io(format!("locking {}", path.display()), e))?;
        debug!("Acquired lock {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock at `path` if nobody else holds it
    pub fn try_acquire(path: &Path) -> CacheResult<Option<Self>> {
        let file = open_lock_file(path)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(CacheError::io(format!("locking {}", path.display()), e)),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released lock {}", self.path.display());
    }
}

fn open_lock_file(path: &Path) -> CacheResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CacheError::io(format!("creating lock directory {}", parent.display()), e)
        })?;
    }

    OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| CacheError::io(format!("opening lock {}", path.display()), e))
}
