//! The content cache: resolve, scan, download what is missing

use super::layout::{self, STAGING_DIR};
use super::lock::{lock_path, TargetLock};
use super::scan::{self, CachedEntry};
use crate::config::registry::normalize_key;
use crate::config::{resolve_data_location, ConfigManager, LocationRegistry, TransportConfig};
use crate::error::{CacheError, CacheResult};
use crate::transport::{FetchOptions, Transport, TransportContext};
use crate::ui::{DownloadProgress, UiContext};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// URL-addressed on-disk cache spanning any number of datasets
pub struct ContentCache<R = ConfigManager> {
    registry: R,
    transport: TransportConfig,
}

impl ContentCache<ConfigManager> {
    /// Cache backed by the configuration file managed by `manager`
    pub fn from_config(manager: ConfigManager) -> CacheResult<Self> {
        let config = manager.load()?;
        Ok(Self::new(manager, config.transport))
    }
}

impl<R: LocationRegistry> ContentCache<R> {
    pub fn new(registry: R, transport: TransportConfig) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Cache root of `dataset`, created on first use
    pub fn data_location(&self, dataset: &str) -> CacheResult<PathBuf> {
        resolve_data_location(&self.registry, dataset)
    }

    /// Everything currently cached for `dataset`. Creates nothing: a dataset
    /// without a recorded location has no entries.
    pub fn cached_entries(&self, dataset: &str) -> CacheResult<Vec<CachedEntry>> {
        let key = normalize_key(dataset)?;
        Ok(match self.registry.data_location(&key)? {
            Some(root) => scan::cached_entries(&root),
            None => Vec::new(),
        })
    }

    /// Make every URL available locally and return the local paths, in the
    /// same order as `urls`.
    ///
    /// URLs already present are not fetched again. A fresh
    /// [`TransportContext`] is built from `options`; use
    /// [`ContentCache::cache_data_with`] to share one across calls.
    pub fn cache_data<S: AsRef<str>>(
        &self,
        dataset: &str,
        urls: &[S],
        options: &FetchOptions,
    ) -> CacheResult<Vec<PathBuf>> {
        let context = TransportContext::new(options, &self.transport)?;
        self.cache_data_with(dataset, urls, &context, options.show_progress)
    }

    /// Like [`ContentCache::cache_data`], fetching through `transport`
    pub fn cache_data_with<S: AsRef<str>>(
        &self,
        dataset: &str,
        urls: &[S],
        transport: &dyn Transport,
        show_progress: bool,
    ) -> CacheResult<Vec<PathBuf>> {
        let requested = urls
            .iter()
            .map(|u| layout::parse_source(u.as_ref()))
            .collect::<CacheResult<Vec<Url>>>()?;

        let root = self.data_location(dataset)?;
        let cached = scan::cached_sources(&root);

        // Sorted, so concurrent runs visit targets in the same order
        let missing: BTreeSet<&Url> = requested.iter().filter(|u| !cached.contains(*u)).collect();

        info!(
            dataset = %dataset,
            requested = requested.len(),
            missing = missing.len(),
            "Resolving cached data"
        );

        let ctx = if show_progress {
            UiContext::detect()
        } else {
            UiContext::non_interactive()
        };
        let progress = DownloadProgress::new(&ctx, missing.len() as u64);

        for url in missing {
            progress.start(url);
            store(&root, url, transport)?;
            progress.advance();
        }
        progress.finish();

        Ok(requested
            .iter()
            .map(|url| layout::local_path(&root, url))
            .collect())
    }
}

/// Download `url` into its place under `root` unless another writer already
/// did. Returns whether a download happened.
fn store(root: &Path, url: &Url, transport: &dyn Transport) -> CacheResult<bool> {
    let target = layout::local_path(root, url);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CacheError::io(format!("creating {}", parent.display()), e))?;
    }

    let lock_file = lock_path(root, url);
    let _lock = match TargetLock::try_acquire(&lock_file)? {
        Some(lock) => lock,
        None => {
            debug!(url = %url, "Waiting for another writer");
            TargetLock::acquire(&lock_file)?
        }
    };

    if scan::is_present(&target) {
        debug!(url = %url, "Already written by another writer");
        return Ok(false);
    }

    let staging = root.join(STAGING_DIR);
    fs::create_dir_all(&staging)
        .map_err(|e| CacheError::io(format!("creating {}", staging.display()), e))?;

    // Dropped (and removed) on any early return
    let mut staged = tempfile::Builder::new()
        .prefix("download-")
        .tempfile_in(&staging)
        .map_err(|e| CacheError::io(format!("staging download in {}", staging.display()), e))?;

    info!(url = %url, "Downloading");
    let written = {
        let mut writer = BufWriter::new(staged.as_file_mut());
        let written = transport.fetch(url, &mut writer)?;
        writer
            .flush()
            .map_err(|e| CacheError::io(format!("writing download of {}", url), e))?;
        written
    };

    staged
        .as_file()
        .sync_all()
        .map_err(|e| CacheError::io(format!("syncing download of {}", url), e))?;
    staged.persist(&target).map_err(|e| {
        CacheError::io(format!("moving download into {}", target.display()), e.error)
    })?;

    if written == 0 {
        warn!(url = %url, "Source returned no content; it will be fetched again next time");
    } else {
        debug!(url = %url, bytes = written, path = %target.display(), "Stored");
    }

    Ok(true)
}
