//! Discovery of content already present in a cache root

use super::layout::{self, is_reserved};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

/// A file in the cache and the URL it was downloaded from
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// Source URL
    pub url: Url,
    /// Location of the content on disk
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,
}

/// Whether `path` holds usable content: it opens and has at least one byte.
///
/// Missing, empty and unreadable files all count as absent, so a later call
/// downloads them again.
pub fn is_present(path: &Path) -> bool {
    let mut first = [0u8; 1];
    match File::open(path) {
        Ok(mut file) => matches!(file.read(&mut first), Ok(1)),
        Err(_) => false,
    }
}

/// Every present entry under `root`, sorted by URL.
///
/// The scan takes no locks. Downloads land by atomic rename, so a file is
/// either complete or not visible yet; entries that vanish mid-scan are
/// skipped.
pub fn cached_entries(root: &Path) -> Vec<CachedEntry> {
    let mut entries: Vec<CachedEntry> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && is_reserved(e.file_name())))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable cache entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_present(entry.path()))
        .filter_map(|entry| {
            let url = layout::source_url(root, entry.path())?;
            let metadata = entry.metadata().ok()?;
            Some(CachedEntry {
                url,
                path: entry.into_path(),
                size: metadata.len(),
                modified: metadata.modified().ok(),
            })
        })
        .collect();

    entries.sort_by(|a, b| a.url.cmp(&b.url));
    entries
}

/// URLs whose content is present under `root`
pub fn cached_sources(root: &Path) -> HashSet<Url> {
    cached_entries(root).into_iter().map(|e| e.url).collect()
}
