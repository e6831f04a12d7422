//! Dataset location registry
//!
//! Maps a dataset key (e.g. "grace", "srtm") to the directory that holds its
//! cache. Keys are case-insensitive and stored lowercase.

use super::{ConfigManager, DatasetConfig};
use crate::error::{CacheError, CacheResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Lookup and storage of per-dataset cache roots
pub trait LocationRegistry {
    /// Recorded location of a dataset, if any
    fn data_location(&self, dataset: &str) -> CacheResult<Option<PathBuf>>;

    /// Record the location of a dataset
    fn set_data_location(&self, dataset: &str, location: &Path) -> CacheResult<()>;

    /// Where a dataset without a recorded location should live
    fn default_location(&self, dataset: &str) -> CacheResult<PathBuf>;
}

impl LocationRegistry for ConfigManager {
    fn data_location(&self, dataset: &str) -> CacheResult<Option<PathBuf>> {
        let config = self.load()?;
        Ok(config
            .datasets
            .get(dataset)
            .map(|d| d.data_location.clone()))
    }

    fn set_data_location(&self, dataset: &str, location: &Path) -> CacheResult<()> {
        let mut config = self.load()?;
        config.datasets.insert(
            dataset.to_string(),
            DatasetConfig {
                data_location: location.to_path_buf(),
            },
        );
        self.save(&config)
    }

    fn default_location(&self, dataset: &str) -> CacheResult<PathBuf> {
        let config = self.load()?;
        let parent = config
            .general
            .root
            .unwrap_or_else(ConfigManager::default_data_root);
        Ok(parent.join(dataset))
    }
}

/// Normalize a dataset key: trimmed and lowercase, never empty
pub fn normalize_key(dataset: &str) -> CacheResult<String> {
    let key = dataset.trim().to_lowercase();
    if key.is_empty() {
        return Err(CacheError::Usage("dataset key must not be empty".to_string()));
    }
    if key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(CacheError::Usage(format!(
            "dataset key '{}' must not contain path separators",
            dataset
        )));
    }
    Ok(key)
}

/// Resolve the cache root of a dataset, creating it when needed.
///
/// A dataset without a recorded location gets a fresh directory under the
/// default parent, and that location is recorded exactly once.
pub fn resolve_data_location<R>(registry: &R, dataset: &str) -> CacheResult<PathBuf>
where
    R: LocationRegistry + ?Sized,
{
    let key = normalize_key(dataset)?;

    if let Some(location) = registry.data_location(&key)? {
        if !location.is_dir() {
            create_root(&key, &location)?;
        }
        return Ok(location);
    }

    let location = registry.default_location(&key)?;
    create_root(&key, &location)?;
    registry.set_data_location(&key, &location)?;
    info!(dataset = %key, location = %location.display(), "Created dataset location");

    Ok(location)
}

/// Create a dataset root, reporting failure against the dataset key
pub fn create_root(key: &str, location: &Path) -> CacheResult<()> {
    fs::create_dir_all(location).map_err(|e| CacheError::DataLocation {
        dataset: key.to_string(),
        reason: format!("creating {}: {}", location.display(), e),
    })
}
