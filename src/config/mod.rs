//! Configuration management for datacache

pub mod registry;
pub mod schema;

pub use registry::{resolve_data_location, LocationRegistry};
pub use schema::{Config, DatasetConfig, GeneralConfig, TransportConfig};

use crate::error::{CacheError, CacheResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datacache")
            .join("config.toml")
    }

    /// Parent directory of dataset roots when `general.root` is unset
    pub fn default_data_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".datacache")
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub fn load(&self) -> CacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, path: &Path) -> CacheResult<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| CacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file.
    ///
    /// The file is written next to its destination and renamed over it, so
    /// concurrent readers see either the old or the new configuration.
    pub fn save(&self, config: &Config) -> CacheResult<()> {
        let dir = self.ensure_config_dir()?;

        let content = toml::to_string_pretty(config)?;
        let mut staged = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| CacheError::io(format!("staging config in {}", dir.display()), e))?;
        staged
            .write_all(content.as_bytes())
            .map_err(|e| CacheError::io("writing staged config", e))?;
        staged.persist(&self.config_path).map_err(|e| {
            CacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e.error,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists, returning it
    fn ensure_config_dir(&self) -> CacheResult<PathBuf> {
        let parent = match self.config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| CacheError::ConfigDirCreate {
            path: parent.clone(),
            source: e,
        })?;
        Ok(parent)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
