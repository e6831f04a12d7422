//! Configuration schema for datacache
//!
//! Configuration is stored at `~/.config/datacache/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP transport settings
    pub transport: TransportConfig,

    /// Dataset locations, keyed by lowercase dataset name
    pub datasets: BTreeMap<String, DatasetConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Parent directory for newly created dataset roots.
    /// Falls back to `~/.datacache` when unset.
    pub root: Option<PathBuf>,

    /// Show a progress bar while downloading
    pub show_progress: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root: None,
            show_progress: true,
            log_format: "text".to_string(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            max_redirects: 10,
            user_agent: concat!("datacache/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Per-dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Cache root for this dataset
    pub data_location: PathBuf,
}
