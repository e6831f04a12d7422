//! Error types for datacache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for datacache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur while resolving, scanning or filling a cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Configuration errors
    #[error("Cannot resolve data location for dataset '{dataset}': {reason}")]
    DataLocation { dataset: String, reason: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Source errors
    #[error("Malformed URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    // Transfer errors
    #[error("Authentication denied for {url} (HTTP {status})")]
    Authentication { url: String, status: u16 },

    #[error("Transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    // Caller errors
    #[error("Invalid option combination: {0}")]
    Usage(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a malformed URL error
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a transfer error
    pub fn transfer(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transfer {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error belongs to the configuration family
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DataLocation { .. } | Self::ConfigInvalid { .. } | Self::ConfigDirCreate { .. }
        )
    }

    /// Check if calling again may succeed without changing the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { .. } => {
                Some("Check --username/--password, or pass --auth-url for the login host")
            }
            Self::Transfer { .. } => {
                Some("Run the same command again; files already downloaded are kept")
            }
            Self::DataLocation { .. } => {
                Some("Set a writable location with: datacache location <dataset> --set <path>")
            }
            Self::Usage(_) => Some("Run with --help to see how the options combine"),
            _ => None,
        }
    }
}
