//! datacache - URL-addressed local cache for scientific datasets
//!
//! Downloads remote files once into a per-dataset directory tree that
//! mirrors their URLs, and hands back local paths on every later call.
//!
//! ```no_run
//! use datacache::cache::ContentCache;
//! use datacache::config::ConfigManager;
//! use datacache::transport::FetchOptions;
//!
//! # fn main() -> datacache::CacheResult<()> {
//! let cache = ContentCache::from_config(ConfigManager::new())?;
//! let paths = cache.cache_data(
//!     "demo",
//!     &["http://example.org/a/b.txt", "http://example.org/a/b.txt?x=1"],
//!     &FetchOptions::default(),
//! )?;
//! # let _ = paths;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod transport;
pub mod ui;

pub use error::{CacheError, CacheResult};
