//! URL-addressed dataset cache
//!
//! Every dataset has a root directory. A source URL is stored at a path
//! derived from the URL alone (see [`layout`]), so the directory tree is the
//! whole index: scanning it recovers which URLs are cached.
//!
//! # Download states
//!
//! | State | On disk | Next call |
//! |-------|---------|-----------|
//! | Missing | nothing at the target | downloads |
//! | In flight | staged under `.partial`, lock held | waits on the lock |
//! | Present | target with at least one byte | reuses |
//! | Empty | zero-byte target | downloads again |
//!
//! Every target ever written keeps a lock file under `.locks`. Lock files are
//! never removed, since another writer may still hold or be waiting on one;
//! the directory grows by one small file per distinct URL.

pub mod layout;
pub mod lock;
pub mod scan;
mod store;

pub use layout::{local_path, parse_source, source_url};
pub use scan::{is_present, CachedEntry};
pub use store::ContentCache;
