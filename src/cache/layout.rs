//! Mapping between source URLs and cache paths
//!
//! A source URL is stored at `<root>/<scheme>/<netloc>/<path...>`, with
//! `?<query>` appended to the last path component when the URL has a query.
//! Both directions are pure functions: nothing here touches the filesystem,
//! so the cache needs no index beyond the directory tree itself.
//!
//! Top-level names starting with `.` are reserved for cache bookkeeping
//! (locks, staged downloads) and never map to a URL.

use crate::error::{CacheError, CacheResult};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Scheme used for local files, including bare absolute paths
pub const FILE_SCHEME: &str = "file";

/// Directory holding per-target lock files
pub const LOCKS_DIR: &str = ".locks";

/// Directory holding in-flight downloads
pub const STAGING_DIR: &str = ".partial";

/// Parse and normalize a source URL.
///
/// Bare absolute paths are treated as `file://` URLs. Fragments are dropped,
/// since they never reach the server.
pub fn parse_source(raw: &str) -> CacheResult<Url> {
    let trimmed = raw.trim();

    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) if Path::new(trimmed).is_absolute() => {
            Url::from_file_path(trimmed)
                .map_err(|()| CacheError::malformed(raw, "not an absolute local path"))?
        }
        Err(e) => return Err(CacheError::malformed(raw, e.to_string())),
    };
    url.set_fragment(None);

    validate(&url).map_err(|reason| CacheError::malformed(raw, reason))?;
    Ok(url)
}

/// Check that a URL maps onto a regular file path and back without loss
fn validate(url: &Url) -> Result<(), String> {
    if url.cannot_be_a_base() {
        return Err("URL has no path hierarchy".to_string());
    }

    let host = url.host_str().unwrap_or_default();
    if url.scheme() == FILE_SCHEME {
        if !host.is_empty() {
            return Err("file URLs with a host are not supported".to_string());
        }
    } else if host.is_empty() {
        return Err("URL has no host".to_string());
    }

    let segments: Vec<&str> = url.path_segments().map(Iterator::collect).unwrap_or_default();
    let Some((last, _)) = segments.split_last() else {
        return Err("URL path does not name a file".to_string());
    };
    if last.is_empty() {
        return Err("URL path does not name a file".to_string());
    }
    if segments.iter().any(|s| !is_storable(s)) {
        return Err("URL path has an empty or relative segment".to_string());
    }

    if let Some(query) = url.query() {
        let name = format!("{}?{}", last, query);
        if !name.split('/').all(is_storable) {
            return Err("query cannot be stored as a file name".to_string());
        }
    }

    Ok(())
}

fn is_storable(component: &str) -> bool {
    !component.is_empty() && component != "." && component != ".."
}

/// Network location as it appears in the cache tree: `[user[:pass]@]host[:port]`
pub fn netloc(url: &Url) -> String {
    let mut netloc = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    netloc.push_str(url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }
    netloc
}

/// Local path at which `url` is cached under `root`
pub fn local_path(root: &Path, url: &Url) -> PathBuf {
    let mut path = root.join(url.scheme());

    let netloc = netloc(url);
    if !netloc.is_empty() {
        path.push(netloc);
    }

    let segments: Vec<&str> = url.path_segments().map(Iterator::collect).unwrap_or_default();
    let Some((last, dirs)) = segments.split_last() else {
        return path;
    };
    for dir in dirs {
        path.push(dir);
    }

    match url.query() {
        // A query may itself contain '/', which nests further directories
        Some(query) => {
            for piece in format!("{}?{}", last, query).split('/') {
                path.push(piece);
            }
        }
        None => path.push(last),
    }

    path
}

/// URL that a cached file at `path` represents, if any.
///
/// Returns `None` for bookkeeping files and for anything whose name would not
/// map back to exactly the same path.
pub fn source_url(root: &Path, path: &Path) -> Option<Url> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;

    let (scheme, rest) = parts.split_first()?;
    if is_reserved(OsStr::new(scheme)) {
        return None;
    }

    let candidate = if *scheme == FILE_SCHEME {
        format!("file:///{}", rest.join("/"))
    } else {
        let (netloc, rest) = rest.split_first()?;
        format!("{}://{}/{}", scheme, netloc, rest.join("/"))
    };

    let url = Url::parse(&candidate).ok()?;
    if url.fragment().is_some() || validate(&url).is_err() {
        return None;
    }

    (local_path(root, &url) == path).then_some(url)
}

/// Whether a top-level name under the root is reserved for bookkeeping
pub fn is_reserved(name: &OsStr) -> bool {
    name.to_str().map_or(true, |s| s.starts_with('.'))
}
