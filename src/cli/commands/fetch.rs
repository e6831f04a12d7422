//! Fetch command - make URLs available locally and print their paths

use crate::cache::ContentCache;
use crate::cli::args::FetchArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use crate::transport::{Credentials, FetchOptions, TransportKind};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Execute the fetch command
pub fn execute(args: FetchArgs, manager: ConfigManager, config: &Config) -> CacheResult<()> {
    let mut urls = args.urls;
    if let Some(ref input) = args.input {
        urls.extend(read_url_list(input)?);
    }
    if urls.is_empty() {
        return Err(CacheError::Usage(
            "no URLs given; pass them as arguments or with --input".to_string(),
        ));
    }

    let credentials = match (args.username, args.password) {
        (None, None) => None,
        (username, password) => Some(Credentials::new(
            username.unwrap_or_default(),
            password.unwrap_or_default(),
        )),
    };

    let options = FetchOptions {
        credentials,
        auth_urls: args.auth_urls,
        transport: if args.session {
            TransportKind::Session
        } else {
            TransportKind::Basic
        },
        show_progress: config.general.show_progress && !args.no_progress,
    };
    debug!("Fetching {} URL(s) for {}", urls.len(), args.dataset);

    let cache = ContentCache::new(manager, config.transport.clone());
    let paths = cache.cache_data(&args.dataset, &urls, &options)?;

    for path in paths {
        println!("{}", path.display());
    }

    Ok(())
}

/// Read a URL list from `path`, or stdin when `path` is `-`
fn read_url_list(path: &Path) -> CacheResult<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CacheError::io("reading URL list from stdin", e))?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| CacheError::io(format!("reading URL list {}", path.display()), e))?
    };

    Ok(parse_url_list(&content))
}

/// One URL per line; blank lines and `#` comments are skipped
fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
