//! Local `file://` sources

use crate::error::{CacheError, CacheResult};
use std::fs::File;
use std::io::{self, Write};
use url::Url;

pub(super) fn copy_file(url: &Url, sink: &mut dyn Write) -> CacheResult<u64> {
    let path = url
        .to_file_path()
        .map_err(|()| CacheError::malformed(url.as_str(), "not a local file path"))?;

    let mut file = File::open(&path).map_err(|e| {
        CacheError::transfer(url.as_str(), format!("opening {}: {}", path.display(), e))
    })?;

    io::copy(&mut file, sink).map_err(|e| CacheError::transfer(url.as_str(), e.to_string()))
}
