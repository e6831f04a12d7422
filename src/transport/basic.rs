//! Basic transport: plain GET, credentials only on challenge

use super::{copy_body, final_url, TransportContext};
use crate::error::CacheResult;
use std::io::Write;
use tracing::debug;
use url::Url;

/// Fetch `url`, answering a 401 with credentials when the challenging
/// location is inside the authentication scope
pub(super) fn fetch(ctx: &TransportContext, url: &Url, sink: &mut dyn Write) -> CacheResult<u64> {
    let mut response = ctx.get(url, url, false)?;

    if response.status().as_u16() == 401 && ctx.credentials.is_some() {
        let challenger = final_url(&response).unwrap_or_else(|| url.clone());
        if ctx.scope.covers(url, &challenger) {
            debug!(url = %challenger, "Answering authentication challenge");
            response = ctx.get(url, &challenger, true)?;
        } else {
            debug!(url = %challenger, "Challenge outside authentication scope");
        }
    }

    copy_body(url, response, sink)
}
