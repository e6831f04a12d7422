//! Byte transports used to fill the cache
//!
//! Two HTTP strategies are available:
//!
//! | Kind | Credentials |
//! |------|-------------|
//! | Basic | Offered only in answer to a 401 challenge, and only to URLs inside the authentication scope |
//! | Session | Initial request, follow redirects, then re-issue the request at the final location with credentials |
//!
//! Both keep cookies for the lifetime of their [`TransportContext`]. All
//! credential and cookie state lives in the context, so unrelated callers
//! in one process never see each other's credentials. Reuse one context
//! across calls to keep a login session alive.
//!
//! `file://` sources are copied from the local filesystem regardless of kind.

mod basic;
mod local;
mod session;

use crate::cache::layout::FILE_SCHEME;
use crate::config::TransportConfig;
use crate::error::{CacheError, CacheResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;
use ureq::http::Response;
use ureq::{Agent, Body, ResponseExt};
use url::Url;

/// Something that can copy the content behind a URL into a writer
pub trait Transport {
    /// Copy the content of `url` into `sink`, returning the number of bytes written
    fn fetch(&self, url: &Url, sink: &mut dyn Write) -> CacheResult<u64>;
}

/// HTTP strategy used for downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Plain requests; credentials answer authentication challenges
    #[default]
    Basic,
    /// Request, redirect, credentialed re-request
    Session,
}

/// Username and password for protected sources
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value of the `Authorization` header for HTTP basic auth
    fn authorization(&self) -> String {
        let pair = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Caller-selected download options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Credentials for protected sources
    pub credentials: Option<Credentials>,

    /// URLs credentials may be sent to (basic transport only).
    /// Empty means the requested URLs themselves.
    pub auth_urls: Vec<String>,

    /// HTTP strategy
    pub transport: TransportKind,

    /// Show a progress bar over the missing URLs
    pub show_progress: bool,
}

impl FetchOptions {
    /// Reject option combinations that cannot work together
    pub fn validate(&self) -> CacheResult<()> {
        if self.transport == TransportKind::Session && !self.auth_urls.is_empty() {
            return Err(CacheError::Usage(
                "an authentication URL cannot be combined with the session transport".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which URLs credentials may be offered to
#[derive(Debug, Clone)]
enum AuthScope {
    /// Only the URL currently being fetched
    Requested,
    /// Any URL below one of these prefixes
    Prefixes(Vec<Url>),
}

impl AuthScope {
    fn covers(&self, requested: &Url, target: &Url) -> bool {
        match self {
            Self::Requested => is_sub_url(requested, target),
            Self::Prefixes(prefixes) => prefixes.iter().any(|p| is_sub_url(p, target)),
        }
    }
}

/// Same authority, and `target`'s path equals or lies below `base`'s path
fn is_sub_url(base: &Url, target: &Url) -> bool {
    if base.scheme() != target.scheme()
        || base.host_str() != target.host_str()
        || base.port_or_known_default() != target.port_or_known_default()
    {
        return false;
    }

    if base.path() == target.path() {
        return true;
    }
    let prefix = base.path().trim_end_matches('/');
    target.path().starts_with(&format!("{}/", prefix))
}

/// Explicit transport state: HTTP agent, cookie store and credentials
pub struct TransportContext {
    kind: TransportKind,
    agent: Agent,
    credentials: Option<Credentials>,
    scope: AuthScope,
    user_agent: String,
}

impl TransportContext {
    /// Build a context for `options`, rejecting invalid combinations before
    /// any network activity
    pub fn new(options: &FetchOptions, settings: &TransportConfig) -> CacheResult<Self> {
        options.validate()?;

        let scope = if options.auth_urls.is_empty() {
            AuthScope::Requested
        } else {
            let prefixes = options
                .auth_urls
                .iter()
                .map(|raw| Url::parse(raw).map_err(|e| CacheError::malformed(raw, e.to_string())))
                .collect::<CacheResult<Vec<_>>>()?;
            AuthScope::Prefixes(prefixes)
        };

        if let Some(ref credentials) = options.credentials {
            debug!(
                "Using {:?} transport with credentials for {}",
                options.transport,
                credentials.username()
            );
        }

        Ok(Self {
            kind: options.transport,
            agent: build_agent(settings),
            credentials: options.credentials.clone(),
            scope,
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// GET `target` on behalf of `requested`, optionally with the basic auth
    /// header attached. Failures name `requested`.
    fn get(&self, requested: &Url, target: &Url, authorize: bool) -> CacheResult<Response<Body>> {
        let mut request = self
            .agent
            .get(target.as_str())
            .header("User-Agent", &self.user_agent);
        if authorize {
            if let Some(ref credentials) = self.credentials {
                request = request.header("Authorization", credentials.authorization());
            }
        }
        request
            .call()
            .map_err(|e| CacheError::transfer(requested.as_str(), e.to_string()))
    }
}

impl Transport for TransportContext {
    fn fetch(&self, url: &Url, sink: &mut dyn Write) -> CacheResult<u64> {
        if url.scheme() == FILE_SCHEME {
            return local::copy_file(url, sink);
        }

        match self.kind {
            TransportKind::Basic => basic::fetch(self, url, sink),
            TransportKind::Session => session::fetch(self, url, sink),
        }
    }
}

fn build_agent(settings: &TransportConfig) -> Agent {
    let timeout = (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs));

    Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(settings.max_redirects)
        .timeout_global(timeout)
        .build()
        .into()
}

/// Location a response was finally served from, after redirects
fn final_url(response: &Response<Body>) -> Option<Url> {
    Url::parse(&response.get_uri().to_string()).ok()
}

/// Stream a response body into `sink`, mapping HTTP failures for `url`
fn copy_body(url: &Url, mut response: Response<Body>, sink: &mut dyn Write) -> CacheResult<u64> {
    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        return Err(CacheError::Authentication {
            url: url.to_string(),
            status,
        });
    }
    if !response.status().is_success() {
        return Err(CacheError::transfer(url.as_str(), format!("HTTP {}", status)));
    }

    let mut reader = response.body_mut().as_reader();
    io::copy(&mut reader, sink).map_err(|e| CacheError::transfer(url.as_str(), e.to_string()))
}
