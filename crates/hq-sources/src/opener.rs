//! HTTP access shared by all metric sources.
//!
//! Every adapter reads through the [`UrlRead`] trait. The production
//! implementation, [`UrlOpener`], adds authentication, a request timeout,
//! an LRU cache of response bodies and a shared [`TimeoutTracker`] so a
//! host that timed out once is not contacted again during the same run.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lru::LruCache;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::error::{Result, SourceError};

/// HTTP request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of cached response bodies per opener.
pub const CACHE_SIZE: usize = 4096;

/// Read access to urls.
pub trait UrlRead: Send + Sync {
    /// Returns the body of the resource at `url`.
    fn url_read(&self, url: &str) -> Result<String>;
}

/// Reads `url` and deserializes the JSON body.
pub fn read_json<T: DeserializeOwned>(opener: &dyn UrlRead, url: &str) -> Result<T> {
    let body = opener.url_read(url)?;
    serde_json::from_str(&body).map_err(|err| {
        warn!(%url, reason = %err, "Couldn't parse JSON");
        SourceError::Json(format!("{url}: {err}"))
    })
}

/// How requests authenticate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// GitLab style `PRIVATE-TOKEN: <token>`.
    PrivateToken(String),
}

/// Hosts that timed out during this run.
#[derive(Debug, Default)]
pub struct TimeoutTracker {
    hosts: Mutex<HashSet<String>>,
}

impl TimeoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, host: &str) {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.to_string());
    }

    pub fn timed_out(&self, host: &str) -> bool {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(host)
    }
}

/// Returns "host[:port]" of a url.
pub fn netloc(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|err| SourceError::InvalidUrl(format!("{url}: {err}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| SourceError::InvalidUrl(format!("{url}: no host")))?;
    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Blocking HTTP client with authentication, caching and timeout tracking.
pub struct UrlOpener {
    client: Client,
    credentials: Credentials,
    cache: Mutex<LruCache<String, String>>,
    timeouts: Arc<TimeoutTracker>,
}

impl UrlOpener {
    /// Create an opener that shares `timeouts` with the other openers.
    pub fn new(credentials: Credentials, timeouts: Arc<TimeoutTracker>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let capacity = NonZeroUsize::new(CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            client,
            credentials,
            cache: Mutex::new(LruCache::new(capacity)),
            timeouts,
        })
    }

    /// Posts a form encoded body and returns the response body. Not cached.
    pub fn post_form(&self, url: &str, body: String) -> Result<String> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        self.send(url, request)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::None => request,
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
        }
    }

    fn send(&self, url: &str, request: RequestBuilder) -> Result<String> {
        let host = netloc(url)?;
        if self.timeouts.timed_out(&host) {
            warn!(%url, %host, "Not opening url: skipped because host timed out before");
            return Err(SourceError::SkippedHost { host });
        }
        let request = self
            .authenticate(request)
            .header(USER_AGENT, concat!("quality-report/", env!("CARGO_PKG_VERSION")));
        debug!(%url, "Opening url");
        let result = request.send().and_then(|response| response.error_for_status());
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(%url, reason = %err, "Couldn't open url");
                if err.is_timeout() {
                    self.timeouts.register(&host);
                    return Err(SourceError::Timeout { host });
                }
                if let Some(status) = err.status() {
                    return Err(SourceError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                return Err(err.into());
            }
        };
        response.text().map_err(|err| {
            warn!(%url, reason = %err, "Couldn't read response body");
            err.into()
        })
    }
}

impl UrlRead for UrlOpener {
    fn url_read(&self, url: &str) -> Result<String> {
        if let Some(body) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
        {
            trace!(%url, "Cache hit");
            return Ok(body.clone());
        }
        let body = self.send(url, self.client.get(url))?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(url.to_string(), body.clone());
        Ok(body)
    }
}
