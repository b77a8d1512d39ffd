//! Time-windowed cache keys.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::http::{Method, Request};

/// Identifies one cacheable request instance: method, full request target,
/// and the index of the TTL window the request arrived in.
///
/// Only these three inputs matter. Request headers and body never change
/// the key.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use cacheproxy::cache::CacheKey;
/// use cacheproxy::http::Method;
///
/// let window = Duration::from_secs(60);
/// let a = CacheKey::new(Method::Get, "/feed?page=1", UNIX_EPOCH + Duration::from_secs(120), window);
/// let b = CacheKey::new(Method::Get, "/feed?page=1", UNIX_EPOCH + Duration::from_secs(179), window);
/// let c = CacheKey::new(Method::Get, "/feed?page=1", UNIX_EPOCH + Duration::from_secs(180), window);
///
/// assert_eq!(a, b);
/// assert_ne!(b, c);
/// assert_eq!(a.to_string(), "GET-/feed?page=1-2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
    bucket: i64,
}

impl CacheKey {
    /// Derives the key for `method` + `url` observed at `now`, with windows of width `window`.
    ///
    /// `window` must be non-zero; [`CacheConfig`](super::CacheConfig) guarantees this
    /// for keys built by the proxy.
    pub fn new(method: Method, url: impl Into<String>, now: SystemTime, window: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            bucket: bucket(now, window),
        }
    }

    /// Derives the key for a request.
    pub fn for_request(req: &Request, now: SystemTime, window: Duration) -> Self {
        Self::new(req.method().clone(), req.uri(), now, window)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The window index: whole windows elapsed since the Unix epoch.
    pub fn bucket(&self) -> i64 {
        self.bucket
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.method, self.url, self.bucket)
    }
}

// Moments before the epoch all fall into bucket 0.
fn bucket(now: SystemTime, window: Duration) -> i64 {
    let width = window.as_nanos().max(1);
    let elapsed = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    i64::try_from(elapsed / width).unwrap_or(i64::MAX)
}
