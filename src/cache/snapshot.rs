//! Captured responses: the buffering [`Recorder`] sink, the immutable
//! [`Snapshot`] it produces, and replay of a snapshot onto a real sink.

use std::time::SystemTime;

use bytes::{Bytes, BytesMut};

use super::CacheConfig;
use crate::http::{Headers, ResponseWriter, StatusCode};

/// Header carrying the upstream `Date` of a cached response.
pub const X_CACHE_DATE: &str = "X-Cache-Date";

/// A complete response captured from a handler.
///
/// Cheap to share behind an `Arc`; never modified once it has been handed to
/// the store or to a waiting caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Snapshot {
    pub fn new(status: StatusCode, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Applies the cache-insertion header rewrites and returns the final snapshot.
    ///
    /// - `Cache-Control: max-age=<n>`, `n` being [`CacheConfig::max_age_secs`]
    /// - `Expires: <now + ttl>` as an HTTP date
    /// - `X-Cache-Date: <Date>`, or `<now>` when the response carried no `Date`
    /// - `Date` removed
    #[must_use]
    pub fn into_cacheable(mut self, config: &CacheConfig, now: SystemTime) -> Self {
        let date = self
            .headers
            .get("date")
            .map(str::to_owned)
            .unwrap_or_else(|| httpdate::fmt_http_date(now));

        self.headers
            .set("Cache-Control", format!("max-age={}", config.max_age_secs()));
        self.headers
            .set("Expires", httpdate::fmt_http_date(now + config.ttl()));
        self.headers.set(X_CACHE_DATE, date);
        self.headers.remove("date");
        self
    }

    /// Writes this snapshot onto `w`: every header, then the status, then the body.
    ///
    /// For each header name in the snapshot, any value already on `w` under
    /// that name is replaced.
    pub fn replay(&self, w: &mut dyn ResponseWriter) {
        let sink = w.headers_mut();
        for name in self.headers.names() {
            sink.remove(name);
        }
        for (name, value) in self.headers.iter() {
            sink.insert(name, value);
        }
        w.write_header(self.status);
        w.write(&self.body);
    }
}

/// A [`ResponseWriter`] that buffers everything instead of sending it.
///
/// Status and headers are frozen on the first [`write_header`](ResponseWriter::write_header)
/// or [`write`](ResponseWriter::write); header edits made afterwards are not
/// part of the capture.
#[derive(Debug, Default)]
pub struct Recorder {
    headers: Headers,
    committed: Option<(StatusCode, Headers)>,
    body: BytesMut,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the capture. A handler that wrote nothing yields `200 OK` with an empty body.
    pub fn finish(self) -> Snapshot {
        let (status, headers) = self
            .committed
            .unwrap_or((StatusCode::Ok, self.headers));
        Snapshot {
            status,
            headers,
            body: self.body.freeze(),
        }
    }
}

impl ResponseWriter for Recorder {
    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.committed.is_none() {
            self.committed = Some((status, self.headers.clone()));
        }
    }

    fn write(&mut self, buf: &[u8]) {
        if self.committed.is_none() {
            self.write_header(StatusCode::Ok);
        }
        self.body.extend_from_slice(buf);
    }
}
