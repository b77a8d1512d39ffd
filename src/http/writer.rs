//! The response sink contract handlers write into.
//!
//! A [`ResponseWriter`] accepts three kinds of writes, in the order a handler
//! would normally issue them:
//!
//! 1. header edits through [`headers_mut`](ResponseWriter::headers_mut),
//! 2. a single status line via [`write_header`](ResponseWriter::write_header),
//! 3. any number of body chunks via [`write`](ResponseWriter::write).
//!
//! The first `write_header` or `write` commits the status. Later
//! `write_header` calls are ignored, and a `write` without a preceding
//! `write_header` commits `200 OK`.
//!
//! [`Response`](super::Response) is the sink the server serializes onto the
//! wire. [`Recorder`](crate::cache::Recorder) is the buffering sink the cache
//! hands to the wrapped handler instead.

use super::{Headers, StatusCode};

/// A place a handler writes its response into.
///
/// # Examples
///
/// ```
/// use cacheproxy::http::{Response, ResponseWriter, StatusCode};
///
/// let mut sink = Response::default();
/// sink.headers_mut().insert("Content-Type", "text/plain");
/// sink.write_header(StatusCode::Created);
/// sink.write(b"made ");
/// sink.write(b"it");
///
/// assert_eq!(sink.status(), StatusCode::Created);
/// assert_eq!(sink.content(), b"made it");
/// ```
pub trait ResponseWriter: Send {
    /// Mutable access to the pending header block.
    fn headers_mut(&mut self) -> &mut Headers;

    /// Commits the status code. No-op once the status is committed.
    fn write_header(&mut self, status: StatusCode);

    /// Appends body bytes, committing `200 OK` first if nothing was committed yet.
    fn write(&mut self, buf: &[u8]);
}
