//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// An HTTP/1.1 request.
///
/// Parsed from the wire by [`Request::parse`], or assembled directly with
/// [`Request::new`] when a request is synthesized in-process.
///
/// # Examples
///
/// ```
/// use cacheproxy::http::{Method, Request};
///
/// let raw = b"GET /hello?name=world HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method(), &Method::Get);
/// assert_eq!(request.path(), "/hello");
/// assert_eq!(request.uri(), "/hello?name=world");
///
/// let built = Request::new(Method::Get, "/hello?name=world").header("Host", "localhost");
/// assert_eq!(built.uri(), request.uri());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    /// The request target exactly as received, including any query string.
    target: String,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Builds an HTTP/1.1 request for `target` with no headers and an empty body.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();
        let path = match target.split_once('?') {
            Some((path, _query)) => path.to_owned(),
            None => target.clone(),
        };
        Self {
            method,
            target,
            path,
            version: 1,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse a raw HTTP/1.1 request from a byte slice.
    ///
    /// Returns the parsed `Request` and the byte offset at which the body begins
    /// in `buf` (i.e. immediately after the `\r\n\r\n` header terminator).
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: more data is needed to complete the request headers.
    /// - [`RequestError::Parse`]: the data is malformed and cannot be parsed.
    /// - [`RequestError::MissingField`]: a required field (method, path, version) is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = match raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse()
        {
            Ok(method) => method,
            Err(never) => match never {},
        };

        let target = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let mut request = Self::new(method, target);
        request.version = version;
        request.headers = header_map;

        let content_length = request.content_length().unwrap_or(0);
        let body_end = buf.len().min(body_offset + content_length);
        request.body = Bytes::copy_from_slice(&buf[body_offset..body_end]);

        Ok((request, body_offset))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full request target: the path plus `?query` when present.
    pub fn uri(&self) -> &str {
        &self.target
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }

    /// Returns the value of the `Content-Length` header parsed as a `usize`, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method().as_str(), "GET");
        assert_eq!(req.path(), "/");
        assert_eq!(req.uri(), "/");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn query_stays_in_uri() {
        let raw = b"GET /search?q=rust&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/search");
        assert_eq!(req.uri(), "/search?q=rust&page=2");
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn keep_alive_defaults() {
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
        assert!(req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\nHost: a\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
        let (req, _) =
            Request::parse(b"GET / HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn body_bounded_by_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET / HTTP/1.1\r\n";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&req.body()[..], b"hello");
        assert_eq!(&raw[body_offset..body_offset + 5], b"hello");
    }

    #[test]
    fn built_request_matches_parsed() {
        let req = Request::new(Method::Head, "/a?b=c+d")
            .header("Accept", "*/*")
            .with_body("ignored");
        assert_eq!(req.method(), &Method::Head);
        assert_eq!(req.path(), "/a");
        assert_eq!(req.uri(), "/a?b=c+d");
        assert_eq!(req.headers().get("accept"), Some("*/*"));
        assert_eq!(&req.body()[..], b"ignored");
    }
}
