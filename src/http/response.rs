//! HTTP/1.1 response builder and wire sink.
//!
//! Provides a fluent builder API for constructing HTTP responses, the
//! [`ResponseWriter`] implementation the server hands to handlers, and
//! serialization to a byte buffer for transmission over TCP.

use bytes::{BufMut, BytesMut};

use super::{Headers, ResponseWriter, StatusCode};

/// An HTTP/1.1 response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use cacheproxy::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Length: 15\r\n"));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    keep_alive: bool,
    // Answers to HEAD keep Content-Length but send no body bytes.
    omit_body: bool,
    // Set once a handler has written a status line or body bytes.
    committed: bool,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            keep_alive: true,
            omit_body: false,
            committed: false,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the response body from a string.
    ///
    /// The `Content-Length` header is written automatically by [`into_bytes`](Self::into_bytes).
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Controls whether the `Connection: keep-alive` or `Connection: close` header is written.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// In-place form of [`keep_alive`](Self::keep_alive).
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    /// Serializes the headers and `Content-Length` but no body, as a HEAD answer requires.
    pub fn set_omit_body(&mut self, omit_body: bool) {
        self.omit_body = omit_body;
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the body bytes written so far.
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Copies this response into another sink: headers, then status, then body.
    ///
    /// Used to adapt builder-style handlers to the [`ResponseWriter`] contract.
    pub fn write_to(self, w: &mut dyn ResponseWriter) {
        let headers = w.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.insert(name, value);
        }
        w.write_header(self.status);
        if !self.body.is_empty() {
            w.write(&self.body);
        }
    }

    /// Serializes the response into a `BytesMut` buffer using HTTP/1.1 wire format.
    ///
    /// Automatically adds:
    /// - `Content-Type: text/plain; charset=utf-8` if the body is non-empty and no
    ///   `Content-Type` header was set.
    /// - `Content-Length: <n>` (always written, replacing any handler-supplied value).
    /// - `Connection: keep-alive` or `Connection: close` (replacing any handler-supplied value).
    pub fn into_bytes(mut self) -> BytesMut {
        let content_length = self.body.len();

        if !self.body.is_empty() && !self.headers.contains("content-type") {
            self.headers
                .insert("Content-Type", "text/plain; charset=utf-8");
        }

        let connection = if self.keep_alive {
            "keep-alive"
        } else {
            "close"
        };
        self.headers.remove("content-length");
        self.headers.set("Connection", connection);

        let estimated_size = 128 + self.headers.len() * 64 + content_length;
        let mut buf = BytesMut::with_capacity(estimated_size);

        // Status line
        buf.put(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason()
            )
            .as_bytes(),
        );

        buf.put(self.headers.to_string().as_bytes());

        // Content-Length is always the last header before the blank line
        buf.put(format!("Content-Length: {content_length}\r\n").as_bytes());

        buf.put(&b"\r\n"[..]);

        if !self.omit_body && !self.body.is_empty() {
            buf.put(self.body.as_slice());
        }

        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}

impl ResponseWriter for Response {
    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            return;
        }
        self.status = status;
        self.committed = true;
    }

    fn write(&mut self, buf: &[u8]) {
        if !self.committed {
            self.write_header(StatusCode::Ok);
        }
        self.body.extend_from_slice(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(bytes: BytesMut) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn simple_ok_response() {
        let r = Response::new(StatusCode::Ok).body("Hello");
        let s = to_string(r.into_bytes());
        assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn handler_content_length_not_duplicated() {
        let r = Response::new(StatusCode::Ok)
            .header("Content-Length", "999")
            .header("Connection", "upgrade")
            .body("abc");
        let s = to_string(r.into_bytes());
        assert_eq!(s.matches("Content-Length").count(), 1);
        assert!(s.contains("Content-Length: 3\r\n"));
        assert_eq!(s.matches("Connection").count(), 1);
        assert!(s.contains("Connection: keep-alive\r\n"));
    }

    #[test]
    fn connection_close() {
        let mut r = Response::new(StatusCode::Ok);
        r.set_keep_alive(false);
        let s = to_string(r.into_bytes());
        assert!(s.contains("Connection: close\r\n"));
    }

    #[test]
    fn omitted_body_keeps_content_length() {
        let mut r = Response::new(StatusCode::Ok).body("Hello");
        r.set_omit_body(true);
        let s = to_string(r.into_bytes());
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\n"));
        assert!(!s.contains("Hello"));
    }

    #[test]
    fn sink_defaults_to_ok_on_first_write() {
        let mut r = Response::new(StatusCode::InternalServerError);
        r.write(b"partial");
        r.write_header(StatusCode::NotFound);
        assert_eq!(r.status(), StatusCode::Ok);
        assert_eq!(r.content(), b"partial");
    }

    #[test]
    fn sink_first_status_wins() {
        let mut r = Response::default();
        r.write_header(StatusCode::Accepted);
        r.write_header(StatusCode::Conflict);
        assert_eq!(r.status(), StatusCode::Accepted);
    }

    #[test]
    fn write_to_copies_everything() {
        let src = Response::new(StatusCode::Created)
            .header("X-A", "1")
            .header("X-A", "2")
            .body("payload");
        let mut dst = Response::default();
        src.write_to(&mut dst);
        assert_eq!(dst.status(), StatusCode::Created);
        assert_eq!(dst.headers().get_all("x-a").collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(dst.content(), b"payload");
    }
}
