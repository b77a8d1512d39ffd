//! HTTP header map with case-insensitive name lookup.
//!
//! HTTP headers are order-preserving and case-insensitive per [RFC 9110 §5].
//! Cached responses are replayed from this type, so write order and
//! multiplicity survive a round trip through the cache unchanged.

use std::fmt;

/// A case-insensitive, multi-value HTTP header map.
///
/// Preserves insertion order and allows multiple values per header name,
/// matching the semantics of HTTP/1.1 header fields (RFC 9110 §5.3).
///
/// # Examples
///
/// ```
/// use cacheproxy::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Vary", "Accept");
/// headers.insert("Vary", "Accept-Encoding");
/// headers.set("Cache-Control", "max-age=60");
///
/// let all: Vec<_> = headers.get_all("vary").collect();
/// assert_eq!(all, vec!["Accept", "Accept-Encoding"]);
///
/// headers.set("VARY", "*");
/// assert_eq!(headers.get_all("vary").count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Multiple values for the same name are preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Replaces every value for `name` with a single `value`.
    ///
    /// The new entry keeps the position of the first existing entry for that
    /// name, or is appended if the name was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let Some(first) = self.position(&name) else {
            self.inner.push((name, value));
            return;
        };

        let mut index = 0;
        self.inner.retain(|(k, _)| {
            let keep = index <= first || !k.eq_ignore_ascii_case(&name);
            index += 1;
            keep
        });
        self.inner[first] = (name, value);
    }

    /// Returns the first value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given header name (case-insensitive).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes all entries with the given header name (case-insensitive).
    ///
    /// Returns `true` if any entries were removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns each distinct header name once, in order of first appearance.
    ///
    /// The spelling of the first occurrence is returned.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (k, _) in &self.inner {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(k)) {
                names.push(k.as_str());
            }
        }
        names
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.inner.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn multi_value_order_preserved() {
        let mut h = Headers::new();
        h.insert("Set-Cookie", "a=1");
        h.insert("X-Other", "x");
        h.insert("Set-Cookie", "b=2");
        let vals: Vec<_> = h.get_all("set-cookie").collect();
        assert_eq!(vals, vec!["a=1", "b=2"]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn set_replaces_all_values_in_place() {
        let mut h = Headers::new();
        h.insert("A", "1");
        h.insert("Cache-Control", "no-cache");
        h.insert("B", "2");
        h.insert("cache-control", "private");
        h.set("Cache-Control", "max-age=60");

        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(
            pairs,
            vec![("A", "1"), ("Cache-Control", "max-age=60"), ("B", "2")]
        );
    }

    #[test]
    fn set_appends_when_absent() {
        let mut h = Headers::new();
        h.insert("A", "1");
        h.set("Expires", "never");
        assert_eq!(h.iter().last(), Some(("Expires", "never")));
    }

    #[test]
    fn remove() {
        let mut h = Headers::new();
        h.insert("Date", "Mon, 02 Jan 2006 15:04:05 GMT");
        h.insert("date", "again");
        assert!(h.remove("DATE"));
        assert!(h.is_empty());
        assert!(!h.remove("date"));
    }

    #[test]
    fn names_are_distinct() {
        let mut h = Headers::new();
        h.insert("Vary", "Accept");
        h.insert("ETag", "\"x\"");
        h.insert("vary", "Origin");
        assert_eq!(h.names(), vec!["Vary", "ETag"]);
    }

    #[test]
    fn display_wire_format() {
        let mut h = Headers::new();
        h.insert("X-A", "1");
        h.insert("X-B", "2");
        assert_eq!(h.to_string(), "X-A: 1\r\nX-B: 2\r\n");
    }
}
