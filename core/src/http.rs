//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! request builder produces `HttpRequest` values and the decoder consumes
//! `HttpResponse` values; whoever executes the round-trip (the bundled ureq
//! transport, a test double, or a host application) only has to move bytes.
//!
//! `HttpResponse` owns its body as a reader rather than a buffer so that
//! streaming operations can hand the connection straight to the caller.
//! Buffered decoding reads the body to the end; dropping the response
//! releases the underlying connection on every exit path.

use std::fmt;
use std::io::{self, Cursor, Read};

use crate::error::CloudantError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods that may be replayed by the transport retry layer.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data, with an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response whose body has not necessarily been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// A response with an in-memory body.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self::streaming(status, headers, Cursor::new(body.into()))
    }

    /// A response whose body is read lazily from `body`.
    pub fn streaming(
        status: u16,
        headers: Vec<(String, String)>,
        body: impl Read + Send + 'static,
    ) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Read the whole body into memory.
    pub fn read_body(&mut self) -> Result<Vec<u8>, CloudantError> {
        let mut buf = Vec::new();
        self.body
            .read_to_end(&mut buf)
            .map_err(|e| CloudantError::Network(format!("reading response body: {e}")))?;
        Ok(buf)
    }

    /// Split into status, headers, and the unread body.
    pub fn into_parts(self) -> (u16, Vec<(String, String)>, ByteStream) {
        (self.status, self.headers, ByteStream { inner: self.body })
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

const CHUNK_SIZE: usize = 8 * 1024;

/// A lazy, single-pass byte sequence backed by an open response body.
///
/// Implements `Read` for incremental consumption and `Iterator` for chunked
/// consumption. Once exhausted it stays exhausted; it cannot be restarted.
pub struct ByteStream {
    inner: Box<dyn Read + Send>,
}

impl ByteStream {
    /// Drain the remaining bytes into memory.
    pub fn into_vec(mut self) -> Result<Vec<u8>, CloudantError> {
        let mut buf = Vec::new();
        self.inner
            .read_to_end(&mut buf)
            .map_err(|e| CloudantError::Network(format!("reading response stream: {e}")))?;
        Ok(buf)
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Iterator for ByteStream {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return None,
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByteStream { .. }")
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_post_is_not_idempotent() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(HttpMethod::Head.is_idempotent());
        assert!(HttpMethod::Put.is_idempotent());
        assert!(HttpMethod::Delete.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse::new(
            200,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            "{}",
        );
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn byte_stream_yields_all_chunks_once() {
        let body: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let response = HttpResponse::new(200, Vec::new(), body.clone());
        let (_, _, mut stream) = response.into_parts();

        let mut collected = Vec::new();
        for chunk in Iterator::by_ref(&mut stream) {
            collected.extend(chunk.unwrap());
        }
        assert_eq!(collected, body);
        assert!(stream.next().is_none());
    }

    #[test]
    fn read_body_consumes_the_reader() {
        let mut response = HttpResponse::new(201, Vec::new(), r#"{"ok":true}"#);
        assert_eq!(response.read_body().unwrap(), br#"{"ok":true}"#);
        assert!(response.read_body().unwrap().is_empty());
    }
}
