//! Parsing of `multipart/mixed` and `multipart/related` bodies.
//!
//! Documents fetched with `open_revs` or with inline attachments, and the
//! results of `_bulk_get`, can be requested as multipart. The body is split
//! on the boundary named in the `Content-Type` header; each part keeps its
//! own headers and raw bytes. Parts may nest (a `_bulk_get` part is itself
//! `multipart/related` when the document carries attachments).

use serde::de::DeserializeOwned;

use crate::error::CloudantError;
use crate::http::find_header;

/// A parsed multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Full media type, e.g. `multipart/mixed`.
    pub media_type: String,
    pub boundary: String,
    pub parts: Vec<Part>,
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Part {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decode the part body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CloudantError> {
        serde_json::from_slice(&self.body).map_err(|e| CloudantError::Decode(e.to_string()))
    }

    /// Parse a nested multipart part. `None` when the part is not multipart.
    pub fn as_multipart(&self) -> Option<Result<MultipartBody, CloudantError>> {
        let content_type = self.content_type()?;
        if !content_type.trim_start().to_ascii_lowercase().starts_with("multipart/") {
            return None;
        }
        Some(MultipartBody::parse(content_type, &self.body))
    }
}

impl MultipartBody {
    /// Split `body` using the boundary declared in `content_type`.
    pub fn parse(content_type: &str, body: &[u8]) -> Result<Self, CloudantError> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !media_type.starts_with("multipart/") {
            return Err(CloudantError::Decode(format!(
                "expected a multipart content type, got {content_type}"
            )));
        }
        let boundary = boundary_param(content_type)
            .ok_or_else(|| CloudantError::Decode(format!("no boundary in content type {content_type}")))?;

        let delimiter = format!("--{boundary}").into_bytes();
        let mut parts = Vec::new();
        let mut pos = find_delimiter(body, &delimiter, 0)
            .ok_or_else(|| CloudantError::Decode("multipart body has no opening boundary".to_string()))?;

        loop {
            pos += delimiter.len();
            if body[pos..].starts_with(b"--") {
                break;
            }
            pos = skip_line_break(body, pos);
            let next = find_delimiter(body, &delimiter, pos)
                .ok_or_else(|| CloudantError::Decode("multipart body has no closing boundary".to_string()))?;
            let raw = trim_trailing_line_break(&body[pos..next]);
            parts.push(parse_part(raw)?);
            pos = next;
        }

        Ok(Self {
            media_type,
            boundary,
            parts,
        })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn boundary_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn parse_part(raw: &[u8]) -> Result<Part, CloudantError> {
    let (head, body) = match find(raw, b"\r\n\r\n", 0) {
        Some(i) => (&raw[..i], &raw[i + 4..]),
        None => match find(raw, b"\n\n", 0) {
            Some(i) => (&raw[..i], &raw[i + 2..]),
            // A part that starts with a blank line has no headers.
            None if raw.starts_with(b"\r\n") => (&raw[..0], &raw[2..]),
            None => (raw, &raw[raw.len()..]),
        },
    };
    let head = std::str::from_utf8(head)
        .map_err(|_| CloudantError::Decode("multipart part headers are not UTF-8".to_string()))?;
    let headers = head
        .lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();
    Ok(Part {
        headers,
        body: body.to_vec(),
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Next boundary line: the delimiter must open a line and be followed by
/// `--` or by optional padding and then a line break or the end of the body.
fn find_delimiter(body: &[u8], delimiter: &[u8], from: usize) -> Option<usize> {
    let mut start = from;
    while let Some(i) = find(body, delimiter, start) {
        let at_line_start = i == 0 || body[i - 1] == b'\n';
        let rest = &body[i + delimiter.len()..];
        let padding = rest.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
        let terminated =
            rest.starts_with(b"--") || matches!(rest.get(padding), None | Some(b'\r' | b'\n'));
        if at_line_start && terminated {
            return Some(i);
        }
        start = i + 1;
    }
    None
}

fn skip_line_break(body: &[u8], mut pos: usize) -> usize {
    while matches!(body.get(pos), Some(b' ' | b'\t')) {
        pos += 1;
    }
    if body[pos..].starts_with(b"\r\n") {
        pos + 2
    } else if body[pos..].starts_with(b"\n") {
        pos + 1
    } else {
        pos
    }
}

fn trim_trailing_line_break(raw: &[u8]) -> &[u8] {
    raw.strip_suffix(b"\r\n")
        .or_else(|| raw.strip_suffix(b"\n"))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    const MIXED: &str = "--abc123\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"_id\":\"doc1\",\"_rev\":\"1-a\"}\r\n\
--abc123\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"_id\":\"doc1\",\"_rev\":\"2-b\"}\r\n\
--abc123--";

    #[test]
    fn splits_parts_on_boundary() {
        let body = MultipartBody::parse("multipart/mixed; boundary=\"abc123\"", MIXED.as_bytes()).unwrap();
        assert_eq!(body.media_type, "multipart/mixed");
        assert_eq!(body.boundary, "abc123");
        assert_eq!(body.len(), 2);
        let second: Document = body.parts[1].json().unwrap();
        assert_eq!(second.rev.as_deref(), Some("2-b"));
        assert_eq!(body.parts[0].content_type(), Some("application/json"));
    }

    #[test]
    fn nested_related_part_with_attachment() {
        let inner = "--inner\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"_id\":\"d\",\"_attachments\":{\"a.txt\":{\"follows\":true}}}\r\n\
--inner\r\n\
Content-Disposition: attachment; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello\r\n\
--inner--";
        let outer = format!(
            "--outer\r\nContent-Type: multipart/related; boundary=\"inner\"\r\n\r\n{inner}\r\n--outer--\r\n"
        );
        let body = MultipartBody::parse("multipart/mixed; boundary=outer", outer.as_bytes()).unwrap();
        assert_eq!(body.len(), 1);
        let nested = body.parts[0].as_multipart().unwrap().unwrap();
        assert_eq!(nested.media_type, "multipart/related");
        assert_eq!(nested.parts[1].body, b"hello");
        assert_eq!(nested.parts[1].content_type(), Some("text/plain"));
    }

    #[test]
    fn boundary_prefix_inside_parts_does_not_split() {
        let inner = "--abcdef\r\n\
Content-Type: application/json\r\n\
\r\n\
{\"_id\":\"d\",\"note\":\"x--abc\"}\r\n\
--abcdef\r\n\
Content-Type: text/plain\r\n\
\r\n\
line one --abc\r\n\
--abc is not a boundary here\r\n\
--abcdef--";
        let outer = format!(
            "--abc\r\nContent-Type: multipart/related; boundary=abcdef\r\n\r\n{inner}\r\n--abc--\r\n"
        );
        let body = MultipartBody::parse("multipart/mixed; boundary=abc", outer.as_bytes()).unwrap();
        assert_eq!(body.len(), 1);
        let nested = body.parts[0].as_multipart().unwrap().unwrap();
        assert_eq!(nested.len(), 2);
        let doc: Document = nested.parts[0].json().unwrap();
        assert_eq!(doc.get("note"), Some(&serde_json::json!("x--abc")));
        assert_eq!(nested.parts[1].body, b"line one --abc\r\n--abc is not a boundary here");
    }

    #[test]
    fn json_part_is_not_multipart() {
        let body = MultipartBody::parse("multipart/mixed; boundary=abc123", MIXED.as_bytes()).unwrap();
        assert!(body.parts[0].as_multipart().is_none());
    }

    #[test]
    fn missing_boundary_is_a_decode_error() {
        let err = MultipartBody::parse("multipart/mixed", MIXED.as_bytes()).unwrap_err();
        assert!(matches!(err, CloudantError::Decode(_)));
    }

    #[test]
    fn non_multipart_content_type_is_rejected() {
        let err = MultipartBody::parse("application/json", b"{}").unwrap_err();
        assert!(matches!(err, CloudantError::Decode(_)));
    }

    #[test]
    fn unterminated_body_is_a_decode_error() {
        let err = MultipartBody::parse("multipart/mixed; boundary=x", b"--x\r\n\r\npartial").unwrap_err();
        assert!(matches!(err, CloudantError::Decode(_)));
    }
}
