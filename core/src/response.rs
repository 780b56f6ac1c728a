//! Response decoding.
//!
//! # Design
//! Every decoder first runs `check_status`: anything outside 2xx becomes
//! `CloudantError::Api` carrying the status, headers, and raw body. What
//! happens to a 2xx body depends on the operation's declared shape:
//! buffered JSON, nothing at all (HEAD), an untouched lazy stream, or a
//! parsed multipart body. A JSON operation never yields a silent null: an
//! empty or mismatched body is a `Decode` error.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CloudantError;
use crate::http::{ByteStream, HttpResponse};
use crate::multipart::MultipartBody;

/// Result of a successful call: status, headers, and the decoded body.
#[derive(Debug)]
pub struct ServiceResponse<T> {
    pub status_code: u16,
    /// Header names are lower-cased; repeated headers are comma-joined.
    pub headers: BTreeMap<String, String>,
    pub result: T,
}

impl<T> ServiceResponse<T> {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The `ETag` header without its surrounding quotes, which for documents
    /// is the current revision.
    pub fn etag(&self) -> Option<&str> {
        self.header("etag").map(|v| v.trim_matches('"'))
    }

    pub fn into_result(self) -> T {
        self.result
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResponse<U> {
        ServiceResponse {
            status_code: self.status_code,
            headers: self.headers,
            result: f(self.result),
        }
    }
}

/// Decode a buffered JSON body into `T`.
pub fn parse_json<T: DeserializeOwned>(mut response: HttpResponse) -> Result<ServiceResponse<T>, CloudantError> {
    check_status(&mut response)?;
    let body = response.read_body()?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CloudantError::Decode(format!(
            "expected a JSON body with status {}, got an empty body",
            response.status
        )));
    }
    let result = serde_json::from_slice(&body).map_err(|e| CloudantError::Decode(e.to_string()))?;
    Ok(wrap(response.status, response.headers, result))
}

/// Decode a response where only status and headers matter.
pub fn parse_head(mut response: HttpResponse) -> Result<ServiceResponse<()>, CloudantError> {
    check_status(&mut response)?;
    Ok(wrap(response.status, response.headers, ()))
}

/// Hand the body to the caller unread.
pub fn parse_stream(mut response: HttpResponse) -> Result<ServiceResponse<ByteStream>, CloudantError> {
    check_status(&mut response)?;
    let (status, headers, stream) = response.into_parts();
    Ok(wrap(status, headers, stream))
}

/// Buffer the body and split it into multipart parts.
pub fn parse_multipart(mut response: HttpResponse) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
    check_status(&mut response)?;
    let content_type = response
        .header("content-type")
        .map(str::to_string)
        .ok_or_else(|| CloudantError::Decode("multipart response without a content type".to_string()))?;
    let body = response.read_body()?;
    let result = MultipartBody::parse(&content_type, &body)?;
    Ok(wrap(response.status, response.headers, result))
}

/// Map non-2xx responses to `CloudantError::Api`, consuming the body.
pub fn check_status(response: &mut HttpResponse) -> Result<(), CloudantError> {
    if response.is_success() {
        return Ok(());
    }
    let body = response.read_body().unwrap_or_default();
    debug!(status = response.status, "request failed");
    Err(CloudantError::api(
        response.status,
        std::mem::take(&mut response.headers),
        body,
    ))
}

fn wrap<T>(status: u16, headers: Vec<(String, String)>, result: T) -> ServiceResponse<T> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    ServiceResponse {
        status_code: status,
        headers: map,
        result,
    }
}
