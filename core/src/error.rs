//! Error types for the Cloudant client.
//!
//! # Design
//! Four failure classes, each inspectable on its own: input rejected before
//! any I/O (`Validation`), transport failure (`Network`), non-2xx reply
//! (`Api`), and a 2xx body that does not match the declared shape
//! (`Decode`). `Api` keeps the raw body alongside the `error`/`reason` pair
//! the server usually sends, so callers can branch on 404/409/412 without
//! parsing anything themselves.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by `CloudantClient` operations and the decode functions.
#[derive(Debug, Error)]
pub enum CloudantError {
    /// Missing or malformed input, detected before any request was sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Connection, timeout, or TLS failure.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a status outside 2xx.
    #[error("HTTP {status}: {}", api_message(.body, .error, .reason))]
    Api {
        status: u16,
        body: String,
        error: Option<String>,
        reason: Option<String>,
        headers: Vec<(String, String)>,
    },

    /// A successful response body could not be decoded into the expected type.
    #[error("response decoding failed: {0}")]
    Decode(String),
}

/// Error payload sent by the server with most non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    reason: Option<String>,
}

fn api_message<'a>(body: &'a str, error: &'a Option<String>, reason: &'a Option<String>) -> &'a str {
    reason.as_deref().or(error.as_deref()).unwrap_or(body)
}

impl CloudantError {
    /// Build an `Api` error from a non-2xx status and its raw body.
    pub fn api(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let body = String::from_utf8_lossy(&body).into_owned();
        let payload = serde_json::from_str::<ErrorPayload>(&body).ok();
        let (error, reason) = match payload {
            Some(p) => (p.error, p.reason),
            None => (None, None),
        };
        CloudantError::Api {
            status,
            body,
            error,
            reason,
            headers,
        }
    }

    /// HTTP status code, when the failure came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudantError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.status() == Some(412)
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if s >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_extracts_server_payload() {
        let err = CloudantError::api(
            409,
            Vec::new(),
            br#"{"error":"conflict","reason":"Document update conflict."}"#.to_vec(),
        );
        assert!(err.is_conflict());
        match &err {
            CloudantError::Api { error, reason, .. } => {
                assert_eq!(error.as_deref(), Some("conflict"));
                assert_eq!(reason.as_deref(), Some("Document update conflict."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "HTTP 409: Document update conflict.");
    }

    #[test]
    fn api_error_keeps_raw_body_when_not_json() {
        let err = CloudantError::api(502, Vec::new(), b"bad gateway".to_vec());
        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        match err {
            CloudantError::Api { body, error, .. } => {
                assert_eq!(body, "bad gateway");
                assert!(error.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_is_absent_for_client_side_failures() {
        let err = CloudantError::Validation("db must be provided".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
        assert!(!CloudantError::Network("timed out".to_string()).is_server_error());
    }

    #[test]
    fn precondition_failed_is_distinct_from_not_found() {
        let err = CloudantError::api(412, Vec::new(), br#"{"error":"file_exists"}"#.to_vec());
        assert!(err.is_precondition_failed());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 412: file_exists");
    }
}
