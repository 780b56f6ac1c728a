//! Operation-level request description and URL resolution.
//!
//! # Design
//! A `ServiceRequest` is what an operation's `build_request` produces: a
//! method, a path template such as `/{db}/_design/{ddoc}`, the named values
//! for its placeholders, and the query, header, and body parameters that were
//! actually supplied. Unset optional parameters never make it in, so nothing
//! is ever sent as an empty or null value.
//!
//! `resolve` turns it into an absolute `HttpRequest` against a base URL. Each
//! path parameter becomes exactly one percent-encoded segment (a `/` inside a
//! document id is sent as `%2F`), and the query string is form-encoded.
//! Dot-only values (`.` and `..`) are rejected: URL normalization would
//! collapse them, even percent-encoded, and retarget the request.

use serde::Serialize;
use url::Url;

use crate::error::CloudantError;
use crate::http::{HttpMethod, HttpRequest};

pub const APPLICATION_JSON: &str = "application/json";

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON, sent as `application/json` unless a content type
    /// header was set explicitly.
    Json(Vec<u8>),
    /// Opaque bytes tagged with a caller-supplied content type.
    Binary { content_type: String, data: Vec<u8> },
}

/// Values that can be rendered as a single query parameter.
pub trait QueryValue {
    fn to_query(&self) -> String;
}

impl QueryValue for bool {
    fn to_query(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }
}

impl QueryValue for &str {
    fn to_query(&self) -> String {
        (*self).to_string()
    }
}

impl QueryValue for String {
    fn to_query(&self) -> String {
        self.clone()
    }
}

macro_rules! numeric_query_value {
    ($($t:ty),*) => {
        $(impl QueryValue for $t {
            fn to_query(&self) -> String {
                self.to_string()
            }
        })*
    };
}

numeric_query_value!(u32, u64, i32, i64, f64);

/// A request for one operation, before it is bound to a service URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub method: HttpMethod,
    pub path: &'static str,
    pub path_params: Vec<(&'static str, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ServiceRequest {
    pub fn new(method: HttpMethod, path: &'static str) -> Self {
        Self {
            method,
            path,
            path_params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn path_param(mut self, name: &'static str, value: &str) -> Self {
        self.path_params.push((name, value.to_string()));
        self
    }

    /// Add a query parameter if `value` is set. Keys stay unique: a second
    /// value for the same key replaces the first.
    pub fn query<T: QueryValue>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            set_pair(&mut self.query, key, v.to_query());
        }
        self
    }

    /// Add a list-valued query parameter as a comma-joined string.
    pub fn query_list(mut self, key: &str, values: Option<&[String]>) -> Self {
        if let Some(values) = values {
            set_pair(&mut self.query, key, values.join(","));
        }
        self
    }

    pub fn header(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            set_header(&mut self.headers, name, v);
        }
        self
    }

    pub fn accept(self, media_type: &str) -> Self {
        self.header("Accept", Some(media_type))
    }

    /// Serialize `value` as the JSON body.
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, CloudantError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| CloudantError::Validation(format!("request body could not be serialized: {e}")))?;
        self.body = Some(RequestBody::Json(bytes));
        Ok(self)
    }

    pub fn binary_body(mut self, content_type: &str, data: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Binary {
            content_type: content_type.to_string(),
            data,
        });
        self
    }

    /// Pass through a query parameter the typed options do not know about.
    pub fn extra_query(mut self, key: &str, value: &str) -> Self {
        set_pair(&mut self.query, key, value.to_string());
        self
    }

    /// Pass through a header the typed options do not know about.
    pub fn extra_header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Bind the request to `base` and produce an absolute `HttpRequest`.
    pub fn resolve(&self, base: &Url) -> Result<HttpRequest, CloudantError> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CloudantError::Validation(format!("service URL {base} cannot be a base")))?;
            segments.pop_if_empty();
            for segment in self.path.split('/').filter(|s| !s.is_empty()) {
                match placeholder(segment) {
                    Some(name) => {
                        let value = self
                            .path_params
                            .iter()
                            .find(|(n, _)| *n == name)
                            .map(|(_, v)| v.as_str())
                            .ok_or_else(|| {
                                CloudantError::Validation(format!("path parameter {name} was not supplied"))
                            })?;
                        if value == "." || value == ".." {
                            return Err(CloudantError::Validation(format!(
                                "path parameter {name} cannot be \"{value}\""
                            )));
                        }
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut headers = self.headers.clone();
        let body = match &self.body {
            None => None,
            Some(RequestBody::Json(bytes)) => {
                if find(&headers, "Content-Type").is_none() {
                    headers.push(("Content-Type".to_string(), APPLICATION_JSON.to_string()));
                }
                Some(bytes.clone())
            }
            Some(RequestBody::Binary { content_type, data }) => {
                set_header(&mut headers, "Content-Type", content_type);
                Some(data.clone())
            }
        };

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
        })
    }
}

/// Fail with a `Validation` error when a required string parameter is empty.
pub fn require(name: &str, value: &str) -> Result<(), CloudantError> {
    if value.is_empty() {
        return Err(CloudantError::Validation(format!("{name} must be provided")));
    }
    Ok(())
}

/// Fail with a `Validation` error when a required list parameter is empty.
pub fn require_non_empty<T>(name: &str, values: &[T]) -> Result<(), CloudantError> {
    if values.is_empty() {
        return Err(CloudantError::Validation(format!("{name} must contain at least one entry")));
    }
    Ok(())
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

fn set_pair(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some(pair) => pair.1 = value,
        None => pairs.push((key.to_string(), value)),
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(pair) => pair.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn find<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    crate::http::find_header(headers, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.cloudant.com").unwrap()
    }

    #[test]
    fn path_parameters_are_substituted_and_encoded() {
        let req = ServiceRequest::new(HttpMethod::Get, "/{db}/{doc_id}")
            .path_param("db", "my db")
            .path_param("doc_id", "a/b?c#d%e")
            .resolve(&base())
            .unwrap();
        assert_eq!(req.url, "https://example.cloudant.com/my%20db/a%2Fb%3Fc%23d%25e");
    }

    #[test]
    fn dot_segments_are_rejected() {
        for value in [".", ".."] {
            let err = ServiceRequest::new(HttpMethod::Delete, "/{db}/{doc_id}")
                .path_param("db", "orders")
                .path_param("doc_id", value)
                .resolve(&base())
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("invalid request: path parameter doc_id cannot be \"{value}\"")
            );
        }
    }

    #[test]
    fn dots_inside_a_value_are_kept() {
        let req = ServiceRequest::new(HttpMethod::Get, "/{db}/{doc_id}")
            .path_param("db", "orders")
            .path_param("doc_id", "...v1.2")
            .resolve(&base())
            .unwrap();
        assert_eq!(req.url, "https://example.cloudant.com/orders/...v1.2");
    }

    #[test]
    fn literal_segments_are_kept() {
        let req = ServiceRequest::new(HttpMethod::Post, "/{db}/_design/{ddoc}/_view/{view}")
            .path_param("db", "products")
            .path_param("ddoc", "app")
            .path_param("view", "by_name")
            .resolve(&base())
            .unwrap();
        assert_eq!(req.url, "https://example.cloudant.com/products/_design/app/_view/by_name");
    }

    #[test]
    fn base_path_prefix_is_preserved() {
        let base = Url::parse("http://localhost:5984/couch/").unwrap();
        let req = ServiceRequest::new(HttpMethod::Get, "/_all_dbs").resolve(&base).unwrap();
        assert_eq!(req.url, "http://localhost:5984/couch/_all_dbs");
    }

    #[test]
    fn unset_query_parameters_are_omitted() {
        let req = ServiceRequest::new(HttpMethod::Get, "/_all_dbs")
            .query("descending", Some(true))
            .query::<u64>("limit", None)
            .query("startkey", Some("a b&c"))
            .query_list("states", None)
            .resolve(&base())
            .unwrap();
        assert_eq!(req.url, "https://example.cloudant.com/_all_dbs?descending=true&startkey=a+b%26c");
    }

    #[test]
    fn list_values_are_comma_joined() {
        let revs = vec!["1-abc".to_string(), "2-def".to_string()];
        let req = ServiceRequest::new(HttpMethod::Get, "/{db}/{doc_id}")
            .path_param("db", "d")
            .path_param("doc_id", "x")
            .query_list("open_revs", Some(&revs))
            .resolve(&base())
            .unwrap();
        assert_eq!(req.url, "https://example.cloudant.com/d/x?open_revs=1-abc%2C2-def");
    }

    #[test]
    fn query_keys_stay_unique() {
        let req = ServiceRequest::new(HttpMethod::Get, "/")
            .query("limit", Some(1u64))
            .extra_query("limit", "5");
        assert_eq!(req.query, vec![("limit".to_string(), "5".to_string())]);
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = ServiceRequest::new(HttpMethod::Post, "/{db}")
            .path_param("db", "d")
            .json_body(&serde_json::json!({"_id": "x", "_rev": "1-a"}))
            .unwrap()
            .resolve(&base())
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["_id"], "x");
        assert_eq!(body["_rev"], "1-a");
    }

    #[test]
    fn explicit_content_type_wins_over_json_default() {
        let req = ServiceRequest::new(HttpMethod::Post, "/{db}")
            .path_param("db", "d")
            .header("Content-Type", Some("application/json; charset=utf-8"))
            .json_body(&serde_json::json!({}))
            .unwrap()
            .resolve(&base())
            .unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("application/json; charset=utf-8"));
    }

    #[test]
    fn binary_body_uses_supplied_content_type() {
        let req = ServiceRequest::new(HttpMethod::Put, "/{db}/{doc_id}/{attachment_name}")
            .path_param("db", "d")
            .path_param("doc_id", "x")
            .path_param("attachment_name", "notes.txt")
            .binary_body("text/plain", b"hello".to_vec())
            .resolve(&base())
            .unwrap();
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn missing_path_parameter_is_a_validation_error() {
        let err = ServiceRequest::new(HttpMethod::Get, "/{db}").resolve(&base()).unwrap_err();
        assert!(matches!(err, CloudantError::Validation(_)));
    }

    #[test]
    fn require_rejects_empty_values() {
        assert!(require("db", "products").is_ok());
        let err = require("db", "").unwrap_err();
        assert_eq!(err.to_string(), "invalid request: db must be provided");
        assert!(require_non_empty::<String>("keys", &[]).is_err());
    }
}
