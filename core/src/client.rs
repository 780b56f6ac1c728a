//! The Cloudant client: configuration, authentication, retries, dispatch.
//!
//! # Design
//! `CloudantClient` holds only immutable configuration plus the IAM token
//! cache, so one client can be shared across threads behind an `Arc`. Every
//! operation method is a thin wrapper: validate and build a
//! `ServiceRequest` from its options, then hand it to one of the `invoke_*`
//! methods, which differ only in how the response body is decoded.
//!
//! The `invoke_*` methods are public. A caller that needs a query parameter
//! or header the typed options do not cover can build the request, add it
//! with `ServiceRequest::extra_query` / `extra_header`, and dispatch it here.

use std::fmt;
use std::sync::Arc;
use std::thread;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpRequest, HttpResponse};
use crate::multipart::MultipartBody;
use crate::request::ServiceRequest;
use crate::response::{parse_head, parse_json, parse_multipart, parse_stream, ServiceResponse};
use crate::transport::{Transport, UreqTransport};

/// Statuses worth replaying an idempotent request for.
const RETRY_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Synchronous client for the Cloudant / CouchDB HTTP API.
///
/// Safe to share between threads. Each call blocks the calling thread until
/// the response has been decoded (or, for `_as_stream` operations, until
/// the headers have arrived).
pub struct CloudantClient {
    config: ClientConfig,
    base_url: Url,
    transport: Arc<dyn Transport>,
    authenticator: Authenticator,
}

impl CloudantClient {
    /// A client using the bundled ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self, CloudantError> {
        let transport = Arc::new(UreqTransport::new(config.timeout));
        Self::with_transport(config, transport)
    }

    /// A client that sends every request through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, CloudantError> {
        let base_url = config.base_url()?;
        let authenticator = Authenticator::from_config(&config.auth);
        Ok(Self {
            config,
            base_url,
            transport,
            authenticator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn service_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `request` against the service URL and apply the user agent
    /// and default headers. No credentials are attached.
    pub fn prepare(&self, request: &ServiceRequest) -> Result<HttpRequest, CloudantError> {
        let mut http = request.resolve(&self.base_url)?;
        let defaults = std::iter::once(("User-Agent", self.config.user_agent.as_str()))
            .chain(self.config.default_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        for (name, value) in defaults {
            if http.header(name).is_none() {
                http.headers.push((name.to_string(), value.to_string()));
            }
        }
        Ok(http)
    }

    /// Send `request` with credentials, retrying idempotent methods on
    /// transient failures. The response status is not interpreted.
    pub fn send(&self, request: &ServiceRequest) -> Result<HttpResponse, CloudantError> {
        let prepared = self.prepare(request)?;
        let log_url = redact(&prepared.url);
        let mut attempt = 0u32;
        loop {
            let mut http = prepared.clone();
            if let Some(value) = self.authenticator.authorization(self.transport.as_ref())? {
                http.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
                http.headers.push(("Authorization".to_string(), value));
            }
            debug!(method = %http.method, url = %log_url, "sending request");
            let outcome = self.transport.execute(&http);

            let retryable = match &outcome {
                Ok(response) => RETRY_STATUSES.contains(&response.status),
                Err(CloudantError::Network(_)) => true,
                Err(_) => false,
            };
            if !retryable || !http.method.is_idempotent() || attempt >= self.config.max_retries {
                if let Ok(response) = &outcome {
                    debug!(status = response.status, url = %log_url, "received response");
                }
                return outcome;
            }

            attempt += 1;
            let delay = match &outcome {
                Ok(response) => retry_after(response)
                    .map(|d| d.min(self.config.max_retry_interval))
                    .unwrap_or_else(|| self.config.retry_delay(attempt)),
                Err(_) => self.config.retry_delay(attempt),
            };
            match &outcome {
                Ok(response) => warn!(
                    attempt,
                    status = response.status,
                    delay_ms = delay.as_millis() as u64,
                    url = %log_url,
                    "retrying request"
                ),
                Err(e) => warn!(
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    url = %log_url,
                    "retrying request"
                ),
            }
            drop(outcome);
            thread::sleep(delay);
        }
    }

    /// Dispatch and decode a JSON response body.
    pub fn invoke_json<T: DeserializeOwned>(&self, request: ServiceRequest) -> Result<ServiceResponse<T>, CloudantError> {
        parse_json(self.send(&request)?)
    }

    /// Dispatch and keep only status and headers.
    pub fn invoke_head(&self, request: ServiceRequest) -> Result<ServiceResponse<()>, CloudantError> {
        parse_head(self.send(&request)?)
    }

    /// Dispatch and return the body unread.
    pub fn invoke_stream(&self, request: ServiceRequest) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        parse_stream(self.send(&request)?)
    }

    /// Dispatch and split a multipart body.
    pub fn invoke_multipart(&self, request: ServiceRequest) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
        parse_multipart(self.send(&request)?)
    }
}

impl fmt::Debug for CloudantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudantClient")
            .field("service_url", &self.base_url.as_str())
            .field("auth", &self.authenticator)
            .finish_non_exhaustive()
    }
}

fn retry_after(response: &HttpResponse) -> Option<std::time::Duration> {
    let seconds: u64 = response.header("retry-after")?.trim().parse().ok()?;
    Some(std::time::Duration::from_secs(seconds))
}

/// `url` with any user info removed.
fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.into()
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::http::HttpMethod;
    use crate::models::OkResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig {
            service_url: "https://acct.example.com".to_string(),
            retry_interval: Duration::from_millis(1),
            max_retry_interval: Duration::from_millis(5),
            ..ClientConfig::default()
        }
    }

    type Script = Arc<Mutex<Vec<Result<HttpResponse, CloudantError>>>>;

    /// A transport that replays `script` in order and records every request.
    fn scripted(
        script: Vec<Result<HttpResponse, CloudantError>>,
    ) -> (Arc<dyn Transport>, Arc<Mutex<Vec<HttpRequest>>>) {
        let script: Script = Arc::new(Mutex::new(script.into_iter().rev().collect()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let transport = move |req: &HttpRequest| -> Result<HttpResponse, CloudantError> {
            recorder.lock().unwrap().push(req.clone());
            script.lock().unwrap().pop().expect("script exhausted")
        };
        (Arc::new(transport), seen)
    }

    fn ok_response() -> Result<HttpResponse, CloudantError> {
        Ok(HttpResponse::new(200, Vec::new(), r#"{"ok":true}"#))
    }

    #[test]
    #[tracing_test::traced_test]
    fn get_is_retried_on_503() {
        let (transport, seen) = scripted(vec![
            Ok(HttpResponse::new(503, Vec::new(), "unavailable")),
            ok_response(),
        ]);
        let client = CloudantClient::with_transport(config(), transport).unwrap();
        let response = client
            .invoke_json::<OkResult>(ServiceRequest::new(HttpMethod::Get, "/_up"))
            .unwrap();
        assert!(response.result.ok);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(logs_contain("retrying request"));
    }

    #[test]
    fn post_is_never_retried() {
        let (transport, seen) = scripted(vec![Ok(HttpResponse::new(503, Vec::new(), ""))]);
        let client = CloudantClient::with_transport(config(), transport).unwrap();
        let err = client
            .invoke_json::<OkResult>(ServiceRequest::new(HttpMethod::Post, "/_replicate"))
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn network_errors_are_retried_up_to_the_limit() {
        let cfg = ClientConfig {
            max_retries: 2,
            ..config()
        };
        let (transport, seen) = scripted(vec![
            Err(CloudantError::Network("reset".to_string())),
            Err(CloudantError::Network("reset".to_string())),
            Err(CloudantError::Network("reset".to_string())),
        ]);
        let client = CloudantClient::with_transport(cfg, transport).unwrap();
        let err = client.invoke_head(ServiceRequest::new(HttpMethod::Head, "/")).unwrap_err();
        assert!(matches!(err, CloudantError::Network(_)));
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let (transport, seen) = scripted(vec![Ok(HttpResponse::new(404, Vec::new(), ""))]);
        let client = CloudantClient::with_transport(config(), transport).unwrap();
        let err = client.invoke_head(ServiceRequest::new(HttpMethod::Head, "/")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn user_agent_default_headers_and_basic_auth_are_applied() {
        let cfg = ClientConfig {
            auth: AuthConfig::basic("u", "p"),
            default_headers: vec![("X-Tenant".to_string(), "blue".to_string())],
            ..config()
        };
        let (transport, seen) = scripted(vec![ok_response()]);
        let client = CloudantClient::with_transport(cfg, transport).unwrap();
        client
            .invoke_json::<OkResult>(ServiceRequest::new(HttpMethod::Get, "/"))
            .unwrap();
        let seen = seen.lock().unwrap();
        let req = &seen[0];
        assert!(req.header("user-agent").unwrap().starts_with("cloudant-rust/"));
        assert_eq!(req.header("x-tenant"), Some("blue"));
        assert_eq!(req.header("authorization"), Some("Basic dTpw"));
    }

    #[test]
    fn operation_headers_win_over_defaults() {
        let cfg = ClientConfig {
            default_headers: vec![("Accept".to_string(), "text/plain".to_string())],
            ..config()
        };
        let client = CloudantClient::with_transport(cfg, scripted(Vec::new()).0).unwrap();
        let http = client
            .prepare(&ServiceRequest::new(HttpMethod::Get, "/").accept("application/json"))
            .unwrap();
        assert_eq!(http.header("accept"), Some("application/json"));
    }

    #[test]
    fn invalid_service_url_is_rejected() {
        let cfg = ClientConfig {
            service_url: "::nope".to_string(),
            ..config()
        };
        let err = CloudantClient::with_transport(cfg, scripted(Vec::new()).0).unwrap_err();
        assert!(matches!(err, CloudantError::Validation(_)));
    }

    #[test]
    fn retry_after_header_sets_the_delay() {
        let response = HttpResponse::new(429, vec![("Retry-After".to_string(), "2".to_string())], "");
        assert_eq!(retry_after(&response), Some(Duration::from_secs(2)));
    }

    #[test]
    fn credentials_are_redacted_from_logged_urls() {
        assert_eq!(redact("https://user:pw@acct.example.com/db"), "https://acct.example.com/db");
        assert_eq!(redact("https://acct.example.com/db"), "https://acct.example.com/db");
    }

    #[test]
    fn transport_calls_are_counted_once_per_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transport = move |_: &HttpRequest| -> Result<HttpResponse, CloudantError> {
            counter.fetch_add(1, Ordering::SeqCst);
            ok_response()
        };
        let client = CloudantClient::with_transport(config(), Arc::new(transport)).unwrap();
        client
            .invoke_json::<OkResult>(ServiceRequest::new(HttpMethod::Get, "/"))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
