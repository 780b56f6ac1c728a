//! Executing `HttpRequest`s.
//!
//! # Design
//! `Transport` is the only place the client touches the network. The bundled
//! `UreqTransport` turns off ureq's status-as-error behavior so 4xx/5xx
//! replies come back as data and the response decoder decides what they
//! mean. Only connection, TLS, and timeout failures become `Err`.
//!
//! Any `Fn(&HttpRequest) -> Result<HttpResponse, CloudantError>` closure is a
//! transport too, which is how tests script responses.

use std::time::Duration;

use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::error::CloudantError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CloudantError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, CloudantError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CloudantError> {
        self(request)
    }
}

/// Blocking transport backed by a shared ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, CloudantError> {
        let url = req.url.as_str();
        let result = match req.method {
            HttpMethod::Get => without_body(self.agent.get(url), req).call(),
            HttpMethod::Head => without_body(self.agent.head(url), req).call(),
            HttpMethod::Delete => without_body(self.agent.delete(url), req).call(),
            HttpMethod::Post => send(self.agent.post(url), req),
            HttpMethod::Put => send(self.agent.put(url), req),
        };
        let response = result.map_err(|e| CloudantError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.into_body().into_reader();
        Ok(HttpResponse::streaming(status, headers, body))
    }
}

fn without_body(
    builder: RequestBuilder<WithoutBody>,
    req: &HttpRequest,
) -> RequestBuilder<WithoutBody> {
    req.headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()))
}

fn send(builder: RequestBuilder<WithBody>, req: &HttpRequest) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = req
        .headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()));
    match &req.body {
        Some(body) => builder.send(body.as_slice()),
        None => builder.send_empty(),
    }
}
