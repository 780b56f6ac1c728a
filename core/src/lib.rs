//! Synchronous client for the Cloudant / CouchDB HTTP API.
//!
//! # Overview
//! Every endpoint is a method on [`CloudantClient`] taking an options struct
//! (`GetDocumentOptions` for `get_document`) and returning a
//! [`ServiceResponse`] with the status, headers, and decoded result. Errors
//! are a single [`CloudantError`] that distinguishes local validation,
//! network failure, server rejection, and undecodable responses.
//!
//! # Design
//! - Building a request never touches the network. Each options struct has a
//!   `build_request` that validates required fields and yields a
//!   [`ServiceRequest`]; the client binds it to the service URL and hands the
//!   resulting [`HttpRequest`] to a [`Transport`].
//! - The default transport is a blocking `ureq` agent. Anything implementing
//!   `Transport`, including a closure, can replace it, which is how the unit
//!   tests run without a server.
//! - Idempotent requests are retried on 429, 502, 503, 504 and connection
//!   failures. IAM tokens are fetched once and shared by all threads using
//!   the client until they near expiry.
//! - Results with open-ended shapes (documents, design documents) keep
//!   unknown keys in an `extra` map so they round-trip untouched.
//!
//! ```no_run
//! use cloudant_core::{AuthConfig, ClientConfig, CloudantClient, GetDocumentOptions};
//!
//! let config = ClientConfig::new("https://account.cloudant.com", AuthConfig::iam("apikey"));
//! let client = CloudantClient::new(config)?;
//! let doc = client.get_document(&GetDocumentOptions::new("orders", "order-1"))?.into_result();
//! println!("{:?}", doc.get("total"));
//! # Ok::<(), cloudant_core::CloudantError>(())
//! ```

mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod multipart;
pub mod operations;
pub mod request;
pub mod response;
pub mod transport;

pub use client::CloudantClient;
pub use config::{AuthConfig, ClientConfig, DEFAULT_IAM_URL, DEFAULT_SERVICE_URL};
pub use error::CloudantError;
pub use http::{ByteStream, HttpMethod, HttpRequest, HttpResponse};
pub use models::*;
pub use multipart::{MultipartBody, Part};
pub use operations::*;
pub use request::ServiceRequest;
pub use response::ServiceResponse;
pub use transport::{Transport, UreqTransport};
