//! One client method per endpoint, grouped by resource.
//!
//! Each operation with parameters has an options struct named after it
//! (`PutDatabaseOptions` for `put_database`). Its `build_request` validates
//! required fields and produces the `ServiceRequest`; the client method
//! dispatches that request and decodes the declared result shape.
//! Options structs implement `Default` and `Deserialize`, so they can be
//! filled with struct-update syntax or loaded from JSON.

use serde::Serialize;

mod attachments;
mod databases;
mod design_documents;
mod documents;
mod local_documents;
mod partitions;
mod queries;
mod replication;
mod search;
mod security;
mod server;

pub use attachments::*;
pub use databases::*;
pub use design_documents::*;
pub use documents::*;
pub use local_documents::*;
pub use partitions::*;
pub use queries::*;
pub use replication::*;
pub use search::*;
pub use security::*;
pub use server::*;

pub(crate) const MULTIPART_MIXED: &str = "multipart/mixed";
pub(crate) const MULTIPART_RELATED: &str = "multipart/related";

/// Body of the multi-query endpoints: `{"queries": [...]}`.
#[derive(Serialize)]
pub(crate) struct QueriesBody<'a, T> {
    pub queries: &'a [T],
}

/// Body of `_dbs_info` and `_bulk_get`-style key lists.
#[derive(Serialize)]
pub(crate) struct KeysBody<'a> {
    pub keys: &'a [String],
}
