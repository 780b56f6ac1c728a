//! Request and response bodies.
//!
//! # Design
//! Plain serde records. Optional fields are skipped when unset so request
//! bodies carry only what the caller supplied. Records with an open
//! extension area keep unrecognized keys in a flattened, insertion-ordered
//! `extra` map.

mod database;
mod design;
mod document;
mod query;
mod replication;
mod security;
mod server;

pub use database::*;
pub use design::*;
pub use document::*;
pub use query::*;
pub use replication::*;
pub use security::*;
pub use server::*;
