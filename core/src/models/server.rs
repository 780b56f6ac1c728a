//! Server, cluster, and session information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::replication::UserContext;

/// Welcome message returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInformation {
    pub couchdb: String,
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<ServerVendor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVendor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipInformation {
    pub all_nodes: Vec<String>,
    pub cluster_nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidsResult {
    pub uuids: Vec<String>,
}

/// Health check result of `GET /_up`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpInformation {
    /// `ok` or `maintenance_mode`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeds: Option<Value>,
}

/// A running task (compaction, indexing, replication).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTask {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_on: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seq: Option<String>,
    pub results: Vec<DbEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub db_name: String,
    pub seq: String,
    /// `created`, `updated`, or `deleted`.
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInformation {
    pub ok: bool,
    pub info: SessionAuthenticationInformation,
    pub user_ctx: UserContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAuthenticationInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_db: Option<String>,
    #[serde(default)]
    pub authentication_handlers: Vec<String>,
}
