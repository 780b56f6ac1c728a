//! Database, partition, shard, and change-feed information.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::Document;

/// Generic `{"ok": true}` acknowledgement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResult {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInformation {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub update_seq: String,
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_format_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<DatabaseInformationCluster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<DatabaseInformationProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<ContentInformationSizes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shard and quorum parameters of a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInformationCluster {
    pub n: u64,
    pub q: u64,
    pub r: u64,
    pub w: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInformationProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInformationSizes {
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub external: u64,
    #[serde(default)]
    pub file: u64,
}

/// One entry of a `_dbs_info` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbsInfoResult {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DatabaseInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionInformation {
    pub db_name: String,
    pub partition: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioned_indexes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<ContentInformationSizes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesResult {
    pub last_seq: String,
    #[serde(default)]
    pub pending: u64,
    pub results: Vec<ChangesResultItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesResultItem {
    pub id: String,
    pub seq: String,
    pub changes: Vec<Change>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub rev: String,
}

/// Shard ranges mapped to the nodes holding them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardsInformation {
    pub shards: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShardInfo {
    pub nodes: Vec<String>,
    pub range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRevsResult {
    pub missing_revs: BTreeMap<String, Vec<String>>,
}

/// Revisions of one document the server does not have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevsDiff {
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_ancestors: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn database_information_decodes_cluster_and_sizes() {
        let info: DatabaseInformation = serde_json::from_value(json!({
            "db_name": "products",
            "doc_count": 5,
            "doc_del_count": 1,
            "update_seq": "7-g1AAAA",
            "compact_running": false,
            "cluster": {"n": 3, "q": 16, "r": 2, "w": 2},
            "props": {"partitioned": true},
            "sizes": {"active": 10, "external": 20, "file": 30},
            "instance_start_time": "0"
        }))
        .unwrap();
        assert_eq!(info.cluster.unwrap().q, 16);
        assert_eq!(info.props.unwrap().partitioned, Some(true));
        assert_eq!(info.sizes.unwrap().file, 30);
        assert_eq!(info.extra["instance_start_time"], "0");
    }

    #[test]
    fn dbs_info_entry_for_missing_database() {
        let entry: DbsInfoResult =
            serde_json::from_value(json!({"key": "nope", "error": "not_found"})).unwrap();
        assert!(entry.info.is_none());
        assert_eq!(entry.error.as_deref(), Some("not_found"));
    }
}
