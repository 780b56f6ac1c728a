//! Design documents and the index definitions they carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::{Attachment, DocumentRevisionStatus, Revisions};

/// A document under `_design/` holding views, search and geo indexes.
///
/// Shares the reserved `_`-prefixed fields of `Document`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_attachments", skip_serializing_if = "Option::is_none")]
    pub attachments: Option<BTreeMap<String, Attachment>>,
    #[serde(rename = "_conflicts", skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<String>>,
    #[serde(rename = "_deleted", skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(rename = "_deleted_conflicts", skip_serializing_if = "Option::is_none")]
    pub deleted_conflicts: Option<Vec<String>>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_local_seq", skip_serializing_if = "Option::is_none")]
    pub local_seq: Option<String>,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "_revisions", skip_serializing_if = "Option::is_none")]
    pub revisions: Option<Revisions>,
    #[serde(rename = "_revs_info", skip_serializing_if = "Option::is_none")]
    pub revs_info: Option<Vec<DocumentRevisionStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoupdate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, String>>,
    /// Search indexes keyed by index name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<BTreeMap<String, SearchIndexDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<DesignDocumentOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updates: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_doc_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<BTreeMap<String, DesignDocumentViewsMapReduce>>,
    /// Geospatial indexes keyed by index name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub st_indexes: Option<BTreeMap<String, GeoIndexDefinition>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentViewsMapReduce {
    pub map: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIndexDefinition {
    pub index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<AnalyzerConfiguration>,
    pub index: String,
}

/// A text analyzer, e.g. `classic`, `standard`, `keyword`, `english`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

/// Analyzer with optional per-field overrides (`perfield` analyzers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfiguration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Analyzer>>,
}

/// Build and size information for a design document's view index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocumentInformation {
    pub name: String,
    pub view_index: DesignDocumentViewIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocumentViewIndex {
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub updater_running: bool,
    #[serde(default)]
    pub waiting_clients: u64,
    #[serde(default)]
    pub waiting_commit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn views_and_indexes_serialize_under_their_keys() {
        let mut views = BTreeMap::new();
        views.insert(
            "by_price".to_string(),
            DesignDocumentViewsMapReduce {
                map: "function(doc) { emit(doc.price, 1); }".to_string(),
                reduce: Some("_count".to_string()),
            },
        );
        let ddoc = DesignDocument {
            id: Some("_design/appliances".to_string()),
            views: Some(views),
            options: Some(DesignDocumentOptions { partitioned: Some(true) }),
            ..DesignDocument::default()
        };
        let value = serde_json::to_value(&ddoc).unwrap();
        assert_eq!(value["_id"], "_design/appliances");
        assert_eq!(value["views"]["by_price"]["reduce"], "_count");
        assert_eq!(value["options"], json!({"partitioned": true}));
        assert!(value.get("indexes").is_none());
    }

    #[test]
    fn design_document_keeps_unknown_keys() {
        let raw = json!({"_id": "_design/x", "lists": {"l": "function(){}"}, "views": {}});
        let ddoc: DesignDocument = serde_json::from_value(raw.clone()).unwrap();
        assert!(ddoc.extra.contains_key("lists"));
        assert_eq!(serde_json::to_value(&ddoc).unwrap(), raw);
    }
}
