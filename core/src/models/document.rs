//! Documents and the metadata the database attaches to them.
//!
//! # Design
//! Reserved fields keep their underscore-prefixed JSON names through serde
//! renames. Everything else a caller stores on a document lives in `extra`,
//! which is flattened back into the top-level object on serialization and
//! keeps insertion order, so unknown keys round-trip untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
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
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set a caller-defined field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Attachment metadata, or inline data when `data` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Base64-encoded content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follows: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,
}

/// Revision history returned with `revs=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revisions {
    pub ids: Vec<String>,
    pub start: u64,
}

/// One entry of `_revs_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRevisionStatus {
    pub rev: String,
    /// `available`, `deleted`, or `missing`.
    pub status: String,
}

/// Outcome of a single document write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Request body for `_bulk_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkDocs {
    pub docs: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_edits: Option<bool>,
}

/// One document reference in a `_bulk_get` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkGetQueryDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atts_since: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_revs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkGetResult {
    pub results: Vec<BulkGetResultItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkGetResultItem {
    pub docs: Vec<BulkGetResultDocument>,
    pub id: String,
}

/// Either a revision of the document or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkGetResultDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DocumentResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Document>,
}

/// Row of an `_all_docs`, `_design_docs`, or `_local_docs` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsResultRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DocsResultRowValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsResultRowValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    pub rev: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDocsResult {
    pub total_rows: u64,
    pub rows: Vec<DocsResultRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDocsQueriesResult {
    pub results: Vec<AllDocsResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_fields_keep_underscore_names() {
        let mut doc = Document::with_id("small-appliances:1000042");
        doc.rev = Some("1-abc".to_string());
        doc.deleted = Some(false);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            json!({"_deleted": false, "_id": "small-appliances:1000042", "_rev": "1-abc"})
        );
    }

    #[test]
    fn unknown_fields_round_trip_unchanged() {
        let raw = json!({
            "_id": "x",
            "_rev": "2-b",
            "name": "Kettle",
            "tags": ["kitchen", {"nested": [1, 2.5, null]}],
            "foo": {"foo": "bar"}
        });
        let doc: Document = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.id.as_deref(), Some("x"));
        assert_eq!(doc.get("foo"), Some(&json!({"foo": "bar"})));
        assert!(!doc.extra.contains_key("_id"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn extra_fields_keep_insertion_order() {
        let text = r#"{"_id":"x","zeta":1,"alpha":2,"mid":3}"#;
        let doc: Document = serde_json::from_str(text).unwrap();
        let keys: Vec<&str> = doc.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&doc).unwrap(), text);
    }

    #[test]
    fn set_adds_caller_fields() {
        let mut doc = Document::default();
        doc.set("type", "product").set("price", 14.99);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, json!({"type": "product", "price": 14.99}));
    }

    #[test]
    fn bulk_get_result_decodes_ok_and_error_entries() {
        let raw = json!({"results": [{"id": "a", "docs": [
            {"ok": {"_id": "a", "_rev": "1-x", "n": 1}},
            {"error": {"id": "a", "rev": "9-z", "error": "not_found", "reason": "missing"}}
        ]}]});
        let result: BulkGetResult = serde_json::from_value(raw).unwrap();
        let docs = &result.results[0].docs;
        assert_eq!(docs[0].ok.as_ref().unwrap().get("n"), Some(&json!(1)));
        assert_eq!(docs[1].error.as_ref().unwrap().error.as_deref(), Some("not_found"));
    }
}
