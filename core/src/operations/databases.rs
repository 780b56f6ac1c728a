//! Database lifecycle, listing, change feed, shards, and revision sync.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{
    ChangesResult, DatabaseInformation, DbsInfoResult, DocumentShardInfo, MissingRevsResult, OkResult, RevsDiff,
    ShardsInformation,
};
use crate::operations::KeysBody;
use crate::request::{require, require_non_empty, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadDatabaseOptions {
    pub db: String,
}

impl HeadDatabaseOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/{db}").path_param("db", &self.db))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetAllDbsOptions {
    pub descending: Option<bool>,
    pub endkey: Option<String>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub startkey: Option<String>,
}

impl GetAllDbsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        Ok(ServiceRequest::new(HttpMethod::Get, "/_all_dbs")
            .query("descending", self.descending)
            .query("endkey", self.endkey.as_deref())
            .query("limit", self.limit)
            .query("skip", self.skip)
            .query("startkey", self.startkey.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostDbsInfoOptions {
    pub keys: Vec<String>,
}

impl PostDbsInfoOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require_non_empty("keys", &self.keys)?;
        ServiceRequest::new(HttpMethod::Post, "/_dbs_info").json_body(&KeysBody { keys: &self.keys })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDatabaseInformationOptions {
    pub db: String,
}

impl GetDatabaseInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}").path_param("db", &self.db))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutDatabaseOptions {
    pub db: String,
    pub partitioned: Option<bool>,
    /// Number of shards.
    pub q: Option<u64>,
}

impl PutDatabaseOptions {
    pub fn new(db: &str) -> Self {
        Self {
            db: db.to_string(),
            ..Self::default()
        }
    }

    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Put, "/{db}")
            .path_param("db", &self.db)
            .query("partitioned", self.partitioned)
            .query("q", self.q))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteDatabaseOptions {
    pub db: String,
}

impl DeleteDatabaseOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}").path_param("db", &self.db))
    }
}

/// Options for the database change feed.
///
/// `doc_ids`, `fields`, and `selector` travel in the body and only take
/// effect with the matching `filter` (`_doc_ids`, `_selector`). Everything
/// else is a query parameter, except `last_event_id`, which is sent as the
/// `Last-Event-ID` header to resume an `eventsource` feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostChangesOptions {
    pub db: String,
    pub doc_ids: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub selector: Option<Map<String, Value>>,
    pub last_event_id: Option<String>,
    pub att_encoding_info: Option<bool>,
    pub attachments: Option<bool>,
    pub conflicts: Option<bool>,
    pub descending: Option<bool>,
    /// `normal`, `longpoll`, `continuous`, or `eventsource`.
    pub feed: Option<String>,
    pub filter: Option<String>,
    pub heartbeat: Option<u64>,
    pub include_docs: Option<bool>,
    pub limit: Option<u64>,
    pub seq_interval: Option<u64>,
    pub since: Option<String>,
    /// `main_only` or `all_docs`.
    pub style: Option<String>,
    pub timeout: Option<u64>,
    pub view: Option<String>,
}

#[derive(Serialize)]
struct ChangesBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<&'a Map<String, Value>>,
}

impl PostChangesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        let body = ChangesBody {
            doc_ids: self.doc_ids.as_deref(),
            fields: self.fields.as_deref(),
            selector: self.selector.as_ref(),
        };
        ServiceRequest::new(HttpMethod::Post, "/{db}/_changes")
            .path_param("db", &self.db)
            .header("Last-Event-ID", self.last_event_id.as_deref())
            .query("att_encoding_info", self.att_encoding_info)
            .query("attachments", self.attachments)
            .query("conflicts", self.conflicts)
            .query("descending", self.descending)
            .query("feed", self.feed.as_deref())
            .query("filter", self.filter.as_deref())
            .query("heartbeat", self.heartbeat)
            .query("include_docs", self.include_docs)
            .query("limit", self.limit)
            .query("seq_interval", self.seq_interval)
            .query("since", self.since.as_deref())
            .query("style", self.style.as_deref())
            .query("timeout", self.timeout)
            .query("view", self.view.as_deref())
            .json_body(&body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetShardsInformationOptions {
    pub db: String,
}

impl GetShardsInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_shards").path_param("db", &self.db))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDocumentShardsInfoOptions {
    pub db: String,
    pub doc_id: String,
}

impl GetDocumentShardsInfoOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_shards/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id))
    }
}

/// Document ids mapped to the revisions the caller holds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostMissingRevsOptions {
    pub db: String,
    pub document_revisions: BTreeMap<String, Vec<String>>,
}

impl PostMissingRevsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_missing_revs")
            .path_param("db", &self.db)
            .json_body(&self.document_revisions)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostRevsDiffOptions {
    pub db: String,
    pub document_revisions: BTreeMap<String, Vec<String>>,
}

impl PostRevsDiffOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_revs_diff")
            .path_param("db", &self.db)
            .json_body(&self.document_revisions)
    }
}

impl CloudantClient {
    /// Check that a database exists without fetching its information.
    pub fn head_database(&self, options: &HeadDatabaseOptions) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    pub fn get_all_dbs(&self, options: &GetAllDbsOptions) -> Result<ServiceResponse<Vec<String>>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_dbs_info(
        &self,
        options: &PostDbsInfoOptions,
    ) -> Result<ServiceResponse<Vec<DbsInfoResult>>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_database_information(
        &self,
        options: &GetDatabaseInformationOptions,
    ) -> Result<ServiceResponse<DatabaseInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// Create a database. Answers 201, or 412 when it already exists.
    pub fn put_database(&self, options: &PutDatabaseOptions) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_database(&self, options: &DeleteDatabaseOptions) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_changes(&self, options: &PostChangesOptions) -> Result<ServiceResponse<ChangesResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// The change feed as raw bytes, for continuous and eventsource feeds.
    pub fn post_changes_as_stream(
        &self,
        options: &PostChangesOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn get_shards_information(
        &self,
        options: &GetShardsInformationOptions,
    ) -> Result<ServiceResponse<ShardsInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_document_shards_info(
        &self,
        options: &GetDocumentShardsInfoOptions,
    ) -> Result<ServiceResponse<DocumentShardInfo>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_missing_revs(
        &self,
        options: &PostMissingRevsOptions,
    ) -> Result<ServiceResponse<MissingRevsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_revs_diff(
        &self,
        options: &PostRevsDiffOptions,
    ) -> Result<ServiceResponse<BTreeMap<String, RevsDiff>>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}
