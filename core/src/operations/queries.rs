//! Mango queries and index management.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{ExplainResult, FindQuery, FindResult, IndexDefinition, IndexResult, IndexesInformation, OkResult};
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostExplainOptions {
    pub db: String,
    #[serde(flatten)]
    pub query: FindQuery,
}

impl PostExplainOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_explain")
            .path_param("db", &self.db)
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostFindOptions {
    pub db: String,
    #[serde(flatten)]
    pub query: FindQuery,
}

impl PostFindOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_find")
            .path_param("db", &self.db)
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetIndexesInformationOptions {
    pub db: String,
}

impl GetIndexesInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_index").path_param("db", &self.db))
    }
}

/// Create a Mango index. Answers 200 with `result` set to `created`, or to
/// `exists` when an identical index is already defined.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostIndexOptions {
    pub db: String,
    pub index: IndexDefinition,
    /// Design document to create the index in. Generated when unset.
    pub ddoc: Option<String>,
    pub def: Option<IndexDefinition>,
    pub name: Option<String>,
    pub partial_filter_selector: Option<Map<String, Value>>,
    pub partitioned: Option<bool>,
    /// `json` (default) or `text`.
    #[serde(rename = "type")]
    pub index_type: Option<String>,
}

#[derive(Serialize)]
struct IndexBody<'a> {
    index: &'a IndexDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    ddoc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    def: Option<&'a IndexDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial_filter_selector: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partitioned: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    index_type: Option<&'a str>,
}

impl PostIndexOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        let body = IndexBody {
            index: &self.index,
            ddoc: self.ddoc.as_deref(),
            def: self.def.as_ref(),
            name: self.name.as_deref(),
            partial_filter_selector: self.partial_filter_selector.as_ref(),
            partitioned: self.partitioned,
            index_type: self.index_type.as_deref(),
        };
        ServiceRequest::new(HttpMethod::Post, "/{db}/_index")
            .path_param("db", &self.db)
            .json_body(&body)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteIndexOptions {
    pub db: String,
    pub ddoc: String,
    /// `json`, `text`, or `special`.
    #[serde(rename = "type")]
    pub index_type: String,
    pub index: String,
}

impl DeleteIndexOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("type", &self.index_type)?;
        require("index", &self.index)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}/_index/_design/{ddoc}/{type}/{index}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("type", &self.index_type)
            .path_param("index", &self.index))
    }
}

impl CloudantClient {
    /// Which index a query would use, and why.
    pub fn post_explain(&self, options: &PostExplainOptions) -> Result<ServiceResponse<ExplainResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_find(&self, options: &PostFindOptions) -> Result<ServiceResponse<FindResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_find_as_stream(&self, options: &PostFindOptions) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn get_indexes_information(
        &self,
        options: &GetIndexesInformationOptions,
    ) -> Result<ServiceResponse<IndexesInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_index(&self, options: &PostIndexOptions) -> Result<ServiceResponse<IndexResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_index(&self, options: &DeleteIndexOptions) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}
