//! Queries scoped to one partition of a partitioned database.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{
    AllDocsQuery, AllDocsResult, FindQuery, FindResult, PartitionInformation, SearchQuery, SearchResult, ViewQuery,
    ViewResult,
};
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetPartitionInformationOptions {
    pub db: String,
    pub partition_key: String,
}

impl GetPartitionInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("partition_key", &self.partition_key)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_partition/{partition_key}")
            .path_param("db", &self.db)
            .path_param("partition_key", &self.partition_key))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPartitionAllDocsOptions {
    pub db: String,
    pub partition_key: String,
    #[serde(flatten)]
    pub query: AllDocsQuery,
}

impl PostPartitionAllDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("partition_key", &self.partition_key)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_partition/{partition_key}/_all_docs")
            .path_param("db", &self.db)
            .path_param("partition_key", &self.partition_key)
            .json_body(&self.query)
    }
}

/// Partitioned search. Faceting, drilldown, grouping, and ranges are only
/// available to global search and are rejected here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPartitionSearchOptions {
    pub db: String,
    pub partition_key: String,
    pub ddoc: String,
    pub index: String,
    #[serde(flatten)]
    pub query: SearchQuery,
}

impl PostPartitionSearchOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("partition_key", &self.partition_key)?;
        require("ddoc", &self.ddoc)?;
        require("index", &self.index)?;
        require("query", &self.query.query)?;
        if self.query.uses_global_only_options() {
            return Err(CloudantError::Validation(
                "counts, drilldown, group_field, group_limit, group_sort and ranges are not supported by partitioned search"
                    .to_string(),
            ));
        }
        ServiceRequest::new(
            HttpMethod::Post,
            "/{db}/_partition/{partition_key}/_design/{ddoc}/_search/{index}",
        )
        .path_param("db", &self.db)
        .path_param("partition_key", &self.partition_key)
        .path_param("ddoc", &self.ddoc)
        .path_param("index", &self.index)
        .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPartitionViewOptions {
    pub db: String,
    pub partition_key: String,
    pub ddoc: String,
    pub view: String,
    #[serde(flatten)]
    pub query: ViewQuery,
}

impl PostPartitionViewOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("partition_key", &self.partition_key)?;
        require("ddoc", &self.ddoc)?;
        require("view", &self.view)?;
        ServiceRequest::new(
            HttpMethod::Post,
            "/{db}/_partition/{partition_key}/_design/{ddoc}/_view/{view}",
        )
        .path_param("db", &self.db)
        .path_param("partition_key", &self.partition_key)
        .path_param("ddoc", &self.ddoc)
        .path_param("view", &self.view)
        .json_body(&self.query)
    }
}

/// Partitioned Mango query. The read quorum `r` is not accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPartitionFindOptions {
    pub db: String,
    pub partition_key: String,
    #[serde(flatten)]
    pub query: FindQuery,
}

impl PostPartitionFindOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("partition_key", &self.partition_key)?;
        if self.query.r.is_some() {
            return Err(CloudantError::Validation(
                "r is not supported by partitioned queries".to_string(),
            ));
        }
        ServiceRequest::new(HttpMethod::Post, "/{db}/_partition/{partition_key}/_find")
            .path_param("db", &self.db)
            .path_param("partition_key", &self.partition_key)
            .json_body(&self.query)
    }
}

impl CloudantClient {
    pub fn get_partition_information(
        &self,
        options: &GetPartitionInformationOptions,
    ) -> Result<ServiceResponse<PartitionInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_partition_all_docs(
        &self,
        options: &PostPartitionAllDocsOptions,
    ) -> Result<ServiceResponse<AllDocsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_partition_all_docs_as_stream(
        &self,
        options: &PostPartitionAllDocsOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn post_partition_search(
        &self,
        options: &PostPartitionSearchOptions,
    ) -> Result<ServiceResponse<SearchResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_partition_search_as_stream(
        &self,
        options: &PostPartitionSearchOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn post_partition_view(
        &self,
        options: &PostPartitionViewOptions,
    ) -> Result<ServiceResponse<ViewResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_partition_view_as_stream(
        &self,
        options: &PostPartitionViewOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn post_partition_find(
        &self,
        options: &PostPartitionFindOptions,
    ) -> Result<ServiceResponse<FindResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_partition_find_as_stream(
        &self,
        options: &PostPartitionFindOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }
}
