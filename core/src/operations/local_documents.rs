//! Local (non-replicating) documents under `_local/`.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::HttpMethod;
use crate::models::{AllDocsQueriesResult, AllDocsQuery, AllDocsResult, Document, DocumentResult};
use crate::operations::QueriesBody;
use crate::request::{require, require_non_empty, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetLocalDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub accept: Option<String>,
    pub if_none_match: Option<String>,
    pub attachments: Option<bool>,
    pub att_encoding_info: Option<bool>,
    pub atts_since: Option<Vec<String>>,
    pub local_seq: Option<bool>,
}

impl GetLocalDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_local/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("Accept", self.accept.as_deref())
            .header("If-None-Match", self.if_none_match.as_deref())
            .query("attachments", self.attachments)
            .query("att_encoding_info", self.att_encoding_info)
            .query_list("atts_since", self.atts_since.as_deref())
            .query("local_seq", self.local_seq))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutLocalDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub document: Document,
    pub content_type: Option<String>,
    pub batch: Option<String>,
}

impl PutLocalDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        ServiceRequest::new(HttpMethod::Put, "/{db}/_local/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("Content-Type", self.content_type.as_deref())
            .query("batch", self.batch.as_deref())
            .json_body(&self.document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteLocalDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub batch: Option<String>,
}

impl DeleteLocalDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}/_local/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .query("batch", self.batch.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostLocalDocsOptions {
    pub db: String,
    #[serde(flatten)]
    pub query: AllDocsQuery,
    pub accept: Option<String>,
}

impl PostLocalDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_local_docs")
            .path_param("db", &self.db)
            .header("Accept", self.accept.as_deref())
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostLocalDocsQueriesOptions {
    pub db: String,
    pub queries: Vec<AllDocsQuery>,
    pub accept: Option<String>,
}

impl PostLocalDocsQueriesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require_non_empty("queries", &self.queries)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_local_docs/queries")
            .path_param("db", &self.db)
            .header("Accept", self.accept.as_deref())
            .json_body(&QueriesBody { queries: &self.queries })
    }
}

impl CloudantClient {
    pub fn get_local_document(
        &self,
        options: &GetLocalDocumentOptions,
    ) -> Result<ServiceResponse<Document>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn put_local_document(
        &self,
        options: &PutLocalDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_local_document(
        &self,
        options: &DeleteLocalDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_local_docs(&self, options: &PostLocalDocsOptions) -> Result<ServiceResponse<AllDocsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_local_docs_queries(
        &self,
        options: &PostLocalDocsQueriesOptions,
    ) -> Result<ServiceResponse<AllDocsQueriesResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}
