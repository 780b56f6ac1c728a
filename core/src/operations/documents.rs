//! Document CRUD, `_all_docs`, and bulk reads and writes.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{
    AllDocsQueriesResult, AllDocsQuery, AllDocsResult, BulkDocs, BulkGetQueryDocument, BulkGetResult, Document,
    DocumentResult,
};
use crate::multipart::MultipartBody;
use crate::operations::{QueriesBody, MULTIPART_MIXED, MULTIPART_RELATED};
use crate::request::{require, require_non_empty, ServiceRequest, APPLICATION_JSON};
use crate::response::ServiceResponse;

/// Query flags shared by every single-document read (documents, design
/// documents, replication documents).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentReadParameters {
    pub attachments: Option<bool>,
    pub att_encoding_info: Option<bool>,
    /// Only include attachments changed since these revisions.
    pub atts_since: Option<Vec<String>>,
    pub conflicts: Option<bool>,
    pub deleted_conflicts: Option<bool>,
    pub latest: Option<bool>,
    pub local_seq: Option<bool>,
    pub meta: Option<bool>,
    /// Leaf revisions to fetch. `all` fetches every leaf.
    pub open_revs: Option<Vec<String>>,
    pub rev: Option<String>,
    pub revs: Option<bool>,
    pub revs_info: Option<bool>,
}

impl DocumentReadParameters {
    pub(crate) fn apply(&self, request: ServiceRequest) -> ServiceRequest {
        request
            .query("attachments", self.attachments)
            .query("att_encoding_info", self.att_encoding_info)
            .query_list("atts_since", self.atts_since.as_deref())
            .query("conflicts", self.conflicts)
            .query("deleted_conflicts", self.deleted_conflicts)
            .query("latest", self.latest)
            .query("local_seq", self.local_seq)
            .query("meta", self.meta)
            .query_list("open_revs", self.open_revs.as_deref())
            .query("rev", self.rev.as_deref())
            .query("revs", self.revs)
            .query("revs_info", self.revs_info)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub if_none_match: Option<String>,
    pub latest: Option<bool>,
    pub rev: Option<String>,
}

impl HeadDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/{db}/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("If-None-Match", self.if_none_match.as_deref())
            .query("latest", self.latest)
            .query("rev", self.rev.as_deref()))
    }
}

/// Create a document with a server-generated id unless `document.id` is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostDocumentOptions {
    pub db: String,
    pub document: Document,
    pub content_type: Option<String>,
    /// `ok` to write in batch mode (answers 202).
    pub batch: Option<String>,
}

impl PostDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}")
            .path_param("db", &self.db)
            .header("Content-Type", self.content_type.as_deref())
            .query("batch", self.batch.as_deref())
            .json_body(&self.document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub if_none_match: Option<String>,
    #[serde(flatten)]
    pub read: DocumentReadParameters,
}

impl GetDocumentOptions {
    pub fn new(db: &str, doc_id: &str) -> Self {
        Self {
            db: db.to_string(),
            doc_id: doc_id.to_string(),
            ..Self::default()
        }
    }

    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        let request = ServiceRequest::new(HttpMethod::Get, "/{db}/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("If-None-Match", self.if_none_match.as_deref());
        Ok(self.read.apply(request))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub document: Document,
    pub content_type: Option<String>,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    /// `false` stores the supplied revision as is (replicator mode).
    pub new_edits: Option<bool>,
    pub rev: Option<String>,
}

impl PutDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        ServiceRequest::new(HttpMethod::Put, "/{db}/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("Content-Type", self.content_type.as_deref())
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("new_edits", self.new_edits)
            .query("rev", self.rev.as_deref())
            .json_body(&self.document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteDocumentOptions {
    pub db: String,
    pub doc_id: String,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    pub rev: Option<String>,
}

impl DeleteDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}/{doc_id}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("rev", self.rev.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostAllDocsOptions {
    pub db: String,
    #[serde(flatten)]
    pub query: AllDocsQuery,
}

impl PostAllDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_all_docs")
            .path_param("db", &self.db)
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostAllDocsQueriesOptions {
    pub db: String,
    pub queries: Vec<AllDocsQuery>,
}

impl PostAllDocsQueriesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require_non_empty("queries", &self.queries)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_all_docs/queries")
            .path_param("db", &self.db)
            .json_body(&QueriesBody { queries: &self.queries })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostBulkDocsOptions {
    pub db: String,
    pub bulk_docs: BulkDocs,
}

impl PostBulkDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_bulk_docs")
            .path_param("db", &self.db)
            .json_body(&self.bulk_docs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostBulkGetOptions {
    pub db: String,
    pub docs: Vec<BulkGetQueryDocument>,
    pub attachments: Option<bool>,
    pub att_encoding_info: Option<bool>,
    pub latest: Option<bool>,
    pub revs: Option<bool>,
}

#[derive(serde::Serialize)]
struct BulkGetBody<'a> {
    docs: &'a [BulkGetQueryDocument],
}

impl PostBulkGetOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require_non_empty("docs", &self.docs)?;
        if self.docs.iter().any(|d| d.id.is_empty()) {
            return Err(CloudantError::Validation("every docs entry must have an id".to_string()));
        }
        ServiceRequest::new(HttpMethod::Post, "/{db}/_bulk_get")
            .path_param("db", &self.db)
            .query("attachments", self.attachments)
            .query("att_encoding_info", self.att_encoding_info)
            .query("latest", self.latest)
            .query("revs", self.revs)
            .json_body(&BulkGetBody { docs: &self.docs })
    }
}

impl CloudantClient {
    /// Latest revision of a document in the `ETag` header, without the body.
    pub fn head_document(&self, options: &HeadDocumentOptions) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    /// Answers 201, or 202 in batch mode.
    pub fn post_document(&self, options: &PostDocumentOptions) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_document(&self, options: &GetDocumentOptions) -> Result<ServiceResponse<Document>, CloudantError> {
        self.invoke_json(options.build_request()?.accept(APPLICATION_JSON))
    }

    /// One part per requested revision; use with `open_revs`.
    pub fn get_document_as_mixed(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
        self.invoke_multipart(options.build_request()?.accept(MULTIPART_MIXED))
    }

    /// Document JSON followed by its attachments as separate parts.
    pub fn get_document_as_related(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
        self.invoke_multipart(options.build_request()?.accept(MULTIPART_RELATED))
    }

    pub fn get_document_as_stream(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?.accept(APPLICATION_JSON))
    }

    /// Create or update a document. Answers 201, or 202 in batch mode.
    pub fn put_document(&self, options: &PutDocumentOptions) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_document(
        &self,
        options: &DeleteDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_all_docs(&self, options: &PostAllDocsOptions) -> Result<ServiceResponse<AllDocsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_all_docs_as_stream(
        &self,
        options: &PostAllDocsOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn post_all_docs_queries(
        &self,
        options: &PostAllDocsQueriesOptions,
    ) -> Result<ServiceResponse<AllDocsQueriesResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_all_docs_queries_as_stream(
        &self,
        options: &PostAllDocsQueriesOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    /// One result per document, in request order. Individual failures are
    /// reported per entry; the call itself answers 201.
    pub fn post_bulk_docs(
        &self,
        options: &PostBulkDocsOptions,
    ) -> Result<ServiceResponse<Vec<DocumentResult>>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_bulk_get(&self, options: &PostBulkGetOptions) -> Result<ServiceResponse<BulkGetResult>, CloudantError> {
        self.invoke_json(options.build_request()?.accept(APPLICATION_JSON))
    }

    pub fn post_bulk_get_as_mixed(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
        self.invoke_multipart(options.build_request()?.accept(MULTIPART_MIXED))
    }

    pub fn post_bulk_get_as_related(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<ServiceResponse<MultipartBody>, CloudantError> {
        self.invoke_multipart(options.build_request()?.accept(MULTIPART_RELATED))
    }

    pub fn post_bulk_get_as_stream(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?.accept(APPLICATION_JSON))
    }
}
