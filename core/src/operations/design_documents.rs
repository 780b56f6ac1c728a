//! Design documents, `_design_docs` listings, and map/reduce views.
//!
//! `ddoc` is the design document name without the `_design/` prefix.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::{
    AllDocsQueriesResult, AllDocsQuery, AllDocsResult, DesignDocument, DesignDocumentInformation, DocumentResult,
    ViewQueriesResult, ViewQuery, ViewResult,
};
use crate::operations::{DocumentReadParameters, QueriesBody};
use crate::request::{require, require_non_empty, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadDesignDocumentOptions {
    pub db: String,
    pub ddoc: String,
    pub if_none_match: Option<String>,
}

impl HeadDesignDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/{db}/_design/{ddoc}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .header("If-None-Match", self.if_none_match.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDesignDocumentOptions {
    pub db: String,
    pub ddoc: String,
    pub if_none_match: Option<String>,
    #[serde(flatten)]
    pub read: DocumentReadParameters,
}

impl GetDesignDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        let request = ServiceRequest::new(HttpMethod::Get, "/{db}/_design/{ddoc}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .header("If-None-Match", self.if_none_match.as_deref());
        Ok(self.read.apply(request))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutDesignDocumentOptions {
    pub db: String,
    pub ddoc: String,
    pub design_document: DesignDocument,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    pub new_edits: Option<bool>,
    pub rev: Option<String>,
}

impl PutDesignDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        ServiceRequest::new(HttpMethod::Put, "/{db}/_design/{ddoc}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("new_edits", self.new_edits)
            .query("rev", self.rev.as_deref())
            .json_body(&self.design_document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteDesignDocumentOptions {
    pub db: String,
    pub ddoc: String,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    pub rev: Option<String>,
}

impl DeleteDesignDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}/_design/{ddoc}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("rev", self.rev.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDesignDocumentInformationOptions {
    pub db: String,
    pub ddoc: String,
}

impl GetDesignDocumentInformationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_design/{ddoc}/_info")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostDesignDocsOptions {
    pub db: String,
    #[serde(flatten)]
    pub query: AllDocsQuery,
    pub accept: Option<String>,
}

impl PostDesignDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_design_docs")
            .path_param("db", &self.db)
            .header("Accept", self.accept.as_deref())
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostDesignDocsQueriesOptions {
    pub db: String,
    pub queries: Vec<AllDocsQuery>,
    pub accept: Option<String>,
}

impl PostDesignDocsQueriesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require_non_empty("queries", &self.queries)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_design_docs/queries")
            .path_param("db", &self.db)
            .header("Accept", self.accept.as_deref())
            .json_body(&QueriesBody { queries: &self.queries })
    }
}

/// Query a map/reduce view. All view options travel in the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostViewOptions {
    pub db: String,
    pub ddoc: String,
    pub view: String,
    #[serde(flatten)]
    pub query: ViewQuery,
}

impl PostViewOptions {
    pub fn new(db: &str, ddoc: &str, view: &str) -> Self {
        Self {
            db: db.to_string(),
            ddoc: ddoc.to_string(),
            view: view.to_string(),
            query: ViewQuery::default(),
        }
    }

    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("view", &self.view)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_design/{ddoc}/_view/{view}")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("view", &self.view)
            .json_body(&self.query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostViewQueriesOptions {
    pub db: String,
    pub ddoc: String,
    pub view: String,
    pub queries: Vec<ViewQuery>,
}

impl PostViewQueriesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("ddoc", &self.ddoc)?;
        require("view", &self.view)?;
        require_non_empty("queries", &self.queries)?;
        ServiceRequest::new(HttpMethod::Post, "/{db}/_design/{ddoc}/_view/{view}/queries")
            .path_param("db", &self.db)
            .path_param("ddoc", &self.ddoc)
            .path_param("view", &self.view)
            .json_body(&QueriesBody { queries: &self.queries })
    }
}

impl CloudantClient {
    pub fn head_design_document(
        &self,
        options: &HeadDesignDocumentOptions,
    ) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    pub fn get_design_document(
        &self,
        options: &GetDesignDocumentOptions,
    ) -> Result<ServiceResponse<DesignDocument>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn put_design_document(
        &self,
        options: &PutDesignDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_design_document(
        &self,
        options: &DeleteDesignDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_design_document_information(
        &self,
        options: &GetDesignDocumentInformationOptions,
    ) -> Result<ServiceResponse<DesignDocumentInformation>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_design_docs(
        &self,
        options: &PostDesignDocsOptions,
    ) -> Result<ServiceResponse<AllDocsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_design_docs_queries(
        &self,
        options: &PostDesignDocsQueriesOptions,
    ) -> Result<ServiceResponse<AllDocsQueriesResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_view(&self, options: &PostViewOptions) -> Result<ServiceResponse<ViewResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// View rows as they arrive. The body is not read before this returns.
    pub fn post_view_as_stream(&self, options: &PostViewOptions) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn post_view_queries(
        &self,
        options: &PostViewQueriesOptions,
    ) -> Result<ServiceResponse<ViewQueriesResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn post_view_queries_as_stream(
        &self,
        options: &PostViewQueriesOptions,
    ) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DesignDocumentViewsMapReduce;
    use crate::operations::test_support::{body_json, pairs, path_of, query_of, resolve};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn design_document_paths() {
        let head = resolve(
            HeadDesignDocumentOptions {
                db: "d".to_string(),
                ddoc: "app".to_string(),
                if_none_match: Some("1-a".to_string()),
            }
            .build_request()
            .unwrap(),
        );
        assert_eq!(head.method, HttpMethod::Head);
        assert_eq!(path_of(&head), "/d/_design/app");
        assert_eq!(head.header("If-None-Match"), Some("1-a"));

        let info = resolve(
            GetDesignDocumentInformationOptions {
                db: "d".to_string(),
                ddoc: "app".to_string(),
            }
            .build_request()
            .unwrap(),
        );
        assert_eq!(path_of(&info), "/d/_design/app/_info");
    }

    #[test]
    fn put_design_document_serializes_views() {
        let mut views = BTreeMap::new();
        views.insert(
            "by_name".to_string(),
            DesignDocumentViewsMapReduce {
                map: "function(doc) { emit(doc.name); }".to_string(),
                reduce: Some("_count".to_string()),
            },
        );
        let options = PutDesignDocumentOptions {
            db: "d".to_string(),
            ddoc: "app".to_string(),
            design_document: DesignDocument {
                views: Some(views),
                ..DesignDocument::default()
            },
            rev: Some("1-a".to_string()),
            ..PutDesignDocumentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(query_of(&req), pairs(&[("rev", "1-a")]));
        assert_eq!(
            body_json(&req),
            json!({"views": {"by_name": {"map": "function(doc) { emit(doc.name); }", "reduce": "_count"}}})
        );
    }

    #[test]
    fn design_docs_accept_header() {
        let options = PostDesignDocsOptions {
            db: "d".to_string(),
            accept: Some("application/json".to_string()),
            query: AllDocsQuery {
                include_docs: Some(true),
                ..AllDocsQuery::default()
            },
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/d/_design_docs");
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(body_json(&req), json!({"include_docs": true}));
    }

    #[test]
    fn view_options_travel_in_body() {
        let options = PostViewOptions {
            query: ViewQuery {
                startkey: Some(json!({"foo": "bar"})),
                group: Some(true),
                group_level: Some(1),
                keys: Some(vec![json!(["a", 1])]),
                reduce: Some(true),
                update: Some("lazy".to_string()),
                ..ViewQuery::default()
            },
            ..PostViewOptions::new("d", "app", "by_name")
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/d/_design/app/_view/by_name");
        assert!(query_of(&req).is_empty());
        assert_eq!(
            body_json(&req),
            json!({
                "startkey": {"foo": "bar"},
                "group": true,
                "group_level": 1,
                "keys": [["a", 1]],
                "reduce": true,
                "update": "lazy"
            })
        );
    }

    #[test]
    fn view_requires_view_name() {
        let err = PostViewOptions::new("d", "app", "").build_request().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: view must be provided");
    }

    #[test]
    fn view_queries_path() {
        let options = PostViewQueriesOptions {
            db: "d".to_string(),
            ddoc: "app".to_string(),
            view: "v".to_string(),
            queries: vec![ViewQuery::default()],
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/d/_design/app/_view/v/queries");
        assert_eq!(body_json(&req), json!({"queries": [{}]}));
    }

    #[test]
    fn get_design_document_all_options() {
        let options = GetDesignDocumentOptions {
            db: "testString".to_string(),
            ddoc: "testString".to_string(),
            if_none_match: Some("1-a".to_string()),
            read: DocumentReadParameters {
                attachments: Some(true),
                att_encoding_info: Some(true),
                atts_since: Some(vec!["1-a".to_string()]),
                conflicts: Some(true),
                deleted_conflicts: Some(true),
                latest: Some(true),
                local_seq: Some(true),
                meta: Some(true),
                open_revs: Some(vec!["all".to_string()]),
                rev: Some("1-a".to_string()),
                revs: Some(true),
                revs_info: Some(true),
            },
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(path_of(&req), "/testString/_design/testString");
        assert_eq!(req.header("If-None-Match"), Some("1-a"));
        assert_eq!(
            query_of(&req),
            pairs(&[
                ("att_encoding_info", "true"),
                ("attachments", "true"),
                ("atts_since", "1-a"),
                ("conflicts", "true"),
                ("deleted_conflicts", "true"),
                ("latest", "true"),
                ("local_seq", "true"),
                ("meta", "true"),
                ("open_revs", "all"),
                ("rev", "1-a"),
                ("revs", "true"),
                ("revs_info", "true"),
            ])
        );
    }

    #[test]
    fn delete_design_document_all_options() {
        let options = DeleteDesignDocumentOptions {
            db: "testString".to_string(),
            ddoc: "testString".to_string(),
            if_match: Some("2-b".to_string()),
            batch: Some("ok".to_string()),
            rev: Some("2-b".to_string()),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(path_of(&req), "/testString/_design/testString");
        assert_eq!(req.header("If-Match"), Some("2-b"));
        assert_eq!(query_of(&req), pairs(&[("batch", "ok"), ("rev", "2-b")]));
        assert!(req.body.is_none());
    }

    #[test]
    fn post_design_docs_queries_all_options() {
        let options = PostDesignDocsQueriesOptions {
            db: "testString".to_string(),
            queries: vec![
                AllDocsQuery {
                    keys: Some(vec!["_design/a".to_string()]),
                    ..AllDocsQuery::default()
                },
                AllDocsQuery {
                    limit: Some(5),
                    skip: Some(1),
                    ..AllDocsQuery::default()
                },
            ],
            accept: Some("application/json".to_string()),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(path_of(&req), "/testString/_design_docs/queries");
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert!(query_of(&req).is_empty());
        assert_eq!(
            body_json(&req),
            json!({"queries": [{"keys": ["_design/a"]}, {"limit": 5, "skip": 1}]})
        );

        let empty = PostDesignDocsQueriesOptions {
            db: "testString".to_string(),
            ..PostDesignDocsQueriesOptions::default()
        };
        assert!(matches!(empty.build_request(), Err(CloudantError::Validation(_))));
    }
}
