//! Replication documents in `_replicator` and the replication scheduler.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::HttpMethod;
use crate::models::{
    DocumentResult, ReplicationDocument, ReplicationResult, SchedulerDocsResult, SchedulerDocument, SchedulerJob,
    SchedulerJobsResult,
};
use crate::operations::DocumentReadParameters;
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadReplicationDocumentOptions {
    pub doc_id: String,
    pub if_none_match: Option<String>,
}

impl HeadReplicationDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/_replicator/{doc_id}")
            .path_param("doc_id", &self.doc_id)
            .header("If-None-Match", self.if_none_match.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadSchedulerJobOptions {
    pub job_id: String,
}

impl HeadSchedulerJobOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("job_id", &self.job_id)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/_scheduler/jobs/{job_id}").path_param("job_id", &self.job_id))
    }
}

/// Run a replication that is not persisted in `_replicator`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostReplicateOptions {
    pub replication_document: ReplicationDocument,
}

impl PostReplicateOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        ServiceRequest::new(HttpMethod::Post, "/_replicate").json_body(&self.replication_document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetReplicationDocumentOptions {
    pub doc_id: String,
    pub if_none_match: Option<String>,
    #[serde(flatten)]
    pub read: DocumentReadParameters,
}

impl GetReplicationDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("doc_id", &self.doc_id)?;
        let request = ServiceRequest::new(HttpMethod::Get, "/_replicator/{doc_id}")
            .path_param("doc_id", &self.doc_id)
            .header("If-None-Match", self.if_none_match.as_deref());
        Ok(self.read.apply(request))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutReplicationDocumentOptions {
    pub doc_id: String,
    pub replication_document: ReplicationDocument,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    pub new_edits: Option<bool>,
    pub rev: Option<String>,
}

impl PutReplicationDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("doc_id", &self.doc_id)?;
        ServiceRequest::new(HttpMethod::Put, "/_replicator/{doc_id}")
            .path_param("doc_id", &self.doc_id)
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("new_edits", self.new_edits)
            .query("rev", self.rev.as_deref())
            .json_body(&self.replication_document)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteReplicationDocumentOptions {
    pub doc_id: String,
    pub if_match: Option<String>,
    pub batch: Option<String>,
    pub rev: Option<String>,
}

impl DeleteReplicationDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/_replicator/{doc_id}")
            .path_param("doc_id", &self.doc_id)
            .header("If-Match", self.if_match.as_deref())
            .query("batch", self.batch.as_deref())
            .query("rev", self.rev.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSchedulerDocsOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    /// Filter by state, e.g. `initializing`, `running`, `failed`.
    pub states: Option<Vec<String>>,
}

impl GetSchedulerDocsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        Ok(ServiceRequest::new(HttpMethod::Get, "/_scheduler/docs")
            .query("limit", self.limit)
            .query("skip", self.skip)
            .query_list("states", self.states.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSchedulerDocumentOptions {
    pub doc_id: String,
}

impl GetSchedulerDocumentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("doc_id", &self.doc_id)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/_scheduler/docs/_replicator/{doc_id}")
            .path_param("doc_id", &self.doc_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSchedulerJobsOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl GetSchedulerJobsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        Ok(ServiceRequest::new(HttpMethod::Get, "/_scheduler/jobs")
            .query("limit", self.limit)
            .query("skip", self.skip))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSchedulerJobOptions {
    pub job_id: String,
}

impl GetSchedulerJobOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("job_id", &self.job_id)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/_scheduler/jobs/{job_id}").path_param("job_id", &self.job_id))
    }
}

impl CloudantClient {
    pub fn head_replication_document(
        &self,
        options: &HeadReplicationDocumentOptions,
    ) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    pub fn head_scheduler_job(&self, options: &HeadSchedulerJobOptions) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    pub fn post_replicate(
        &self,
        options: &PostReplicateOptions,
    ) -> Result<ServiceResponse<ReplicationResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_replication_document(
        &self,
        options: &GetReplicationDocumentOptions,
    ) -> Result<ServiceResponse<ReplicationDocument>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// Create or update a persistent replication. Answers 201.
    pub fn put_replication_document(
        &self,
        options: &PutReplicationDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// Cancel a persistent replication by deleting its document.
    pub fn delete_replication_document(
        &self,
        options: &DeleteReplicationDocumentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_scheduler_docs(
        &self,
        options: &GetSchedulerDocsOptions,
    ) -> Result<ServiceResponse<SchedulerDocsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_scheduler_document(
        &self,
        options: &GetSchedulerDocumentOptions,
    ) -> Result<ServiceResponse<SchedulerDocument>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_scheduler_jobs(
        &self,
        options: &GetSchedulerJobsOptions,
    ) -> Result<ServiceResponse<SchedulerJobsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_scheduler_job(&self, options: &GetSchedulerJobOptions) -> Result<ServiceResponse<SchedulerJob>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{body_json, pairs, path_of, query_of, resolve};
    use serde_json::json;

    #[test]
    fn scheduler_docs_states_are_comma_joined() {
        let options = GetSchedulerDocsOptions {
            limit: Some(0),
            skip: Some(0),
            states: Some(vec!["initializing".to_string(), "running".to_string()]),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/_scheduler/docs");
        assert_eq!(
            query_of(&req),
            pairs(&[("limit", "0"), ("skip", "0"), ("states", "initializing,running")])
        );
    }

    #[test]
    fn scheduler_document_path() {
        let req = resolve(
            GetSchedulerDocumentOptions {
                doc_id: "repl-1".to_string(),
            }
            .build_request()
            .unwrap(),
        );
        assert_eq!(path_of(&req), "/_scheduler/docs/_replicator/repl-1");
    }

    #[test]
    fn put_replication_document_body_and_query() {
        let options = PutReplicationDocumentOptions {
            doc_id: "repl-1".to_string(),
            replication_document: ReplicationDocument {
                create_target: Some(true),
                ..ReplicationDocument::new("https://a.example/src", "https://b.example/dst")
            },
            rev: Some("1-a".to_string()),
            ..PutReplicationDocumentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/_replicator/repl-1");
        assert_eq!(query_of(&req), pairs(&[("rev", "1-a")]));
        assert_eq!(
            body_json(&req),
            json!({
                "create_target": true,
                "source": {"url": "https://a.example/src"},
                "target": {"url": "https://b.example/dst"}
            })
        );
    }

    #[test]
    fn job_id_is_required() {
        assert!(HeadSchedulerJobOptions::default().build_request().is_err());
        let req = resolve(
            GetSchedulerJobOptions {
                job_id: "abc+continuous".to_string(),
            }
            .build_request()
            .unwrap(),
        );
        assert_eq!(path_of(&req), "/_scheduler/jobs/abc+continuous");
    }

    #[test]
    fn replication_document_reads_share_document_flags() {
        let options = GetReplicationDocumentOptions {
            doc_id: "repl-1".to_string(),
            read: DocumentReadParameters {
                conflicts: Some(true),
                ..DocumentReadParameters::default()
            },
            ..GetReplicationDocumentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(query_of(&req), pairs(&[("conflicts", "true")]));
    }

    #[test]
    fn head_replication_document_all_options() {
        let options = HeadReplicationDocumentOptions {
            doc_id: "testString".to_string(),
            if_none_match: Some("1-a".to_string()),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Head);
        assert_eq!(path_of(&req), "/_replicator/testString");
        assert_eq!(req.header("If-None-Match"), Some("1-a"));
        assert!(query_of(&req).is_empty());
    }

    #[test]
    fn post_replicate_sends_replication_document() {
        let options = PostReplicateOptions {
            replication_document: ReplicationDocument {
                continuous: Some(true),
                create_target: Some(true),
                doc_ids: Some(vec!["a".to_string()]),
                ..ReplicationDocument::new("https://src.example.com/a", "https://dst.example.com/b")
            },
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(path_of(&req), "/_replicate");
        assert!(query_of(&req).is_empty());
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(
            body_json(&req),
            json!({
                "continuous": true,
                "create_target": true,
                "doc_ids": ["a"],
                "source": {"url": "https://src.example.com/a"},
                "target": {"url": "https://dst.example.com/b"}
            })
        );
    }

    #[test]
    fn delete_replication_document_all_options() {
        let options = DeleteReplicationDocumentOptions {
            doc_id: "testString".to_string(),
            if_match: Some("3-c".to_string()),
            batch: Some("ok".to_string()),
            rev: Some("3-c".to_string()),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(path_of(&req), "/_replicator/testString");
        assert_eq!(req.header("If-Match"), Some("3-c"));
        assert_eq!(query_of(&req), pairs(&[("batch", "ok"), ("rev", "3-c")]));
    }

    #[test]
    fn get_scheduler_jobs_all_options() {
        let options = GetSchedulerJobsOptions {
            limit: Some(10),
            skip: Some(20),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(path_of(&req), "/_scheduler/jobs");
        assert_eq!(query_of(&req), pairs(&[("limit", "10"), ("skip", "20")]));

        let req = resolve(GetSchedulerJobsOptions::default().build_request().unwrap());
        assert!(query_of(&req).is_empty());
    }
}
