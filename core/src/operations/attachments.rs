//! Standalone document attachments.

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::{ByteStream, HttpMethod};
use crate::models::DocumentResult;
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadAttachmentOptions {
    pub db: String,
    pub doc_id: String,
    pub attachment_name: String,
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub rev: Option<String>,
}

impl HeadAttachmentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        require("attachment_name", &self.attachment_name)?;
        Ok(ServiceRequest::new(HttpMethod::Head, "/{db}/{doc_id}/{attachment_name}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .path_param("attachment_name", &self.attachment_name)
            .header("If-Match", self.if_match.as_deref())
            .header("If-None-Match", self.if_none_match.as_deref())
            .query("rev", self.rev.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetAttachmentOptions {
    pub db: String,
    pub doc_id: String,
    pub attachment_name: String,
    /// Media type to ask for, e.g. `image/png`. Defaults to any.
    pub accept: Option<String>,
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    /// A byte range such as `bytes=0-1023`.
    pub range: Option<String>,
    pub rev: Option<String>,
}

impl GetAttachmentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        require("attachment_name", &self.attachment_name)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/{doc_id}/{attachment_name}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .path_param("attachment_name", &self.attachment_name)
            .header("Accept", self.accept.as_deref())
            .header("If-Match", self.if_match.as_deref())
            .header("If-None-Match", self.if_none_match.as_deref())
            .header("Range", self.range.as_deref())
            .query("rev", self.rev.as_deref()))
    }
}

/// Upload raw attachment bytes. `rev` must name the current revision of an
/// existing document; without it a new document is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutAttachmentOptions {
    pub db: String,
    pub doc_id: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
    pub content_type: String,
    pub if_match: Option<String>,
    pub rev: Option<String>,
}

impl PutAttachmentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        require("attachment_name", &self.attachment_name)?;
        require("content_type", &self.content_type)?;
        Ok(ServiceRequest::new(HttpMethod::Put, "/{db}/{doc_id}/{attachment_name}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .path_param("attachment_name", &self.attachment_name)
            .header("If-Match", self.if_match.as_deref())
            .query("rev", self.rev.as_deref())
            .binary_body(&self.content_type, self.attachment.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAttachmentOptions {
    pub db: String,
    pub doc_id: String,
    pub attachment_name: String,
    pub if_match: Option<String>,
    pub rev: Option<String>,
    pub batch: Option<String>,
}

impl DeleteAttachmentOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        require("doc_id", &self.doc_id)?;
        require("attachment_name", &self.attachment_name)?;
        Ok(ServiceRequest::new(HttpMethod::Delete, "/{db}/{doc_id}/{attachment_name}")
            .path_param("db", &self.db)
            .path_param("doc_id", &self.doc_id)
            .path_param("attachment_name", &self.attachment_name)
            .header("If-Match", self.if_match.as_deref())
            .query("rev", self.rev.as_deref())
            .query("batch", self.batch.as_deref()))
    }
}

impl CloudantClient {
    pub fn head_attachment(&self, options: &HeadAttachmentOptions) -> Result<ServiceResponse<()>, CloudantError> {
        self.invoke_head(options.build_request()?)
    }

    /// Attachment content as a lazy byte stream. The `content-type` and
    /// `content-range` response headers describe it.
    pub fn get_attachment(&self, options: &GetAttachmentOptions) -> Result<ServiceResponse<ByteStream>, CloudantError> {
        self.invoke_stream(options.build_request()?)
    }

    pub fn put_attachment(
        &self,
        options: &PutAttachmentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn delete_attachment(
        &self,
        options: &DeleteAttachmentOptions,
    ) -> Result<ServiceResponse<DocumentResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{pairs, path_of, query_of, resolve};

    #[test]
    fn put_attachment_sends_raw_bytes() {
        let options = PutAttachmentOptions {
            db: "d".to_string(),
            doc_id: "doc".to_string(),
            attachment_name: "logo.png".to_string(),
            attachment: vec![0x89, b'P', b'N', b'G'],
            content_type: "image/png".to_string(),
            rev: Some("1-a".to_string()),
            ..PutAttachmentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(path_of(&req), "/d/doc/logo.png");
        assert_eq!(req.header("content-type"), Some("image/png"));
        assert_eq!(req.body.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
        assert_eq!(query_of(&req), pairs(&[("rev", "1-a")]));
    }

    #[test]
    fn put_attachment_requires_content_type() {
        let options = PutAttachmentOptions {
            db: "d".to_string(),
            doc_id: "doc".to_string(),
            attachment_name: "a.txt".to_string(),
            ..PutAttachmentOptions::default()
        };
        assert_eq!(
            options.build_request().unwrap_err().to_string(),
            "invalid request: content_type must be provided"
        );
    }

    #[test]
    fn attachment_names_are_one_segment() {
        let options = GetAttachmentOptions {
            db: "d".to_string(),
            doc_id: "doc".to_string(),
            attachment_name: "dir/file.txt".to_string(),
            range: Some("bytes=0-9".to_string()),
            ..GetAttachmentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/d/doc/dir%2Ffile.txt");
        assert_eq!(req.header("range"), Some("bytes=0-9"));
    }

    #[test]
    fn delete_attachment_query() {
        let options = DeleteAttachmentOptions {
            db: "d".to_string(),
            doc_id: "doc".to_string(),
            attachment_name: "a.txt".to_string(),
            rev: Some("2-b".to_string()),
            batch: Some("ok".to_string()),
            ..DeleteAttachmentOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(query_of(&req), pairs(&[("batch", "ok"), ("rev", "2-b")]));
    }

    #[test]
    fn head_attachment_all_options() {
        let options = HeadAttachmentOptions {
            db: "testString".to_string(),
            doc_id: "testString".to_string(),
            attachment_name: "testString".to_string(),
            if_match: Some("1-a".to_string()),
            if_none_match: Some("1-b".to_string()),
            rev: Some("1-a".to_string()),
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Head);
        assert_eq!(path_of(&req), "/testString/testString/testString");
        assert_eq!(req.header("If-Match"), Some("1-a"));
        assert_eq!(req.header("If-None-Match"), Some("1-b"));
        assert_eq!(query_of(&req), pairs(&[("rev", "1-a")]));
        assert!(req.body.is_none());
    }
}
