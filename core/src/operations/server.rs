//! Server-wide endpoints.

use serde::{Deserialize, Serialize};

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::HttpMethod;
use crate::models::{
    ActiveTask, ApiKeysResult, CorsInformation, DbUpdates, MembershipInformation, OkResult, SearchAnalyzeResult,
    ServerInformation, SessionInformation, UpInformation, UuidsResult,
};
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetUuidsOptions {
    pub count: Option<u64>,
}

impl GetUuidsOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        Ok(ServiceRequest::new(HttpMethod::Get, "/_uuids").query("count", self.count))
    }
}

/// Options for the account-level database event feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetDbUpdatesOptions {
    /// `normal`, `longpoll`, or `continuous`.
    pub feed: Option<String>,
    /// Milliseconds between heartbeat newlines on a continuous feed.
    pub heartbeat: Option<u64>,
    pub timeout: Option<u64>,
    pub since: Option<String>,
}

impl GetDbUpdatesOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        Ok(ServiceRequest::new(HttpMethod::Get, "/_db_updates")
            .query("feed", self.feed.as_deref())
            .query("heartbeat", self.heartbeat)
            .query("timeout", self.timeout)
            .query("since", self.since.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PutCorsConfigurationOptions {
    pub origins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_cors: Option<bool>,
}

impl PutCorsConfigurationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        ServiceRequest::new(HttpMethod::Put, "/_api/v2/user/config/cors").json_body(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSearchAnalyzeOptions {
    pub analyzer: String,
    pub text: String,
}

impl PostSearchAnalyzeOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("analyzer", &self.analyzer)?;
        require("text", &self.text)?;
        ServiceRequest::new(HttpMethod::Post, "/_search_analyze").json_body(self)
    }
}

impl CloudantClient {
    /// `GET /`: welcome message, version, and feature flags.
    pub fn get_server_information(&self) -> Result<ServiceResponse<ServerInformation>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/"))
    }

    pub fn get_membership_information(&self) -> Result<ServiceResponse<MembershipInformation>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/_membership"))
    }

    pub fn get_uuids(&self, options: &GetUuidsOptions) -> Result<ServiceResponse<UuidsResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// Health check. A node in maintenance mode answers 404 or 503.
    pub fn get_up_information(&self) -> Result<ServiceResponse<UpInformation>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/_up"))
    }

    pub fn get_active_tasks(&self) -> Result<ServiceResponse<Vec<ActiveTask>>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/_active_tasks"))
    }

    pub fn get_db_updates(&self, options: &GetDbUpdatesOptions) -> Result<ServiceResponse<DbUpdates>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn get_session_information(&self) -> Result<ServiceResponse<SessionInformation>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/_session"))
    }

    /// Generate an API key and password pair. Answers 201.
    pub fn post_api_keys(&self) -> Result<ServiceResponse<ApiKeysResult>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Post, "/_api/v2/api_keys"))
    }

    pub fn get_cors_information(&self) -> Result<ServiceResponse<CorsInformation>, CloudantError> {
        self.invoke_json(ServiceRequest::new(HttpMethod::Get, "/_api/v2/user/config/cors"))
    }

    pub fn put_cors_configuration(
        &self,
        options: &PutCorsConfigurationOptions,
    ) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    /// Tokenize `text` with a search analyzer.
    pub fn post_search_analyze(
        &self,
        options: &PostSearchAnalyzeOptions,
    ) -> Result<ServiceResponse<SearchAnalyzeResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}
