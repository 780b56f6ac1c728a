//! Database `_security` documents.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::client::CloudantClient;
use crate::error::CloudantError;
use crate::http::HttpMethod;
use crate::models::{OkResult, Security, SecurityObject};
use crate::request::{require, ServiceRequest};
use crate::response::ServiceResponse;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSecurityOptions {
    pub db: String,
}

impl GetSecurityOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        Ok(ServiceRequest::new(HttpMethod::Get, "/{db}/_security").path_param("db", &self.db))
    }
}

/// Replace the whole security document. Sections left unset are omitted
/// from the body, which the server treats as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutSecurityOptions {
    pub db: String,
    pub admins: Option<SecurityObject>,
    pub members: Option<SecurityObject>,
    pub cloudant: Option<BTreeMap<String, Vec<String>>>,
    pub couchdb_auth_only: Option<bool>,
}

impl PutSecurityOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        let body = Security {
            admins: self.admins.clone(),
            members: self.members.clone(),
            cloudant: self.cloudant.clone(),
            couchdb_auth_only: self.couchdb_auth_only,
        };
        ServiceRequest::new(HttpMethod::Put, "/{db}/_security")
            .path_param("db", &self.db)
            .json_body(&body)
    }
}

/// Cloudant permissions through the account API. `cloudant` maps a user,
/// API key, or `nobody` to roles such as `_reader` and `_writer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PutCloudantSecurityConfigurationOptions {
    pub db: String,
    pub cloudant: BTreeMap<String, Vec<String>>,
    pub admins: Option<SecurityObject>,
    pub members: Option<SecurityObject>,
    pub couchdb_auth_only: Option<bool>,
}

impl PutCloudantSecurityConfigurationOptions {
    pub fn build_request(&self) -> Result<ServiceRequest, CloudantError> {
        require("db", &self.db)?;
        let body = Security {
            admins: self.admins.clone(),
            members: self.members.clone(),
            cloudant: Some(self.cloudant.clone()),
            couchdb_auth_only: self.couchdb_auth_only,
        };
        ServiceRequest::new(HttpMethod::Put, "/_api/v2/db/{db}/_security")
            .path_param("db", &self.db)
            .json_body(&body)
    }
}

impl CloudantClient {
    pub fn get_security(&self, options: &GetSecurityOptions) -> Result<ServiceResponse<Security>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn put_security(&self, options: &PutSecurityOptions) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }

    pub fn put_cloudant_security_configuration(
        &self,
        options: &PutCloudantSecurityConfigurationOptions,
    ) -> Result<ServiceResponse<OkResult>, CloudantError> {
        self.invoke_json(options.build_request()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{body_json, path_of, resolve};
    use serde_json::json;

    #[test]
    fn put_security_omits_unset_sections() {
        let options = PutSecurityOptions {
            db: "d".to_string(),
            members: Some(SecurityObject {
                names: Some(vec!["alice".to_string()]),
                roles: Some(vec!["reader".to_string()]),
            }),
            ..PutSecurityOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(path_of(&req), "/d/_security");
        assert_eq!(
            body_json(&req),
            json!({"members": {"names": ["alice"], "roles": ["reader"]}})
        );
    }

    #[test]
    fn cloudant_configuration_uses_account_api() {
        let mut cloudant = BTreeMap::new();
        cloudant.insert("nobody".to_string(), vec!["_reader".to_string()]);
        let options = PutCloudantSecurityConfigurationOptions {
            db: "d".to_string(),
            cloudant,
            couchdb_auth_only: Some(false),
            ..PutCloudantSecurityConfigurationOptions::default()
        };
        let req = resolve(options.build_request().unwrap());
        assert_eq!(path_of(&req), "/_api/v2/db/d/_security");
        assert_eq!(
            body_json(&req),
            json!({"cloudant": {"nobody": ["_reader"]}, "couchdb_auth_only": false})
        );
    }

    #[test]
    fn db_is_required() {
        assert!(GetSecurityOptions::default().build_request().is_err());
        assert!(PutSecurityOptions::default().build_request().is_err());
    }
}
