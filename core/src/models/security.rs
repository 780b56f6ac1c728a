//! Database security objects and account-level access settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Names and roles granted one access level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// The `_security` document of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admins: Option<SecurityObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<SecurityObject>,
    /// Cloudant permissions keyed by user or API key, e.g. `_reader`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudant: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub couchdb_auth_only: Option<bool>,
}

/// A generated API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeysResult {
    pub ok: bool,
    pub key: String,
    pub password: String,
}

/// Account CORS settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsInformation {
    #[serde(default)]
    pub allow_credentials: bool,
    #[serde(default)]
    pub enable_cors: bool,
    #[serde(default)]
    pub origins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_sections_are_omitted() {
        let security = Security {
            members: Some(SecurityObject {
                names: Some(vec!["alice".to_string()]),
                roles: None,
            }),
            ..Security::default()
        };
        assert_eq!(
            serde_json::to_value(&security).unwrap(),
            json!({"members": {"names": ["alice"]}})
        );
    }

    #[test]
    fn empty_security_document_decodes() {
        let security: Security = serde_json::from_str("{}").unwrap();
        assert_eq!(security, Security::default());
    }
}
