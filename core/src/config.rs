//! Client configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::CloudantError;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5984";
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// How requests are authenticated.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    #[default]
    NoAuth,
    Basic {
        username: String,
        password: String,
    },
    /// A static bearer token, sent as is.
    BearerToken { token: String },
    /// An API key exchanged for short-lived bearer tokens. `url` overrides
    /// the token endpoint.
    Iam { apikey: String, url: Option<String> },
}

impl AuthConfig {
    pub fn basic(username: &str, password: &str) -> Self {
        AuthConfig::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn iam(apikey: &str) -> Self {
        AuthConfig::Iam {
            apikey: apikey.to_string(),
            url: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::NoAuth => f.write_str("NoAuth"),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            AuthConfig::BearerToken { .. } => f.debug_struct("BearerToken").finish_non_exhaustive(),
            AuthConfig::Iam { url, .. } => f.debug_struct("Iam").field("url", url).finish_non_exhaustive(),
        }
    }
}

/// Settings for a `CloudantClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub service_url: String,
    pub auth: AuthConfig,
    /// Whole-request timeout, connect through last body byte.
    pub timeout: Duration,
    /// Extra attempts for idempotent requests. Zero disables retries.
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub max_retry_interval: Duration,
    pub user_agent: String,
    /// Headers added to every request unless the operation sets them itself.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            auth: AuthConfig::NoAuth,
            timeout: Duration::from_secs(60),
            max_retries: 4,
            retry_interval: Duration::from_secs(1),
            max_retry_interval: Duration::from_secs(30),
            user_agent: concat!("cloudant-rust/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(service_url: &str, auth: AuthConfig) -> Self {
        Self {
            service_url: service_url.to_string(),
            auth,
            ..Self::default()
        }
    }

    /// Parse `service_url`. Only http and https URLs are accepted.
    pub(crate) fn base_url(&self) -> Result<Url, CloudantError> {
        let url = Url::parse(&self.service_url)
            .map_err(|e| CloudantError::Validation(format!("invalid service URL {}: {e}", self.service_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CloudantError::Validation(format!(
                "service URL scheme must be http or https, got {other}"
            ))),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub(crate) fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_interval
            .saturating_mul(factor)
            .min(self.max_retry_interval)
    }
}
