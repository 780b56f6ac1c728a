//! Request authentication.
//!
//! # Design
//! Basic and bearer credentials are rendered once into a ready-made
//! `Authorization` value. IAM API keys are exchanged for bearer tokens at the
//! token endpoint and cached until 80% of their lifetime has passed.
//!
//! The cache lock is held for the whole refresh, so when many threads find
//! the token stale at once only the first one calls the token endpoint; the
//! rest wait and reuse its result. A failed refresh leaves the cache empty
//! and the next caller tries again.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use crate::config::{AuthConfig, DEFAULT_IAM_URL};
use crate::error::CloudantError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::parse_json;
use crate::transport::Transport;

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const REFRESH_FRACTION: f64 = 0.8;
/// Upper bound on the `expires_in` a token endpoint is trusted with.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

pub(crate) enum Authenticator {
    NoAuth,
    Static(String),
    Iam(IamTokenManager),
}

impl Authenticator {
    pub(crate) fn from_config(config: &AuthConfig) -> Self {
        match config {
            AuthConfig::NoAuth => Authenticator::NoAuth,
            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                Authenticator::Static(format!("Basic {encoded}"))
            }
            AuthConfig::BearerToken { token } => Authenticator::Static(format!("Bearer {token}")),
            AuthConfig::Iam { apikey, url } => Authenticator::Iam(IamTokenManager::new(
                apikey,
                url.as_deref().unwrap_or(DEFAULT_IAM_URL),
            )),
        }
    }

    /// The `Authorization` header value for the next request, if any.
    pub(crate) fn authorization(&self, transport: &dyn Transport) -> Result<Option<String>, CloudantError> {
        match self {
            Authenticator::NoAuth => Ok(None),
            Authenticator::Static(value) => Ok(Some(value.clone())),
            Authenticator::Iam(manager) => manager.token(transport).map(|t| Some(format!("Bearer {t}"))),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::NoAuth => f.write_str("NoAuth"),
            Authenticator::Static(_) => f.write_str("Static(..)"),
            Authenticator::Iam(manager) => manager.fmt(f),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Exchanges an IAM API key for bearer tokens and caches them.
pub(crate) struct IamTokenManager {
    apikey: String,
    url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl IamTokenManager {
    pub(crate) fn new(apikey: &str, url: &str) -> Self {
        Self {
            apikey: apikey.to_string(),
            url: url.to_string(),
            cache: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a new one when needed.
    pub(crate) fn token(&self, transport: &dyn Transport) -> Result<String, CloudantError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.access_token.clone());
            }
        }
        *cache = None;
        let fresh = self.request_token(transport)?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    fn request_token(&self, transport: &dyn Transport) -> Result<CachedToken, CloudantError> {
        debug!(url = %self.url, "requesting IAM access token");
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", IAM_GRANT_TYPE)
            .append_pair("apikey", &self.apikey)
            .finish();
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.url.clone(),
            headers: vec![
                (
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            body: Some(body.into_bytes()),
        };
        let response = parse_json::<TokenResponse>(transport.execute(&request)?)?.into_result();
        let lifetime = Duration::from_secs(response.expires_in)
            .min(MAX_TOKEN_LIFETIME)
            .mul_f64(REFRESH_FRACTION);
        let now = Instant::now();
        Ok(CachedToken {
            access_token: response.access_token,
            refresh_at: now.checked_add(lifetime).unwrap_or(now),
        })
    }
}

impl fmt::Debug for IamTokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamTokenManager")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
