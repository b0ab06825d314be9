use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OAuthConfig;

/// Normalized identity returned by the provider's "who am I" endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub external_id: i64,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider rejected the access token")]
    Rejected,
    #[error("identity provider timed out")]
    Timeout,
    #[error("identity provider request failed: {0}")]
    Transport(String),
    #[error("identity provider returned status {0}")]
    Status(u16),
    #[error("identity provider payload is malformed: {0}")]
    Payload(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct KakaoProfile {
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    profile: Option<KakaoProfile>,
}

#[derive(Debug, Deserialize)]
struct KakaoUser {
    id: i64,
    kakao_account: Option<KakaoAccount>,
}

impl From<KakaoUser> for ExternalIdentity {
    fn from(u: KakaoUser) -> Self {
        let (email, profile_image_url) = match u.kakao_account {
            Some(acc) => (acc.email, acc.profile.and_then(|p| p.profile_image_url)),
            None => (None, None),
        };
        Self {
            external_id: u.id,
            email,
            profile_image_url,
        }
    }
}

/// Kakao user-info client.
#[derive(Clone)]
pub struct KakaoClient {
    http: reqwest::Client,
    profile_url: String,
}

impl KakaoClient {
    pub fn new(cfg: &OAuthConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            http,
            profile_url: cfg.profile_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for KakaoClient {
    async fn fetch_identity(&self, access_token: &str) -> Result<ExternalIdentity, IdentityError> {
        let res = self
            .http
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else {
                    IdentityError::Transport(e.to_string())
                }
            })?;

        match res.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(IdentityError::Rejected),
            s => {
                warn!(status = %s, "identity provider returned error status");
                return Err(IdentityError::Status(s.as_u16()));
            }
        }

        let user: KakaoUser = res
            .json()
            .await
            .map_err(|e| IdentityError::Payload(e.to_string()))?;
        debug!(external_id = user.id, "external identity fetched");
        Ok(user.into())
    }
}
