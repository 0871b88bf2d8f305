//! Credential exchange for short-lived access tokens

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::core::Credentials;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credentials missing")]
    CredentialsMissing,

    #[error("response has no access token")]
    MissingToken,

    #[error("invalid credentials (401)")]
    InvalidCredentials,

    #[error("unexpected response {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("malformed token response: {0}")]
    InvalidResponse(String),

    #[error("authentication server failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Bearer token, valid for one cycle
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Exchanges credentials for an access token
#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access: Option<String>,
}

/// HTTP authenticator with bounded retries on server and transport errors
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    auth_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl AuthClient {
    pub fn new(
        auth_url: impl Into<String>,
        max_attempts: u32,
        retry_delay: Duration,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            auth_url: auth_url.into(),
            max_attempts: max_attempts.max(1),
            retry_delay,
        })
    }

    async fn wait_before_retry(&self, attempt: u32) {
        if attempt < self.max_attempts {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[async_trait]
impl Authenticate for AuthClient {
    #[instrument(skip(self, credentials), fields(url = %self.auth_url, username = %credentials.username))]
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::CredentialsMissing);
        }

        let body = TokenRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        for attempt in 1..=self.max_attempts {
            let response = match self.client.post(&self.auth_url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, max = self.max_attempts, error = %e, "Auth request failed");
                    self.wait_before_retry(attempt).await;
                    continue;
                }
            };

            let status = response.status();
            match status {
                StatusCode::OK => {
                    let parsed: TokenResponse = response
                        .json()
                        .await
                        .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
                    return match parsed.access.filter(|t| !t.is_empty()) {
                        Some(token) => {
                            info!(attempt, "Authenticated");
                            Ok(AccessToken(token))
                        }
                        None => Err(AuthError::MissingToken),
                    };
                }
                StatusCode::UNAUTHORIZED => return Err(AuthError::InvalidCredentials),
                s if s.is_server_error() => {
                    warn!(attempt, max = self.max_attempts, status = %s, "Auth server error");
                    self.wait_before_retry(attempt).await;
                }
                s => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AuthError::UnexpectedStatus {
                        status: s.as_u16(),
                        body,
                    });
                }
            }
        }

        Err(AuthError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
