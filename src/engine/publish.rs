//! Message publication through the engine's client API.
//!
//! Authenticates with the OAuth2 client-credentials grant. The access token is
//! cached until shortly before it expires; a 401 from the engine drops it so
//! the next request fetches a fresh one.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::{join_endpoint, EngineTransport};
use crate::config::TransportKind;
use crate::errors::{error_chain, TransportError};
use crate::models::message::{EngineMessage, PublicationBody};

const PUBLICATION_PATH: &str = "v2/messages/publication";

/// Refresh this long before the token's advertised expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

#[derive(Clone)]
pub struct OAuthCredentials {
    pub token_url: Url,
    pub audience: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct PublishTransport {
    client: reqwest::Client,
    endpoint: Url,
    credentials: OAuthCredentials,
    message_name: String,
    ttl_ms: u64,
    token: Mutex<Option<CachedToken>>,
}

impl PublishTransport {
    pub fn new(
        client: reqwest::Client,
        api_url: &Url,
        credentials: OAuthCredentials,
        message_name: String,
        ttl_ms: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            endpoint: join_endpoint(api_url, PUBLICATION_PATH)?,
            credentials,
            message_name,
            ttl_ms,
            token: Mutex::new(None),
        })
    }

    /// Return the cached access token, fetching a new one if absent or expired.
    /// The lock is held across the fetch so concurrent requests share one refresh.
    async fn access_token(&self) -> Result<String, TransportError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, TransportError> {
        let creds = &self.credentials;
        let resp = self
            .client
            .post(creds.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("audience", creds.audience.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                TransportError::Auth(format!(
                    "token request failed: {}",
                    error_chain(&e.without_url())
                ))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| {
                TransportError::Auth(format!(
                    "invalid token response: {}",
                    error_chain(&e.without_url())
                ))
            })?;

        let lifetime = token
            .expires_in
            .unwrap_or(0)
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);

        tracing::debug!(
            client_id = %creds.client_id,
            expires_in_secs = lifetime,
            "obtained engine access token"
        );

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl EngineTransport for PublishTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Publish
    }

    async fn deliver(&self, message: &EngineMessage) -> Result<(), TransportError> {
        let access_token = self.access_token().await?;
        let body = PublicationBody::new(&self.message_name, self.ttl_ms, message);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
            }
            return Err(TransportError::from_response(resp).await);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            message_name = %self.message_name,
            ttl_ms = self.ttl_ms,
            status = %status,
            "message published"
        );
        Ok(())
    }
}
