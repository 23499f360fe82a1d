//! Forwarding through a pre-provisioned connector (webhook) URL.
//!
//! The URL itself is the credential, so no auth header is sent. The raw
//! decision token is forwarded; the connector decides what it means.

use async_trait::async_trait;
use url::Url;

use super::EngineTransport;
use crate::config::TransportKind;
use crate::errors::TransportError;
use crate::models::message::EngineMessage;

pub struct WebhookTransport {
    client: reqwest::Client,
    url: Url,
}

impl WebhookTransport {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Connector URL with the decision appended. Existing query pairs are kept.
    fn request_url(&self, message: &EngineMessage) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("processInstanceId", &message.correlation_key)
            .append_pair("decision", &message.decision);
        url
    }
}

#[async_trait]
impl EngineTransport for WebhookTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Webhook
    }

    async fn deliver(&self, message: &EngineMessage) -> Result<(), TransportError> {
        let resp = self.client.get(self.request_url(message)).send().await?;

        if !resp.status().is_success() {
            return Err(TransportError::from_response(resp).await);
        }

        // The URL is a secret; log the host only.
        tracing::debug!(
            host = self.url.host_str().unwrap_or_default(),
            status = %resp.status(),
            "webhook accepted decision"
        );
        Ok(())
    }
}
