pub mod correlate;
pub mod publish;
pub mod webhook;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use url::Url;

use crate::config::{EngineConfig, TransportKind};
use crate::errors::TransportError;
use crate::models::message::EngineMessage;

pub use correlate::CorrelateTransport;
pub use publish::PublishTransport;
pub use webhook::WebhookTransport;

/// Abstraction over the ways a decision reaches the workflow engine.
/// Implementations: [`CorrelateTransport`] (REST message correlation),
/// [`WebhookTransport`] (connector URL), [`PublishTransport`] (message publication).
///
/// `deliver` issues exactly one engine call and never retries.
#[async_trait]
pub trait EngineTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn deliver(&self, message: &EngineMessage) -> Result<(), TransportError>;
}

/// Build the transport selected by configuration.
pub fn build_transport(engine: &EngineConfig) -> anyhow::Result<Arc<dyn EngineTransport>> {
    let client = http_client()?;

    let transport: Arc<dyn EngineTransport> = match engine {
        EngineConfig::Correlate {
            base_url,
            api_token,
            message_name,
        } => Arc::new(CorrelateTransport::new(
            client,
            base_url,
            api_token.clone(),
            message_name.clone(),
        )?),
        EngineConfig::Webhook { url } => Arc::new(WebhookTransport::new(client, url.clone())),
        EngineConfig::Publish {
            api_url,
            oauth_url,
            audience,
            client_id,
            client_secret,
            message_name,
            ttl_ms,
        } => Arc::new(PublishTransport::new(
            client,
            api_url,
            publish::OAuthCredentials {
                token_url: oauth_url.clone(),
                audience: audience.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            },
            message_name.clone(),
            *ttl_ms,
        )?),
    };

    tracing::debug!(transport = %transport.kind(), "engine transport ready");
    Ok(transport)
}

/// Shared HTTP client. Timeouts are left at reqwest's defaults.
pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("approval-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build engine HTTP client")
}

/// Append `path` to `base`, keeping any path prefix `base` already has.
pub(crate) fn join_endpoint(base: &Url, path: &str) -> anyhow::Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .with_context(|| format!("cannot join '{}' onto {}", path, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_endpoint_without_prefix() {
        let base = Url::parse("https://engine.example.com").unwrap();
        let url = join_endpoint(&base, "/api/v1/message").unwrap();
        assert_eq!(url.as_str(), "https://engine.example.com/api/v1/message");
    }

    #[test]
    fn test_join_endpoint_keeps_prefix() {
        let base = Url::parse("https://bru-2.zeebe.camunda.io/cluster-1").unwrap();
        let url = join_endpoint(&base, "v2/messages/publication").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bru-2.zeebe.camunda.io/cluster-1/v2/messages/publication"
        );
    }

    #[test]
    fn test_build_transport_matches_config() {
        let engine = EngineConfig::Webhook {
            url: Url::parse("https://hooks.example.com/inbound/abc").unwrap(),
        };
        let transport = build_transport(&engine).unwrap();
        assert_eq!(transport.kind(), TransportKind::Webhook);
    }
}
