//! Direct message correlation over the engine's REST API.

use async_trait::async_trait;
use url::Url;

use super::{join_endpoint, EngineTransport};
use crate::config::TransportKind;
use crate::errors::TransportError;
use crate::models::message::{CorrelationBody, EngineMessage};

const MESSAGE_PATH: &str = "api/v1/message";

pub struct CorrelateTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_token: String,
    message_name: String,
}

impl CorrelateTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: &Url,
        api_token: String,
        message_name: String,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            endpoint: join_endpoint(base_url, MESSAGE_PATH)?,
            api_token,
            message_name,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EngineTransport for CorrelateTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Correlate
    }

    async fn deliver(&self, message: &EngineMessage) -> Result<(), TransportError> {
        let body = CorrelationBody::new(&self.message_name, message);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TransportError::from_response(resp).await);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            message_name = %self.message_name,
            status = %resp.status(),
            "message correlated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> CorrelateTransport {
        CorrelateTransport::new(
            reqwest::Client::new(),
            &Url::parse(&server.uri()).unwrap(),
            "test-token".to_string(),
            "managerApprovalResponse".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_typed_variable_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/message"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "messageName": "managerApprovalResponse",
                "processInstanceId": "abc-123",
                "variables": { "approved": { "value": true, "type": "Boolean" } }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .deliver(&EngineMessage::approval("abc-123", "approved", true))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/message"))
            .respond_with(ResponseTemplate::new(503).set_body_string("cluster unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server)
            .deliver(&EngineMessage::approval("xyz", "approved", true))
            .await
            .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "cluster unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_request_error() {
        let transport = CorrelateTransport::new(
            reqwest::Client::new(),
            &Url::parse("http://127.0.0.1:1").unwrap(),
            "t".to_string(),
            "m".to_string(),
        )
        .unwrap();

        let err = transport
            .deliver(&EngineMessage::approval("xyz", "approved", true))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }
}
