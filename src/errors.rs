use axum::http::StatusCode;
use thiserror::Error;

/// Failure of the single outbound call to the workflow engine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL is stripped on conversion: connector URLs carry credentials.
    #[error("request to workflow engine failed")]
    Request(#[source] reqwest::Error),

    #[error("workflow engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication with workflow engine failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.without_url())
    }
}

impl TransportError {
    /// The error and all of its sources, joined with `": "`.
    pub fn detail(&self) -> String {
        error_chain(self)
    }

    /// Build a `Status` error from a non-success response, consuming its body.
    pub async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        TransportError::Status { status, body }
    }
}

/// Render an error with its full source chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(err)
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("relay failed: {0}")]
    RelayFailed(#[from] TransportError),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },
}

impl RelayError {
    /// Missing-parameter error naming every absent field, in declaration order.
    pub fn missing(names: &[&str]) -> Self {
        RelayError::MissingParameter(names.join(", "))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingParameter(_) | RelayError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::RelayFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            RelayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// `(type, code)` pair used in JSON error bodies.
    pub fn kind(&self) -> (&'static str, &'static str) {
        match self {
            RelayError::MissingParameter(_) => ("invalid_request_error", "missing_parameter"),
            RelayError::InvalidRequest(_) => ("invalid_request_error", "invalid_request"),
            RelayError::RelayFailed(_) => ("upstream_error", "relay_failed"),
            RelayError::RouteNotFound(_) => ("not_found_error", "route_not_found"),
            RelayError::MethodNotAllowed { .. } => {
                ("invalid_request_error", "method_not_allowed")
            }
        }
    }

    /// Caller-facing message. Transport detail is only included when asked for.
    pub fn public_message(&self, expose_detail: bool) -> String {
        match self {
            RelayError::MissingParameter(names) => {
                format!("Missing required parameter: {}", names)
            }
            RelayError::InvalidRequest(reason) => format!("Invalid request: {}", reason),
            RelayError::RelayFailed(e) if expose_detail => {
                format!(
                    "Could not relay the decision to the workflow engine: {}",
                    e.detail()
                )
            }
            RelayError::RelayFailed(_) => {
                "Could not relay the decision to the workflow engine.".to_string()
            }
            RelayError::RouteNotFound(path) => format!("No route for {}", path),
            RelayError::MethodNotAllowed { method, path } => {
                format!("Method {} is not allowed on {}", method, path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_both_parameters() {
        let err = RelayError::missing(&["processInstanceId", "decision"]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(false),
            "Missing required parameter: processInstanceId, decision"
        );
    }

    #[test]
    fn test_relay_failed_hides_detail_by_default() {
        let err = RelayError::from(TransportError::Status {
            status: 503,
            body: "cluster unavailable".into(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message(false).contains("cluster unavailable"));
        assert!(err.public_message(true).contains("503"));
        assert!(err.public_message(true).contains("cluster unavailable"));
    }

    #[tokio::test]
    async fn test_request_error_drops_url_and_keeps_cause() {
        let e = reqwest::get("http://127.0.0.1:1/hooks/SECRET-CONNECTOR-TOKEN?decision=approved")
            .await
            .unwrap_err();
        let err = TransportError::from(e);

        let detail = err.detail();
        assert!(!detail.contains("SECRET-CONNECTOR-TOKEN"), "{}", detail);
        assert!(!detail.contains("decision=approved"), "{}", detail);
        assert!(detail.starts_with("request to workflow engine failed: "), "{}", detail);
        // relay error, reqwest error, and at least the connect cause beneath it
        assert!(anyhow::Chain::new(&err).count() >= 3, "{}", detail);

        let public = RelayError::from(err).public_message(true);
        assert!(!public.contains("SECRET-CONNECTOR-TOKEN"), "{}", public);
    }

    #[test]
    fn test_route_not_found_kind() {
        let err = RelayError::RouteNotFound("/nope".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind().1, "route_not_found");
    }
}
