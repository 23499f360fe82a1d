use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TransportKind;
use crate::errors::RelayError;

/// Raw inbound parameters, as extracted from a query string, route or JSON body.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalParams {
    pub process_instance_id: Option<String>,
    pub decision: Option<String>,
}

/// A validated decision: both fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub process_instance_id: String,
    pub decision: String,
}

impl ApprovalRequest {
    /// Checks that both parameters are present. Empty strings count as missing;
    /// no other syntactic validation is done.
    pub fn validate(
        process_instance_id: Option<&str>,
        decision: Option<&str>,
    ) -> Result<Self, RelayError> {
        let process_instance_id = process_instance_id.filter(|s| !s.is_empty());
        let decision = decision.filter(|s| !s.is_empty());

        match (process_instance_id, decision) {
            (Some(id), Some(decision)) => Ok(Self {
                process_instance_id: id.to_string(),
                decision: decision.to_string(),
            }),
            (id, decision) => {
                let mut missing = Vec::with_capacity(2);
                if id.is_none() {
                    missing.push("processInstanceId");
                }
                if decision.is_none() {
                    missing.push("decision");
                }
                Err(RelayError::missing(&missing))
            }
        }
    }
}

impl TryFrom<&ApprovalParams> for ApprovalRequest {
    type Error = RelayError;

    fn try_from(params: &ApprovalParams) -> Result<Self, Self::Error> {
        ApprovalRequest::validate(
            params.process_instance_id.as_deref(),
            params.decision.as_deref(),
        )
    }
}

/// Maps a decision token to the boolean the workflow engine expects.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    approved_token: String,
}

impl DecisionPolicy {
    pub fn new(approved_token: impl Into<String>) -> Self {
        Self {
            approved_token: approved_token.into(),
        }
    }

    pub fn approved_token(&self) -> &str {
        &self.approved_token
    }

    /// Exact, case-sensitive comparison against the positive token.
    pub fn is_approved(&self, decision: &str) -> bool {
        decision == self.approved_token
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Recorded,
    Failed,
}

/// What was recorded on the engine, for the caller-facing layer to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResult {
    pub status: ApprovalStatus,
    pub process_instance_id: String,
    pub decision: String,
    pub approved: bool,
    pub transport: TransportKind,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_both_present() {
        let req = ApprovalRequest::validate(Some("abc-123"), Some("approved")).unwrap();
        assert_eq!(req.process_instance_id, "abc-123");
        assert_eq!(req.decision, "approved");
    }

    #[test]
    fn test_validate_names_missing_instance_id() {
        let err = ApprovalRequest::validate(None, Some("rejected")).unwrap_err();
        match err {
            RelayError::MissingParameter(names) => assert_eq!(names, "processInstanceId"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_treats_empty_as_missing() {
        let err = ApprovalRequest::validate(Some(""), Some("")).unwrap_err();
        match err {
            RelayError::MissingParameter(names) => {
                assert_eq!(names, "processInstanceId, decision")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_does_not_check_id_format() {
        assert!(ApprovalRequest::validate(Some("not a uuid!"), Some("x")).is_ok());
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: ApprovalParams =
            serde_json::from_str(r#"{"processInstanceId":"p1","decision":"Approved"}"#).unwrap();
        let req = ApprovalRequest::try_from(&params).unwrap();
        assert_eq!(req.process_instance_id, "p1");
        assert_eq!(req.decision, "Approved");
    }

    #[test]
    fn test_policy_is_case_sensitive() {
        let policy = DecisionPolicy::new("approved");
        assert!(policy.is_approved("approved"));
        assert!(!policy.is_approved("Approved"));
        assert!(!policy.is_approved("APPROVED"));
        assert!(!policy.is_approved("approve"));
        assert!(!policy.is_approved("rejected"));
        assert!(!policy.is_approved(" approved"));
    }

    #[test]
    fn test_policy_custom_token() {
        let policy = DecisionPolicy::new("Approved");
        assert!(policy.is_approved("Approved"));
        assert!(!policy.is_approved("approved"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = RelayResult {
            status: ApprovalStatus::Recorded,
            process_instance_id: "abc".into(),
            decision: "approved".into(),
            approved: true,
            transport: TransportKind::Webhook,
            recorded_at: Utc::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "recorded");
        assert_eq!(json["processInstanceId"], "abc");
        assert_eq!(json["transport"], "webhook");
        assert!(json.get("recordedAt").is_some());
    }
}
