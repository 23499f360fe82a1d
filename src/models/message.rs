//! Outbound message payloads.
//!
//! [`EngineMessage`] is transport-neutral; each transport turns it into the
//! wire shape its endpoint expects.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Variable name the approval flag is delivered under.
pub const APPROVED_VARIABLE: &str = "approved";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineMessage {
    /// Identifies the waiting process instance (the `processInstanceId`).
    pub correlation_key: String,
    /// The raw decision token, forwarded untouched by the webhook transport.
    pub decision: String,
    pub variables: Map<String, Value>,
}

impl EngineMessage {
    pub fn approval(process_instance_id: &str, decision: &str, approved: bool) -> Self {
        let mut variables = Map::new();
        variables.insert(APPROVED_VARIABLE.to_string(), Value::Bool(approved));
        Self {
            correlation_key: process_instance_id.to_string(),
            decision: decision.to_string(),
            variables,
        }
    }

    /// Connectivity probe: carries `test: true` and no approval flag.
    pub fn probe(correlation_key: &str) -> Self {
        let mut variables = Map::new();
        variables.insert("test".to_string(), Value::Bool(true));
        Self {
            correlation_key: correlation_key.to_string(),
            decision: "probe".to_string(),
            variables,
        }
    }
}

/// A variable in the engine REST API's typed form: `{"value": .., "type": ".."}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypedVariable {
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&Value> for TypedVariable {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => TypedVariable {
                value: Value::Null,
                kind: "Null",
            },
            Value::Bool(_) => TypedVariable {
                value: value.clone(),
                kind: "Boolean",
            },
            Value::Number(n) if n.is_i64() || n.is_u64() => TypedVariable {
                value: value.clone(),
                kind: "Long",
            },
            Value::Number(_) => TypedVariable {
                value: value.clone(),
                kind: "Double",
            },
            Value::String(_) => TypedVariable {
                value: value.clone(),
                kind: "String",
            },
            Value::Array(_) | Value::Object(_) => TypedVariable {
                value: Value::String(value.to_string()),
                kind: "Json",
            },
        }
    }
}

/// Body for the message-correlation endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationBody<'a> {
    pub message_name: &'a str,
    pub process_instance_id: &'a str,
    pub variables: BTreeMap<&'a str, TypedVariable>,
}

impl<'a> CorrelationBody<'a> {
    pub fn new(message_name: &'a str, message: &'a EngineMessage) -> Self {
        let variables = message
            .variables
            .iter()
            .map(|(name, value)| (name.as_str(), TypedVariable::from(value)))
            .collect();
        Self {
            message_name,
            process_instance_id: &message.correlation_key,
            variables,
        }
    }
}

/// Body for the message-publication endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationBody<'a> {
    pub name: &'a str,
    pub correlation_key: &'a str,
    pub time_to_live: u64,
    pub variables: &'a Map<String, Value>,
}

impl<'a> PublicationBody<'a> {
    pub fn new(name: &'a str, ttl_ms: u64, message: &'a EngineMessage) -> Self {
        Self {
            name,
            correlation_key: &message.correlation_key,
            time_to_live: ttl_ms,
            variables: &message.variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_correlation_body_shape() {
        let msg = EngineMessage::approval("abc-123", "approved", true);
        let body = serde_json::to_value(CorrelationBody::new("managerApprovalResponse", &msg)).unwrap();
        assert_eq!(
            body,
            json!({
                "messageName": "managerApprovalResponse",
                "processInstanceId": "abc-123",
                "variables": { "approved": { "value": true, "type": "Boolean" } }
            })
        );
    }

    #[test]
    fn test_publication_body_shape() {
        let msg = EngineMessage::approval("abc-123", "rejected", false);
        let body = serde_json::to_value(PublicationBody::new("managerApprovalResponse", 60_000, &msg)).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "managerApprovalResponse",
                "correlationKey": "abc-123",
                "timeToLive": 60000,
                "variables": { "approved": false }
            })
        );
    }

    #[test]
    fn test_typed_variable_kinds() {
        assert_eq!(TypedVariable::from(&json!(42)).kind, "Long");
        assert_eq!(TypedVariable::from(&json!(1.5)).kind, "Double");
        assert_eq!(TypedVariable::from(&json!("x")).kind, "String");
        assert_eq!(TypedVariable::from(&Value::Null).kind, "Null");

        let nested = TypedVariable::from(&json!({"a": 1}));
        assert_eq!(nested.kind, "Json");
        assert_eq!(nested.value, json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_probe_has_no_approval_flag() {
        let msg = EngineMessage::probe("key-1");
        assert_eq!(msg.variables.get("test"), Some(&Value::Bool(true)));
        assert!(msg.variables.get(APPROVED_VARIABLE).is_none());
    }
}
