//! The approval relay: validate, translate, forward once, report.

use std::sync::Arc;

use chrono::Utc;

use crate::engine::EngineTransport;
use crate::errors::RelayError;
use crate::models::approval::{ApprovalRequest, ApprovalStatus, DecisionPolicy, RelayResult};
use crate::models::message::EngineMessage;

#[derive(Clone)]
pub struct ApprovalRelay {
    transport: Arc<dyn EngineTransport>,
    policy: DecisionPolicy,
}

impl ApprovalRelay {
    pub fn new(transport: Arc<dyn EngineTransport>, policy: DecisionPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Relay one decision to the workflow engine.
    ///
    /// Missing parameters fail before any outbound call. Otherwise exactly one
    /// call is made; its failure is terminal for this request.
    pub async fn handle_approval(
        &self,
        process_instance_id: Option<&str>,
        decision: Option<&str>,
    ) -> Result<RelayResult, RelayError> {
        let request = ApprovalRequest::validate(process_instance_id, decision).map_err(|e| {
            tracing::warn!(error = %e, "rejecting approval request");
            e
        })?;
        self.relay(request).await
    }

    pub async fn relay(&self, request: ApprovalRequest) -> Result<RelayResult, RelayError> {
        let approved = self.policy.is_approved(&request.decision);
        let transport = self.transport.kind();

        tracing::debug!(
            process_instance_id = %request.process_instance_id,
            decision = %request.decision,
            approved,
            %transport,
            status = ?ApprovalStatus::Pending,
            "relaying decision"
        );

        let message = EngineMessage::approval(&request.process_instance_id, &request.decision, approved);

        match self.transport.deliver(&message).await {
            Ok(()) => {
                tracing::info!(
                    process_instance_id = %request.process_instance_id,
                    decision = %request.decision,
                    approved,
                    %transport,
                    "decision recorded"
                );
                Ok(RelayResult {
                    status: ApprovalStatus::Recorded,
                    process_instance_id: request.process_instance_id,
                    decision: request.decision,
                    approved,
                    transport,
                    recorded_at: Utc::now(),
                })
            }
            Err(e) => {
                tracing::error!(
                    process_instance_id = %request.process_instance_id,
                    decision = %request.decision,
                    %transport,
                    status = ?ApprovalStatus::Failed,
                    error = %e.detail(),
                    "could not relay decision to workflow engine"
                );
                Err(RelayError::RelayFailed(e))
            }
        }
    }
}
