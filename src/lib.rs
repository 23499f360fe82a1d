//! Approval Relay — forwards approval decisions from web forms and email
//! links to a workflow engine.
//!
//! Library crate shared by the binary and the integration tests in `tests/`.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod relay;

use std::sync::Arc;

use engine::EngineTransport;
use models::approval::DecisionPolicy;
use relay::ApprovalRelay;

/// Shared application state passed to handlers. Immutable after startup.
pub struct AppState {
    pub relay: ApprovalRelay,
    pub expose_error_detail: bool,
}

impl AppState {
    pub fn new(transport: Arc<dyn EngineTransport>, cfg: &config::Config) -> Self {
        Self {
            relay: ApprovalRelay::new(transport, DecisionPolicy::new(cfg.approved_token.clone())),
            expose_error_detail: cfg.expose_error_detail,
        }
    }
}
