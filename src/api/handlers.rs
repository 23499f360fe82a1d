use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, Uri},
    response::Response,
    Json,
};
use serde::Deserialize;

use super::render::{self, ApiError, Format};
use crate::errors::RelayError;
use crate::models::approval::ApprovalParams;
use crate::AppState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DecisionQuery {
    pub decision: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /approval?processInstanceId=..&decision=.. — plain text
pub async fn approval_from_query(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ApprovalParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let format = Format::Text;
    let Query(params) = params.map_err(|e| state.reject(format, e.body_text()))?;

    relay(
        &state,
        format,
        params.process_instance_id.as_deref(),
        params.decision.as_deref(),
    )
    .await
}

/// GET /approve/:processInstanceId?decision=.. — HTML page
pub async fn approval_page(
    State(state): State<Arc<AppState>>,
    process_instance_id: Result<Path<String>, PathRejection>,
    query: Result<Query<DecisionQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let format = Format::Html;
    let Path(process_instance_id) =
        process_instance_id.map_err(|e| state.reject(format, e.body_text()))?;
    let Query(query) = query.map_err(|e| state.reject(format, e.body_text()))?;

    relay(
        &state,
        format,
        Some(process_instance_id.as_str()),
        query.decision.as_deref(),
    )
    .await
}

/// POST /approve with `{processInstanceId, decision}` — JSON
pub async fn approval_from_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApprovalParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let format = Format::Json;
    let Json(params) = payload.map_err(|e| {
        tracing::warn!("approval_from_json: rejected body: {}", e.body_text());
        state.reject(format, e.body_text())
    })?;

    relay(
        &state,
        format,
        params.process_instance_id.as_deref(),
        params.decision.as_deref(),
    )
    .await
}

pub async fn route_not_found(uri: Uri) -> ApiError {
    tracing::debug!("no route for {}", uri.path());
    ApiError::new(
        Format::Json,
        RelayError::RouteNotFound(uri.path().to_string()),
        false,
    )
}

// Wrong-method answers, one per approval route so the content type matches.

pub async fn wrong_method_text(method: Method, uri: Uri) -> ApiError {
    method_not_allowed(Format::Text, method, uri)
}

pub async fn wrong_method_html(method: Method, uri: Uri) -> ApiError {
    method_not_allowed(Format::Html, method, uri)
}

pub async fn wrong_method_json(method: Method, uri: Uri) -> ApiError {
    method_not_allowed(Format::Json, method, uri)
}

fn method_not_allowed(format: Format, method: Method, uri: Uri) -> ApiError {
    tracing::debug!("{} not allowed on {}", method, uri.path());
    ApiError::new(
        format,
        RelayError::MethodNotAllowed {
            method: method.to_string(),
            path: uri.path().to_string(),
        },
        false,
    )
}

pub async fn health() -> &'static str {
    "ok"
}

async fn relay(
    state: &AppState,
    format: Format,
    process_instance_id: Option<&str>,
    decision: Option<&str>,
) -> Result<Response, ApiError> {
    let result = state
        .relay
        .handle_approval(process_instance_id, decision)
        .await
        .map_err(|e| ApiError::new(format, e, state.expose_error_detail))?;

    Ok(render::success(format, &result))
}

impl AppState {
    fn reject(&self, format: Format, reason: String) -> ApiError {
        ApiError::new(
            format,
            RelayError::InvalidRequest(reason),
            self.expose_error_detail,
        )
    }
}
