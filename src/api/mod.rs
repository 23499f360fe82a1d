use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::AppState;

pub mod handlers;
pub mod render;

/// Build the relay router: the three approval shapes, health probes and a
/// JSON 404 fallback.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/approval",
            get(handlers::approval_from_query).fallback(handlers::wrong_method_text),
        )
        .route(
            "/approve/:process_instance_id",
            get(handlers::approval_page).fallback(handlers::wrong_method_html),
        )
        .route(
            "/approve",
            post(handlers::approval_from_json).fallback(handlers::wrong_method_json),
        )
        // Health endpoints
        .route("/healthz", get(handlers::health))
        .route("/readyz", get(handlers::health))
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows callers to correlate errors with relay logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %req_id);

    let mut resp = next.run(req).instrument(span).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: security headers on every response. Decision pages are
/// opened from email links, so they must not be framed, sniffed or cached.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; style-src 'unsafe-inline'"),
    );
    headers.remove(header::SERVER);

    resp
}
