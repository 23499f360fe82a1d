//! Caller-facing rendering. Each endpoint has one content type, used for
//! both its success and its error responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::RelayError;
use crate::models::approval::RelayResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Html,
    Json,
}

/// A [`RelayError`] bound to the format of the endpoint that produced it.
#[derive(Debug)]
pub struct ApiError {
    pub format: Format,
    pub error: RelayError,
    pub expose_detail: bool,
}

impl ApiError {
    pub fn new(format: Format, error: RelayError, expose_detail: bool) -> Self {
        Self {
            format,
            error,
            expose_detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let msg = self.error.public_message(self.expose_detail);

        match self.format {
            Format::Text => (status, msg).into_response(),
            Format::Html => (status, Html(html_page("Decision not recorded", &msg))).into_response(),
            Format::Json => {
                let (error_type, code) = self.error.kind();
                let body = Json(json!({
                    "error": {
                        "message": msg,
                        "type": error_type,
                        "code": code,
                    }
                }));
                (status, body).into_response()
            }
        }
    }
}

pub fn success(format: Format, result: &RelayResult) -> Response {
    match format {
        Format::Text => (StatusCode::OK, success_message(result)).into_response(),
        Format::Html => (
            StatusCode::OK,
            Html(html_page("Decision recorded", &success_message(result))),
        )
            .into_response(),
        Format::Json => (StatusCode::OK, Json(result)).into_response(),
    }
}

fn success_message(result: &RelayResult) -> String {
    format!(
        "Your decision ({}) has been recorded for process instance {}, thank you!",
        result.decision, result.process_instance_id
    )
}

fn html_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>body{{font-family:sans-serif;max-width:40em;margin:4em auto;}}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n<p>{message}</p>\n</body>\n</html>\n",
        title = escape_html(title),
        message = escape_html(message),
    )
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
