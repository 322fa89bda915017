//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values never reach the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in URL encoded forms are redacted and multipart uploads are not logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|header| header.to_str().ok())
        .unwrap_or_default();
    let display_text = request_body_text(content_type, &body_bytes);
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &display_text,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!("Sending response: {}", parts.status),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn request_body_text(content_type: &str, body: &Bytes) -> String {
    if content_type.starts_with("multipart/form-data") {
        return format!("<multipart upload, {} bytes>", body.len());
    }

    let text = String::from_utf8_lossy(body);

    if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_passwords(&text)
    } else {
        text.into_owned()
    }
}

fn redact_passwords(form_text: &str) -> String {
    let Ok(fields) = serde_urlencoded::from_str::<Vec<(String, String)>>(form_text) else {
        return "<unreadable form>".to_owned();
    };

    let fields = fields
        .into_iter()
        .map(|(name, value)| {
            if REDACTED_FIELDS.contains(&name.as_str()) {
                (name, "********".to_owned())
            } else {
                (name, value)
            }
        })
        .collect::<Vec<_>>();

    serde_urlencoded::to_string(fields).unwrap_or_default()
}

fn log_body(message: &str, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect::<String>();
        tracing::info!("{message}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}
