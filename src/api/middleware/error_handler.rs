//! Error handler for converting AppError to HTTP responses.
//!
//! `AppError` renders as a JSON [`ErrorResponse`]; [`global_error_handler`]
//! gives framework-generated errors (unknown route, wrong method) the same
//! shape and stamps every error body with the request id.

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Error bodies larger than this are passed through untouched.
const MAX_ERROR_BODY: usize = 64 * 1024;

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - NotFound → 404
    /// - Validation, BadRequest → 400
    /// - UnprocessableContent → 422
    /// - Configuration, Internal → 500
    fn into_response(self) -> Response {
        let status = error_status(&self);
        let code = error_code(&self);
        let body = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
                message,
            } => ErrorResponse::new(code, message).with_details(json!({
                "entity": entity,
                "field": field,
                "value": value,
            })),
            AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
            AppError::BadRequest { message, details } => {
                let response = ErrorResponse::new(code, message);
                match details {
                    Some(details) => response.with_details(details.clone()),
                    None => response,
                }
            }
            AppError::UnprocessableContent { message } => ErrorResponse::new(code, message),
            AppError::Configuration { key, source } => {
                tracing::error!(key = %key, error = ?source, "Configuration error while serving request");
                ErrorResponse::new(code, &format!("Configuration error: {key}"))
                    .with_details(json!({ "key": key }))
            }
            AppError::Internal { source } => {
                // Details stay in the log; the client only learns that it failed.
                tracing::error!(error = ?source, "Internal error while serving request");
                ErrorResponse::new(code, "An internal error occurred")
            }
        };

        (status, Json(body)).into_response()
    }
}

pub fn error_status(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn error_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::UnprocessableContent { .. } => "UNPROCESSABLE_CONTENT",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Normalizes every 4xx/5xx response into an [`ErrorResponse`] carrying the
/// request id.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let (parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_ERROR_BODY).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let mut payload = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value @ Value::Object(_)) if is_json => value,
        _ => {
            let original = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = if original.is_empty() {
                default_message(status).to_string()
            } else {
                original
            };
            json!(ErrorResponse::new(default_code(status), &message))
        }
    };

    if let (Some(id), Value::Object(map)) = (request_id, &mut payload) {
        map.entry("request_id").or_insert(Value::String(id));
    }

    let mut response = (status, Json(payload)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
    response
}

fn default_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        s if s.is_server_error() => "INTERNAL_SERVER_ERROR",
        _ => "UNKNOWN_ERROR",
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request - invalid or malformed request",
        StatusCode::NOT_FOUND => "The requested resource was not found",
        StatusCode::METHOD_NOT_ALLOWED => "HTTP method not allowed for this endpoint",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported media type",
        StatusCode::PAYLOAD_TOO_LARGE => "Request payload too large",
        StatusCode::REQUEST_TIMEOUT => "Request timeout",
        s if s.is_server_error() => "An internal server error occurred",
        _ => "An unknown error occurred",
    }
}
