use axum::extract::rejection::JsonRejection;
use thiserror::Error;

use crate::config::ConfigError;
use crate::tasks::TaskError;

/// Application-wide error type.
///
/// Subsystem errors convert into it at the HTTP and CLI edges; the HTTP
/// status mapping lives in `api::middleware::error_handler`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
        message: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Bad request, optionally carrying structured details for the body
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Unprocessable content: {message}")]
    UnprocessableContent { message: String },

    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> Self {
        match error {
            TaskError::UnsupportedSite { site, supported } => {
                let message = TaskError::UnsupportedSite {
                    site: site.clone(),
                    supported: supported.clone(),
                }
                .to_string();
                let supported: Vec<&str> = supported.split(", ").collect();
                AppError::BadRequest {
                    message,
                    details: Some(serde_json::json!({
                        "site": site,
                        "supported": supported,
                    })),
                }
            }
            TaskError::UnknownTask(id) => AppError::NotFound {
                entity: "task".to_string(),
                field: "task_id".to_string(),
                value: id.to_string(),
                message: error.to_string(),
            },
            TaskError::EmptyResult(id) => AppError::NotFound {
                entity: "task_result".to_string(),
                field: "task_id".to_string(),
                value: id.to_string(),
                message: error.to_string(),
            },
            TaskError::Export { .. } => AppError::Internal {
                source: anyhow::Error::new(error),
            },
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            ConfigError::FileNotFound(path) => path.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, reason) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                (field.to_string(), reason)
            })
            .unwrap_or_else(|| ("request".to_string(), errors.to_string()));
        AppError::Validation { field, reason }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::BadRequest {
                message: "Missing or invalid Content-Type header".to_string(),
                details: Some(serde_json::json!({ "expected": "application/json" })),
            },
            JsonRejection::JsonDataError(err) => AppError::UnprocessableContent {
                message: err.body_text(),
            },
            other => AppError::BadRequest {
                message: "Invalid JSON format".to_string(),
                details: Some(serde_json::json!({ "error": other.body_text() })),
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
