use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::models::{MenuKind, RepositoryError, ServiceError};

pub type ApiError = (StatusCode, Json<Value>);

/// JSON error body shared by every endpoint
pub fn error_body(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({
            "error": error,
            "message": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Convert ServiceError to HTTP response
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let (status, error) = match &err {
        ServiceError::CategoryNotFound { .. } | ServiceError::ItemNotFound { .. } => {
            (StatusCode::NOT_FOUND, "Not found")
        }
        ServiceError::InvalidMenuKind { .. } | ServiceError::ValidationError { .. } => {
            (StatusCode::BAD_REQUEST, "Invalid request")
        }
        ServiceError::Upload { .. } => (StatusCode::BAD_REQUEST, "Upload rejected"),
        ServiceError::CategoryNotEmpty { .. } => (StatusCode::CONFLICT, "Category not empty"),
        ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        ServiceError::Repository { source } => {
            return repository_error_to_response(source);
        }
        ServiceError::Configuration { .. } => {
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error",
                "Internal server error",
            );
        }
        ServiceError::ExternalService { .. } => {
            return error_body(
                StatusCode::BAD_GATEWAY,
                "External service error",
                "Upstream storage failed",
            );
        }
    };

    error_body(status, error, err.to_string())
}

fn repository_error_to_response(err: &RepositoryError) -> ApiError {
    let (status, message) = match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
        RepositoryError::ConnectionFailed | RepositoryError::TableNotFound { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
        ),
        RepositoryError::Timeout => (StatusCode::REQUEST_TIMEOUT, "Request timeout"),
        RepositoryError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    };
    error_body(status, "Repository error", message)
}

/// Parse the `:kind` path segment
pub fn parse_kind(kind: &str) -> Result<MenuKind, ApiError> {
    kind.parse::<MenuKind>().map_err(|_| {
        service_error_to_response(ServiceError::InvalidMenuKind {
            kind: kind.to_string(),
        })
    })
}
