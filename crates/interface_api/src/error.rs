//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use core_kernel::CoreError;
use engine_batch::{BatchError, ChannelError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String, Vec<String>),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None),
            ApiError::Validation(msg, details) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg, Some(details))
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidBatch(_) | BatchError::InvalidClaim(_) => ApiError::BadRequest(err.to_string()),
            BatchError::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            BatchError::InvalidState(CoreError::Configuration(msg)) => {
                ApiError::ServiceUnavailable(format!("Fraud detection system not available: {}", msg))
            }
            BatchError::InvalidState(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<ChannelError> for ApiError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        ApiError::Validation("Request failed validation".to_string(), details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::TaskId;

    #[test]
    fn test_batch_errors_map_to_status_codes() {
        let cases = [
            (BatchError::invalid_batch("empty"), StatusCode::BAD_REQUEST),
            (BatchError::TaskNotFound(TaskId::new()), StatusCode::NOT_FOUND),
            (
                BatchError::InvalidState(CoreError::configuration("no scorers configured")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (BatchError::InvalidState(CoreError::invalid_state("x")), StatusCode::CONFLICT),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }
}
