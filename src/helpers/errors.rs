use crate::schemas::ErrorResponse;
use axum::{body::Bytes, http::StatusCode, response::Json};
use compute::ComputeError;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use tracing::{error, warn};
use validator::Validate;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

pub fn validation_error(error: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error)
}

/// Runs the `validator` rules of a request body.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ApiError> {
    request.validate().map_err(|e| {
        warn!("Request validation failed: {}", e);
        validation_error(e.to_string())
    })
}

/// Parses a JSON body that may be left out entirely.
///
/// An empty (or blank) body means "no body"; anything else must be valid JSON
/// for `T`, otherwise the request is rejected.
pub fn optional_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        warn!("Malformed request body: {}", e);
        validation_error(format!("Malformed request body: {}", e))
    })
}

pub fn not_found(code: &str, what: &str, id: i32) -> ApiError {
    warn!("{} with ID {} not found", what, id);
    api_error(
        StatusCode::NOT_FOUND,
        code,
        format!("{} with id {} does not exist", what, id),
    )
}

/// Logs the underlying error and hides it behind a generic message.
pub fn database_error(message: &str, e: impl Display) -> ApiError {
    error!("{}: {}", message, e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", message)
}

pub fn from_compute_error(e: ComputeError) -> ApiError {
    match e {
        ComputeError::Database(db_err) => database_error("Database operation failed", db_err),
        ComputeError::Validation(message) | ComputeError::Date(message) => {
            warn!("Rejected request: {}", message);
            validation_error(message)
        }
        e @ ComputeError::NoOccurrence { .. } => {
            warn!("Rejected request: {}", e);
            api_error(StatusCode::BAD_REQUEST, "NO_OCCURRENCE", e.to_string())
        }
        e @ ComputeError::Lifecycle { .. } => {
            warn!("Rejected lifecycle change: {}", e);
            api_error(StatusCode::CONFLICT, "INVALID_STATE_TRANSITION", e.to_string())
        }
        ComputeError::Materialization(message) => {
            error!("Unexpected materialization error: {}", message);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_ERROR", message)
        }
    }
}
