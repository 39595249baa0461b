//! Error taxonomy for the account service
//!
//! Every fallible operation surfaces one of these variants; the mapping to
//! HTTP status codes lives here, at the transport boundary, and nowhere
//! else. Failures serialize into the uniform envelope
//! `{statusCode, message, success: false, errors}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application error taxonomy
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or empty required field
    #[error("{0}")]
    Validation(String),

    /// Duplicate username or email
    #[error("{0}")]
    Conflict(String),

    /// No matching user or channel
    #[error("{0}")]
    NotFound(String),

    /// Bad password, or bad/absent/mismatched token
    #[error("{0}")]
    Auth(String),

    /// Media store did not produce a durable URL
    #[error("{0}")]
    Upload(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected internal failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The status code each error kind maps to at the transport boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal messages are logged for operator visibility, not leaked
        let message = match &self {
            AppError::Database(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(e) => {
                error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
            "success": false,
            "errors": [],
        }));

        (status, body).into_response()
    }
}

/// Type alias for account service results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_to_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Upload("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failure_envelope_shape() {
        let response = AppError::Conflict("User already exists".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_messages_are_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("secret connection string"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
