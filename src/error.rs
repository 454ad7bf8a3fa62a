//! Domain error types for DevScan.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::SqlErr;
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Unique-constraint violation on insert
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found (locally or upstream)
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No usable GitHub access token; the user must sign in again
    #[error("GitHub access token missing. Please reconnect your GitHub account.")]
    CredentialMissing,

    /// GitHub network failure or non-2xx response
    #[error("GitHub API unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Explicit client-side timeout exceeded
    #[error("Analysis timeout: the AI took too long. Try analyzing smaller code chunks.")]
    Timeout,

    /// Analysis service refused the connection
    #[error("AI service is not available. Please try again later.")]
    ServiceUnavailable,

    /// Any other analysis relay failure
    #[error("Failed to analyze code with AI: {0}")]
    AnalysisFailed(String),
}

impl AppError {
    /// Whether a bounded retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::UpstreamUnavailable(_))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::CredentialMissing => (StatusCode::UNAUTHORIZED, "CREDENTIAL_MISSING"),
            AppError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            AppError::Timeout => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            AppError::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            AppError::AnalysisFailed(_) => (StatusCode::BAD_GATEWAY, "ANALYSIS_FAILED"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.status_and_code();

        let response_message = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                "An internal database error occurred".to_string()
            }
            AppError::UpstreamUnavailable(msg) | AppError::AnalysisFailed(msg) => {
                tracing::warn!("{}: {}", error_code, msg);
                self.to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}
