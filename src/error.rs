//! Error handling module
//!
//! Centralized error types and HTTP response conversion.
//!
//! Error responses carry a plain message string; the client renders it
//! verbatim, and the HTTP status communicates the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::event_store::EventStoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account is closed")]
    AccountClosed,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Concurrent modification detected, please retry")]
    VersionConflict,

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EventStoreError> for AppError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::ConcurrencyConflict { .. } | EventStoreError::MaxRetriesExceeded => {
                AppError::VersionConflict
            }
            EventStoreError::AggregateNotFound(id) => AppError::AccountNotFound(id.to_string()),
            EventStoreError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            // 400 Bad Request
            AppError::Validation(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::AccountNotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::AccountClosed => StatusCode::CONFLICT,
            AppError::InsufficientFunds => StatusCode::CONFLICT,
            AppError::VersionConflict => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
