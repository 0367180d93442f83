//! Rewind API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rewind_core::error::DomainError;
use rewind_ledger::application::errors::LedgerError;
use rewind_ledger::domain::errors::AccountError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `LedgerError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(LedgerError::Domain(err))
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
        DomainError::InvalidVersion { .. } => (StatusCode::BAD_REQUEST, "invalid_version"),
        DomainError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, "concurrency_conflict"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::UnknownEventType(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "unknown_event_type")
        }
        DomainError::Deserialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "deserialization_error")
        }
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    }
}

fn account_status(err: &AccountError) -> (StatusCode, &'static str) {
    let code = match err {
        AccountError::InvalidArgument(_) => "invalid_argument",
        AccountError::InvalidAmount(_) => "invalid_amount",
        AccountError::InsufficientFunds { .. } => "insufficient_funds",
        AccountError::NotOpened => "not_opened",
        AccountError::AccountClosed => "account_closed",
        AccountError::AlreadyClosed => "already_closed",
        AccountError::NoChange => "no_change",
    };
    (StatusCode::BAD_REQUEST, code)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            LedgerError::Domain(err) => domain_status(err),
            LedgerError::Account(err) => account_status(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
