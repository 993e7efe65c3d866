//! Service-level error type bridging database failures and application errors.

use axum::response::{IntoResponse, Response};
use shared::{AppError, ErrorCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by service and repository layers.
///
/// `Db` wraps infrastructure failures (connection loss, constraint violations,
/// serialization). `App` carries a structured application error that maps to a
/// stable error code on the wire.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(#[source] BoxError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => {
                ServiceError::App(AppError::new(ErrorCode::NotFound))
            }
            other => ServiceError::Db(Box::new(other)),
        }
    }
}

impl ServiceError {
    pub fn app(code: ErrorCode) -> Self {
        ServiceError::App(AppError::new(code))
    }

    pub fn app_msg(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError::App(AppError::with_message(code, message))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::App(err) => err.into_response(),
            ServiceError::Db(err) => {
                tracing::error!(error = %err, "database failure");
                AppError::with_message(ErrorCode::DatabaseError, "A database error occurred")
                    .into_response()
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
