use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;
use crate::mealdb::MealDbError;
use crate::storage::StorageError;
use crate::units::ConversionError;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Core(#[from] crate::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Core(e.into())
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Core(e.into())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Core(e.into())
    }
}

impl From<MealDbError> for AppError {
    fn from(e: MealDbError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<ConversionError> for AppError {
    fn from(e: ConversionError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use crate::Error;

        match self {
            AppError::Unauthorized { code, .. } => (StatusCode::UNAUTHORIZED, *code),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::Core(e) => match e {
                Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                Error::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                Error::Llm(LlmError::NotConfigured) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "llm_not_configured")
                }
                Error::Llm(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
                Error::Storage(StorageError::TooLarge { .. }) => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
                }
                Error::Storage(s) if s.is_client_error() => {
                    (StatusCode::BAD_REQUEST, "invalid_upload")
                }
                Error::Storage(_) | Error::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Internal details stay in the log
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!(error = %self, "upstream failure");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
