use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use fiesta_db::StoreError;

/// Every failure a handler can surface. The `IntoResponse` impl is the
/// single place where failures become wire responses, so the same error
/// always renders the same status and message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// Unknown user and wrong password collapse into this one variant so
    /// the response cannot reveal which half was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not authenticated")]
    Unauthorized,

    #[error("admin access required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("setup already completed")]
    SetupAlreadyComplete,

    /// Backing store or mail relay unreachable; the caller may retry.
    #[error("service unavailable")]
    Unavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Admin access required".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::DuplicateUsername => {
                (StatusCode::CONFLICT, "Username already exists".to_string())
            }
            ApiError::SetupAlreadyComplete => {
                (StatusCode::BAD_REQUEST, "Setup already completed".to_string())
            }
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable. Please try again later.".to_string(),
            ),
            ApiError::Internal(detail) => {
                // The detail stays in the logs; clients get a generic body.
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            StoreError::SetupAlreadyComplete => ApiError::SetupAlreadyComplete,
            StoreError::Unavailable(detail) => {
                warn!(%detail, "storage unavailable");
                ApiError::Unavailable
            }
            StoreError::Corrupt(detail) => ApiError::Internal(format!("corrupt record: {detail}")),
        }
    }
}
