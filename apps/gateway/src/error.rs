use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use labmesh_core::AppError;
use serde::Serialize;
use tracing::error;

/// Gateway error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// Gateway error: an application error, or an upstream that answered unusably.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    BadGateway(String),
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::App(AppError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, format!("validation error: {message}"))
            }
            Self::App(AppError::NotFound(message)) => {
                (StatusCode::NOT_FOUND, format!("not found: {message}"))
            }
            Self::App(AppError::Conflict(message)) => {
                (StatusCode::CONFLICT, format!("conflict: {message}"))
            }
            Self::App(AppError::Unauthorized(_)) => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_owned(),
            ),
            Self::App(AppError::Forbidden(message)) => {
                (StatusCode::FORBIDDEN, format!("forbidden: {message}"))
            }
            Self::App(AppError::Unavailable(detail)) => {
                error!(error = %detail, "upstream unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream temporarily unavailable".to_owned(),
                )
            }
            Self::App(AppError::Internal(detail)) => {
                error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            Self::BadGateway(detail) => {
                error!(error = %detail, "bad gateway");
                (StatusCode::BAD_GATEWAY, "bad gateway".to_owned())
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard gateway result type.
pub type ApiResult<T> = Result<T, ApiError>;
