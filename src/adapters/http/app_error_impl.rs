use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        if self.is_client_error() {
            tracing::warn!(error = %self, "Request rejected");
        } else {
            tracing::error!(error = ?self, "Request failed");
        }

        match self {
            AppError::DuplicateEmail => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::DuplicateEmail,
                "User with this email already exists",
            ),
            AppError::InvalidCredentials => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidCredentials,
                "Invalid email or password",
            ),
            AppError::InvalidRefreshToken => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidRefreshToken,
                "Invalid refresh token",
            ),
            AppError::Unauthenticated => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthenticated,
                "Authentication required",
            ),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, &msg)
            }
            // Details stay in the log
            AppError::StoreUnavailable(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::StoreUnavailable,
                "An unexpected error occurred",
            ),
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "An unexpected error occurred",
            ),
        }
    }
}

/// Malformed or incomplete bodies become a 400 with a fixed message; serde's
/// text stays in the log.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Request body rejected");
        AppError::InvalidInput("Invalid request body".into())
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    let body = serde_json::json!({ "code": code.as_str(), "message": message });
    (status, Json(body)).into_response()
}
