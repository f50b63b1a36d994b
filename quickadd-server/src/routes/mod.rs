pub mod event;
pub mod health;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quickadd_core::QuickAddError;
use serde::Serialize;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            error: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.error, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.error, "rejected request");
        }

        let body = Json(ErrorResponse {
            error: self.error.to_string(),
        });
        (self.status, body).into_response()
    }
}

// Malformed links are the caller's fault; everything else is ours.
impl From<QuickAddError> for AppError {
    fn from(err: QuickAddError) -> Self {
        match err {
            QuickAddError::InvalidUrl(..)
            | QuickAddError::InvalidDate(_)
            | QuickAddError::NotQuickAdd(_) => AppError::bad_request(err),
            other => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: other.into(),
            },
        }
    }
}
