use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::{
    bookings::BookingError, payment_events::PaymentEventError, settlement::SettlementError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Builds the JSON error body shared by every route.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });

    (status, body).into_response()
}

/// Failures raised by the HTTP layer itself, before a use case runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(_) => error_response(StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => error_response(StatusCode::FORBIDDEN, "access denied"),
            AppError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            // Don't leak internal error detail to client
            AppError::Internal(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Renders a use-case failure. A 500 never carries the underlying cause.
fn usecase_failure(status: StatusCode, message: String) -> Response {
    if status.is_server_error() {
        error!(%message, "http: request failed");
        return error_response(status, "Internal server error");
    }
    error_response(status, message)
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        usecase_failure(self.status_code(), self.to_string())
    }
}

impl IntoResponse for SettlementError {
    fn into_response(self) -> Response {
        usecase_failure(self.status_code(), self.to_string())
    }
}

impl IntoResponse for PaymentEventError {
    fn into_response(self) -> Response {
        usecase_failure(self.status_code(), self.to_string())
    }
}
