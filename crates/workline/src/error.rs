use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::bookings::{BookingServiceError, RepositoryError};

/// Everything the binaries can fail with, from startup through request
/// handling. Engine errors keep their HTTP mapping when the value is
/// rendered as a response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("http server error: {0}")]
    Server(#[from] axum::Error),
    #[error("booking engine error: {0}")]
    Booking(#[from] BookingServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(BookingServiceError::Validation(_))
            | AppError::Booking(BookingServiceError::Transition(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Booking(BookingServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Booking(BookingServiceError::Repository(RepositoryError::Conflict)) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
