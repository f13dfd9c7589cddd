use crate::config::ConfigError;
use crate::ordering::OrderingError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Ordering(OrderingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Ordering(err) => write!(f, "ordering error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Ordering(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Ordering(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Ordering(err) if err.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Ordering(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<OrderingError> for AppError {
    fn from(value: OrderingError) -> Self {
        Self::Ordering(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_errors_map_to_client_and_retry_statuses() {
        let bad = AppError::from(OrderingError::MissingParameter).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let retry = AppError::from(OrderingError::TransactionAborted(
            crate::ordering::StoreError::LockTimeout,
        ))
        .into_response();
        assert_eq!(retry.status(), StatusCode::SERVICE_UNAVAILABLE);

        let fatal = AppError::from(OrderingError::EmptyScope).into_response();
        assert_eq!(fatal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
