//! Service error types and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credit_score_core::ScoringError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors raised while configuring or starting the service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Request-level failure rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InvalidInput(message) => Self::bad_request(message),
            ScoringError::ModelUnavailable(message) => Self::service_unavailable(message),
            other => {
                // details stay in the log; the client gets a generic message
                error!(error = %other, "prediction failed");
                Self::internal("prediction failed due to an internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_errors_map_to_statuses() {
        let invalid: ApiError = ScoringError::invalid_input("bad").into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message(), "bad");

        let unavailable: ApiError = ScoringError::unavailable("no model").into();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let failed: ApiError = ScoringError::inference("secret detail").into();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!failed.message().contains("secret"));
    }
}
