//! Error types for the scoring core

use thiserror::Error;

/// Errors raised while validating input, loading artifacts or running inference.
///
/// The variants map one-to-one onto the request-level outcomes of the
/// serving layer: `InvalidInput` is a client mistake, `ModelUnavailable`
/// means the service is degraded, `InferenceFailure` is an opaque per-request
/// failure of the classifier.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Wrong feature count, out-of-range threshold/probability, malformed body
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Classifier or scaler missing, unreadable or structurally invalid
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The classifier could not produce a usable probability
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScoringError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::ModelUnavailable(message.into())
    }

    pub fn inference<S: Into<String>>(message: S) -> Self {
        Self::InferenceFailure(message.into())
    }

    /// True for errors caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type for scoring core operations
pub type Result<T> = std::result::Result<T, ScoringError>;
