use credit_score_core::ScoringError;
use thiserror::Error;

/// Errors returned by the offline analyzer.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl AnalyzerError {
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        Self::Dataset(message.into())
    }

    pub fn analysis<S: Into<String>>(message: S) -> Self {
        Self::Analysis(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
