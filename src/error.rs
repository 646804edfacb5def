//! Error types for Learnpulse

use thiserror::Error;

/// Errors that can occur during feature extraction or serving
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input data not found: {0}")]
    DataNotFound(String),

    #[error("Failed to parse activity record: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Model not ready")]
    ModelNotReady,

    #[error("Invalid feature value for '{name}': {value}")]
    InvalidFeature { name: String, value: String },

    #[error("Classifier error: {0}")]
    ClassifierError(String),
}
