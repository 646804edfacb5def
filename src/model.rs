//! Classifier boundary
//!
//! The completion classifier is an external collaborator (a gradient-boosted
//! tree model in production). The engine only depends on this trait: rows go
//! in with columns in [`crate::types::FEATURE_NAMES`] order, predictions and
//! class-1 probabilities come out. Training, serialization, and loading
//! mechanics live behind the implementation.

use crate::error::EngineError;
use crate::types::FeatureRow;

/// Contract for the external completion classifier
pub trait CompletionClassifier {
    /// Fit on aligned rows and binary targets
    fn fit(&mut self, rows: &[FeatureRow], targets: &[u8]) -> Result<(), EngineError>;

    /// Predict the binary class per row
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<u8>, EngineError>;

    /// Predict the probability of class 1 per row
    fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, EngineError>;
}
