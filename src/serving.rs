//! Serving boundary
//!
//! Lookup-time entry point exposed to the HTTP layer (an external
//! collaborator): validates a feature payload, builds classifier input in
//! schema order, and shapes the response. A feature absent from the request
//! defaults to 0 before matrix construction; a present-but-non-numeric value
//! is a client input error naming the offending key, never a silent coercion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::model::CompletionClassifier;
use crate::types::{FeatureRow, FEATURE_COUNT, FEATURE_NAMES};

/// Prediction request: feature name to value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: HashMap<String, Value>,
}

/// Prediction response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub will_complete: bool,
    /// Probability of completion, rounded to 4 decimal places
    pub probability: f64,
}

/// Prediction service holding the (optionally not-yet-loaded) classifier
pub struct PredictService<M> {
    model: Option<M>,
}

impl<M: CompletionClassifier> PredictService<M> {
    /// Create a service with no model attached yet
    pub fn not_ready() -> Self {
        Self { model: None }
    }

    /// Create a service around a ready model
    pub fn with_model(model: M) -> Self {
        Self { model: Some(model) }
    }

    /// Attach a model, making the service ready
    pub fn attach(&mut self, model: M) {
        self.model = Some(model);
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Run one prediction.
    ///
    /// Fails with `ModelNotReady` before a model is attached and with
    /// `InvalidFeature` on a non-numeric payload value.
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, EngineError> {
        let model = self.model.as_ref().ok_or(EngineError::ModelNotReady)?;

        let rows = [vectorize_features(&request.features)?];
        let prediction = first_of(model.predict(&rows)?)?;
        let probability = first_of(model.predict_proba(&rows)?)?;

        Ok(PredictResponse {
            will_complete: prediction == 1,
            probability: round_probability(probability),
        })
    }
}

/// Build one classifier row from a name→value payload.
///
/// Walks [`FEATURE_NAMES`] in order; unknown extra keys are ignored.
pub fn vectorize_features(features: &HashMap<String, Value>) -> Result<FeatureRow, EngineError> {
    let mut row = [0.0; FEATURE_COUNT];
    for (i, name) in FEATURE_NAMES.iter().enumerate() {
        row[i] = match features.get(*name) {
            None => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| EngineError::InvalidFeature {
                name: (*name).to_string(),
                value: value.to_string(),
            })?,
        };
    }
    Ok(row)
}

fn first_of<T: Copy>(values: Vec<T>) -> Result<T, EngineError> {
    values
        .first()
        .copied()
        .ok_or_else(|| EngineError::ClassifierError("classifier returned no rows".to_string()))
}

fn round_probability(p: f64) -> f64 {
    (p * 10_000.0).round() / 10_000.0
}
