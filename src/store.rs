//! Persisted feature lookup table
//!
//! Precompute-mode output: a JSON mapping from user id to the 19-key feature
//! object, consumed by a serving layer via direct key lookup instead of
//! recomputation per request. Publishing is atomic (write to a sibling
//! temporary file, then rename), so a failed run never leaves a partially
//! written table behind.

use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::pipeline::FeatureTable;
use crate::types::FeatureVector;

/// Lookup table of precomputed feature vectors
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: FeatureTable,
}

impl FeatureStore {
    /// Wrap a computed feature table
    pub fn from_table(features: FeatureTable) -> Self {
        Self { features }
    }

    /// Look up one user's features
    pub fn get(&self, user_id: u64) -> Option<&FeatureVector> {
        self.features.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Serialize the bare `user_id -> features` mapping
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(&self.features).map_err(EngineError::JsonError)
    }

    /// Parse a previously persisted table
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let features: FeatureTable = serde_json::from_str(json)?;
        Ok(Self { features })
    }

    /// Persist the table atomically: write `<path>.tmp`, then rename over the
    /// destination.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| EngineError::EncodingError(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path).map_err(|e| {
            EngineError::EncodingError(format!("rename into {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Load a persisted table; a missing file is fatal
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Err(EngineError::DataNotFound(path.display().to_string()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| EngineError::ParseError(format!("read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compute_feature_table;
    use crate::schema::{RawEvent, StepAction};
    use pretty_assertions::assert_eq;

    fn sample_store() -> FeatureStore {
        let events = vec![
            RawEvent {
                user_id: 17,
                step_id: 1,
                timestamp: 100,
                action: StepAction::Viewed,
            },
            RawEvent {
                user_id: 42,
                step_id: 1,
                timestamp: 200,
                action: StepAction::Passed,
            },
        ];
        FeatureStore::from_table(compute_feature_table(&events, &[]))
    }

    #[test]
    fn test_lookup_by_user_id() {
        let store = sample_store();
        assert_eq!(store.len(), 2);
        assert!(store.get(17).is_some());
        assert!(store.get(999).is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let store = sample_store();
        let json = store.to_json().unwrap();
        let loaded = FeatureStore::from_json(&json).unwrap();
        assert_eq!(loaded.get(17), store.get(17));
        assert_eq!(loaded.len(), store.len());
    }

    #[test]
    fn test_table_shape_is_a_bare_mapping() {
        let store = sample_store();
        let json = store.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        let row = object.get("17").unwrap().as_object().unwrap();
        assert_eq!(row.len(), 19);
        assert!(row.contains_key("wrong^2"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_features.json");

        let store = sample_store();
        store.save(&path).unwrap();

        let loaded = FeatureStore::load(&path).unwrap();
        assert_eq!(loaded.len(), store.len());

        // No temporary file lingers after a successful publish.
        assert!(!dir.path().join("users_features.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = FeatureStore::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(EngineError::DataNotFound(_))));
    }
}
