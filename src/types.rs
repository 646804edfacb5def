//! Core types for the Learnpulse pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: observation windows, base aggregates, derived interaction terms,
//! the final feature vector, completion labels, and the training set handed to
//! the classifier.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Number of base (directly aggregated) features
pub const BASE_FEATURE_COUNT: usize = 13;

/// Number of derived (frozen interaction) features
pub const DERIVED_FEATURE_COUNT: usize = 6;

/// Total width of a feature row
pub const FEATURE_COUNT: usize = 19;

/// Base feature names, in wire order
pub const BASE_FEATURE_NAMES: [&str; BASE_FEATURE_COUNT] = [
    "days",
    "steps_tried",
    "correct",
    "wrong",
    "correct_ratio",
    "viewed",
    "passed",
    "view_to_pass_ratio",
    "first_try_ratio",
    "active_hours",
    "last_sub_correct",
    "attempts_per_step",
    "first_day_ratio",
];

/// Derived feature names, in wire order.
///
/// These six terms were selected once, offline, by feature importance and are
/// frozen here. They are not a generic degree-2 expansion of the base set.
pub const DERIVED_FEATURE_NAMES: [&str; DERIVED_FEATURE_COUNT] = [
    "view_to_pass_ratio active_hours",
    "days first_try_ratio",
    "wrong viewed",
    "days wrong",
    "wrong^2",
    "steps_tried viewed",
];

/// The full ordered feature schema: 13 base names followed by 6 derived names.
///
/// Training, precompute, and serving all consult this single constant, and the
/// classifier receives columns in exactly this order. Never reorder.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "days",
    "steps_tried",
    "correct",
    "wrong",
    "correct_ratio",
    "viewed",
    "passed",
    "view_to_pass_ratio",
    "first_try_ratio",
    "active_hours",
    "last_sub_correct",
    "attempts_per_step",
    "first_day_ratio",
    "view_to_pass_ratio active_hours",
    "days first_try_ratio",
    "wrong viewed",
    "days wrong",
    "wrong^2",
    "steps_tried viewed",
];

/// One row of classifier input, columns in [`FEATURE_NAMES`] order
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Per-user observation window: the first three days of recorded activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    /// Minimum event timestamp for the user (epoch seconds)
    pub start: i64,
    /// `start` plus the fixed window length (epoch seconds, inclusive bound)
    pub end: i64,
}

impl ObservationWindow {
    /// Whether a record timestamp falls inside the window
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp <= self.end
    }
}

/// The 13 directly aggregated per-user statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseFeatures {
    /// Count of distinct submission days inside the window
    pub days: f64,
    /// Count of distinct steps with at least one submission
    pub steps_tried: f64,
    /// Count of submissions with status `correct`
    pub correct: f64,
    /// Count of submissions with status `wrong`
    pub wrong: f64,
    /// `correct / (correct + wrong + 1e-10)`
    pub correct_ratio: f64,
    /// Count of events with action `viewed`
    pub viewed: f64,
    /// Count of events with action `passed`
    pub passed: f64,
    /// `passed / (viewed + 1)`
    pub view_to_pass_ratio: f64,
    /// First-attempt successes over `steps_tried + 1`
    pub first_try_ratio: f64,
    /// Event timestamp span in hours
    pub active_hours: f64,
    /// 1 if the latest submission was correct, else 0
    pub last_sub_correct: f64,
    /// `(correct + wrong) / (steps_tried + 1)`
    pub attempts_per_step: f64,
    /// Share of windowed events inside the user's first 24 hours
    pub first_day_ratio: f64,
}

/// The 6 frozen interaction/power terms computed from base features
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// `view_to_pass_ratio * active_hours`
    pub view_to_pass_by_active_hours: f64,
    /// `days * first_try_ratio`
    pub days_by_first_try_ratio: f64,
    /// `wrong * viewed`
    pub wrong_by_viewed: f64,
    /// `days * wrong`
    pub days_by_wrong: f64,
    /// `wrong * wrong`
    pub wrong_squared: f64,
    /// `steps_tried * viewed`
    pub steps_tried_by_viewed: f64,
}

/// The complete 19-value representation of one user.
///
/// Field declaration order matches [`FEATURE_NAMES`], so JSON serialization
/// emits the keys in wire order and `to_row` is a plain positional copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub days: f64,
    pub steps_tried: f64,
    pub correct: f64,
    pub wrong: f64,
    pub correct_ratio: f64,
    pub viewed: f64,
    pub passed: f64,
    pub view_to_pass_ratio: f64,
    pub first_try_ratio: f64,
    pub active_hours: f64,
    pub last_sub_correct: f64,
    pub attempts_per_step: f64,
    pub first_day_ratio: f64,
    #[serde(rename = "view_to_pass_ratio active_hours")]
    pub view_to_pass_by_active_hours: f64,
    #[serde(rename = "days first_try_ratio")]
    pub days_by_first_try_ratio: f64,
    #[serde(rename = "wrong viewed")]
    pub wrong_by_viewed: f64,
    #[serde(rename = "days wrong")]
    pub days_by_wrong: f64,
    #[serde(rename = "wrong^2")]
    pub wrong_squared: f64,
    #[serde(rename = "steps_tried viewed")]
    pub steps_tried_by_viewed: f64,
}

impl FeatureVector {
    /// Assemble the vector from the two stage outputs
    pub fn from_parts(base: BaseFeatures, derived: DerivedFeatures) -> Self {
        Self {
            days: base.days,
            steps_tried: base.steps_tried,
            correct: base.correct,
            wrong: base.wrong,
            correct_ratio: base.correct_ratio,
            viewed: base.viewed,
            passed: base.passed,
            view_to_pass_ratio: base.view_to_pass_ratio,
            first_try_ratio: base.first_try_ratio,
            active_hours: base.active_hours,
            last_sub_correct: base.last_sub_correct,
            attempts_per_step: base.attempts_per_step,
            first_day_ratio: base.first_day_ratio,
            view_to_pass_by_active_hours: derived.view_to_pass_by_active_hours,
            days_by_first_try_ratio: derived.days_by_first_try_ratio,
            wrong_by_viewed: derived.wrong_by_viewed,
            days_by_wrong: derived.days_by_wrong,
            wrong_squared: derived.wrong_squared,
            steps_tried_by_viewed: derived.steps_tried_by_viewed,
        }
    }

    /// Positional row in [`FEATURE_NAMES`] order, ready for the classifier
    pub fn to_row(&self) -> FeatureRow {
        [
            self.days,
            self.steps_tried,
            self.correct,
            self.wrong,
            self.correct_ratio,
            self.viewed,
            self.passed,
            self.view_to_pass_ratio,
            self.first_try_ratio,
            self.active_hours,
            self.last_sub_correct,
            self.attempts_per_step,
            self.first_day_ratio,
            self.view_to_pass_by_active_hours,
            self.days_by_first_try_ratio,
            self.wrong_by_viewed,
            self.days_by_wrong,
            self.wrong_squared,
            self.steps_tried_by_viewed,
        ]
    }

    /// Look up a single value by wire name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_row()[i])
    }
}

/// Completion label derived from the full (unwindowed) log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLabel {
    /// More than 170 `passed` events across the whole log
    pub passed_course: bool,
    /// No activity for more than 30 days as of the dataset's latest timestamp
    pub is_gone_user: bool,
}

impl CompletionLabel {
    /// A still-active user who has not passed: outcome unknown, excluded from
    /// training entirely.
    pub fn is_indeterminate(&self) -> bool {
        !self.is_gone_user && !self.passed_course
    }
}

/// Provenance attached to dataset outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub producer: String,
    pub version: String,
    pub run_id: String,
    pub computed_at_utc: String,
}

impl RunManifest {
    pub fn new() -> Self {
        Self {
            producer: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            run_id: Uuid::new_v4().to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
        }
    }
}

impl Default for RunManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Training matrix plus aligned targets, handed to the external classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSet {
    pub manifest: RunManifest,
    /// Column names, identical to [`FEATURE_NAMES`]
    pub feature_names: Vec<String>,
    /// Row owner per index
    pub user_ids: Vec<u64>,
    /// Feature rows, one per user id
    pub rows: Vec<FeatureRow>,
    /// Binary targets aligned with `rows` (1 = passed the course)
    pub targets: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_vector() -> FeatureVector {
        FeatureVector::from_parts(
            BaseFeatures {
                days: 2.0,
                steps_tried: 3.0,
                correct: 4.0,
                wrong: 1.0,
                correct_ratio: 0.8,
                viewed: 10.0,
                passed: 2.0,
                view_to_pass_ratio: 2.0 / 11.0,
                first_try_ratio: 0.5,
                active_hours: 6.0,
                last_sub_correct: 1.0,
                attempts_per_step: 1.25,
                first_day_ratio: 0.7,
            },
            DerivedFeatures {
                view_to_pass_by_active_hours: 12.0 / 11.0,
                days_by_first_try_ratio: 1.0,
                wrong_by_viewed: 10.0,
                days_by_wrong: 2.0,
                wrong_squared: 1.0,
                steps_tried_by_viewed: 30.0,
            },
        )
    }

    #[test]
    fn test_schema_is_base_then_derived() {
        let mut expected: Vec<&str> = BASE_FEATURE_NAMES.to_vec();
        expected.extend_from_slice(&DERIVED_FEATURE_NAMES);
        assert_eq!(FEATURE_NAMES.to_vec(), expected);
    }

    #[test]
    fn test_serialized_keys_follow_wire_order() {
        let json = serde_json::to_string(&sample_vector()).unwrap();
        let mut last = 0;
        for name in FEATURE_NAMES {
            let needle = format!("\"{}\":", name);
            let pos = json.find(&needle).expect("key missing from payload");
            assert!(pos >= last, "key '{}' out of order", name);
            last = pos;
        }
    }

    #[test]
    fn test_row_matches_named_lookup() {
        let vector = sample_vector();
        let row = vector.to_row();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(vector.get(name), Some(row[i]));
        }
        assert_eq!(vector.get("not_a_feature"), None);
    }

    #[test]
    fn test_vector_round_trip() {
        let vector = sample_vector();
        let json = serde_json::to_string(&vector).unwrap();
        let parsed: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vector);
    }

    #[test]
    fn test_indeterminate_label() {
        let active_not_passed = CompletionLabel {
            passed_course: false,
            is_gone_user: false,
        };
        assert!(active_not_passed.is_indeterminate());

        let gone = CompletionLabel {
            passed_course: false,
            is_gone_user: true,
        };
        assert!(!gone.is_indeterminate());

        let passed = CompletionLabel {
            passed_course: true,
            is_gone_user: false,
        };
        assert!(!passed.is_indeterminate());
    }
}
