//! course.activity.v1 schema definition
//!
//! Input schema for course-platform activity logs: step events (views, passes)
//! and quiz submissions. Both record kinds arrive as flat tabular rows, one
//! record per row, and may contain duplicates that must be preserved.

use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "course.activity.v1";

/// Step actions recorded by the platform.
///
/// The set is open: production logs carry at least `discovered`,
/// `started_attempt`, `viewed`, and `passed`, and new actions may appear
/// without a schema bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Viewed,
    Passed,
    Discovered,
    StartedAttempt,
    /// For actions not known to this engine
    #[serde(untagged)]
    Other(String),
}

impl StepAction {
    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Viewed => "viewed",
            StepAction::Passed => "passed",
            StepAction::Discovered => "discovered",
            StepAction::StartedAttempt => "started_attempt",
            StepAction::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for StepAction {
    fn from(s: &str) -> Self {
        match s {
            "viewed" => StepAction::Viewed,
            "passed" => StepAction::Passed,
            "discovered" => StepAction::Discovered,
            "started_attempt" => StepAction::StartedAttempt,
            other => StepAction::Other(other.to_string()),
        }
    }
}

/// Submission grading outcome.
///
/// Statuses outside `correct`/`wrong` count toward neither counter but still
/// participate in first-attempt and last-submission selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Correct,
    Wrong,
    /// For statuses not known to this engine
    #[serde(untagged)]
    Other(String),
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionStatus::Correct => "correct",
            SubmissionStatus::Wrong => "wrong",
            SubmissionStatus::Other(name) => name.as_str(),
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, SubmissionStatus::Correct)
    }
}

impl From<&str> for SubmissionStatus {
    fn from(s: &str) -> Self {
        match s {
            "correct" => SubmissionStatus::Correct,
            "wrong" => SubmissionStatus::Wrong,
            other => SubmissionStatus::Other(other.to_string()),
        }
    }
}

/// A single step interaction event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub user_id: u64,
    pub step_id: u64,
    /// Epoch seconds
    pub timestamp: i64,
    pub action: StepAction,
}

impl RawEvent {
    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp < 0 {
            return Err(ValidationError::NegativeTimestamp {
                timestamp: self.timestamp,
            });
        }
        if self.action.as_str().is_empty() {
            return Err(ValidationError::EmptyAction);
        }
        Ok(())
    }
}

/// A single quiz submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    pub user_id: u64,
    pub step_id: u64,
    /// Epoch seconds
    pub timestamp: i64,
    #[serde(rename = "submission_status")]
    pub status: SubmissionStatus,
}

impl RawSubmission {
    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp < 0 {
            return Err(ValidationError::NegativeTimestamp {
                timestamp: self.timestamp,
            });
        }
        if self.status.as_str().is_empty() {
            return Err(ValidationError::EmptyStatus);
        }
        Ok(())
    }
}

/// Validation errors for activity records
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Negative timestamp: {timestamp}")]
    NegativeTimestamp { timestamp: i64 },

    #[error("Empty action string")]
    EmptyAction,

    #[error("Empty submission status string")]
    EmptyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_action_serialization() {
        let action = StepAction::StartedAttempt;
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, "\"started_attempt\"");

        let parsed: StepAction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StepAction::StartedAttempt);
    }

    #[test]
    fn test_unknown_action_round_trip() {
        let parsed: StepAction = serde_json::from_str("\"bookmarked\"").unwrap();
        assert_eq!(parsed, StepAction::Other("bookmarked".to_string()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"bookmarked\"");
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "user_id": 17,
            "step_id": 32815,
            "timestamp": 1434340848,
            "action": "viewed"
        }"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.user_id, 17);
        assert_eq!(event.step_id, 32815);
        assert_eq!(event.action, StepAction::Viewed);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_submission_status_field_name() {
        let json = r#"{
            "user_id": 17,
            "step_id": 31971,
            "timestamp": 1434341791,
            "submission_status": "wrong"
        }"#;

        let sub: RawSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Wrong);
        assert!(!sub.status.is_correct());

        let back = serde_json::to_string(&sub).unwrap();
        assert!(back.contains("\"submission_status\":\"wrong\""));
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let event = RawEvent {
            user_id: 1,
            step_id: 2,
            timestamp: -5,
            action: StepAction::Viewed,
        };
        assert!(matches!(
            event.validate(),
            Err(ValidationError::NegativeTimestamp { timestamp: -5 })
        ));
    }

    #[test]
    fn test_empty_action_rejected() {
        let event = RawEvent {
            user_id: 1,
            step_id: 2,
            timestamp: 0,
            action: StepAction::Other(String::new()),
        };
        assert!(matches!(event.validate(), Err(ValidationError::EmptyAction)));
    }
}
