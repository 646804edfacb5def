//! Activity log ingestion
//!
//! Parses event and submission logs from the platform's export formats:
//! CSV (the canonical export), NDJSON, and JSON arrays. Parsing is strict:
//! a malformed row aborts the run rather than silently dropping data.

use crate::error::EngineError;
use crate::schema::record::{
    RawEvent, RawSubmission, StepAction, SubmissionStatus, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Adapter for reading activity logs into typed records
pub struct ActivityLogAdapter;

impl ActivityLogAdapter {
    /// Parse a JSON array of events
    pub fn parse_events_array(json: &str) -> Result<Vec<RawEvent>, EngineError> {
        let events: Vec<RawEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse newline-delimited JSON events
    pub fn parse_events_ndjson(ndjson: &str) -> Result<Vec<RawEvent>, EngineError> {
        parse_ndjson(ndjson)
    }

    /// Parse a CSV event export (`user_id,step_id,timestamp,action`)
    pub fn parse_events_csv(data: &str) -> Result<Vec<RawEvent>, EngineError> {
        let rows: Vec<EventRow> = parse_csv(data)?;
        Ok(rows.into_iter().map(RawEvent::from).collect())
    }

    /// Parse a JSON array of submissions
    pub fn parse_submissions_array(json: &str) -> Result<Vec<RawSubmission>, EngineError> {
        let submissions: Vec<RawSubmission> = serde_json::from_str(json)?;
        Ok(submissions)
    }

    /// Parse newline-delimited JSON submissions
    pub fn parse_submissions_ndjson(ndjson: &str) -> Result<Vec<RawSubmission>, EngineError> {
        parse_ndjson(ndjson)
    }

    /// Parse a CSV submission export (`user_id,step_id,timestamp,submission_status`)
    pub fn parse_submissions_csv(data: &str) -> Result<Vec<RawSubmission>, EngineError> {
        let rows: Vec<SubmissionRow> = parse_csv(data)?;
        Ok(rows.into_iter().map(RawSubmission::from).collect())
    }

    /// Validate a batch of events, returning only the failures
    pub fn validate_events(events: &[RawEvent]) -> Vec<ValidationIssue> {
        events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| {
                event.validate().err().map(|error| ValidationIssue {
                    index,
                    user_id: event.user_id,
                    error,
                })
            })
            .collect()
    }

    /// Validate a batch of submissions, returning only the failures
    pub fn validate_submissions(submissions: &[RawSubmission]) -> Vec<ValidationIssue> {
        submissions
            .iter()
            .enumerate()
            .filter_map(|(index, submission)| {
                submission.validate().err().map(|error| ValidationIssue {
                    index,
                    user_id: submission.user_id,
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug)]
pub struct ValidationIssue {
    pub index: usize,
    pub user_id: u64,
    pub error: ValidationError,
}

fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, EngineError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(EngineError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(records)
}

fn parse_csv<T: DeserializeOwned>(data: &str) -> Result<Vec<T>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut records = Vec::new();
    for (row_num, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(EngineError::ParseError(format!(
                    "Failed to parse row {}: {}",
                    row_num + 2,
                    e
                )));
            }
        }
    }
    Ok(records)
}

/// CSV row shape for events; `action` is converted through the open-set enum
#[derive(Debug, Deserialize)]
struct EventRow {
    user_id: u64,
    step_id: u64,
    timestamp: i64,
    action: String,
}

impl From<EventRow> for RawEvent {
    fn from(row: EventRow) -> Self {
        RawEvent {
            user_id: row.user_id,
            step_id: row.step_id,
            timestamp: row.timestamp,
            action: StepAction::from(row.action.as_str()),
        }
    }
}

/// CSV row shape for submissions
#[derive(Debug, Deserialize)]
struct SubmissionRow {
    user_id: u64,
    step_id: u64,
    timestamp: i64,
    submission_status: String,
}

impl From<SubmissionRow> for RawSubmission {
    fn from(row: SubmissionRow) -> Self {
        RawSubmission {
            user_id: row.user_id,
            step_id: row.step_id,
            timestamp: row.timestamp,
            status: SubmissionStatus::from(row.submission_status.as_str()),
        }
    }
}
