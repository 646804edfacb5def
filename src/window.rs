//! Observation windowing
//!
//! First pipeline stage: every user with at least one event gets a fixed
//! three-day observation window anchored at their first recorded event, and
//! both logs are cut down to that window. Training and precompute share these
//! functions; there is no second filtering implementation.

use std::collections::BTreeMap;

use crate::schema::{RawEvent, RawSubmission};
use crate::types::ObservationWindow;

/// Fixed observation period: three days from a user's first event
pub const OBSERVATION_WINDOW_SEC: i64 = 3 * 86_400;

/// Compute one window per user appearing in the event log.
///
/// Users absent from the event log get no window and are dropped from all
/// downstream aggregation, together with any submissions they made.
pub fn build_windows(events: &[RawEvent]) -> BTreeMap<u64, ObservationWindow> {
    let mut starts: BTreeMap<u64, i64> = BTreeMap::new();
    for event in events {
        starts
            .entry(event.user_id)
            .and_modify(|start| {
                if event.timestamp < *start {
                    *start = event.timestamp;
                }
            })
            .or_insert(event.timestamp);
    }

    starts
        .into_iter()
        .map(|(user_id, start)| {
            (
                user_id,
                ObservationWindow {
                    start,
                    end: start + OBSERVATION_WINDOW_SEC,
                },
            )
        })
        .collect()
}

/// Keep events inside their owner's window, preserving ingestion order
pub fn filter_events(
    events: &[RawEvent],
    windows: &BTreeMap<u64, ObservationWindow>,
) -> Vec<RawEvent> {
    events
        .iter()
        .filter(|event| {
            windows
                .get(&event.user_id)
                .map(|window| window.contains(event.timestamp))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Keep submissions inside their owner's window, preserving ingestion order.
///
/// Submissions from users with no window (no events at all) are dropped.
pub fn filter_submissions(
    submissions: &[RawSubmission],
    windows: &BTreeMap<u64, ObservationWindow>,
) -> Vec<RawSubmission> {
    submissions
        .iter()
        .filter(|submission| {
            windows
                .get(&submission.user_id)
                .map(|window| window.contains(submission.timestamp))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
