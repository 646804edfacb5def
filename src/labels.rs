//! Completion label derivation
//!
//! Training-only stage: derives a binary completion label and a dropout flag
//! per user from the full, unwindowed event log. Users that are neither gone
//! nor passed are indeterminate (still active, outcome unknown) and are
//! excluded from training entirely; that exclusion is a hard rule applied in
//! the assembler, not a heuristic.

use std::collections::BTreeMap;

use crate::schema::{RawEvent, StepAction};
use crate::types::CompletionLabel;

/// Inactivity gap after which a user counts as gone
pub const DROPOUT_GAP_SEC: i64 = 30 * 86_400;

/// Passed-step count above which a user counts as having completed the course.
///
/// Domain threshold for this course's step count; not configurable.
pub const COURSE_PASS_THRESHOLD: u32 = 170;

/// Derive labels for every user in the (unwindowed) event log.
///
/// `now` is the maximum timestamp across the whole log, so "gone" is relative
/// to the dataset snapshot, not the wall clock.
pub fn derive_labels(events: &[RawEvent]) -> BTreeMap<u64, CompletionLabel> {
    let mut last_seen: BTreeMap<u64, i64> = BTreeMap::new();
    let mut passed_counts: BTreeMap<u64, u32> = BTreeMap::new();

    for event in events {
        last_seen
            .entry(event.user_id)
            .and_modify(|last| {
                if event.timestamp > *last {
                    *last = event.timestamp;
                }
            })
            .or_insert(event.timestamp);

        if event.action == StepAction::Passed {
            *passed_counts.entry(event.user_id).or_default() += 1;
        }
    }

    let now = match last_seen.values().max() {
        Some(&max) => max,
        None => return BTreeMap::new(),
    };

    last_seen
        .into_iter()
        .map(|(user_id, last)| {
            let passed_count = passed_counts.get(&user_id).copied().unwrap_or(0);
            (
                user_id,
                CompletionLabel {
                    passed_course: passed_count > COURSE_PASS_THRESHOLD,
                    is_gone_user: now - last > DROPOUT_GAP_SEC,
                },
            )
        })
        .collect()
}
