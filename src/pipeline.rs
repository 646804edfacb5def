//! Pipeline orchestration
//!
//! This module provides the public API for Learnpulse. It wires the stages
//! together: windowing → base aggregation → interaction composition →
//! assembly, with an optional label join for the training path.
//!
//! `compute_feature_table` is the single computation behind both output
//! modes. Training and lookup-time precompute must never diverge on a
//! windowing or aggregation rule, so both call sites run through this one
//! function and differ only in what they do with the table.

use std::collections::BTreeMap;

use crate::aggregate::BaseAggregator;
use crate::compose::InteractionComposer;
use crate::labels::derive_labels;
use crate::schema::{RawEvent, RawSubmission};
use crate::types::{FeatureVector, RunManifest, TrainingSet, FEATURE_NAMES};
use crate::window::{build_windows, filter_events, filter_submissions};

/// Per-user feature table, keyed by user id
pub type FeatureTable = BTreeMap<u64, FeatureVector>;

/// Compute the 19-feature vector for every user with at least one event.
///
/// Deterministic: identical input slices produce an identical table, including
/// iteration order, whether run for training or for precompute.
pub fn compute_feature_table(
    events: &[RawEvent],
    submissions: &[RawSubmission],
) -> FeatureTable {
    let windows = build_windows(events);
    let windowed_events = filter_events(events, &windows);
    let windowed_submissions = filter_submissions(submissions, &windows);

    let base = BaseAggregator::aggregate(&windows, &windowed_events, &windowed_submissions);

    base.into_iter()
        .map(|(user_id, base)| {
            let derived = InteractionComposer::compose(&base);
            (user_id, FeatureVector::from_parts(base, derived))
        })
        .collect()
}

/// Build the training set: feature table joined with completion labels.
///
/// Indeterminate users (still active, not passed) are excluded entirely; the
/// remaining users' `passed_course` becomes the binary target. Rows stay
/// aligned with `user_ids` and `targets` by index.
pub fn build_training_set(events: &[RawEvent], submissions: &[RawSubmission]) -> TrainingSet {
    let table = compute_feature_table(events, submissions);
    let labels = derive_labels(events);

    let mut user_ids = Vec::new();
    let mut rows = Vec::new();
    let mut targets = Vec::new();

    for (user_id, vector) in &table {
        // Every window holder has events, so a label always exists.
        let label = match labels.get(user_id) {
            Some(label) => label,
            None => continue,
        };
        if label.is_indeterminate() {
            continue;
        }
        user_ids.push(*user_id);
        rows.push(vector.to_row());
        targets.push(u8::from(label.passed_course));
    }

    TrainingSet {
        manifest: RunManifest::new(),
        feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        user_ids,
        rows,
        targets,
    }
}
