//! Base feature aggregation
//!
//! Second pipeline stage: computes the 13 directly aggregated per-user
//! statistics from the windowed logs. Each signal is its own accumulator pass
//! over the input; the passes are then assembled over the window-holder
//! universe, zero-filling any user a pass did not touch. Zero-filling is the
//! documented missing-data policy here, not an error fallback; nothing else
//! in this stage can fail.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::schema::{RawEvent, RawSubmission, StepAction, SubmissionStatus};
use crate::types::{BaseFeatures, ObservationWindow};

/// Additive smoothing term for `correct_ratio`
pub const CORRECT_RATIO_EPSILON: f64 = 1e-10;

/// Length of the "first day" slice of a user's window
const FIRST_DAY_SEC: i64 = 86_400;

/// Aggregator for the base per-user statistics
pub struct BaseAggregator;

impl BaseAggregator {
    /// Compute base features for every user that holds a window.
    ///
    /// `events` and `submissions` must already be windowed; per-user record
    /// order must be ingestion order, which the tie-break rules below rely on.
    pub fn aggregate(
        windows: &BTreeMap<u64, ObservationWindow>,
        events: &[RawEvent],
        submissions: &[RawSubmission],
    ) -> BTreeMap<u64, BaseFeatures> {
        let days = distinct_submission_days(submissions);
        let steps = distinct_steps_tried(submissions);
        let statuses = submission_status_counts(submissions);
        let first_try = first_attempt_correct_counts(submissions);
        let last_correct = last_submission_correct(submissions);
        let actions = event_action_counts(events);
        let activity = event_time_stats(events);

        windows
            .keys()
            .map(|&user_id| {
                let days = days.get(&user_id).copied().unwrap_or(0) as f64;
                let steps_tried = steps.get(&user_id).copied().unwrap_or(0) as f64;

                let counts = statuses.get(&user_id).copied().unwrap_or_default();
                let correct = counts.correct as f64;
                let wrong = counts.wrong as f64;
                let correct_ratio = correct / (correct + wrong + CORRECT_RATIO_EPSILON);

                let action_counts = actions.get(&user_id).copied().unwrap_or_default();
                let viewed = action_counts.viewed as f64;
                let passed = action_counts.passed as f64;
                let view_to_pass_ratio = passed / (viewed + 1.0);

                let first_try_correct = first_try.get(&user_id).copied().unwrap_or(0) as f64;
                let first_try_ratio = first_try_correct / (steps_tried + 1.0);

                let stats = activity.get(&user_id);
                let active_hours = stats
                    .map(|s| (s.max_ts - s.min_ts) as f64 / 3600.0)
                    .unwrap_or(0.0);
                let first_day_ratio = stats
                    .map(|s| s.first_day as f64 / s.total.max(1) as f64)
                    .unwrap_or(0.0);

                let last_sub_correct = if last_correct.get(&user_id).copied().unwrap_or(false) {
                    1.0
                } else {
                    0.0
                };

                let attempts_per_step = (correct + wrong) / (steps_tried + 1.0);

                (
                    user_id,
                    BaseFeatures {
                        days,
                        steps_tried,
                        correct,
                        wrong,
                        correct_ratio,
                        viewed,
                        passed,
                        view_to_pass_ratio,
                        first_try_ratio,
                        active_hours,
                        last_sub_correct,
                        attempts_per_step,
                        first_day_ratio,
                    },
                )
            })
            .collect()
    }
}

/// Count of distinct UTC submission days per user
fn distinct_submission_days(submissions: &[RawSubmission]) -> HashMap<u64, u32> {
    let mut days: HashMap<u64, HashSet<i64>> = HashMap::new();
    for submission in submissions {
        days.entry(submission.user_id)
            .or_default()
            .insert(submission.timestamp.div_euclid(FIRST_DAY_SEC));
    }
    days.into_iter().map(|(u, d)| (u, d.len() as u32)).collect()
}

/// Count of distinct steps with at least one submission per user
fn distinct_steps_tried(submissions: &[RawSubmission]) -> HashMap<u64, u32> {
    let mut steps: HashMap<u64, HashSet<u64>> = HashMap::new();
    for submission in submissions {
        steps
            .entry(submission.user_id)
            .or_default()
            .insert(submission.step_id);
    }
    steps.into_iter().map(|(u, s)| (u, s.len() as u32)).collect()
}

/// Correct/wrong submission counts per user
#[derive(Debug, Clone, Copy, Default)]
struct StatusCounts {
    correct: u32,
    wrong: u32,
}

/// Count `correct` and `wrong` submissions per user.
///
/// Statuses outside those two count toward neither.
fn submission_status_counts(submissions: &[RawSubmission]) -> HashMap<u64, StatusCounts> {
    let mut counts: HashMap<u64, StatusCounts> = HashMap::new();
    for submission in submissions {
        let entry = counts.entry(submission.user_id).or_default();
        match submission.status {
            SubmissionStatus::Correct => entry.correct += 1,
            SubmissionStatus::Wrong => entry.wrong += 1,
            _ => {}
        }
    }
    counts
}

/// Count first attempts that were correct per user.
///
/// The first attempt for a (user, step) pair is the submission with the
/// earliest timestamp; equal timestamps resolve to the first-ingested record.
fn first_attempt_correct_counts(submissions: &[RawSubmission]) -> HashMap<u64, u32> {
    let mut first: HashMap<(u64, u64), (i64, bool)> = HashMap::new();
    for submission in submissions {
        let key = (submission.user_id, submission.step_id);
        let candidate = (submission.timestamp, submission.status.is_correct());
        match first.get(&key).copied() {
            Some((best_ts, _)) if submission.timestamp >= best_ts => {}
            _ => {
                first.insert(key, candidate);
            }
        }
    }

    let mut counts: HashMap<u64, u32> = HashMap::new();
    for ((user_id, _), (_, correct)) in first {
        if correct {
            *counts.entry(user_id).or_default() += 1;
        }
    }
    counts
}

/// Whether each user's latest submission was correct.
///
/// The latest submission is the one with the maximum timestamp; equal
/// timestamps resolve to the first-ingested record among the maxima.
fn last_submission_correct(submissions: &[RawSubmission]) -> HashMap<u64, bool> {
    let mut last: HashMap<u64, (i64, bool)> = HashMap::new();
    for submission in submissions {
        let candidate = (submission.timestamp, submission.status.is_correct());
        match last.get(&submission.user_id).copied() {
            Some((best_ts, _)) if submission.timestamp <= best_ts => {}
            _ => {
                last.insert(submission.user_id, candidate);
            }
        }
    }
    last.into_iter().map(|(u, (_, c))| (u, c)).collect()
}

/// Viewed/passed event counts per user
#[derive(Debug, Clone, Copy, Default)]
struct ActionCounts {
    viewed: u32,
    passed: u32,
}

fn event_action_counts(events: &[RawEvent]) -> HashMap<u64, ActionCounts> {
    let mut counts: HashMap<u64, ActionCounts> = HashMap::new();
    for event in events {
        let entry = counts.entry(event.user_id).or_default();
        match event.action {
            StepAction::Viewed => entry.viewed += 1,
            StepAction::Passed => entry.passed += 1,
            _ => {}
        }
    }
    counts
}

/// Event timing statistics per user
#[derive(Debug, Clone, Copy)]
struct EventTimeStats {
    min_ts: i64,
    max_ts: i64,
    /// Total windowed events
    total: u32,
    /// Events within 24h of the user's first event
    first_day: u32,
}

fn event_time_stats(events: &[RawEvent]) -> HashMap<u64, EventTimeStats> {
    let mut stats: HashMap<u64, EventTimeStats> = HashMap::new();
    for event in events {
        stats
            .entry(event.user_id)
            .and_modify(|s| {
                s.min_ts = s.min_ts.min(event.timestamp);
                s.max_ts = s.max_ts.max(event.timestamp);
            })
            .or_insert(EventTimeStats {
                min_ts: event.timestamp,
                max_ts: event.timestamp,
                total: 0,
                first_day: 0,
            });
    }

    // First-day membership needs the per-user minimum, hence the second pass.
    for event in events {
        if let Some(s) = stats.get_mut(&event.user_id) {
            s.total += 1;
            if event.timestamp < s.min_ts + FIRST_DAY_SEC {
                s.first_day += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SubmissionStatus;
    use crate::window::build_windows;
    use pretty_assertions::assert_eq;

    fn event(user_id: u64, timestamp: i64, action: StepAction) -> RawEvent {
        RawEvent {
            user_id,
            step_id: 500,
            timestamp,
            action,
        }
    }

    fn submission(
        user_id: u64,
        step_id: u64,
        timestamp: i64,
        status: SubmissionStatus,
    ) -> RawSubmission {
        RawSubmission {
            user_id,
            step_id,
            timestamp,
            status,
        }
    }

    fn aggregate_single_user(
        events: Vec<RawEvent>,
        submissions: Vec<RawSubmission>,
    ) -> BaseFeatures {
        let windows = build_windows(&events);
        let features = BaseAggregator::aggregate(&windows, &events, &submissions);
        *features.get(&1).expect("user 1 missing from aggregation")
    }

    #[test]
    fn test_distinct_days_and_steps() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 100, SubmissionStatus::Wrong),
            submission(1, 10, 200, SubmissionStatus::Correct),
            submission(1, 11, 86_400 + 100, SubmissionStatus::Correct),
        ];

        let features = aggregate_single_user(events, submissions);
        assert_eq!(features.days, 2.0);
        assert_eq!(features.steps_tried, 2.0);
    }

    #[test]
    fn test_status_counts_ignore_unknown_statuses() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 100, SubmissionStatus::Correct),
            submission(1, 10, 200, SubmissionStatus::Wrong),
            submission(1, 10, 300, SubmissionStatus::Other("pending".to_string())),
        ];

        let features = aggregate_single_user(events, submissions);
        assert_eq!(features.correct, 1.0);
        assert_eq!(features.wrong, 1.0);
        // Unknown status still wins the last-submission slot without counting.
        assert_eq!(features.last_sub_correct, 0.0);
    }

    #[test]
    fn test_correct_ratio_is_zero_for_no_submissions() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let features = aggregate_single_user(events, vec![]);
        assert_eq!(features.correct_ratio, 0.0);
        assert_eq!(features.attempts_per_step, 0.0);
    }

    #[test]
    fn test_view_to_pass_ratio_bias() {
        let events = vec![
            event(1, 0, StepAction::Viewed),
            event(1, 10, StepAction::Viewed),
            event(1, 20, StepAction::Passed),
        ];
        let features = aggregate_single_user(events, vec![]);
        assert!((features.view_to_pass_ratio - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_try_ratio_uses_earliest_attempt() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 200, SubmissionStatus::Correct), // later, ignored
            submission(1, 10, 100, SubmissionStatus::Wrong),   // first attempt
            submission(1, 11, 300, SubmissionStatus::Correct), // first attempt
        ];

        let features = aggregate_single_user(events, submissions);
        // One first-try success over steps_tried(2) + 1
        assert!((features.first_try_ratio - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_attempt_tie_resolves_to_first_ingested() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 100, SubmissionStatus::Wrong),
            submission(1, 10, 100, SubmissionStatus::Correct), // same timestamp, later row
        ];

        let features = aggregate_single_user(events, submissions);
        assert_eq!(features.first_try_ratio, 0.0);
    }

    #[test]
    fn test_last_submission_tie_resolves_to_first_ingested() {
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 100, SubmissionStatus::Correct),
            submission(1, 11, 100, SubmissionStatus::Wrong), // same max timestamp
        ];

        let features = aggregate_single_user(events, submissions);
        assert_eq!(features.last_sub_correct, 1.0);
    }

    #[test]
    fn test_active_hours_span() {
        let events = vec![
            event(1, 1_000, StepAction::Viewed),
            event(1, 1_000 + 7_200, StepAction::Viewed),
        ];
        let features = aggregate_single_user(events, vec![]);
        assert_eq!(features.active_hours, 2.0);
    }

    #[test]
    fn test_active_hours_zero_for_single_event() {
        let events = vec![event(1, 1_000, StepAction::Viewed)];
        let features = aggregate_single_user(events, vec![]);
        assert_eq!(features.active_hours, 0.0);
    }

    #[test]
    fn test_first_day_ratio() {
        let events = vec![
            event(1, 0, StepAction::Viewed),
            event(1, 86_399, StepAction::Viewed),  // still first day
            event(1, 86_400, StepAction::Viewed),  // second day
            event(1, 100_000, StepAction::Viewed), // second day
        ];
        let features = aggregate_single_user(events, vec![]);
        assert_eq!(features.first_day_ratio, 0.5);
    }

    #[test]
    fn test_missing_passes_zero_fill() {
        // User 2 holds a window but appears in no submission pass at all.
        let events = vec![
            event(1, 0, StepAction::Viewed),
            event(2, 0, StepAction::Passed),
        ];
        let submissions = vec![submission(1, 10, 100, SubmissionStatus::Correct)];

        let windows = build_windows(&events);
        let features = BaseAggregator::aggregate(&windows, &events, &submissions);

        let user2 = features.get(&2).unwrap();
        assert_eq!(user2.days, 0.0);
        assert_eq!(user2.correct, 0.0);
        assert_eq!(user2.wrong, 0.0);
        assert_eq!(user2.viewed, 0.0);
        assert_eq!(user2.passed, 1.0);
        assert_eq!(user2.last_sub_correct, 0.0);
    }

    #[test]
    fn test_no_wrong_submissions_in_whole_dataset() {
        // The "wrong" category can be entirely absent from a run; the column
        // degrades to zero instead of aborting.
        let events = vec![event(1, 0, StepAction::Viewed)];
        let submissions = vec![
            submission(1, 10, 100, SubmissionStatus::Correct),
            submission(1, 11, 200, SubmissionStatus::Correct),
        ];

        let features = aggregate_single_user(events, submissions);
        assert_eq!(features.wrong, 0.0);
        assert!((features.correct_ratio - 1.0).abs() < 1e-9);
    }
}
