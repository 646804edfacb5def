//! Derived feature composition
//!
//! Third pipeline stage: computes the six frozen interaction/power terms from
//! the base statistics. The term list was selected once, offline, by feature
//! importance and is hardcoded here; a generic degree-2 expansion would change
//! model semantics and must not be substituted.

use crate::types::{BaseFeatures, DerivedFeatures};

/// Composer for the frozen interaction terms
pub struct InteractionComposer;

impl InteractionComposer {
    /// Compute the six derived terms from already-assembled base features.
    ///
    /// Base inputs are finite by construction (zero-filled upstream), so every
    /// product here is finite too.
    pub fn compose(base: &BaseFeatures) -> DerivedFeatures {
        DerivedFeatures {
            view_to_pass_by_active_hours: base.view_to_pass_ratio * base.active_hours,
            days_by_first_try_ratio: base.days * base.first_try_ratio,
            wrong_by_viewed: base.wrong * base.viewed,
            days_by_wrong: base.days * base.wrong,
            wrong_squared: base.wrong * base.wrong,
            steps_tried_by_viewed: base.steps_tried * base.viewed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_base() -> BaseFeatures {
        BaseFeatures {
            days: 2.0,
            steps_tried: 3.0,
            correct: 4.0,
            wrong: 1.0,
            correct_ratio: 0.8,
            viewed: 10.0,
            passed: 2.0,
            view_to_pass_ratio: 2.0 / 11.0,
            first_try_ratio: 0.75,
            active_hours: 5.5,
            last_sub_correct: 1.0,
            attempts_per_step: 1.25,
            first_day_ratio: 0.6,
        }
    }

    #[test]
    fn test_products_match_base_inputs() {
        let base = make_base();
        let derived = InteractionComposer::compose(&base);

        assert_eq!(
            derived.view_to_pass_by_active_hours,
            base.view_to_pass_ratio * base.active_hours
        );
        assert_eq!(derived.days_by_first_try_ratio, base.days * base.first_try_ratio);
        assert_eq!(derived.wrong_by_viewed, base.wrong * base.viewed);
        assert_eq!(derived.days_by_wrong, base.days * base.wrong);
        assert_eq!(derived.steps_tried_by_viewed, base.steps_tried * base.viewed);
    }

    #[test]
    fn test_wrong_squared_is_exact_square() {
        let mut base = make_base();
        base.wrong = 7.0;
        let derived = InteractionComposer::compose(&base);
        assert_eq!(derived.wrong_squared, 49.0);
    }

    #[test]
    fn test_zero_base_yields_zero_terms() {
        let derived = InteractionComposer::compose(&BaseFeatures::default());
        assert_eq!(derived, DerivedFeatures::default());
    }
}
