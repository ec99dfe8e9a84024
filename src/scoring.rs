// Scoring: absolute scoreline error between a prediction and a result.
//
// Lower is better. A missing or malformed side yields no score at all rather
// than a default, so unscored fixtures never pollute totals.

use crate::model::Scoreline;

/// Error between two parsed scorelines: `|ph - rh| + |pa - ra|`.
///
/// Widened to u64: each side's difference fits in u32, but their sum does
/// not, and aggregation over many fixtures needs the headroom anyway.
pub fn score_lines(prediction: Scoreline, result: Scoreline) -> u64 {
    u64::from(prediction.home.abs_diff(result.home))
        + u64::from(prediction.away.abs_diff(result.away))
}

/// Score a raw prediction against a raw result.
///
/// Returns `None` when either input is absent or fails to parse as
/// `<home>-<away>`. Total over all inputs; never panics.
pub fn score(prediction: Option<&str>, result: Option<&str>) -> Option<u64> {
    let prediction: Scoreline = prediction?.parse().ok()?;
    let result: Scoreline = result?.parse().ok()?;
    Some(score_lines(prediction, result))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Exact and near misses --

    #[test]
    fn exact_prediction_scores_zero() {
        assert_eq!(score(Some("1-1"), Some("1-1")), Some(0));
        assert_eq!(score(Some("0-0"), Some("0-0")), Some(0));
    }

    #[test]
    fn error_is_sum_of_per_side_differences() {
        assert_eq!(score(Some("2-1"), Some("0-0")), Some(3));
        assert_eq!(score(Some("0-0"), Some("2-1")), Some(3));
        assert_eq!(score(Some("1-0"), Some("1-2")), Some(2));
    }

    #[test]
    fn large_scorelines_do_not_overflow() {
        assert_eq!(
            score(Some("0-0"), Some("4294967295-0")),
            Some(u64::from(u32::MAX))
        );
        // Both sides maxed out: the per-side differences each fit in u32 but
        // their sum does not.
        assert_eq!(
            score(Some("4294967295-4294967295"), Some("0-0")),
            Some(2 * u64::from(u32::MAX))
        );
        assert_eq!(
            score_lines(Scoreline::new(u32::MAX, u32::MAX), Scoreline::new(0, 0)),
            2 * u64::from(u32::MAX)
        );
    }

    // -- Missing and malformed inputs --

    #[test]
    fn missing_inputs_yield_none() {
        assert_eq!(score(None, Some("1-1")), None);
        assert_eq!(score(Some("1-1"), None), None);
        assert_eq!(score(None, None), None);
    }

    #[test]
    fn malformed_inputs_yield_none() {
        assert_eq!(score(Some("a-b"), Some("1-1")), None);
        assert_eq!(score(Some("1-1"), Some("")), None);
        assert_eq!(score(Some("1--1"), Some("1-1")), None);
        assert_eq!(score(Some("1-1 "), Some("1-1")), None);
    }

    // -- Parsed form --

    #[test]
    fn score_lines_matches_string_path() {
        let p = Scoreline::new(3, 2);
        let r = Scoreline::new(1, 4);
        assert_eq!(score_lines(p, r), 4);
        assert_eq!(score(Some("3-2"), Some("1-4")), Some(4));
    }
}
