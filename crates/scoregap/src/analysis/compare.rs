use tracing::debug;

/// A gap strictly above this share of the global best qualifies.
pub const THRESHOLD_PERCENT: u64 = 15;

/// A gap strictly above this many points qualifies regardless of share.
pub const ABSOLUTE_CEILING: i64 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonResult {
    pub qualifies: bool,
    pub gap: i64,
}

impl ComparisonResult {
    const DEGENERATE: Self = Self {
        qualifies: false,
        gap: 0,
    };
}

/// Compares the global best total against a national representative.
///
/// `qualifies` is `gap / global_best * 100 > 15 || gap > 2_000_000`. The
/// share test runs in integer arithmetic so the 15 % boundary is exact. A
/// zero global best never qualifies and reports a zero gap.
pub fn compare_scores(global_best: u64, other: u64) -> ComparisonResult {
    if global_best == 0 {
        debug!("Global best score is zero, comparison skipped");
        return ComparisonResult::DEGENERATE;
    }

    let gap = i128::from(global_best) - i128::from(other);
    let above_share = gap * 100 > i128::from(THRESHOLD_PERCENT) * i128::from(global_best);
    let above_ceiling = gap > i128::from(ABSOLUTE_CEILING);

    ComparisonResult {
        qualifies: above_share || above_ceiling,
        gap: i64::try_from(gap).unwrap_or(if gap > 0 { i64::MAX } else { i64::MIN }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exactly_fifteen_percent_does_not_qualify() {
        let result = compare_scores(1_000_000, 850_000);
        assert_eq!(result.gap, 150_000);
        assert!(!result.qualifies);
    }

    #[test]
    fn test_just_above_fifteen_percent_qualifies() {
        // 150_001 / 1_000_000 = 15.0001 %
        let result = compare_scores(1_000_000, 849_999);
        assert_eq!(result.gap, 150_001);
        assert!(result.qualifies);
    }

    #[test]
    fn test_absolute_ceiling_is_strict() {
        // 2_000_000 / 100_000_000 = 2 %, only the ceiling can trigger
        let at_ceiling = compare_scores(100_000_000, 98_000_000);
        assert_eq!(at_ceiling.gap, 2_000_000);
        assert!(!at_ceiling.qualifies);

        let above = compare_scores(100_000_000, 97_999_999);
        assert_eq!(above.gap, 2_000_001);
        assert!(above.qualifies);
    }

    #[test]
    fn test_zero_global_best_is_degenerate() {
        assert_eq!(
            compare_scores(0, 0),
            ComparisonResult {
                qualifies: false,
                gap: 0
            }
        );
        assert_eq!(
            compare_scores(0, 5_000_000),
            ComparisonResult {
                qualifies: false,
                gap: 0
            }
        );
    }

    #[test]
    fn test_negative_gap_never_qualifies() {
        let result = compare_scores(1_000_000, 3_500_000);
        assert_eq!(result.gap, -2_500_000);
        assert!(!result.qualifies);
    }

    #[test]
    fn test_both_thresholds() {
        let result = compare_scores(10_000_000, 7_500_000);
        assert_eq!(result.gap, 2_500_000);
        assert!(result.qualifies);
    }

    proptest! {
        #[test]
        fn prop_matches_real_valued_definition(global in 1u64..=u32::MAX as u64, other in 0u64..=u32::MAX as u64) {
            let result = compare_scores(global, other);
            let gap = global as i64 - other as i64;
            prop_assert_eq!(result.gap, gap);

            // Exact rational comparison: gap/global*100 > 15  <=>  gap*100 > 15*global
            let expected = (gap as i128) * 100 > 15 * (global as i128) || gap > ABSOLUTE_CEILING;
            prop_assert_eq!(result.qualifies, expected);
        }

        #[test]
        fn prop_equal_scores_never_qualify(score in 0u64..=u64::MAX / 2) {
            prop_assert!(!compare_scores(score, score).qualifies);
        }
    }
}
