use crate::catalog::WorkItem;
use crate::fetcher::ScoreRecord;

use super::compare::{compare_scores, ComparisonResult};
use super::eligibility::EligibilityRule;
use super::{Analysis, SkipReason};

/// Running counters for the missing-score report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapTotals {
    /// Every catalog item visited.
    pub analyzed: u64,
    /// Items whose leaderboard was actually compared.
    pub compared: u64,
    /// Items written to the report.
    pub qualifying: u64,
    /// Sum of the qualifying gaps.
    pub missing_score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapOutcome {
    pub global_best: u64,
    pub national_best: u64,
    /// No target-country score in the window; the last-ranked score stood in.
    pub used_fallback: bool,
    pub result: ComparisonResult,
}

/// Finds beatmaps where the target country's best score trails the world
/// record by a wide margin.
#[derive(Debug, Clone)]
pub struct MissingScoreAnalysis {
    target_country: String,
    eligibility: EligibilityRule,
}

impl MissingScoreAnalysis {
    pub fn new(target_country: impl Into<String>, eligibility: EligibilityRule) -> Self {
        Self {
            target_country: target_country.into(),
            eligibility,
        }
    }

    pub fn target_country(&self) -> &str {
        &self.target_country
    }
}

/// Highest total among the target country's scores, if any.
pub(crate) fn national_best(scores: &[ScoreRecord], country: &str) -> Option<u64> {
    scores
        .iter()
        .filter(|s| s.is_from(country))
        .map(|s| s.total_score)
        .max()
}

impl Analysis for MissingScoreAnalysis {
    type Totals = GapTotals;
    type Outcome = GapOutcome;

    fn name(&self) -> &'static str {
        "missing-score"
    }

    fn scope(&self) -> String {
        format!(
            "target={} max_difficulty={} min_note_count={}",
            self.target_country, self.eligibility.max_difficulty, self.eligibility.min_note_count
        )
    }

    fn initial_totals(&self) -> GapTotals {
        GapTotals::default()
    }

    fn is_eligible(&self, item: &WorkItem) -> bool {
        self.eligibility.admits(item)
    }

    fn record_visit(&self, totals: &mut GapTotals, _eligible: bool) {
        totals.analyzed += 1;
    }

    fn evaluate(&self, scores: &[ScoreRecord]) -> Result<GapOutcome, SkipReason> {
        let (top, _) = scores.split_first().ok_or(SkipReason::NoScores)?;
        if top.is_from(&self.target_country) {
            return Err(SkipReason::TargetHoldsTop {
                country: self.target_country.clone(),
            });
        }

        let (national, used_fallback) = match national_best(scores, &self.target_country) {
            Some(best) => (best, false),
            // split_first succeeded, so last() exists
            None => (scores.last().map_or(0, |s| s.total_score), true),
        };

        Ok(GapOutcome {
            global_best: top.total_score,
            national_best: national,
            used_fallback,
            result: compare_scores(top.total_score, national),
        })
    }

    fn apply(&self, totals: &mut GapTotals, outcome: &GapOutcome) {
        totals.compared += 1;
        if outcome.result.qualifies {
            totals.qualifying += 1;
            let gap = u64::try_from(outcome.result.gap).unwrap_or(0);
            totals.missing_score = totals.missing_score.saturating_add(gap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> MissingScoreAnalysis {
        MissingScoreAnalysis::new("FR", EligibilityRule::default())
    }

    fn window(top: (u64, &str), filler: u64, filler_country: &str, last: u64) -> Vec<ScoreRecord> {
        let mut scores = vec![ScoreRecord::new(top.0, Some(top.1))];
        for i in 0..98 {
            scores.push(ScoreRecord::new(filler - i, Some(filler_country)));
        }
        scores.push(ScoreRecord::new(last, Some(filler_country)));
        scores
    }

    #[test]
    fn test_empty_leaderboard_is_skipped() {
        assert_eq!(analysis().evaluate(&[]), Err(SkipReason::NoScores));
    }

    #[test]
    fn test_fallback_to_last_ranked_score() {
        let scores = window((10_000_000, "US"), 9_000_000, "KR", 7_500_000);
        assert_eq!(scores.len(), 100);

        let outcome = analysis().evaluate(&scores).unwrap();
        assert!(outcome.used_fallback);
        assert_eq!(outcome.global_best, 10_000_000);
        assert_eq!(outcome.national_best, 7_500_000);
        assert_eq!(
            outcome.result,
            ComparisonResult {
                qualifies: true,
                gap: 2_500_000
            }
        );
    }

    #[test]
    fn test_national_best_is_the_maximum_target_score() {
        let scores = vec![
            ScoreRecord::new(10_000_000, Some("JP")),
            ScoreRecord::new(8_000_000, Some("FR")),
            ScoreRecord::new(8_100_000, Some("FR")),
            ScoreRecord::new(7_000_000, None),
        ];

        let outcome = analysis().evaluate(&scores).unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.national_best, 8_100_000);
        assert_eq!(outcome.result.gap, 1_900_000);
        assert!(outcome.result.qualifies);
    }

    #[test]
    fn test_target_holding_top_short_circuits() {
        // A later FR score would otherwise produce a huge gap.
        let scores = vec![
            ScoreRecord::new(10_000_000, Some("FR")),
            ScoreRecord::new(9_000_000, Some("US")),
            ScoreRecord::new(1_000_000, Some("FR")),
        ];

        assert_eq!(
            analysis().evaluate(&scores),
            Err(SkipReason::TargetHoldsTop {
                country: "FR".to_string()
            })
        );
    }

    #[test]
    fn test_scores_without_country_never_match() {
        let scores = vec![
            ScoreRecord::new(10_000_000, None),
            ScoreRecord::new(9_900_000, None),
        ];
        let outcome = analysis().evaluate(&scores).unwrap();
        assert!(outcome.used_fallback);
        assert!(!outcome.result.qualifies);
    }

    #[test]
    fn test_single_score_falls_back_to_itself() {
        let scores = vec![ScoreRecord::new(5_000_000, Some("DE"))];
        let outcome = analysis().evaluate(&scores).unwrap();
        assert_eq!(outcome.result.gap, 0);
        assert!(!outcome.result.qualifies);
    }

    #[test]
    fn test_scope_covers_target_and_filter() {
        let fr = analysis();
        assert_eq!(fr.scope(), "target=FR max_difficulty=8 min_note_count=400");
        assert!(fr.accepts(&fr.scope(), &GapTotals::default()));

        let de = MissingScoreAnalysis::new("DE", EligibilityRule::default());
        assert!(!de.accepts(&fr.scope(), &GapTotals::default()));

        let stricter = MissingScoreAnalysis::new(
            "FR",
            EligibilityRule {
                max_difficulty: 7.5,
                ..EligibilityRule::default()
            },
        );
        assert!(!stricter.accepts(&fr.scope(), &GapTotals::default()));
    }

    #[test]
    fn test_apply_counts_compared_and_qualifying() {
        let analysis = analysis();
        let mut totals = analysis.initial_totals();

        analysis.record_visit(&mut totals, true);
        let qualifying = analysis
            .evaluate(&window((10_000_000, "US"), 9_000_000, "KR", 7_500_000))
            .unwrap();
        analysis.apply(&mut totals, &qualifying);

        analysis.record_visit(&mut totals, true);
        let close = analysis
            .evaluate(&[
                ScoreRecord::new(10_000_000, Some("US")),
                ScoreRecord::new(9_900_000, Some("FR")),
            ])
            .unwrap();
        analysis.apply(&mut totals, &close);

        analysis.record_visit(&mut totals, false);

        assert_eq!(
            totals,
            GapTotals {
                analyzed: 3,
                compared: 2,
                qualifying: 1,
                missing_score: 2_500_000,
            }
        );
    }
}
