//! Per-item filter, comparison and aggregation.
//!
//! An [`Analysis`] decides whether a beatmap is worth a remote call, turns
//! a fetched leaderboard into an outcome (or a [`SkipReason`]), and folds
//! outcomes into its running totals. The batch driver never inspects the
//! numbers itself.

pub mod compare;
pub mod eligibility;
pub mod leaderboard;
pub mod missing_score;

use std::fmt;

use crate::catalog::WorkItem;
use crate::checkpoint::CheckpointState;
use crate::fetcher::ScoreRecord;

pub use compare::{compare_scores, ComparisonResult, ABSOLUTE_CEILING, THRESHOLD_PERCENT};
pub use eligibility::{EligibilityRule, DEFAULT_MAX_DIFFICULTY, DEFAULT_MIN_NOTE_COUNT};
pub use leaderboard::{CountryTotals, LeaderboardAnalysis, LeaderboardOutcome};
pub use missing_score::{GapOutcome, GapTotals, MissingScoreAnalysis};

/// Why a fetched leaderboard produced no outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The leaderboard is empty.
    NoScores,
    /// The first-ranked score already belongs to the target country.
    TargetHoldsTop { country: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoScores => write!(f, "no scores on the leaderboard"),
            SkipReason::TargetHoldsTop { country } => {
                write!(f, "top score already held by {}", country)
            }
        }
    }
}

pub trait Analysis {
    type Totals: CheckpointState + Clone + PartialEq + fmt::Debug;
    type Outcome: fmt::Debug;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn initial_totals(&self) -> Self::Totals;

    /// Evaluated before any remote call.
    fn is_eligible(&self, item: &WorkItem) -> bool;

    /// Called once per visited item, eligible or not, before any fetch.
    fn record_visit(&self, totals: &mut Self::Totals, eligible: bool);

    fn evaluate(&self, scores: &[ScoreRecord]) -> Result<Self::Outcome, SkipReason>;

    fn apply(&self, totals: &mut Self::Totals, outcome: &Self::Outcome);

    /// One-line description of the settings that shape the totals and the
    /// report. Stored with every checkpoint.
    fn scope(&self) -> String;

    /// Whether a checkpoint written under `scope` with `totals` can be
    /// continued by this analysis.
    fn accepts(&self, scope: &str, _totals: &Self::Totals) -> bool {
        scope == self.scope()
    }
}
