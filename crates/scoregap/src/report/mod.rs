//! Human-readable output written while the batch runs.

pub mod format;
pub mod leaderboard;
pub mod missing_score;

use thiserror::Error;

use crate::analysis::Analysis;
use crate::catalog::WorkItem;
use crate::error::StorageError;

pub use format::{group_signed, group_thousands};
pub use leaderboard::LeaderboardReport;
pub use missing_score::MissingScoreReport;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Report is {actual} bytes but the checkpoint accounts for {expected}")]
    Diverged { expected: u64, actual: u64 },
}

/// Output side of a batch run for one kind of analysis.
///
/// Every method returning a length reports the committed byte length of the
/// report afterwards; the driver stores it in the next checkpoint.
pub trait ReportSink<A: Analysis> {
    /// Discards any previous output and starts over.
    fn reset(&mut self) -> Result<u64, ReportError>;

    /// Brings the report back to the state a checkpoint describes.
    fn restore(&mut self, committed_len: u64, totals: &A::Totals) -> Result<(), ReportError>;

    /// `position` is the 1-based catalog position of `item`.
    fn record(
        &mut self,
        position: usize,
        item: &WorkItem,
        outcome: &A::Outcome,
        totals: &A::Totals,
    ) -> Result<u64, ReportError>;

    /// Writes the closing summary once the catalog is exhausted.
    fn finish(&mut self, totals: &A::Totals) -> Result<(), ReportError>;
}
