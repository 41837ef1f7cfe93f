use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::fetcher::FetchError;
use crate::report::ReportError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Report write failed: {0}")]
    Report(#[from] ReportError),

    #[error("Checkpoint could not be saved ({failures} consecutive failures): {source}")]
    Checkpoint {
        failures: u32,
        #[source]
        source: CheckpointError,
    },

    #[error("Scoring service unusable: {0}")]
    Fetch(#[from] FetchError),
}
