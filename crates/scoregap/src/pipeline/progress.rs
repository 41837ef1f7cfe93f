use tracing::{debug, info, warn};

/// Events emitted by the batch driver while it walks the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Resumed {
        next_index: usize,
        total: usize,
    },
    /// The item produced nothing: filtered out before fetching, or its
    /// leaderboard yielded no outcome.
    Skipped {
        index: usize,
        beatmap_id: u64,
        reason: String,
    },
    FetchFailed {
        index: usize,
        beatmap_id: u64,
        error: String,
    },
    Recorded {
        index: usize,
        beatmap_id: u64,
    },
    CheckpointSaved {
        next_index: usize,
    },
    Finished {
        visited: usize,
        remote_calls: usize,
        interrupted: bool,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes progress to the log. Checkpoint saves are logged every
/// `checkpoint_log_every` items so long runs stay readable.
pub struct TracingProgress {
    total: usize,
    checkpoint_log_every: usize,
}

impl TracingProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            checkpoint_log_every: 100,
        }
    }
}

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Resumed { next_index, total } => {
                info!(next_index, total, "Resuming from checkpoint");
            }
            ProgressEvent::Skipped {
                index,
                beatmap_id,
                reason,
            } => {
                debug!(index, beatmap_id, %reason, "Beatmap skipped");
            }
            ProgressEvent::FetchFailed {
                index,
                beatmap_id,
                error,
            } => {
                warn!(index, beatmap_id, %error, "Could not fetch scores, skipping beatmap");
            }
            ProgressEvent::Recorded { index, beatmap_id } => {
                debug!(index, beatmap_id, "Beatmap recorded");
            }
            ProgressEvent::CheckpointSaved { next_index } => {
                if next_index % self.checkpoint_log_every == 0 || next_index == self.total {
                    info!(next_index, total = self.total, "Progress saved");
                }
            }
            ProgressEvent::Finished {
                visited,
                remote_calls,
                interrupted,
            } => {
                if interrupted {
                    info!(visited, remote_calls, "Run interrupted, progress kept");
                } else {
                    info!(visited, remote_calls, "Run finished");
                }
            }
        }
    }
}
