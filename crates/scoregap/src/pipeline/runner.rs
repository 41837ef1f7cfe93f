use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, debug_span, info, info_span, warn};

use crate::analysis::Analysis;
use crate::catalog::WorkItem;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::fetcher::ScoreFetcher;
use crate::report::{ReportError, ReportSink};

use super::config::BatchConfig;
use super::error::BatchError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::rate_limit::RateLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Catalog exhausted, summary written, checkpoint cleared.
    Completed,
    /// Stopped on request; the checkpoint points at `next_index`.
    Interrupted { next_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary<T> {
    pub outcome: RunOutcome,
    pub totals: T,
    /// Items visited in this run, resumed items excluded.
    pub visited: usize,
    pub remote_calls: usize,
    pub fetch_failures: usize,
}

/// Where the run stands. Checkpoints and the report are always written from
/// the same cursor.
struct Cursor<T> {
    next_index: usize,
    report_len: u64,
    totals: T,
}

#[derive(Default)]
struct Counters {
    visited: usize,
    remote_calls: usize,
    fetch_failures: usize,
    save_failures: u32,
}

/// Walks a catalog once, resuming from the last checkpoint.
pub struct BatchRunner<A, R, F> {
    analysis: A,
    report: R,
    fetcher: F,
    store: CheckpointStore,
    config: BatchConfig,
    limiter: RateLimiter,
    stop: Arc<AtomicBool>,
}

impl<A, R, F> BatchRunner<A, R, F>
where
    A: Analysis,
    R: ReportSink<A>,
    F: ScoreFetcher,
{
    pub fn new(analysis: A, report: R, fetcher: F, store: CheckpointStore, config: BatchConfig) -> Self {
        let limiter = RateLimiter::new(config.request_interval);
        Self {
            analysis,
            report,
            fetcher,
            store,
            config,
            limiter,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the stop flag, e.g. with one shared with a signal handler.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    pub fn report(&self) -> &R {
        &self.report
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn run(
        &mut self,
        items: &[WorkItem],
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary<A::Totals>, BatchError> {
        let _batch_span = info_span!("batch",
            analysis = self.analysis.name(),
            items = items.len(),
        )
        .entered();

        if self.config.fresh {
            info!(path = %self.store.path().display(), "Starting fresh, discarding checkpoint");
            self.discard_checkpoint()?;
        }

        let mut cursor = self.resume(items.len(), progress)?;
        let mut counters = Counters::default();

        while cursor.next_index < items.len() {
            if self.stop.load(Ordering::SeqCst) {
                return self.interrupt(cursor, counters, progress);
            }

            let index = cursor.next_index;
            let item = &items[index];
            let _item_span = debug_span!("item", index, beatmap_id = item.id).entered();

            counters.visited += 1;
            let made_call = self.step(index, item, &mut cursor, &mut counters, progress)?;
            cursor.next_index = index + 1;

            if made_call {
                self.save_checkpoint(&cursor, &mut counters, progress)?;
            }
        }

        self.drain(cursor, counters, progress)
    }

    /// INIT/RESUMING: a usable checkpoint restores the cursor, anything else
    /// resets the report and starts at index 0.
    fn resume(
        &mut self,
        total: usize,
        progress: &dyn ProgressReporter,
    ) -> Result<Cursor<A::Totals>, BatchError> {
        if let Some(checkpoint) = self.store.load::<A::Totals>() {
            if let Some(cursor) = self.accept_checkpoint(checkpoint, total)? {
                info!(
                    next_index = cursor.next_index,
                    total,
                    "Resuming {} run",
                    self.analysis.name()
                );
                progress.report(ProgressEvent::Resumed {
                    next_index: cursor.next_index,
                    total,
                });
                return Ok(cursor);
            }
            self.discard_checkpoint()?;
        }

        let report_len = self.report.reset()?;
        Ok(Cursor {
            next_index: 0,
            report_len,
            totals: self.analysis.initial_totals(),
        })
    }

    fn accept_checkpoint(
        &mut self,
        checkpoint: Checkpoint<A::Totals>,
        total: usize,
    ) -> Result<Option<Cursor<A::Totals>>, BatchError> {
        if checkpoint.next_index > total {
            warn!(
                next_index = checkpoint.next_index,
                total, "Checkpoint is past the end of the catalog, starting over"
            );
            return Ok(None);
        }
        if !self.analysis.accepts(&checkpoint.scope, &checkpoint.totals) {
            warn!(
                found = %checkpoint.scope,
                expected = %self.analysis.scope(),
                "Checkpoint does not match the configuration, starting over"
            );
            return Ok(None);
        }

        match self
            .report
            .restore(checkpoint.report_len, &checkpoint.totals)
        {
            Ok(()) => Ok(Some(Cursor {
                next_index: checkpoint.next_index,
                report_len: checkpoint.report_len,
                totals: checkpoint.totals,
            })),
            Err(ReportError::Diverged { expected, actual }) => {
                warn!(
                    expected,
                    actual, "Report is shorter than the checkpoint records, starting over"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// One item. Returns whether a remote call was made.
    fn step(
        &mut self,
        index: usize,
        item: &WorkItem,
        cursor: &mut Cursor<A::Totals>,
        counters: &mut Counters,
        progress: &dyn ProgressReporter,
    ) -> Result<bool, BatchError> {
        let eligible = self.analysis.is_eligible(item);
        self.analysis.record_visit(&mut cursor.totals, eligible);
        if !eligible {
            progress.report(ProgressEvent::Skipped {
                index,
                beatmap_id: item.id,
                reason: "filtered out".to_string(),
            });
            return Ok(false);
        }

        self.limiter.wait();
        counters.remote_calls += 1;

        let scores = match self.fetcher.fetch(item.id) {
            Ok(scores) => scores,
            Err(e) if e.is_transient() => {
                counters.fetch_failures += 1;
                warn!(beatmap_id = item.id, error = %e, "Fetch failed, skipping beatmap");
                progress.report(ProgressEvent::FetchFailed {
                    index,
                    beatmap_id: item.id,
                    error: e.to_string(),
                });
                return Ok(true);
            }
            Err(e) => return Err(e.into()),
        };

        match self.analysis.evaluate(&scores) {
            Ok(outcome) => {
                debug!(outcome = ?outcome, "Leaderboard evaluated");
                self.analysis.apply(&mut cursor.totals, &outcome);
                cursor.report_len =
                    self.report
                        .record(index + 1, item, &outcome, &cursor.totals)?;
                progress.report(ProgressEvent::Recorded {
                    index,
                    beatmap_id: item.id,
                });
            }
            Err(reason) => {
                debug!(%reason, "No outcome for beatmap");
                progress.report(ProgressEvent::Skipped {
                    index,
                    beatmap_id: item.id,
                    reason: reason.to_string(),
                });
            }
        }
        Ok(true)
    }

    /// A failed save is tolerated until `max_persistence_failures` in a row.
    fn save_checkpoint(
        &mut self,
        cursor: &Cursor<A::Totals>,
        counters: &mut Counters,
        progress: &dyn ProgressReporter,
    ) -> Result<(), BatchError> {
        if self.store.last_saved() == Some(cursor.next_index) {
            return Ok(());
        }

        let checkpoint = Checkpoint::new(cursor.next_index, cursor.report_len, cursor.totals.clone())
            .with_scope(self.analysis.scope());
        match self.store.save(&checkpoint) {
            Ok(()) => {
                counters.save_failures = 0;
                progress.report(ProgressEvent::CheckpointSaved {
                    next_index: cursor.next_index,
                });
                Ok(())
            }
            Err(e) => {
                counters.save_failures += 1;
                warn!(
                    next_index = cursor.next_index,
                    failures = counters.save_failures,
                    error = %e,
                    "Checkpoint save failed"
                );
                if counters.save_failures >= self.config.max_persistence_failures {
                    Err(BatchError::Checkpoint {
                        failures: counters.save_failures,
                        source: e,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn discard_checkpoint(&mut self) -> Result<(), BatchError> {
        self.store
            .clear()
            .map_err(|source| BatchError::Checkpoint {
                failures: 1,
                source,
            })
    }

    fn interrupt(
        &mut self,
        cursor: Cursor<A::Totals>,
        mut counters: Counters,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary<A::Totals>, BatchError> {
        info!(next_index = cursor.next_index, "Stop requested");
        self.save_checkpoint(&cursor, &mut counters, progress)?;
        progress.report(ProgressEvent::Finished {
            visited: counters.visited,
            remote_calls: counters.remote_calls,
            interrupted: true,
        });
        Ok(RunSummary {
            outcome: RunOutcome::Interrupted {
                next_index: cursor.next_index,
            },
            totals: cursor.totals,
            visited: counters.visited,
            remote_calls: counters.remote_calls,
            fetch_failures: counters.fetch_failures,
        })
    }

    /// DRAINING/DONE: final checkpoint, summary, then cleanup.
    fn drain(
        &mut self,
        cursor: Cursor<A::Totals>,
        mut counters: Counters,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary<A::Totals>, BatchError> {
        let _drain_span = info_span!("drain").entered();

        self.save_checkpoint(&cursor, &mut counters, progress)?;
        self.report.finish(&cursor.totals)?;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Could not remove checkpoint after completion");
        }

        info!(
            visited = counters.visited,
            remote_calls = counters.remote_calls,
            fetch_failures = counters.fetch_failures,
            "Catalog exhausted"
        );
        progress.report(ProgressEvent::Finished {
            visited: counters.visited,
            remote_calls: counters.remote_calls,
            interrupted: false,
        });

        Ok(RunSummary {
            outcome: RunOutcome::Completed,
            totals: cursor.totals,
            visited: counters.visited,
            remote_calls: counters.remote_calls,
            fetch_failures: counters.fetch_failures,
        })
    }
}
