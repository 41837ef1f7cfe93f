use std::path::{Path, PathBuf};

use tracing::info;

use crate::analysis::{GapOutcome, GapTotals, MissingScoreAnalysis};
use crate::catalog::WorkItem;
use crate::error::StorageError;
use crate::storage;

use super::format::{group_signed, group_thousands};
use super::{ReportError, ReportSink};

pub const HEADER: &str =
    "Beatmap ID;Title [Difficulty];Date Ranked;Stars;BPM;AR;OD;CS;HP;Length;Missing score\n";

/// Append-only list of qualifying beatmaps, plus a standalone summary file.
#[derive(Debug)]
pub struct MissingScoreReport {
    path: PathBuf,
    summary_path: PathBuf,
    committed: u64,
}

impl MissingScoreReport {
    pub fn new(path: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            summary_path: summary_path.into(),
            committed: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }
}

fn format_line(item: &WorkItem, gap: i64) -> String {
    format!(
        "{};{};{};{}*;{} BPM;{};{};{};{};{};{}\n",
        item.id,
        item.label(),
        item.ranked_day(),
        item.stars,
        item.bpm,
        item.ar,
        item.od,
        item.cs,
        item.hp,
        item.length,
        group_signed(gap),
    )
}

fn format_summary(totals: &GapTotals) -> String {
    format!(
        "Total beatmaps analysed : {}\n\
         Total beatmaps compared : {}\n\
         Total beatmaps retained : {}\n\
         Total missing score : {}\n",
        totals.analyzed,
        totals.compared,
        totals.qualifying,
        group_thousands(totals.missing_score),
    )
}

impl ReportSink<MissingScoreAnalysis> for MissingScoreReport {
    fn reset(&mut self) -> Result<u64, ReportError> {
        storage::write_atomic(&self.path, HEADER.as_bytes())?;
        storage::remove_if_exists(&self.summary_path)?;
        self.committed = HEADER.len() as u64;
        Ok(self.committed)
    }

    fn restore(&mut self, committed_len: u64, _totals: &GapTotals) -> Result<(), ReportError> {
        match storage::truncate_to(&self.path, committed_len) {
            Ok(()) => {
                self.committed = committed_len;
                Ok(())
            }
            Err(StorageError::TooShort {
                expected, actual, ..
            }) => Err(ReportError::Diverged { expected, actual }),
            Err(e) => Err(e.into()),
        }
    }

    fn record(
        &mut self,
        position: usize,
        item: &WorkItem,
        outcome: &GapOutcome,
        totals: &GapTotals,
    ) -> Result<u64, ReportError> {
        if !outcome.result.qualifies {
            return Ok(self.committed);
        }

        let line = format_line(item, outcome.result.gap);
        self.committed = storage::append(&self.path, line.as_bytes())?;
        info!(
            beatmap_id = item.id,
            position,
            retained = totals.qualifying,
            gap = outcome.result.gap,
            "Beatmap retained: {}",
            item.label()
        );
        Ok(self.committed)
    }

    fn finish(&mut self, totals: &GapTotals) -> Result<(), ReportError> {
        let summary = format_summary(totals);
        self.committed = storage::append(&self.path, format!("\n{}", summary).as_bytes())?;
        storage::write_atomic(&self.summary_path, summary.as_bytes())?;
        Ok(())
    }
}
