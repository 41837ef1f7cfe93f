//! Test harness for isolated batch runs.
//!
//! `TestHarness` owns a temporary output directory and wires the batch driver
//! to it. `ScriptedFetcher` replays canned leaderboards and can raise the
//! stop flag after a given number of calls, which simulates Ctrl-C at any
//! point of a run.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use scoregap::analysis::EligibilityRule;
use scoregap::config::CountryConfig;
use scoregap::pipeline::ProgressEvent;
use scoregap::{
    BatchConfig, BatchRunner, CheckpointStore, FetchError, LeaderboardAnalysis,
    LeaderboardReport, MissingScoreAnalysis, MissingScoreReport, ProgressReporter, ScoreFetcher,
    ScoreRecord, WorkItem,
};

use super::builders::catalog_csv;

pub const REPORT_FILE: &str = "french_missing_score.txt";
pub const SUMMARY_FILE: &str = "results.txt";
pub const CHECKPOINT_FILE: &str = "french_missing_score_progress.txt";
pub const LEADERBOARD_FILE: &str = "national_top_score_leaderboard.txt";
pub const LEADERBOARD_CHECKPOINT_FILE: &str = "national_top_score_progress.txt";

pub type MissingScoreRunner<F> = BatchRunner<MissingScoreAnalysis, MissingScoreReport, F>;
pub type LeaderboardRunner<F> = BatchRunner<LeaderboardAnalysis, LeaderboardReport, F>;

/// Test harness providing an isolated output directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub output_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output_dir = temp_dir.path().join("out");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
        Self {
            temp_dir,
            output_dir,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", name, e))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.path(name), content).expect("Failed to write file");
    }

    /// Writes `items` as a CSV catalog outside the output directory.
    pub fn write_catalog(&self, items: &[WorkItem]) -> PathBuf {
        let path = self.temp_dir.path().join("beatmaps.csv");
        std::fs::write(&path, catalog_csv(items)).expect("Failed to write catalog");
        path
    }

    pub fn missing_score_runner<F: ScoreFetcher>(&self, fetcher: F) -> MissingScoreRunner<F> {
        self.missing_score_runner_for("FR", fetcher)
    }

    /// Same output files, another target country.
    pub fn missing_score_runner_for<F: ScoreFetcher>(
        &self,
        country: &str,
        fetcher: F,
    ) -> MissingScoreRunner<F> {
        BatchRunner::new(
            MissingScoreAnalysis::new(country, EligibilityRule::default()),
            MissingScoreReport::new(self.path(REPORT_FILE), self.path(SUMMARY_FILE)),
            fetcher,
            CheckpointStore::new(self.path(CHECKPOINT_FILE)),
            batch_config(),
        )
    }

    pub fn leaderboard_runner<F: ScoreFetcher>(
        &self,
        countries: Vec<CountryConfig>,
        fetcher: F,
    ) -> LeaderboardRunner<F> {
        BatchRunner::new(
            LeaderboardAnalysis::new(countries.clone()),
            LeaderboardReport::new(self.path(LEADERBOARD_FILE), countries),
            fetcher,
            CheckpointStore::new(self.path(LEADERBOARD_CHECKPOINT_FILE)),
            batch_config(),
        )
    }
}

/// No rate spacing, default failure tolerance.
pub fn batch_config() -> BatchConfig {
    BatchConfig {
        request_interval: Duration::ZERO,
        max_persistence_failures: 3,
        fresh: false,
    }
}

/// Replays canned leaderboards. Unknown ids fail like a network error.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<u64, Vec<ScoreRecord>>,
    pub calls: Vec<u64>,
    stop: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, beatmap_id: u64, scores: Vec<ScoreRecord>) -> Self {
        self.responses.insert(beatmap_id, scores);
        self
    }

    /// Raises `flag` once `calls` fetches have been made.
    pub fn stop_after(mut self, calls: usize, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some((calls, flag));
        self
    }
}

impl ScoreFetcher for ScriptedFetcher {
    fn fetch(&mut self, beatmap_id: u64) -> Result<Vec<ScoreRecord>, FetchError> {
        self.calls.push(beatmap_id);
        if let Some((limit, flag)) = &self.stop {
            if self.calls.len() >= *limit {
                flag.store(true, Ordering::SeqCst);
            }
        }

        self.responses
            .get(&beatmap_id)
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                beatmap_id,
                message: "connection reset".to_string(),
            })
    }
}

/// Captures every event, plus the checkpoint file content after each save.
pub struct RecordingProgress {
    checkpoint_path: Option<PathBuf>,
    events: Mutex<Vec<ProgressEvent>>,
    snapshots: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self {
            checkpoint_path: None,
            events: Mutex::new(Vec::new()),
            snapshots: Mutex::new(Vec::new()),
        }
    }

    pub fn watching(checkpoint_path: &Path) -> Self {
        Self {
            checkpoint_path: Some(checkpoint_path.to_path_buf()),
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<String> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn saved_indices(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::CheckpointSaved { next_index } => Some(next_index),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let (ProgressEvent::CheckpointSaved { .. }, Some(path)) = (&event, &self.checkpoint_path)
        {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            self.snapshots.lock().unwrap().push(content);
        }
        self.events.lock().unwrap().push(event);
    }
}

/// A stop flag already raised, for interrupting before the first item.
pub fn raised_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(true))
}

pub fn lowered_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}
