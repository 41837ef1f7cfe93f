pub mod analysis;
pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod report;
pub mod secrets;
pub mod storage;

pub use analysis::{Analysis, LeaderboardAnalysis, MissingScoreAnalysis, SkipReason};
pub use catalog::{load_catalog, CatalogColumns, WorkItem};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use config::{load_config, Config, Credentials};
pub use error::{
    ConfigError, Result, ScoregapError, SearchError, SourceFormatError, StorageError,
};
pub use fetcher::{BeatmapSearch, FetchError, OsuClient, ScoreFetcher, ScoreRecord, SearchPage};
pub use pipeline::{
    BatchConfig, BatchError, BatchRunner, ProgressEvent, ProgressReporter, RunOutcome, RunSummary,
};
pub use report::{LeaderboardReport, MissingScoreReport, ReportError, ReportSink};
pub use secrets::{load_env_file, resolve_secret, SecretError};
