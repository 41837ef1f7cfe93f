pub mod config;
pub mod error;
pub mod progress;
pub mod rate_limit;
pub mod runner;

pub use config::BatchConfig;
pub use error::BatchError;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, TracingProgress};
pub use rate_limit::RateLimiter;
pub use runner::{BatchRunner, RunOutcome, RunSummary};
