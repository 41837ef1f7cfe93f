use std::time::Duration;

use crate::config::Config;

/// Driver settings taken from the loaded configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Minimum spacing between two remote calls.
    pub request_interval: Duration,
    /// Consecutive failed checkpoint saves tolerated before the run aborts.
    pub max_persistence_failures: u32,
    /// Ignore and delete any existing checkpoint.
    pub fresh: bool,
}

impl BatchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_interval: Duration::from_millis(config.api.request_interval_ms),
            max_persistence_failures: config.max_persistence_failures,
            fresh: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
