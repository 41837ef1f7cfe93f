use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scoregap::config::SearchConfig;
use scoregap::Config;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "scoregap.json";

/// Read for `CLIENT_ID` / `CLIENT_SECRET` before credentials are resolved.
pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser, Debug)]
#[command(
    name = "scoregap",
    version,
    about = "Resumable leaderboard analysis for ranked osu! beatmaps"
)]
pub struct Cli {
    /// JSON config file
    #[arg(long, short = 'c', env = "SCOREGAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// dotenv file holding credential variables
    #[arg(long = "env-file", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Beatmap catalog (CSV)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Build the catalog from the beatmap search instead of the CSV file
    /// (`--search` or `--search="star>5 ranked<2020"`)
    #[arg(long, value_name = "QUERY", num_args = 0..=1, require_equals = true)]
    pub search: Option<Option<String>>,

    /// Directory for reports and checkpoints
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Minimum delay between two API calls, in milliseconds
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,

    /// Delete any saved progress and start from the first beatmap
    #[arg(long)]
    pub fresh: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List beatmaps where a country's best score trails the world record
    MissingScore {
        /// Two-letter country code to analyse (defaults to the config value)
        #[arg(long)]
        country: Option<String>,
    },
    /// Sum each tracked country's best score over the whole catalog
    Leaderboard,
}

impl Cli {
    /// Command-line values win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(catalog) = &self.catalog {
            config.catalog = catalog.clone();
        }
        if let Some(query) = &self.search {
            let mut search = config.search.clone().unwrap_or_default();
            if let Some(query) = query {
                search.query = query.clone();
            }
            config.search = Some(search);
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(interval) = self.interval_ms {
            config.api.request_interval_ms = interval;
        }
        if let Command::MissingScore {
            country: Some(country),
        } = &self.command
        {
            config.missing_score.target_country = country.to_ascii_uppercase();
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
