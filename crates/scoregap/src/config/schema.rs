use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    /// Builds the catalog from the beatmap search instead of `catalog`.
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub missing_score: MissingScoreConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default = "default_max_persistence_failures")]
    pub max_persistence_failures: u32,
}

fn default_catalog() -> PathBuf {
    PathBuf::from("beatmaps.csv")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_persistence_failures() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            search: None,
            output_directory: default_output_directory(),
            api: ApiConfig::default(),
            credentials: CredentialsConfig::default(),
            missing_score: MissingScoreConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            max_persistence_failures: default_max_persistence_failures(),
        }
    }
}

impl Config {
    /// Resolves a file name from the config against `output_directory`.
    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_directory.join(file)
    }
}

/// Replaces `{date}` in a file name with `day` as `YYYY-MM-DD`.
pub fn dated_file_name(name: &str, day: NaiveDate) -> String {
    name.replace("{date}", &day.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_query")]
    pub query: String,
    /// Frozen result list, reused when a run resumes.
    #[serde(default = "default_search_snapshot")]
    pub snapshot_file: String,
    #[serde(default)]
    pub max_pages: Option<usize>,
}

fn default_search_query() -> String {
    crate::catalog::DEFAULT_SEARCH_QUERY.to_string()
}

fn default_search_snapshot() -> String {
    "search_catalog.csv".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: default_search_query(),
            snapshot_file: default_search_snapshot(),
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ruleset")]
    pub ruleset: String,
    #[serde(default = "default_score_limit")]
    pub score_limit: u32,
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://osu.ppy.sh".to_string()
}

fn default_ruleset() -> String {
    "osu".to_string()
}

fn default_score_limit() -> u32 {
    100
}

fn default_request_interval_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ruleset: default_ruleset(),
            score_limit: default_score_limit(),
            request_interval_ms: default_request_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where to find the OAuth client id and secret.
///
/// Each credential is resolved as direct value, then file, then env var.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_id_file: Option<String>,
    #[serde(default = "default_client_id_env")]
    pub client_id_env: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub client_secret_file: Option<String>,
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: Option<String>,
}

fn default_client_id_env() -> Option<String> {
    Some("CLIENT_ID".to_string())
}

fn default_client_secret_env() -> Option<String> {
    Some("CLIENT_SECRET".to_string())
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_id_file: None,
            client_id_env: default_client_id_env(),
            client_secret: None,
            client_secret_file: None,
            client_secret_env: default_client_secret_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingScoreConfig {
    #[serde(default = "default_target_country")]
    pub target_country: String,
    #[serde(default = "default_max_difficulty")]
    pub max_difficulty: f64,
    #[serde(default = "default_min_note_count")]
    pub min_note_count: u64,
    #[serde(default = "default_missing_score_report")]
    pub report_file: String,
    #[serde(default = "default_missing_score_checkpoint")]
    pub checkpoint_file: String,
    /// `{date}` is replaced with the day the run starts.
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
}

fn default_target_country() -> String {
    "FR".to_string()
}

fn default_max_difficulty() -> f64 {
    crate::analysis::DEFAULT_MAX_DIFFICULTY
}

fn default_min_note_count() -> u64 {
    crate::analysis::DEFAULT_MIN_NOTE_COUNT
}

fn default_missing_score_report() -> String {
    "french_missing_score.txt".to_string()
}

fn default_missing_score_checkpoint() -> String {
    "french_missing_score_progress.txt".to_string()
}

fn default_summary_file() -> String {
    "results.txt".to_string()
}

impl Default for MissingScoreConfig {
    fn default() -> Self {
        Self {
            target_country: default_target_country(),
            max_difficulty: default_max_difficulty(),
            min_note_count: default_min_note_count(),
            report_file: default_missing_score_report(),
            checkpoint_file: default_missing_score_checkpoint(),
            summary_file: default_summary_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryConfig {
    pub code: String,
    pub name: String,
}

impl CountryConfig {
    fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_countries")]
    pub countries: Vec<CountryConfig>,
    #[serde(default = "default_leaderboard_report")]
    pub report_file: String,
    #[serde(default = "default_leaderboard_checkpoint")]
    pub checkpoint_file: String,
}

fn default_countries() -> Vec<CountryConfig> {
    vec![
        CountryConfig::new("US", "United States"),
        CountryConfig::new("PL", "Poland"),
        CountryConfig::new("DE", "Germany"),
        CountryConfig::new("RU", "Russia"),
        CountryConfig::new("FR", "France"),
        CountryConfig::new("GB", "United Kingdom"),
        CountryConfig::new("CA", "Canada"),
        CountryConfig::new("JP", "Japan"),
        CountryConfig::new("KR", "South Korea"),
        CountryConfig::new("TW", "Taiwan"),
    ]
}

fn default_leaderboard_report() -> String {
    "national_top_score_leaderboard.txt".to_string()
}

fn default_leaderboard_checkpoint() -> String {
    "national_top_score_progress.txt".to_string()
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            report_file: default_leaderboard_report(),
            checkpoint_file: default_leaderboard_checkpoint(),
        }
    }
}
