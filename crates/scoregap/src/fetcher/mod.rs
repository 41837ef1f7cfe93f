//! Leaderboard retrieval from the remote scoring service.
//!
//! The batch engine only depends on [`ScoreFetcher`]; [`OsuClient`] is the
//! production implementation. Rate spacing is enforced by the caller.
//! [`BeatmapSearch`] feeds the catalog when it comes from the service's
//! beatmap search instead of a CSV file.

pub mod osu;

use thiserror::Error;

use crate::catalog::WorkItem;

pub use osu::OsuClient;

/// One leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub total_score: u64,
    pub country_code: Option<String>,
}

impl ScoreRecord {
    pub fn new(total_score: u64, country_code: Option<&str>) -> Self {
        Self {
            total_score,
            country_code: country_code.map(str::to_string),
        }
    }

    pub fn is_from(&self, code: &str) -> bool {
        self.country_code.as_deref() == Some(code)
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The token endpoint could not be reached or had a server-side failure.
    #[error("Token request failed: {0}")]
    TokenUnavailable(String),

    #[error("Request for beatmap {beatmap_id} failed: {message}")]
    Transport { beatmap_id: u64, message: String },

    #[error("Scoring service returned HTTP {status} for beatmap {beatmap_id}: {body}")]
    Status {
        beatmap_id: u64,
        status: u16,
        body: String,
    },

    #[error("Malformed leaderboard for beatmap {beatmap_id}: {message}")]
    Decode { beatmap_id: u64, message: String },

    #[error("Beatmap search failed: {0}")]
    Search(String),
}

impl FetchError {
    /// Per-item failures the batch skips over. Client construction and
    /// rejected credentials are not transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::TokenUnavailable(_)
                | FetchError::Transport { .. }
                | FetchError::Status { .. }
                | FetchError::Decode { .. }
        )
    }
}

/// Returns the top scores for a beatmap, best first.
pub trait ScoreFetcher {
    fn fetch(&mut self, beatmap_id: u64) -> Result<Vec<ScoreRecord>, FetchError>;
}

impl<F> ScoreFetcher for F
where
    F: FnMut(u64) -> Result<Vec<ScoreRecord>, FetchError>,
{
    fn fetch(&mut self, beatmap_id: u64) -> Result<Vec<ScoreRecord>, FetchError> {
        self(beatmap_id)
    }
}

/// One page of beatmap search results, already flattened to catalog items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub items: Vec<WorkItem>,
    /// Opaque continuation token; `None` on the last page.
    pub cursor: Option<String>,
}

pub trait BeatmapSearch {
    fn search(&mut self, query: &str, cursor: Option<&str>) -> Result<SearchPage, FetchError>;
}
