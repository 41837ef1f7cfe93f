//! osu! API v2 leaderboard client.
//!
//! Authenticates with the OAuth2 client-credentials grant and reads
//! `GET /api/v2/beatmaps/{id}/scores`. Also walks the beatmapset search for
//! catalogs built from a query. Blocking: the batch engine is strictly
//! sequential.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::catalog::WorkItem;
use crate::config::{ApiConfig, Credentials};

use super::{BeatmapSearch, FetchError, ScoreFetcher, ScoreRecord, SearchPage};

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response format version; selects the score shape carrying
/// `classic_total_score` and `user.country_code`.
const API_VERSION: &str = "20220705";

/// Renew the access token this long before the server says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Maximum length for error bodies copied into errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn sanitize_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ScoresResponse {
    #[serde(default)]
    scores: Vec<ApiScore>,
}

#[derive(Debug, Deserialize)]
struct ApiScore {
    #[serde(default)]
    classic_total_score: Option<u64>,
    #[serde(default)]
    total_score: Option<u64>,
    #[serde(default)]
    score: Option<u64>,
    #[serde(default)]
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    beatmapsets: Vec<ApiBeatmapset>,
    #[serde(default)]
    cursor_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiBeatmapset {
    #[serde(default)]
    title: String,
    #[serde(default)]
    ranked_date: Option<String>,
    #[serde(default)]
    beatmaps: Vec<ApiBeatmap>,
}

#[derive(Debug, Deserialize)]
struct ApiBeatmap {
    id: u64,
    mode_int: u8,
    #[serde(default)]
    version: String,
    #[serde(default)]
    difficulty_rating: f64,
    #[serde(default)]
    bpm: Option<f64>,
    #[serde(default)]
    ar: f64,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    cs: f64,
    #[serde(default)]
    drain: f64,
    #[serde(default)]
    total_length: f64,
    #[serde(default)]
    count_circles: u32,
    #[serde(default)]
    count_sliders: u32,
    #[serde(default)]
    count_spinners: u32,
}

/// Numeric mode used by the search endpoint and `mode_int`.
fn ruleset_mode(ruleset: &str) -> Option<u8> {
    match ruleset {
        "osu" => Some(0),
        "taiko" => Some(1),
        "fruits" => Some(2),
        "mania" => Some(3),
        _ => None,
    }
}

struct AccessToken {
    value: SecretString,
    expires_at: Instant,
}

pub struct OsuClient {
    client: Client,
    base_url: String,
    ruleset: String,
    limit: u32,
    credentials: Credentials,
    token: Option<AccessToken>,
}

impl OsuClient {
    /// Builds the client without contacting the service.
    pub fn new(api: &ApiConfig, credentials: Credentials) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(concat!("scoregap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            ruleset: api.ruleset.clone(),
            limit: api.score_limit,
            credentials,
            token: None,
        })
    }

    /// Builds the client and obtains a token, so bad credentials fail at
    /// startup rather than on the first beatmap.
    pub fn connect(api: &ApiConfig, credentials: Credentials) -> Result<Self, FetchError> {
        let mut client = Self::new(api, credentials)?;
        client.authenticate()?;
        Ok(client)
    }

    fn authenticate(&mut self) -> Result<(), FetchError> {
        let url = format!("{}/oauth/token", self.base_url);
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
            ("grant_type", "client_credentials"),
            ("scope", "public"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .map_err(|e| FetchError::TokenUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::TokenUnavailable(format!("Failed to read token body: {}", e)))?;

        if !status.is_success() {
            return Err(token_status_error(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Authentication(format!("Invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(86_400));
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);
        info!("Obtained scoring service token (valid for {}s)", lifetime.as_secs());

        self.token = Some(AccessToken {
            value: SecretString::from(token.access_token),
            expires_at,
        });
        Ok(())
    }

    fn bearer(&mut self) -> Result<String, FetchError> {
        let expired = self
            .token
            .as_ref()
            .map_or(true, |t| Instant::now() >= t.expires_at);
        if expired {
            debug!("Access token missing or about to expire, renewing");
            self.authenticate()?;
        }

        self.token
            .as_ref()
            .map(|t| format!("Bearer {}", t.value.expose_secret()))
            .ok_or_else(|| FetchError::Authentication("No access token available".to_string()))
    }
}

impl ScoreFetcher for OsuClient {
    fn fetch(&mut self, beatmap_id: u64) -> Result<Vec<ScoreRecord>, FetchError> {
        let authorization = self.bearer()?;
        let url = format!("{}/api/v2/beatmaps/{}/scores", self.base_url, beatmap_id);
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .header("x-api-version", API_VERSION)
            .query(&[("mode", self.ruleset.as_str()), ("limit", limit.as_str())])
            .send()
            .map_err(|e| FetchError::Transport {
                beatmap_id,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| FetchError::Transport {
            beatmap_id,
            message: format!("Failed to read body: {}", e),
        })?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                // Force a fresh token for the next beatmap.
                warn!("Scoring service rejected the access token");
                self.token = None;
            }
            return Err(FetchError::Status {
                beatmap_id,
                status: status.as_u16(),
                body: sanitize_error_body(&body),
            });
        }

        parse_scores(beatmap_id, &body)
    }
}

impl BeatmapSearch for OsuClient {
    /// `GET /api/v2/beatmapsets/search` over sets with a leaderboard.
    fn search(&mut self, query: &str, cursor: Option<&str>) -> Result<SearchPage, FetchError> {
        let mode = ruleset_mode(&self.ruleset).ok_or_else(|| {
            FetchError::Search(format!("ruleset '{}' cannot be searched", self.ruleset))
        })?;
        let authorization = self.bearer()?;
        let url = format!("{}/api/v2/beatmapsets/search", self.base_url);
        let mode_param = mode.to_string();

        let mut params = vec![
            ("q", query),
            ("m", mode_param.as_str()),
            ("s", "leaderboard"),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor_string", cursor));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .header("x-api-version", API_VERSION)
            .query(&params)
            .send()
            .map_err(|e| FetchError::Search(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::Search(format!("Failed to read body: {}", e)))?;
        if !status.is_success() {
            return Err(FetchError::Search(format!(
                "HTTP {}: {}",
                status.as_u16(),
                sanitize_error_body(&body)
            )));
        }

        let page = parse_search_page(&body, mode)?;
        debug!(
            "Search page with {} beatmaps (more: {})",
            page.items.len(),
            page.cursor.is_some()
        );
        Ok(page)
    }
}

/// Flattens beatmapsets into catalog items, keeping only beatmaps of `mode`.
pub(crate) fn parse_search_page(body: &str, mode: u8) -> Result<SearchPage, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Search(format!("Malformed search page: {}", e)))?;

    let mut items = Vec::new();
    for set in response.beatmapsets {
        let ranked_date = set.ranked_date.unwrap_or_default();
        for beatmap in set.beatmaps.into_iter().filter(|b| b.mode_int == mode) {
            items.push(WorkItem {
                id: beatmap.id,
                title: set.title.clone(),
                difficulty_name: beatmap.version,
                stars: beatmap.difficulty_rating,
                ranked_date: ranked_date.clone(),
                bpm: beatmap.bpm.unwrap_or(0.0),
                ar: beatmap.ar,
                od: beatmap.accuracy,
                cs: beatmap.cs,
                hp: beatmap.drain,
                length: beatmap.total_length,
                circles: beatmap.count_circles,
                sliders: beatmap.count_sliders,
                spinners: beatmap.count_spinners,
            });
        }
    }

    Ok(SearchPage {
        items,
        cursor: response.cursor_string.filter(|c| !c.is_empty()),
    })
}

/// A rejected grant is fatal; throttling and server errors are retried on
/// the next beatmap.
fn token_status_error(status: u16, body: &str) -> FetchError {
    let message = format!(
        "Token endpoint returned HTTP {}: {}",
        status,
        sanitize_error_body(body)
    );
    if status == 429 || status >= 500 {
        warn!("{}", message);
        FetchError::TokenUnavailable(message)
    } else {
        FetchError::Authentication(message)
    }
}

/// Decodes a leaderboard body, keeping the service's rank order.
pub(crate) fn parse_scores(beatmap_id: u64, body: &str) -> Result<Vec<ScoreRecord>, FetchError> {
    let response: ScoresResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode {
            beatmap_id,
            message: e.to_string(),
        })?;

    response
        .scores
        .into_iter()
        .enumerate()
        .map(|(rank, score)| -> Result<ScoreRecord, FetchError> {
            let total_score = score
                .classic_total_score
                .or(score.total_score)
                .or(score.score)
                .ok_or_else(|| FetchError::Decode {
                    beatmap_id,
                    message: format!("score at rank {} has no total", rank + 1),
                })?;
            let country_code = score
                .user
                .and_then(|u| u.country_code)
                .filter(|c| !c.is_empty());
            Ok(ScoreRecord {
                total_score,
                country_code,
            })
        })
        .collect()
}
