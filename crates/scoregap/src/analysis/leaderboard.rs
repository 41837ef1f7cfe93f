use crate::catalog::WorkItem;
use crate::config::CountryConfig;
use crate::fetcher::ScoreRecord;

use super::{Analysis, SkipReason};

/// Running score sum per tracked country, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTotals {
    entries: Vec<(String, u64)>,
}

impl CountryTotals {
    pub fn zeroed<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            entries: codes.into_iter().map(|c| (c.to_string(), 0)).collect(),
        }
    }

    pub fn from_entries(entries: Vec<(String, u64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(c, t)| (c.as_str(), *t))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Highest total first; ties keep configured order.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    fn add(&mut self, code: &str, score: u64) {
        if let Some((_, total)) = self.entries.iter_mut().find(|(c, _)| c == code) {
            *total = total.saturating_add(score);
        }
    }
}

/// One contribution per tracked country for a single beatmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardOutcome {
    pub contributions: Vec<(String, u64)>,
    /// Countries absent from the window, credited with the last-ranked score.
    pub fallback_countries: usize,
}

/// Sums each tracked country's best leaderboard presence across the catalog.
#[derive(Debug, Clone)]
pub struct LeaderboardAnalysis {
    countries: Vec<CountryConfig>,
}

impl LeaderboardAnalysis {
    pub fn new(countries: Vec<CountryConfig>) -> Self {
        Self { countries }
    }

    pub fn countries(&self) -> &[CountryConfig] {
        &self.countries
    }
}

impl Analysis for LeaderboardAnalysis {
    type Totals = CountryTotals;
    type Outcome = LeaderboardOutcome;

    fn name(&self) -> &'static str {
        "leaderboard"
    }

    fn scope(&self) -> String {
        let codes: Vec<&str> = self.countries.iter().map(|c| c.code.as_str()).collect();
        format!("countries={}", codes.join(","))
    }

    fn initial_totals(&self) -> CountryTotals {
        CountryTotals::zeroed(self.countries.iter().map(|c| c.code.as_str()))
    }

    fn is_eligible(&self, _item: &WorkItem) -> bool {
        true
    }

    fn record_visit(&self, _totals: &mut CountryTotals, _eligible: bool) {}

    fn evaluate(&self, scores: &[ScoreRecord]) -> Result<LeaderboardOutcome, SkipReason> {
        let last = scores.last().ok_or(SkipReason::NoScores)?.total_score;

        let mut fallback_countries = 0;
        let contributions = self
            .countries
            .iter()
            .map(|country| {
                // First appearance in rank order is that country's best placement.
                let score = match scores.iter().find(|s| s.is_from(&country.code)) {
                    Some(record) => record.total_score,
                    None => {
                        fallback_countries += 1;
                        last
                    }
                };
                (country.code.clone(), score)
            })
            .collect();

        Ok(LeaderboardOutcome {
            contributions,
            fallback_countries,
        })
    }

    fn apply(&self, totals: &mut CountryTotals, outcome: &LeaderboardOutcome) {
        for (code, score) in &outcome.contributions {
            totals.add(code, *score);
        }
    }

    fn accepts(&self, scope: &str, totals: &CountryTotals) -> bool {
        scope == self.scope() && totals.codes().eq(self.countries.iter().map(|c| c.code.as_str()))
    }
}
