use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::analysis::{CountryTotals, LeaderboardAnalysis, LeaderboardOutcome};
use crate::catalog::WorkItem;
use crate::config::CountryConfig;
use crate::storage;

use super::format::group_thousands;
use super::{ReportError, ReportSink};

/// National leaderboard, rewritten in full after every fetched beatmap.
#[derive(Debug)]
pub struct LeaderboardReport {
    path: PathBuf,
    countries: Vec<CountryConfig>,
}

impl LeaderboardReport {
    pub fn new(path: impl Into<PathBuf>, countries: Vec<CountryConfig>) -> Self {
        Self {
            path: path.into(),
            countries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn country_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.countries
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
            .unwrap_or(code)
    }

    fn render_rows<'a>(&self, out: &mut String, rows: impl Iterator<Item = (&'a str, u64)>) {
        for (code, total) in rows {
            let _ = writeln!(
                out,
                "{};{};{};",
                code,
                self.country_name(code),
                group_thousands(total)
            );
        }
    }

    fn write(&self, content: &str) -> Result<(), ReportError> {
        storage::write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }
}

impl ReportSink<LeaderboardAnalysis> for LeaderboardReport {
    fn reset(&mut self) -> Result<u64, ReportError> {
        let mut out = String::new();
        self.render_rows(&mut out, self.countries.iter().map(|c| (c.code.as_str(), 0)));
        self.write(&out)?;
        Ok(0)
    }

    /// Rewritten from the checkpoint totals. A crash between `record` and
    /// the checkpoint save leaves the file one beatmap ahead.
    fn restore(&mut self, _committed_len: u64, totals: &CountryTotals) -> Result<(), ReportError> {
        let mut out = String::new();
        self.render_rows(&mut out, totals.iter());
        self.write(&out)
    }

    fn record(
        &mut self,
        position: usize,
        item: &WorkItem,
        _outcome: &LeaderboardOutcome,
        totals: &CountryTotals,
    ) -> Result<u64, ReportError> {
        let mut out = String::new();
        self.render_rows(&mut out, totals.iter());
        let _ = writeln!(
            out,
            "\nBeatmap #{} : {} - {} ({}) - {}",
            position,
            item.id,
            item.title,
            item.difficulty_name,
            item.ranked_day()
        );
        self.write(&out)?;
        Ok(0)
    }

    fn finish(&mut self, totals: &CountryTotals) -> Result<(), ReportError> {
        let mut out = String::new();
        self.render_rows(&mut out, totals.iter());
        out.push_str("\nFinal ranking\n");
        self.render_rows(&mut out, totals.ranked().into_iter());
        self.write(&out)
    }
}
