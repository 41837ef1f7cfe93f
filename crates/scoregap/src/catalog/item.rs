use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One ranked beatmap from the catalog.
///
/// Field names follow the catalog's CSV header; unknown columns are ignored.
/// Attribute columns absent from the header read as zero; whether they may
/// be absent is decided by [`CatalogColumns`](super::CatalogColumns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "beatmap_id")]
    pub id: u64,
    pub title: String,
    #[serde(rename = "diffname")]
    pub difficulty_name: String,
    #[serde(default)]
    pub stars: f64,
    #[serde(rename = "approved_date")]
    pub ranked_date: String,
    #[serde(default)]
    pub bpm: f64,
    #[serde(default)]
    pub ar: f64,
    #[serde(default)]
    pub od: f64,
    #[serde(default)]
    pub cs: f64,
    #[serde(default)]
    pub hp: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub circles: u32,
    #[serde(default)]
    pub sliders: u32,
    #[serde(default)]
    pub spinners: u32,
}

impl WorkItem {
    /// Total hit objects: circles + sliders + spinners.
    pub fn note_count(&self) -> u64 {
        u64::from(self.circles) + u64::from(self.sliders) + u64::from(self.spinners)
    }

    /// `Title [Difficulty]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.title, self.difficulty_name)
    }

    /// The ranked date as `YYYY-MM-DD` when it parses, otherwise verbatim.
    pub fn ranked_day(&self) -> String {
        parse_day(&self.ranked_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.ranked_date.clone())
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
pub(crate) fn sample_item(id: u64) -> WorkItem {
    WorkItem {
        id,
        title: format!("Song {}", id),
        difficulty_name: "Insane".to_string(),
        stars: 5.25,
        ranked_date: "2014-03-01 12:30:00".to_string(),
        bpm: 180.0,
        ar: 9.0,
        od: 8.0,
        cs: 4.0,
        hp: 6.0,
        length: 125.0,
        circles: 400,
        sliders: 90,
        spinners: 1,
    }
}
