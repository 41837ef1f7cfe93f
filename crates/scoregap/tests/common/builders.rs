//! Builders for catalog items, leaderboards and country lists.

#![allow(dead_code)]

use scoregap::config::CountryConfig;
use scoregap::{ScoreRecord, WorkItem};

/// Builder for `WorkItem`s. Defaults describe an eligible beatmap.
pub struct ItemBuilder {
    item: WorkItem,
}

impl ItemBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            item: WorkItem {
                id,
                title: format!("Map {}", id),
                difficulty_name: "Hard".to_string(),
                stars: 5.0,
                ranked_date: "2015-06-01 10:00:00".to_string(),
                bpm: 170.0,
                ar: 9.0,
                od: 8.0,
                cs: 4.0,
                hp: 5.0,
                length: 120.0,
                circles: 500,
                sliders: 100,
                spinners: 2,
            },
        }
    }

    pub fn title(mut self, title: &str, difficulty: &str) -> Self {
        self.item.title = title.to_string();
        self.item.difficulty_name = difficulty.to_string();
        self
    }

    pub fn stars(mut self, stars: f64) -> Self {
        self.item.stars = stars;
        self
    }

    pub fn notes(mut self, circles: u32, sliders: u32, spinners: u32) -> Self {
        self.item.circles = circles;
        self.item.sliders = sliders;
        self.item.spinners = spinners;
        self
    }

    pub fn build(self) -> WorkItem {
        self.item
    }
}

/// Renders items as a catalog CSV with the expected header.
pub fn catalog_csv(items: &[WorkItem]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "beatmap_id",
            "title",
            "diffname",
            "stars",
            "approved_date",
            "bpm",
            "ar",
            "od",
            "cs",
            "hp",
            "length",
            "circles",
            "sliders",
            "spinners",
        ])
        .unwrap();
    for item in items {
        writer
            .write_record([
                item.id.to_string(),
                item.title.clone(),
                item.difficulty_name.clone(),
                item.stars.to_string(),
                item.ranked_date.clone(),
                item.bpm.to_string(),
                item.ar.to_string(),
                item.od.to_string(),
                item.cs.to_string(),
                item.hp.to_string(),
                item.length.to_string(),
                item.circles.to_string(),
                item.sliders.to_string(),
                item.spinners.to_string(),
            ])
            .unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

/// Builder for a leaderboard, best score first.
#[derive(Default)]
pub struct ScoresBuilder {
    scores: Vec<ScoreRecord>,
}

impl ScoresBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(mut self, total: u64, country: &str) -> Self {
        self.scores.push(ScoreRecord::new(total, Some(country)));
        self
    }

    pub fn anonymous(mut self, total: u64) -> Self {
        self.scores.push(ScoreRecord::new(total, None));
        self
    }

    pub fn build(self) -> Vec<ScoreRecord> {
        self.scores
    }
}

pub fn countries(entries: &[(&str, &str)]) -> Vec<CountryConfig> {
    entries
        .iter()
        .map(|(code, name)| CountryConfig {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}
