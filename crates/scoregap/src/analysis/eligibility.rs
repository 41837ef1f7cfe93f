use crate::catalog::WorkItem;

pub const DEFAULT_MAX_DIFFICULTY: f64 = 8.0;
pub const DEFAULT_MIN_NOTE_COUNT: u64 = 400;

/// Pre-fetch filter: only beatmaps below the difficulty ceiling and above
/// the note floor are worth a rate-limited leaderboard call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityRule {
    pub max_difficulty: f64,
    pub min_note_count: u64,
}

impl Default for EligibilityRule {
    fn default() -> Self {
        Self {
            max_difficulty: DEFAULT_MAX_DIFFICULTY,
            min_note_count: DEFAULT_MIN_NOTE_COUNT,
        }
    }
}

impl EligibilityRule {
    /// Both bounds are strict. A NaN difficulty is never admitted.
    pub fn admits(&self, item: &WorkItem) -> bool {
        item.stars < self.max_difficulty && item.note_count() > self.min_note_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::item::sample_item;

    fn item(stars: f64, circles: u32, sliders: u32, spinners: u32) -> WorkItem {
        WorkItem {
            stars,
            circles,
            sliders,
            spinners,
            ..sample_item(1)
        }
    }

    #[test]
    fn test_admits_easy_dense_map() {
        assert!(EligibilityRule::default().admits(&item(5.0, 300, 150, 50)));
    }

    #[test]
    fn test_difficulty_ceiling_is_strict() {
        let rule = EligibilityRule::default();
        assert!(!rule.admits(&item(8.0, 500, 0, 0)));
        assert!(rule.admits(&item(7.99, 500, 0, 0)));
        assert!(!rule.admits(&item(9.0, 500, 0, 0)));
    }

    #[test]
    fn test_note_floor_is_strict() {
        let rule = EligibilityRule::default();
        assert!(!rule.admits(&item(5.0, 300, 99, 1)));
        assert!(rule.admits(&item(5.0, 300, 100, 1)));
    }

    #[test]
    fn test_nan_difficulty_rejected() {
        assert!(!EligibilityRule::default().admits(&item(f64::NAN, 500, 0, 0)));
    }

    #[test]
    fn test_custom_bounds() {
        let rule = EligibilityRule {
            max_difficulty: 4.0,
            min_note_count: 10,
        };
        assert!(rule.admits(&item(3.5, 11, 0, 0)));
        assert!(!rule.admits(&item(4.5, 11, 0, 0)));
    }
}
