//! Best-run records
//!
//! Kept for end-screen comparison only. Storage is the host's business;
//! the records round-trip through `serde_json`.

use serde::{Deserialize, Serialize};

use crate::sim::state::GameSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Records {
    pub high_score: u64,
    pub best_combo: u32,
    /// Tallest tower left standing at the end of a won game
    pub best_tower_height: usize,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score beats the current high score
    pub fn is_new_high_score(&self, score: u64) -> bool {
        score > self.high_score
    }

    /// Fold a finished run into the records
    ///
    /// Returns true if any record improved. Tower height only counts for
    /// won games.
    pub fn merge(&mut self, summary: &GameSummary) -> bool {
        let mut improved = false;
        if summary.score > self.high_score {
            self.high_score = summary.score;
            improved = true;
        }
        if summary.max_combo > self.best_combo {
            self.best_combo = summary.max_combo;
            improved = true;
        }
        if summary.won && summary.tower_height > self.best_tower_height {
            self.best_tower_height = summary.tower_height;
            improved = true;
        }
        if improved {
            log::info!(
                "New records: score {}, combo {}, tower {}",
                self.high_score,
                self.best_combo,
                self.best_tower_height
            );
        }
        improved
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse stored records; anything unreadable starts fresh
    pub fn from_json_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable records: {e}");
            Self::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: u64, max_combo: u32, tower_height: usize, won: bool) -> GameSummary {
        GameSummary {
            score,
            max_combo,
            tower_height,
            won,
        }
    }

    #[test]
    fn test_merge_improves_each_record() {
        let mut records = Records::new();
        assert!(records.merge(&summary(1200, 4, 3, true)));
        assert_eq!(
            records,
            Records {
                high_score: 1200,
                best_combo: 4,
                best_tower_height: 3
            }
        );

        assert!(!records.merge(&summary(800, 2, 1, true)));
        assert!(records.merge(&summary(800, 9, 0, false)));
        assert_eq!(records.high_score, 1200);
        assert_eq!(records.best_combo, 9);
    }

    #[test]
    fn test_lost_game_tower_does_not_count() {
        let mut records = Records::new();
        assert!(!records.merge(&summary(0, 0, 7, false)));
        assert_eq!(records.best_tower_height, 0);
    }

    #[test]
    fn test_high_score_check() {
        let records = Records {
            high_score: 500,
            ..Default::default()
        };
        assert!(records.is_new_high_score(501));
        assert!(!records.is_new_high_score(500));
    }

    #[test]
    fn test_json_round_trip_and_garbage() {
        let records = Records {
            high_score: 42,
            best_combo: 3,
            best_tower_height: 5,
        };
        let json = records.to_json().unwrap();
        assert_eq!(Records::from_json_or_default(&json), records);
        assert_eq!(Records::from_json_or_default("nope"), Records::new());
        assert_eq!(
            Records::from_json_or_default(r#"{"high_score": 9}"#).high_score,
            9
        );
    }
}
