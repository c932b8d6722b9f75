//! Per-match dominance score
//!
//! Bounded score combining the winning margin with the opponent's pre-match
//! rating. It never feeds back into the Elo sweep.

use crate::ratings::elo::{expected_score, RatedMatch, BASE_RATING};
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominanceScorer {
    margin_scale: f64,
    max_score: f64,
    base_rating: f64,
}

impl Default for DominanceScorer {
    fn default() -> Self {
        DominanceScorer {
            margin_scale: 20.0,
            max_score: 50.0,
            base_rating: BASE_RATING,
        }
    }
}

impl DominanceScorer {
    pub fn new(margin_scale: f64, max_score: f64, base_rating: f64) -> Self {
        DominanceScorer {
            margin_scale,
            max_score,
            base_rating,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.dominance.margin_scale,
            config.dominance.max_score,
            config.rating.base_rating,
        )
    }

    /// Opponent strength multiplier in (0, 2); 1.0 for a base-rated opponent
    pub fn strength(&self, opponent_pre: f64) -> f64 {
        2.0 * expected_score(opponent_pre, self.base_rating)
    }

    /// Score in (-2 * max_score, 2 * max_score). Wins count for more against
    /// stronger opponents, losses cost less. Non-decreasing in margin; strictly
    /// increasing until `tanh` rounds to 1.0 (about 19 * `margin_scale`).
    pub fn score(&self, margin: i32, opponent_pre: f64) -> f64 {
        let base = (margin as f64 / self.margin_scale).tanh();
        let strength = self.strength(opponent_pre);
        let weight = if base >= 0.0 { strength } else { 2.0 - strength };
        self.max_score * base * weight
    }

    pub fn score_match(&self, rated: &RatedMatch) -> f64 {
        self.score(rated.record.margin(), rated.opponent_elo.elo_pre)
    }
}
