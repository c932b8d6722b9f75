//! Rating layers
//!
//! Tier classification, the chronological Elo sweep and per-match dominance.

pub mod dominance;
pub mod elo;
pub mod tier;

pub use dominance::DominanceScorer;
pub use elo::{expected_score, EloEngine, RatedMatch, RatingEvent, RatingRun, RatingState};
pub use tier::{Classifier, KFactors, Tier};
