//! Tier and competition classification
//!
//! Maps nations to a competitive tier and picks the K-factor for a match.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Config, TeamId};

/// Coarse strength classification of a nation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    One,
    Two,
    /// Anything outside the configured nation set
    Unranked,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::One => write!(f, "Tier 1"),
            Tier::Two => write!(f, "Tier 2"),
            Tier::Unranked => write!(f, "Unranked"),
        }
    }
}

/// K-factor per match category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KFactors {
    pub world_cup: f64,
    pub tier1: f64,
    pub cross_tier: f64,
    pub base: f64,
}

impl Default for KFactors {
    fn default() -> Self {
        KFactors {
            world_cup: 40.0,
            tier1: 30.0,
            cross_tier: 25.0,
            base: 20.0,
        }
    }
}

impl KFactors {
    /// Same K for every category (the older single-K rating variant)
    pub fn flat(k: f64) -> Self {
        KFactors {
            world_cup: k,
            tier1: k,
            cross_tier: k,
            base: k,
        }
    }
}

/// Stateless tier and K-factor lookup
#[derive(Debug, Clone)]
pub struct Classifier {
    tier1: HashSet<TeamId>,
    tier2: HashSet<TeamId>,
    world_cup: String,
    k_factors: KFactors,
}

impl Classifier {
    pub fn new<I, J>(tier1: I, tier2: J, world_cup: &str, k_factors: KFactors) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        Classifier {
            tier1: tier1.into_iter().map(|t| TeamId(t.into())).collect(),
            tier2: tier2.into_iter().map(|t| TeamId(t.into())).collect(),
            world_cup: world_cup.to_string(),
            k_factors,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let k_factors = KFactors {
            world_cup: config.rating.k_world_cup,
            tier1: config.rating.k_tier1,
            cross_tier: config.rating.k_cross_tier,
            base: config.rating.k_base,
        };
        Self::new(
            config.filter.tier1.iter().cloned(),
            config.filter.tier2.iter().cloned(),
            &config.rating.world_cup_tournament,
            k_factors,
        )
    }

    pub fn tier_of(&self, team: &TeamId) -> Tier {
        if self.tier1.contains(team) {
            Tier::One
        } else if self.tier2.contains(team) {
            Tier::Two
        } else {
            Tier::Unranked
        }
    }

    /// Check if a team belongs to the configured nation set
    pub fn is_eligible(&self, team: &TeamId) -> bool {
        self.tier_of(team) != Tier::Unranked
    }

    pub fn is_world_cup(&self, tournament: &str) -> bool {
        tournament.trim() == self.world_cup
    }

    /// K-factor for a match, in priority order: World Cup, Tier 1 vs Tier 1,
    /// mixed tiers, everything else
    pub fn k_factor(&self, tournament: &str, a: Tier, b: Tier) -> f64 {
        if self.is_world_cup(tournament) {
            self.k_factors.world_cup
        } else if a == Tier::One && b == Tier::One {
            self.k_factors.tier1
        } else if a != b {
            self.k_factors.cross_tier
        } else {
            self.k_factors.base
        }
    }

    pub fn k_for_teams(&self, tournament: &str, team: &TeamId, opponent: &TeamId) -> f64 {
        self.k_factor(tournament, self.tier_of(team), self.tier_of(opponent))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
