//! International rugby ratings
//!
//! Normalizes historical test match results, runs a chronological Elo sweep with
//! tier-aware K-factors, scores each match for dominance and rolls the results up
//! into team, season and head-to-head tables.

pub mod data;
pub mod pipeline;
pub mod ratings;
pub mod report;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team (the nation name, matched exactly)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(name: impl Into<String>) -> Self {
        TeamId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(name: &str) -> Self {
        TeamId(name.to_string())
    }
}

/// Outcome of a match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    pub fn from_margin(margin: i32) -> Self {
        match margin.cmp(&0) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Less => MatchResult::Loss,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }

    /// Actual score used by the Elo update: 1 for a win, 0.5 for a draw, 0 for a loss
    pub fn score(&self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Draw => 0.5,
            MatchResult::Loss => 0.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            MatchResult::Draw => MatchResult::Draw,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Win => write!(f, "Win"),
            MatchResult::Loss => write!(f, "Loss"),
            MatchResult::Draw => write!(f, "Draw"),
        }
    }
}

/// A canonical match row, always expressed from `team`'s perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub date: NaiveDate,
    pub tournament: String,
    pub team: TeamId,
    pub opponent: TeamId,
    pub team_score: u16,
    pub opponent_score: u16,
}

impl Match {
    /// Points difference (positive = `team` won)
    pub fn margin(&self) -> i32 {
        self.team_score as i32 - self.opponent_score as i32
    }

    pub fn result(&self) -> MatchResult {
        MatchResult::from_margin(self.margin())
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// The same match seen from the opponent's side
    pub fn mirrored(&self) -> Match {
        Match {
            date: self.date,
            tournament: self.tournament.clone(),
            team: self.opponent.clone(),
            opponent: self.team.clone(),
            team_score: self.opponent_score,
            opponent_score: self.team_score,
        }
    }
}

/// A home/away fixture as recorded by fixture-shaped sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub date: NaiveDate,
    pub tournament: String,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_score: u16,
    pub away_score: u16,
}

impl Fixture {
    pub fn home_view(&self) -> Match {
        Match {
            date: self.date,
            tournament: self.tournament.clone(),
            team: self.home_team.clone(),
            opponent: self.away_team.clone(),
            team_score: self.home_score,
            opponent_score: self.away_score,
        }
    }

    pub fn away_view(&self) -> Match {
        self.home_view().mirrored()
    }
}

/// A normalized batch of matches, keeping the shape the source recorded them in
#[derive(Debug, Clone, PartialEq)]
pub enum MatchBatch {
    /// One row per observing team; opponents are not mirrored
    Perspective(Vec<Match>),
    /// Home/away fixtures; each expands to two canonical rows
    Fixtures(Vec<Fixture>),
}

impl MatchBatch {
    /// Number of canonical rows this batch expands to
    pub fn row_count(&self) -> usize {
        match self {
            MatchBatch::Perspective(rows) => rows.len(),
            MatchBatch::Fixtures(fixtures) => fixtures.len() * 2,
        }
    }

    /// Expand into canonical rows (home perspective first for fixtures)
    pub fn into_matches(self) -> Vec<Match> {
        match self {
            MatchBatch::Perspective(rows) => rows,
            MatchBatch::Fixtures(fixtures) => fixtures
                .iter()
                .flat_map(|f| [f.home_view(), f.away_view()])
                .collect(),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum RugbyError {
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("No rated matches available - run `rugby build` first")]
    NoData,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, RugbyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rating: RatingConfig,
    pub dominance: DominanceConfig,
    pub filter: FilterConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConfig {
    pub base_rating: f64,
    /// Tournament name that always gets `k_world_cup`
    pub world_cup_tournament: String,
    pub k_world_cup: f64,
    pub k_tier1: f64,
    pub k_cross_tier: f64,
    pub k_base: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominanceConfig {
    /// Margin (in points) at which the score reaches ~76% of its range
    pub margin_scale: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Earliest year kept (modern World Cup era)
    pub min_year: i32,
    pub tier1: Vec<String>,
    pub tier2: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub input_path: String,
    pub output_path: String,
    pub team_stats_path: String,
    pub team_year_stats_path: String,
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Config {
            rating: RatingConfig {
                base_rating: 1500.0,
                world_cup_tournament: "World Cup".to_string(),
                k_world_cup: 40.0,
                k_tier1: 30.0,
                k_cross_tier: 25.0,
                k_base: 20.0,
            },
            dominance: DominanceConfig {
                margin_scale: 20.0,
                max_score: 50.0,
            },
            filter: FilterConfig {
                min_year: 1987,
                tier1: names(&[
                    "New Zealand",
                    "South Africa",
                    "England",
                    "Wales",
                    "Ireland",
                    "France",
                    "Australia",
                ]),
                tier2: names(&[
                    "Argentina",
                    "Fiji",
                    "Samoa",
                    "Tonga",
                    "Japan",
                    "Georgia",
                    "Italy",
                    "USA",
                    "Canada",
                ]),
            },
            data: DataConfig {
                input_path: "data/rugby_matches.csv".to_string(),
                output_path: "data/rugby_matches_with_elo.csv".to_string(),
                team_stats_path: "data/team_stats.csv".to_string(),
                team_year_stats_path: "data/team_year_stats.csv".to_string(),
                database_path: "data/rugby.db".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RugbyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| RugbyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RugbyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
