//! Team statistics computation
//!
//! Career and per-season rollups over rated match rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::report::reference::world_cup_titles;
use crate::report::MatchRow;
use crate::{MatchResult, TeamId};

/// Running totals for one team
#[derive(Debug, Clone, Default)]
pub struct TeamStatistics {
    /// Total matches played
    pub matches_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Total points scored
    pub points_for: u32,
    /// Total points conceded
    pub points_against: u32,
    pub margin_total: i64,
    pub dominance_total: f64,
    /// `elo_post` of the most recent row seen
    pub latest_rating: Option<f64>,
    pub peak_rating: Option<f64>,
}

impl TeamStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row; rows must arrive in chronological order for
    /// `latest_rating` to be meaningful
    pub fn update(&mut self, row: &MatchRow) {
        self.matches_played += 1;
        self.points_for += row.team_score as u32;
        self.points_against += row.opponent_score as u32;
        self.margin_total += row.margin as i64;
        self.dominance_total += row.dominance_score;

        match row.result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Draw => self.draws += 1,
        }

        self.latest_rating = Some(row.elo_post);
        self.peak_rating = Some(match self.peak_rating {
            Some(peak) => peak.max(row.elo_post),
            None => row.elo_post,
        });
    }

    /// Win percentage (0-100)
    pub fn win_pct(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.matches_played as f64 * 100.0
        }
    }

    /// Average point differential per match
    pub fn avg_margin(&self) -> f64 {
        self.per_match(self.margin_total as f64)
    }

    /// Average points scored per match
    pub fn avg_points_for(&self) -> f64 {
        self.per_match(self.points_for as f64)
    }

    /// Average points conceded per match
    pub fn avg_points_against(&self) -> f64 {
        self.per_match(self.points_against as f64)
    }

    fn per_match(&self, total: f64) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            total / self.matches_played as f64
        }
    }
}

/// Ranking order: win % desc, mean margin desc, matches played desc, then name
fn ranking_cmp(a: (&TeamId, &TeamStatistics), b: (&TeamId, &TeamStatistics)) -> Ordering {
    b.1.win_pct()
        .total_cmp(&a.1.win_pct())
        .then_with(|| b.1.avg_margin().total_cmp(&a.1.avg_margin()))
        .then_with(|| b.1.matches_played.cmp(&a.1.matches_played))
        .then_with(|| a.0.cmp(b.0))
}

fn ranked(stats: BTreeMap<TeamId, TeamStatistics>) -> Vec<(usize, TeamId, TeamStatistics)> {
    let mut entries: Vec<(TeamId, TeamStatistics)> = stats.into_iter().collect();
    entries.sort_by(|a, b| ranking_cmp((&a.0, &a.1), (&b.0, &b.1)));
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (team, stats))| (i + 1, team, stats))
        .collect()
}

/// Career rollup row for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub rank: usize,
    pub team: TeamId,
    pub matches_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub win_pct: f64,
    pub margin_per_match: f64,
    pub points_for_per_match: f64,
    pub points_allowed_per_match: f64,
    pub dominance_score: f64,
    pub latest_elo: f64,
    pub peak_elo: f64,
    /// Mean of the team's per-season margins
    pub avg_season_margin: f64,
    pub world_cup_titles: usize,
}

impl TeamSummary {
    fn new(rank: usize, team: TeamId, stats: &TeamStatistics, avg_season_margin: f64) -> Self {
        TeamSummary {
            rank,
            world_cup_titles: world_cup_titles(&team),
            team,
            matches_played: stats.matches_played,
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            win_pct: stats.win_pct(),
            margin_per_match: stats.avg_margin(),
            points_for_per_match: stats.avg_points_for(),
            points_allowed_per_match: stats.avg_points_against(),
            dominance_score: stats.dominance_total,
            latest_elo: stats.latest_rating.unwrap_or_default(),
            peak_elo: stats.peak_rating.unwrap_or_default(),
            avg_season_margin,
        }
    }
}

/// Season rollup row for one team; `rank` is within the season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamYearSummary {
    pub year: i32,
    pub rank: usize,
    pub team: TeamId,
    pub matches_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub win_pct: f64,
    pub margin_per_match: f64,
    pub points_for_per_match: f64,
    pub points_allowed_per_match: f64,
    pub dominance_score: f64,
    pub latest_elo: f64,
    pub peak_elo: f64,
}

impl TeamYearSummary {
    fn new(year: i32, rank: usize, team: TeamId, stats: &TeamStatistics) -> Self {
        TeamYearSummary {
            year,
            rank,
            team,
            matches_played: stats.matches_played,
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            win_pct: stats.win_pct(),
            margin_per_match: stats.avg_margin(),
            points_for_per_match: stats.avg_points_for(),
            points_allowed_per_match: stats.avg_points_against(),
            dominance_score: stats.dominance_total,
            latest_elo: stats.latest_rating.unwrap_or_default(),
            peak_elo: stats.peak_rating.unwrap_or_default(),
        }
    }
}

/// Per-team career rollup, ranked from 1
pub fn team_rollup(rows: &[MatchRow]) -> Vec<TeamSummary> {
    let mut stats: BTreeMap<TeamId, TeamStatistics> = BTreeMap::new();
    for row in rows {
        stats.entry(row.team.clone()).or_default().update(row);
    }
    let seasons = team_year_rollup(rows);

    ranked(stats)
        .into_iter()
        .map(|(rank, team, stats)| {
            let season_margin = avg_season_margin(&seasons, &team).unwrap_or_default();
            TeamSummary::new(rank, team, &stats, season_margin)
        })
        .collect()
}

/// Per-team per-season rollup, ordered by year then in-season rank
pub fn team_year_rollup(rows: &[MatchRow]) -> Vec<TeamYearSummary> {
    let mut by_year: BTreeMap<i32, BTreeMap<TeamId, TeamStatistics>> = BTreeMap::new();
    for row in rows {
        by_year
            .entry(row.year)
            .or_default()
            .entry(row.team.clone())
            .or_default()
            .update(row);
    }

    by_year
        .into_iter()
        .flat_map(|(year, stats)| {
            ranked(stats)
                .into_iter()
                .map(move |(rank, team, stats)| TeamYearSummary::new(year, rank, team, &stats))
        })
        .collect()
}

/// Mean of a team's season margins (each season weighted equally)
pub fn avg_season_margin(seasons: &[TeamYearSummary], team: &TeamId) -> Option<f64> {
    let margins: Vec<f64> = seasons
        .iter()
        .filter(|s| &s.team == team)
        .map(|s| s.margin_per_match)
        .collect();
    if margins.is_empty() {
        None
    } else {
        Some(margins.iter().sum::<f64>() / margins.len() as f64)
    }
}

/// Alternative orderings for ranking views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    WinPct,
    Elo,
    Dominance,
}

impl std::str::FromStr for RankMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" | "win_pct" => Ok(RankMetric::WinPct),
            "elo" | "rating" => Ok(RankMetric::Elo),
            "dominance" => Ok(RankMetric::Dominance),
            _ => Err(format!("Unknown metric: {}. Use win, elo, or dominance.", s)),
        }
    }
}

/// Reorder summaries for display; `rank` keeps the win % ranking
pub fn sort_by_metric(summaries: &mut [TeamSummary], metric: RankMetric) {
    match metric {
        RankMetric::WinPct => summaries.sort_by_key(|s| s.rank),
        RankMetric::Elo => summaries.sort_by(|a, b| {
            b.latest_elo
                .total_cmp(&a.latest_elo)
                .then_with(|| a.rank.cmp(&b.rank))
        }),
        RankMetric::Dominance => summaries.sort_by(|a, b| {
            b.dominance_score
                .total_cmp(&a.dominance_score)
                .then_with(|| a.rank.cmp(&b.rank))
        }),
    }
}
