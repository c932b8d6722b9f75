//! Tabular views over rated matches
//!
//! Flat output rows plus the team, season and head-to-head rollups the
//! presentation layer reads.

pub mod display;
pub mod head_to_head;
pub mod reference;
pub mod team_stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ratings::RatedMatch;
use crate::{MatchResult, TeamId};

pub use head_to_head::{head_to_head, HeadToHead, Meeting};
pub use team_stats::{
    avg_season_margin, sort_by_metric, team_rollup, team_year_rollup, RankMetric,
    TeamStatistics, TeamSummary, TeamYearSummary,
};

/// One canonical match row with its rating and dominance columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub date: NaiveDate,
    pub year: i32,
    pub team: TeamId,
    pub opponent: TeamId,
    pub team_score: u16,
    pub opponent_score: u16,
    pub margin: i32,
    pub result: MatchResult,
    pub tournament: String,
    pub elo_pre: f64,
    pub elo_post: f64,
    pub elo_delta: f64,
    pub dominance_score: f64,
}

impl MatchRow {
    pub fn from_rated(rated: &RatedMatch, dominance_score: f64) -> Self {
        let record = &rated.record;
        MatchRow {
            date: record.date,
            year: record.year(),
            team: record.team.clone(),
            opponent: record.opponent.clone(),
            team_score: record.team_score,
            opponent_score: record.opponent_score,
            margin: record.margin(),
            result: record.result(),
            tournament: record.tournament.clone(),
            elo_pre: rated.elo.elo_pre,
            elo_post: rated.elo.elo_post,
            elo_delta: rated.elo.elo_delta,
            dominance_score,
        }
    }
}

/// Order rows by (date, team) for output; equal keys keep processing order
pub fn sort_for_output(rows: &mut [MatchRow]) {
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.team.cmp(&b.team)));
}

/// Rows involving a team as the observing side, in the order given
pub fn team_rows<'a>(rows: &'a [MatchRow], team: &TeamId) -> Vec<&'a MatchRow> {
    rows.iter().filter(|r| &r.team == team).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn make_row(
        date: (i32, u32, u32),
        team: &str,
        opponent: &str,
        ts: u16,
        os: u16,
    ) -> MatchRow {
        let margin = ts as i32 - os as i32;
        MatchRow {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            year: date.0,
            team: TeamId::from(team),
            opponent: TeamId::from(opponent),
            team_score: ts,
            opponent_score: os,
            margin,
            result: MatchResult::from_margin(margin),
            tournament: "Test Match".to_string(),
            elo_pre: 1500.0,
            elo_post: 1500.0 + margin as f64,
            elo_delta: margin as f64,
            dominance_score: margin as f64 / 2.0,
        }
    }
}
