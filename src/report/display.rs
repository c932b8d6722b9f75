//! Terminal rendering of the report tables

use std::fmt::Write;

use crate::report::reference::{title_counts, WORLD_CUP_WINNERS};
use crate::report::{HeadToHead, MatchRow, TeamSummary, TeamYearSummary};
use crate::TeamId;

const RULE: &str = "───────────────────────────────────────────────────────────────────────────";

/// Ranking table, one line per team in the order given
pub fn format_rankings(summaries: &[TeamSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<14} {:>4} {:>4} {:>4} {:>4} {:>7} {:>8} {:>10} {:>8}",
        "Rank", "Team", "P", "W", "L", "D", "Win %", "Margin", "Dominance", "Elo"
    );
    let _ = writeln!(out, "{}", RULE);
    for s in summaries {
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:>4} {:>4} {:>4} {:>4} {:>6.1}% {:>8.2} {:>10.1} {:>8.1}",
            s.rank,
            s.team.as_str(),
            s.matches_played,
            s.wins,
            s.losses,
            s.draws,
            s.win_pct,
            s.margin_per_match,
            s.dominance_score,
            s.latest_elo
        );
    }
    out
}

/// Season-by-season table for one team
pub fn format_trend(team: &TeamId, seasons: &[&TeamYearSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", team);
    let _ = writeln!(
        out,
        "  {:>4} {:>4} {:>7} {:>8} {:>8}",
        "Year", "P", "Win %", "Margin", "Elo"
    );
    for s in seasons {
        let _ = writeln!(
            out,
            "  {:>4} {:>4} {:>6.1}% {:>8.2} {:>8.1}",
            s.year, s.matches_played, s.win_pct, s.margin_per_match, s.latest_elo
        );
    }
    out
}

/// Snapshot card for a single team
pub fn format_team_snapshot(summary: &TeamSummary, recent: &[&MatchRow]) -> String {
    let mut out = format!(
        r#"
┌─────────────────────────────────────────────────┐
│  Team Snapshot: {}
├─────────────────────────────────────────────────┤
│  Rank:                 {}
│  Record (W-L-D):       {}-{}-{}
│  Win %:                {:.1}%
│  Avg margin/match:     {:.2}
│  Points allowed/match: {:.2}
│  Dominance:            {:.1}
│  Elo (latest / peak):  {:.1} / {:.1}
│  Avg seasonal margin:  {:.2}
│  World Cup titles:     {}
└─────────────────────────────────────────────────┘
"#,
        summary.team,
        summary.rank,
        summary.wins,
        summary.losses,
        summary.draws,
        summary.win_pct,
        summary.margin_per_match,
        summary.points_allowed_per_match,
        summary.dominance_score,
        summary.latest_elo,
        summary.peak_elo,
        summary.avg_season_margin,
        summary.world_cup_titles,
    );

    if !recent.is_empty() {
        let _ = writeln!(out, "Recent matches");
        for row in recent {
            let _ = writeln!(
                out,
                "  {}  {:<4} {:>3}-{:<3} vs {:<14} Elo {:>7.1} ({:+.1})",
                row.date,
                row.result.to_string(),
                row.team_score,
                row.opponent_score,
                row.opponent.as_str(),
                row.elo_post,
                row.elo_delta
            );
        }
    }
    out
}

pub fn format_head_to_head(h2h: &HeadToHead) -> String {
    let mut out = format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Meetings:     {}
│  Wins:         {} {} - {} {}
│  Draws:        {}
│  Points:       {} - {}
│  Avg margin:   {:+.2}
│  Last meeting: {}
└─────────────────────────────────────────────────┘
"#,
        h2h.team_a,
        h2h.team_b,
        h2h.played(),
        h2h.team_a,
        h2h.wins_a,
        h2h.wins_b,
        h2h.team_b,
        h2h.draws,
        h2h.points_a,
        h2h.points_b,
        h2h.avg_margin(),
        h2h.last_meeting()
            .map(|m| m.date.to_string())
            .unwrap_or_else(|| "-".to_string()),
    );

    for m in &h2h.meetings {
        let _ = writeln!(
            out,
            "  {}  {:<4} {:>3}-{:<3} {}",
            m.date,
            m.result.to_string(),
            m.points_for,
            m.points_against,
            m.tournament
        );
    }
    out
}

pub fn format_world_cups() -> String {
    let mut out = String::from("Rugby World Cup Winners\n");
    let _ = writeln!(out, "  {:<6} {}", "Year", "Winner");
    for (year, winner) in WORLD_CUP_WINNERS {
        let _ = writeln!(out, "  {:<6} {}", year, winner);
    }
    let _ = writeln!(out, "\nTitles");
    for (team, titles) in title_counts() {
        let _ = writeln!(out, "  {:<14} {}", team, "#".repeat(titles));
    }
    out
}

pub fn format_leaderboard(board: &[(TeamId, f64)]) -> String {
    let mut out = String::new();
    for (i, (team, rating)) in board.iter().enumerate() {
        let _ = writeln!(out, "{:>4}  {:<20} {:>8.1}", i + 1, team.as_str(), rating);
    }
    out
}
