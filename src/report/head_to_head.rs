//! Head-to-head extraction
//!
//! Collects every meeting between two teams and reads it from the first team's
//! side, whichever perspective the rows were recorded in.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::report::MatchRow;
use crate::{MatchResult, TeamId};

/// One meeting, from `HeadToHead::team_a`'s side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub date: NaiveDate,
    pub tournament: String,
    pub points_for: u16,
    pub points_against: u16,
    pub margin: i32,
    pub result: MatchResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub team_a: TeamId,
    pub team_b: TeamId,
    /// Chronological
    pub meetings: Vec<Meeting>,
    pub wins_a: usize,
    pub wins_b: usize,
    pub draws: usize,
    pub points_a: u32,
    pub points_b: u32,
}

impl HeadToHead {
    pub fn played(&self) -> usize {
        self.meetings.len()
    }

    /// Average margin from `team_a`'s side
    pub fn avg_margin(&self) -> f64 {
        if self.meetings.is_empty() {
            0.0
        } else {
            (self.points_a as f64 - self.points_b as f64) / self.meetings.len() as f64
        }
    }

    pub fn last_meeting(&self) -> Option<&Meeting> {
        self.meetings.last()
    }
}

/// All meetings between `a` and `b` read from `a`'s side. When both
/// perspectives of a fixture are present only `a`'s row is counted.
pub fn head_to_head(rows: &[MatchRow], a: &TeamId, b: &TeamId) -> HeadToHead {
    let mut meetings: Vec<Meeting> = Vec::new();
    // (date, a's score, b's score) -> rows already taken from a's side
    let mut claimed: HashMap<(NaiveDate, u16, u16), usize> = HashMap::new();

    for row in rows.iter().filter(|r| &r.team == a && &r.opponent == b) {
        *claimed
            .entry((row.date, row.team_score, row.opponent_score))
            .or_default() += 1;
        meetings.push(Meeting {
            date: row.date,
            tournament: row.tournament.clone(),
            points_for: row.team_score,
            points_against: row.opponent_score,
            margin: row.margin,
            result: row.result,
        });
    }

    for row in rows.iter().filter(|r| &r.team == b && &r.opponent == a) {
        let key = (row.date, row.opponent_score, row.team_score);
        if let Some(count) = claimed.get_mut(&key) {
            if *count > 0 {
                *count -= 1;
                continue;
            }
        }
        meetings.push(Meeting {
            date: row.date,
            tournament: row.tournament.clone(),
            points_for: row.opponent_score,
            points_against: row.team_score,
            margin: -row.margin,
            result: row.result.flipped(),
        });
    }

    meetings.sort_by_key(|m| m.date);

    let mut h2h = HeadToHead {
        team_a: a.clone(),
        team_b: b.clone(),
        meetings: Vec::new(),
        wins_a: 0,
        wins_b: 0,
        draws: 0,
        points_a: 0,
        points_b: 0,
    };
    for m in &meetings {
        match m.result {
            MatchResult::Win => h2h.wins_a += 1,
            MatchResult::Loss => h2h.wins_b += 1,
            MatchResult::Draw => h2h.draws += 1,
        }
        h2h.points_a += m.points_for as u32;
        h2h.points_b += m.points_against as u32;
    }
    h2h.meetings = meetings;
    h2h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::make_row;

    #[test]
    fn test_fixture_pairs_count_once() {
        let rows = vec![
            make_row((2015, 10, 31), "New Zealand", "Australia", 34, 17),
            make_row((2015, 10, 31), "Australia", "New Zealand", 17, 34),
            make_row((2017, 10, 21), "Australia", "New Zealand", 23, 18),
            make_row((2017, 10, 21), "New Zealand", "Australia", 18, 23),
        ];
        let h2h = head_to_head(&rows, &TeamId::from("New Zealand"), &TeamId::from("Australia"));
        assert_eq!(h2h.played(), 2);
        assert_eq!(h2h.wins_a, 1);
        assert_eq!(h2h.wins_b, 1);
        assert_eq!(h2h.points_a, 52);
        assert_eq!(h2h.points_b, 40);
    }

    #[test]
    fn test_single_perspective_rows_are_mirrored() {
        let rows = vec![
            make_row((2016, 6, 11), "England", "Australia", 39, 28),
            make_row((2018, 11, 24), "Australia", "England", 18, 37),
            make_row((2022, 7, 2), "Australia", "England", 30, 28),
            make_row((2022, 7, 9), "Australia", "Scotland", 13, 17),
        ];
        let england = TeamId::from("England");
        let australia = TeamId::from("Australia");

        let from_england = head_to_head(&rows, &england, &australia);
        assert_eq!(from_england.played(), 3);
        assert_eq!(from_england.wins_a, 2);
        assert_eq!(from_england.wins_b, 1);
        assert_eq!(from_england.meetings[1].points_for, 37);
        assert_eq!(from_england.meetings[1].result, MatchResult::Win);
        assert_eq!(from_england.last_meeting().unwrap().margin, -2);

        let from_australia = head_to_head(&rows, &australia, &england);
        assert_eq!(from_australia.wins_a, from_england.wins_b);
        assert_eq!(from_australia.points_a, from_england.points_b);
        assert!((from_australia.avg_margin() + from_england.avg_margin()).abs() < 1e-12);
    }

    #[test]
    fn test_no_meetings() {
        let rows = vec![make_row((2016, 6, 11), "England", "Australia", 39, 28)];
        let h2h = head_to_head(&rows, &TeamId::from("Japan"), &TeamId::from("Georgia"));
        assert_eq!(h2h.played(), 0);
        assert_eq!(h2h.avg_margin(), 0.0);
        assert!(h2h.last_meeting().is_none());
    }
}
