//! Elo rating engine
//!
//! Computes team ratings by walking the match log in date order. Every update
//! reads the ratings produced by all earlier matches, so the sweep is strictly
//! sequential.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ratings::tier::Classifier;
use crate::{Config, Fixture, Match, MatchBatch, TeamId};

/// Starting rating for teams that have not played yet
pub const BASE_RATING: f64 = 1500.0;

/// Expected score (0-1) of a team rated `rating_a` against one rated `rating_b`
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) / 400.0))
}

/// Current rating of every team seen so far in a pass
#[derive(Debug, Clone)]
pub struct RatingState {
    ratings: HashMap<TeamId, f64>,
    /// Teams whose rating was produced by a match, not just read at the base
    rated: HashSet<TeamId>,
    base_rating: f64,
}

impl RatingState {
    pub fn new(base_rating: f64) -> Self {
        RatingState {
            ratings: HashMap::new(),
            rated: HashSet::new(),
            base_rating,
        }
    }

    /// Current rating for a team, registering it at the base rating on first sight
    pub fn get_or_insert(&mut self, team: &TeamId) -> f64 {
        let base = self.base_rating;
        *self.ratings.entry(team.clone()).or_insert(base)
    }

    pub fn get(&self, team: &TeamId) -> Option<f64> {
        self.ratings.get(team).copied()
    }

    pub fn set(&mut self, team: &TeamId, rating: f64) {
        self.ratings.insert(team.clone(), rating);
        self.rated.insert(team.clone());
    }

    /// Number of teams seen, rated or not
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Final ratings of every team a match has updated, highest first (ties by
    /// team name). Opponents that were only ever read are left out.
    pub fn leaderboard(&self) -> Vec<(TeamId, f64)> {
        let mut board: Vec<(TeamId, f64)> = self
            .rated
            .iter()
            .filter_map(|team| self.get(team).map(|rating| (team.clone(), rating)))
            .collect();
        board.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        board
    }
}

impl Default for RatingState {
    fn default() -> Self {
        Self::new(BASE_RATING)
    }
}

/// Rating movement of one team in one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub elo_pre: f64,
    pub elo_post: f64,
    pub elo_delta: f64,
}

impl RatingEvent {
    pub fn new(elo_pre: f64, elo_post: f64) -> Self {
        RatingEvent {
            elo_pre,
            elo_post,
            elo_delta: elo_post - elo_pre,
        }
    }

    pub fn unchanged(rating: f64) -> Self {
        Self::new(rating, rating)
    }
}

/// A match with the rating movement it caused
#[derive(Debug, Clone, PartialEq)]
pub struct RatedMatch {
    pub record: Match,
    pub k_factor: f64,
    /// Expected score of `record.team` going into the match
    pub expected: f64,
    pub elo: RatingEvent,
    /// Opponent's movement; unchanged for single-perspective rows
    pub opponent_elo: RatingEvent,
}

/// Output of one full pass
#[derive(Debug, Clone)]
pub struct RatingRun {
    /// Rated rows in processing order
    pub matches: Vec<RatedMatch>,
    pub state: RatingState,
}

/// Elo rating computer
#[derive(Debug, Clone)]
pub struct EloEngine {
    classifier: Classifier,
    base_rating: f64,
}

impl Default for EloEngine {
    fn default() -> Self {
        Self::new(Classifier::default(), BASE_RATING)
    }
}

impl EloEngine {
    pub fn new(classifier: Classifier, base_rating: f64) -> Self {
        EloEngine {
            classifier,
            base_rating,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Classifier::from_config(config), config.rating.base_rating)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Update the observing team's rating from one single-perspective row.
    /// The opponent's rating is read but not updated.
    pub fn rate_row(&self, state: &mut RatingState, record: &Match) -> RatedMatch {
        let team_rating = state.get_or_insert(&record.team);
        let opponent_rating = state.get_or_insert(&record.opponent);

        let k = self
            .classifier
            .k_for_teams(&record.tournament, &record.team, &record.opponent);
        let expected = expected_score(team_rating, opponent_rating);
        let new_rating = team_rating + k * (record.result().score() - expected);

        state.set(&record.team, new_rating);

        RatedMatch {
            record: record.clone(),
            k_factor: k,
            expected,
            elo: RatingEvent::new(team_rating, new_rating),
            opponent_elo: RatingEvent::unchanged(opponent_rating),
        }
    }

    /// Update both sides of a fixture at once. Returns the home-perspective row
    /// followed by the away-perspective row.
    pub fn rate_fixture(&self, state: &mut RatingState, fixture: &Fixture) -> [RatedMatch; 2] {
        let home_rating = state.get_or_insert(&fixture.home_team);
        let away_rating = state.get_or_insert(&fixture.away_team);

        let home_expected = expected_score(home_rating, away_rating);
        let away_expected = 1.0 - home_expected;

        let home_view = fixture.home_view();
        let home_actual = home_view.result().score();
        let away_actual = 1.0 - home_actual;

        // K is a property of the fixture, shared by both sides
        let k = self
            .classifier
            .k_for_teams(&fixture.tournament, &fixture.home_team, &fixture.away_team);

        let home_new = home_rating + k * (home_actual - home_expected);
        let away_new = away_rating + k * (away_actual - away_expected);

        state.set(&fixture.home_team, home_new);
        state.set(&fixture.away_team, away_new);

        let home_event = RatingEvent::new(home_rating, home_new);
        let away_event = RatingEvent::new(away_rating, away_new);

        [
            RatedMatch {
                record: home_view,
                k_factor: k,
                expected: home_expected,
                elo: home_event,
                opponent_elo: away_event,
            },
            RatedMatch {
                record: fixture.away_view(),
                k_factor: k,
                expected: away_expected,
                elo: away_event,
                opponent_elo: home_event,
            },
        ]
    }

    /// Run a full pass from fresh state. Matches are processed in ascending
    /// date order; same-day matches keep their input order.
    pub fn rate(&self, batch: MatchBatch) -> RatingRun {
        let state = RatingState::new(self.base_rating);
        let capacity = batch.row_count();

        let (matches, state) = match batch {
            MatchBatch::Perspective(mut rows) => {
                rows.sort_by_key(|m| m.date);
                rows.iter().fold(
                    (Vec::with_capacity(capacity), state),
                    |(mut out, mut state), record| {
                        out.push(self.rate_row(&mut state, record));
                        (out, state)
                    },
                )
            }
            MatchBatch::Fixtures(mut fixtures) => {
                fixtures.sort_by_key(|f| f.date);
                fixtures.iter().fold(
                    (Vec::with_capacity(capacity), state),
                    |(mut out, mut state), fixture| {
                        out.extend(self.rate_fixture(&mut state, fixture));
                        (out, state)
                    },
                )
            }
        };

        log::debug!("Rated {} rows across {} teams", matches.len(), state.len());

        RatingRun { matches, state }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::ratings::tier::KFactors;

    fn make_match(
        day: u32,
        team: &str,
        opponent: &str,
        ts: u16,
        os: u16,
        tournament: &str,
    ) -> Match {
        Match {
            date: NaiveDate::from_ymd_opt(2015, 9, day).unwrap(),
            tournament: tournament.to_string(),
            team: TeamId::from(team),
            opponent: TeamId::from(opponent),
            team_score: ts,
            opponent_score: os,
        }
    }

    fn make_fixture(day: u32, home: &str, away: &str, hs: u16, aws: u16) -> Fixture {
        Fixture {
            date: NaiveDate::from_ymd_opt(2015, 9, day).unwrap(),
            tournament: "Test Match".to_string(),
            home_team: TeamId::from(home),
            away_team: TeamId::from(away),
            home_score: hs,
            away_score: aws,
        }
    }

    /// Unranked teams only; "World Cup" plays the role of a K=30 match and
    /// everything else falls back to K=20.
    fn scenario_engine() -> EloEngine {
        let classifier = Classifier::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            "World Cup",
            KFactors {
                world_cup: 30.0,
                tier1: 30.0,
                cross_tier: 25.0,
                base: 20.0,
            },
        );
        EloEngine::new(classifier, BASE_RATING)
    }

    #[test]
    fn test_expected_score_symmetry() {
        let e = expected_score(1500.0, 1500.0);
        assert_eq!(e, 0.5);

        let a = expected_score(1620.0, 1480.0);
        let b = expected_score(1480.0, 1620.0);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > 0.5);
    }

    #[test]
    fn test_expected_score_monotonic() {
        let mut previous = 0.0;
        for step in 0..40 {
            let rating = 1200.0 + step as f64 * 15.0;
            let e = expected_score(rating, 1500.0);
            assert!(e > previous);
            previous = e;
        }
    }

    #[test]
    fn test_get_or_insert_defaults_to_base() {
        let mut state = RatingState::default();
        let team = TeamId::from("Japan");
        assert_eq!(state.get(&team), None);
        assert_eq!(state.get_or_insert(&team), 1500.0);
        assert_eq!(state.get(&team), Some(1500.0));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_first_appearance_uses_base_rating() {
        let engine = EloEngine::default();
        let run = engine.rate(MatchBatch::Perspective(vec![
            make_match(1, "Japan", "Samoa", 26, 5, "Test Match"),
            make_match(2, "Fiji", "Japan", 10, 20, "Test Match"),
        ]));
        assert_eq!(run.matches[0].elo.elo_pre, 1500.0);
        assert_eq!(run.matches[0].opponent_elo.elo_pre, 1500.0);
        assert_eq!(run.matches[1].elo.elo_pre, 1500.0);
        // Japan carries its first-match gain into the second row
        assert!(run.matches[1].opponent_elo.elo_pre > 1500.0);
    }

    #[test]
    fn test_concrete_scenario_fixture_mode() {
        let engine = scenario_engine();
        let mut state = RatingState::default();

        let mut first = make_fixture(1, "A", "B", 20, 10);
        first.tournament = "World Cup".to_string();
        let [home, away] = engine.rate_fixture(&mut state, &first);
        assert_eq!(home.k_factor, 30.0);
        assert_eq!(home.expected, 0.5);
        assert_eq!(home.elo.elo_post, 1515.0);
        assert_eq!(away.elo.elo_post, 1485.0);
        assert_eq!(home.elo.elo_delta, 15.0);
        assert_eq!(away.elo.elo_delta, -15.0);

        let second = make_fixture(2, "A", "C", 13, 13);
        let [home, _] = engine.rate_fixture(&mut state, &second);
        assert_eq!(home.k_factor, 20.0);
        assert!((home.expected - 0.5216).abs() < 1e-4);
        assert!((home.elo.elo_post - 1514.57).abs() < 0.01);
        assert_eq!(state.get(&TeamId::from("B")), Some(1485.0));
    }

    #[test]
    fn test_concrete_scenario_single_perspective() {
        let engine = scenario_engine();
        let run = engine.rate(MatchBatch::Perspective(vec![
            make_match(1, "A", "B", 20, 10, "World Cup"),
            make_match(2, "A", "C", 13, 13, "Test Match"),
        ]));

        assert_eq!(run.matches[0].elo.elo_post, 1515.0);
        // Opponent is not updated by a single-perspective row
        assert_eq!(run.matches[0].opponent_elo.elo_delta, 0.0);
        assert_eq!(run.state.get(&TeamId::from("B")), Some(1500.0));
        assert!((run.matches[1].elo.elo_post - 1514.57).abs() < 0.01);
    }

    #[test]
    fn test_fixture_pairing_is_complementary() {
        let engine = EloEngine::default();
        let mut state = RatingState::default();
        state.set(&TeamId::from("Ireland"), 1642.0);
        state.set(&TeamId::from("Italy"), 1431.0);

        let [home, away] =
            engine.rate_fixture(&mut state, &make_fixture(3, "Italy", "Ireland", 17, 17));
        assert!((home.expected + away.expected - 1.0).abs() < 1e-12);
        assert_eq!(
            home.record.result().score() + away.record.result().score(),
            1.0
        );
        assert_eq!(home.k_factor, away.k_factor);
        assert_eq!(home.k_factor, 25.0);
        // Underdog draw: Italy gains exactly what Ireland loses
        assert!(home.elo.elo_delta > 0.0);
        assert!((home.elo.elo_delta + away.elo.elo_delta).abs() < 1e-9);
        assert_eq!(home.opponent_elo, away.elo);
    }

    #[test]
    fn test_rating_run_is_deterministic() {
        let engine = EloEngine::default();
        let rows = vec![
            make_match(1, "England", "Wales", 25, 28, "World Cup"),
            make_match(2, "Australia", "England", 33, 13, "World Cup"),
            make_match(3, "Wales", "Australia", 6, 15, "World Cup"),
            make_match(4, "England", "Uruguay", 60, 3, "World Cup"),
            make_match(5, "Fiji", "Uruguay", 47, 15, "World Cup"),
        ];

        let first = engine.rate(MatchBatch::Perspective(rows.clone()));
        let second = engine.rate(MatchBatch::Perspective(rows));
        assert_eq!(first.matches.len(), second.matches.len());
        for (a, b) in first.matches.iter().zip(&second.matches) {
            assert_eq!(a.elo.elo_pre.to_bits(), b.elo.elo_pre.to_bits());
            assert_eq!(a.elo.elo_post.to_bits(), b.elo.elo_post.to_bits());
            assert_eq!(a.elo.elo_delta.to_bits(), b.elo.elo_delta.to_bits());
        }
    }

    #[test]
    fn test_processing_order_matters() {
        let engine = EloEngine::default();
        let loss = make_fixture(1, "Tonga", "Samoa", 10, 30);
        let win = make_fixture(2, "Tonga", "Georgia", 24, 6);

        let forward = engine.rate(MatchBatch::Fixtures(vec![loss.clone(), win.clone()]));

        let mut swapped_loss = loss;
        let mut swapped_win = win;
        swapped_loss.date = NaiveDate::from_ymd_opt(2015, 9, 2).unwrap();
        swapped_win.date = NaiveDate::from_ymd_opt(2015, 9, 1).unwrap();
        let reversed = engine.rate(MatchBatch::Fixtures(vec![swapped_loss, swapped_win]));

        let tonga = TeamId::from("Tonga");
        let forward_posts: Vec<f64> = forward
            .matches
            .iter()
            .filter(|m| m.record.team == tonga)
            .map(|m| m.elo.elo_post)
            .collect();
        let reversed_posts: Vec<f64> = reversed
            .matches
            .iter()
            .filter(|m| m.record.team == tonga)
            .map(|m| m.elo.elo_post)
            .collect();
        assert_eq!(forward_posts.len(), 2);
        assert_ne!(forward_posts[0], reversed_posts[1]);
        assert_ne!(forward_posts[1], reversed_posts[0]);
    }

    #[test]
    fn test_unsorted_input_is_processed_by_date() {
        let engine = EloEngine::default();
        let later = make_match(20, "France", "Italy", 30, 10, "Six Nations");
        let earlier = make_match(5, "France", "Scotland", 12, 20, "Six Nations");
        let run = engine.rate(MatchBatch::Perspective(vec![later, earlier]));

        assert_eq!(run.matches[0].record.opponent, TeamId::from("Scotland"));
        assert_eq!(run.matches[0].elo.elo_pre, 1500.0);
        assert_eq!(run.matches[1].elo.elo_pre, run.matches[0].elo.elo_post);
    }

    #[test]
    fn test_same_day_matches_keep_input_order() {
        let engine = EloEngine::default();
        let run = engine.rate(MatchBatch::Perspective(vec![
            make_match(7, "Canada", "USA", 20, 10, "Test Match"),
            make_match(7, "Canada", "Japan", 5, 40, "Test Match"),
        ]));
        assert_eq!(run.matches[0].record.opponent, TeamId::from("USA"));
        assert_eq!(run.matches[1].elo.elo_pre, run.matches[0].elo.elo_post);
    }

    #[test]
    fn test_leaderboard_skips_opponents_never_rated() {
        let engine = EloEngine::default();
        let run = engine.rate(MatchBatch::Perspective(vec![make_match(
            20,
            "Japan",
            "Russia",
            30,
            10,
            "World Cup",
        )]));

        assert_eq!(run.state.get(&TeamId::from("Russia")), Some(1500.0));
        let board = run.state.leaderboard();
        assert_eq!(board, vec![(TeamId::from("Japan"), 1520.0)]);
        assert_eq!(board[0].1, run.matches[0].elo.elo_post);
    }

    #[test]
    fn test_leaderboard_sorted_descending() {
        let engine = EloEngine::default();
        let run = engine.rate(MatchBatch::Fixtures(vec![
            make_fixture(1, "New Zealand", "Argentina", 54, 9),
            make_fixture(2, "South Africa", "Argentina", 25, 20),
        ]));
        let board = run.state.leaderboard();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].0, TeamId::from("New Zealand"));
        assert_eq!(board[2].0, TeamId::from("Argentina"));
        assert!(board.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}
