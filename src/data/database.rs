//! SQLite snapshot of the rated match table
//!
//! Every build replaces the stored rows wholesale; nothing is updated in place.

use crate::report::MatchRow;
use crate::{MatchResult, Result, TeamId};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                seq INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                year INTEGER NOT NULL,
                team TEXT NOT NULL,
                opponent TEXT NOT NULL,
                team_score INTEGER NOT NULL,
                opponent_score INTEGER NOT NULL,
                margin INTEGER NOT NULL,
                result TEXT NOT NULL,
                tournament TEXT NOT NULL,
                elo_pre REAL NOT NULL,
                elo_post REAL NOT NULL,
                elo_delta REAL NOT NULL,
                dominance_score REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ratings (
                team TEXT PRIMARY KEY,
                rating REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            CREATE INDEX IF NOT EXISTS idx_matches_team ON matches(team, opponent);
            "#,
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Replace all stored rows. `seq` keeps the given (processing) order.
    pub fn replace_matches(&mut self, rows: &[MatchRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM matches", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO matches (seq, date, year, team, opponent, team_score, opponent_score,
                                     margin, result, tournament, elo_pre, elo_post, elo_delta,
                                     dominance_score)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )?;
            for (seq, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    row.date.format("%Y-%m-%d").to_string(),
                    row.year,
                    row.team.as_str(),
                    row.opponent.as_str(),
                    row.team_score,
                    row.opponent_score,
                    row.margin,
                    row.result.to_string(),
                    row.tournament,
                    row.elo_pre,
                    row.elo_post,
                    row.elo_delta,
                    row.dominance_score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Replace the stored final ratings
    pub fn replace_ratings(&mut self, ratings: &[(TeamId, f64)]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM ratings", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO ratings (team, rating) VALUES (?1, ?2)")?;
            for (team, rating) in ratings {
                stmt.execute(params![team.as_str(), rating])?;
            }
        }
        tx.commit()?;
        Ok(ratings.len())
    }

    /// Get all rows in processing order
    pub fn get_all_matches(&self) -> Result<Vec<MatchRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, year, team, opponent, team_score, opponent_score, margin,
                    tournament, elo_pre, elo_post, elo_delta, dominance_score
             FROM matches
             ORDER BY seq",
        )?;

        let rows = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Stored final ratings, highest first
    pub fn get_ratings(&self) -> Result<Vec<(TeamId, f64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT team, rating FROM ratings ORDER BY rating DESC, team")?;
        let ratings = stmt
            .query_map([], |row| Ok((TeamId(row.get(0)?), row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ratings)
    }

    /// Find a team by exact name, falling back to a case-insensitive match.
    /// Teams that only appear as opponents are found too.
    pub fn find_team(&self, name: &str) -> Result<Option<TeamId>> {
        let exact: Option<String> = self
            .conn
            .query_row(
                "SELECT team FROM matches WHERE team = ?1
                 UNION
                 SELECT opponent FROM matches WHERE opponent = ?1
                 LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exact.is_some() {
            return Ok(exact.map(TeamId));
        }

        let folded: Option<String> = self
            .conn
            .query_row(
                "SELECT team FROM matches WHERE LOWER(team) = LOWER(?1)
                 UNION
                 SELECT opponent FROM matches WHERE LOWER(opponent) = LOWER(?1)
                 ORDER BY 1
                 LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(folded.map(TeamId))
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRow> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let margin: i32 = row.get(6)?;

        Ok(MatchRow {
            date,
            year: row.get(1)?,
            team: TeamId(row.get(2)?),
            opponent: TeamId(row.get(3)?),
            team_score: row.get(4)?,
            opponent_score: row.get(5)?,
            margin,
            result: MatchResult::from_margin(margin),
            tournament: row.get(7)?,
            elo_pre: row.get(8)?,
            elo_post: row.get(9)?,
            elo_delta: row.get(10)?,
            dominance_score: row.get(11)?,
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let team_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT team) FROM matches", [], |row| {
                    row.get(0)
                })?;

        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let min_date: Option<String> = self
            .conn
            .query_row("SELECT MIN(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            team_count: team_count as usize,
            match_count: match_count as usize,
            earliest_match: min_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            latest_match: max_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub match_count: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::make_row;

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 0);
        assert_eq!(stats.match_count, 0);
        assert!(stats.earliest_match.is_none());
    }

    #[test]
    fn test_replace_matches() {
        let mut db = Database::in_memory().unwrap();
        let rows = vec![
            make_row((2011, 10, 23), "New Zealand", "France", 8, 7),
            make_row((2011, 10, 23), "France", "New Zealand", 7, 8),
            make_row((2011, 10, 21), "Australia", "Wales", 21, 18),
        ];
        assert_eq!(db.replace_matches(&rows).unwrap(), 3);
        assert_eq!(db.get_all_matches().unwrap(), rows);

        // A second build replaces, not appends
        db.replace_matches(&rows[..1]).unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 1);
        assert_eq!(stats.team_count, 1);
        assert_eq!(stats.earliest_match, NaiveDate::from_ymd_opt(2011, 10, 23));
    }

    #[test]
    fn test_team_lookup() {
        let mut db = Database::in_memory().unwrap();
        db.replace_matches(&[make_row((2011, 10, 23), "New Zealand", "France", 8, 7)])
            .unwrap();

        let nz = TeamId::from("New Zealand");
        assert_eq!(db.find_team("New Zealand").unwrap(), Some(nz.clone()));
        assert_eq!(db.find_team("new zealand").unwrap(), Some(nz.clone()));
        assert_eq!(db.find_team("Chile").unwrap(), None);
    }

    #[test]
    fn test_opponent_only_team_lookup() {
        let mut db = Database::in_memory().unwrap();
        db.replace_matches(&[make_row((2019, 9, 20), "Japan", "Russia", 30, 10)])
            .unwrap();

        let russia = TeamId::from("Russia");
        assert_eq!(db.find_team("Russia").unwrap(), Some(russia.clone()));
        assert_eq!(db.find_team("RUSSIA").unwrap(), Some(russia));
        assert_eq!(db.find_team("Japan").unwrap(), Some(TeamId::from("Japan")));
    }

    #[test]
    fn test_replace_ratings() {
        let mut db = Database::in_memory().unwrap();
        db.replace_ratings(&[
            (TeamId::from("Ireland"), 1630.5),
            (TeamId::from("South Africa"), 1702.25),
        ])
        .unwrap();
        let ratings = db.get_ratings().unwrap();
        assert_eq!(ratings[0], (TeamId::from("South Africa"), 1702.25));
        assert_eq!(ratings.len(), 2);
    }
}
