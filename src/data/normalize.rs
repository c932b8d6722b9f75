//! Match record normalization
//!
//! Turns raw CSV rows into canonical matches. Two input shapes are supported:
//! single-perspective rows (`team`/`opponent`) and home/away fixtures
//! (`home_team`/`away_team`). Both filter to the modern era and to fixtures
//! involving at least one eligible nation.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fmt;

use crate::data::loader::{ColumnMap, RawTable};
use crate::ratings::Classifier;
use crate::{Fixture, Match, MatchBatch, Result, TeamId};

/// Numeric day/month layouts are read month first; day-first only applies when
/// the first field cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%B %d, %Y",
];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Which layout the source table uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Perspective,
    Fixture,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Perspective => write!(f, "team/opponent"),
            Shape::Fixture => write!(f, "home/away"),
        }
    }
}

/// Pick the shape from the columns present. Any home/away column selects the
/// fixture layout so a half-converted file reports its missing columns.
pub fn detect_shape(table: &RawTable) -> Shape {
    if table.has_column("home_team") || table.has_column("away_team") {
        Shape::Fixture
    } else {
        Shape::Perspective
    }
}

/// Row-local problem; the row is dropped and the run continues
#[derive(Debug, Clone, PartialEq)]
pub enum RowIssue {
    /// Date could not be parsed (undecodable records are counted the same way)
    ParseError { line: u64, value: String },
    /// Score missing, non-numeric or negative, or both sides are the same team
    DomainError { line: u64, reason: String },
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::ParseError { line, value } => {
                write!(f, "line {}: unparseable date '{}'", line, value)
            }
            RowIssue::DomainError { line, reason } => write!(f, "line {}: {}", line, reason),
        }
    }
}

/// Counts of what happened to the input rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub rows_read: usize,
    pub parse_errors: usize,
    pub domain_errors: usize,
    pub before_era: usize,
    pub ineligible: usize,
    /// Input rows that passed every filter
    pub rows_kept: usize,
}

impl IngestReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }

    fn record_issue(&mut self, issue: &RowIssue) {
        log::debug!("Dropping row: {}", issue);
        match issue {
            RowIssue::ParseError { .. } => self.parse_errors += 1,
            RowIssue::DomainError { .. } => self.domain_errors += 1,
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Rows read:          {}", self.rows_read)?;
        writeln!(f, "  Rows kept:          {}", self.rows_kept)?;
        writeln!(f, "  Unparseable rows:   {}", self.parse_errors)?;
        writeln!(f, "  Invalid scores:     {}", self.domain_errors)?;
        writeln!(f, "  Before era cutoff:  {}", self.before_era)?;
        write!(f, "  No eligible nation: {}", self.ineligible)
    }
}

/// Era and eligibility filter shared by both normalizers
#[derive(Debug, Clone, Copy)]
pub struct RowFilter<'a> {
    pub min_year: i32,
    pub classifier: &'a Classifier,
}

impl RowFilter<'_> {
    fn in_era(&self, date: NaiveDate) -> bool {
        date.year() >= self.min_year
    }

    fn any_eligible(&self, a: &TeamId, b: &TeamId) -> bool {
        self.classifier.is_eligible(a) || self.classifier.is_eligible(b)
    }
}

/// Normalized output of one table
#[derive(Debug, Clone)]
pub struct Normalized {
    pub batch: MatchBatch,
    pub report: IngestReport,
}

/// Fields common to both row shapes, after parsing. `first` is `team` or
/// `home_team`, `second` is `opponent` or `away_team`.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub date: NaiveDate,
    pub tournament: String,
    pub first: TeamId,
    pub second: TeamId,
    pub first_score: u16,
    pub second_score: u16,
}

/// Converts a raw table into a canonical match batch
pub trait Normalizer {
    fn shape(&self) -> Shape;

    /// Columns that must be present: date, two team columns, two score
    /// columns, tournament
    fn required_columns(&self) -> &'static [&'static str];

    /// Build the canonical batch from the rows that survived parsing and filtering
    fn build(&self, rows: Vec<ParsedRow>) -> MatchBatch;

    fn normalize(&self, table: &RawTable, filter: &RowFilter<'_>) -> Result<Normalized> {
        let columns = table.require(self.required_columns())?;
        let [date_col, first_col, second_col, first_score_col, second_score_col, tournament_col] =
            column_names(self.required_columns());

        let mut report = IngestReport {
            rows_read: table.len() + table.unreadable(),
            parse_errors: table.unreadable(),
            ..IngestReport::default()
        };
        let mut kept = Vec::with_capacity(table.len());

        for record in table.records() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields = RowFields {
                columns: &columns,
                record,
                line,
            };

            let parsed = fields
                .date(date_col)
                .and_then(|date| {
                    let first = fields.team(first_col)?;
                    let second = fields.team(second_col)?;
                    if first == second {
                        return Err(RowIssue::DomainError {
                            line,
                            reason: format!("'{}' listed on both sides", first),
                        });
                    }
                    Ok(ParsedRow {
                        date,
                        tournament: fields.text(tournament_col).to_string(),
                        first,
                        second,
                        first_score: fields.score(first_score_col)?,
                        second_score: fields.score(second_score_col)?,
                    })
                });

            let row = match parsed {
                Ok(row) => row,
                Err(issue) => {
                    report.record_issue(&issue);
                    continue;
                }
            };

            if !filter.in_era(row.date) {
                report.before_era += 1;
                continue;
            }
            if !filter.any_eligible(&row.first, &row.second) {
                report.ineligible += 1;
                continue;
            }

            kept.push(row);
        }

        report.rows_kept = kept.len();
        if report.parse_errors > 0 {
            log::warn!("Dropped {} unparseable rows", report.parse_errors);
        }
        if report.domain_errors > 0 {
            log::warn!("Dropped {} rows with invalid scores or teams", report.domain_errors);
        }
        log::info!(
            "Normalized {} of {} {} rows",
            report.rows_kept,
            report.rows_read,
            self.shape()
        );

        Ok(Normalized {
            batch: self.build(kept),
            report,
        })
    }
}

/// Rows already keyed by `team`/`opponent`; one canonical row each
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveNormalizer;

impl Normalizer for PerspectiveNormalizer {
    fn shape(&self) -> Shape {
        Shape::Perspective
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "date",
            "team",
            "opponent",
            "team_score",
            "opponent_score",
            "tournament",
        ]
    }

    fn build(&self, rows: Vec<ParsedRow>) -> MatchBatch {
        MatchBatch::Perspective(
            rows.into_iter()
                .map(|row| Match {
                    date: row.date,
                    tournament: row.tournament,
                    team: row.first,
                    opponent: row.second,
                    team_score: row.first_score,
                    opponent_score: row.second_score,
                })
                .collect(),
        )
    }
}

/// Home/away fixtures; each expands to two canonical rows
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureNormalizer;

impl Normalizer for FixtureNormalizer {
    fn shape(&self) -> Shape {
        Shape::Fixture
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            "date",
            "home_team",
            "away_team",
            "home_score",
            "away_score",
            "tournament",
        ]
    }

    fn build(&self, rows: Vec<ParsedRow>) -> MatchBatch {
        MatchBatch::Fixtures(
            rows.into_iter()
                .map(|row| Fixture {
                    date: row.date,
                    tournament: row.tournament,
                    home_team: row.first,
                    away_team: row.second,
                    home_score: row.first_score,
                    away_score: row.second_score,
                })
                .collect(),
        )
    }
}

/// Normalize a table with the variant matching its columns
pub fn normalize_table(table: &RawTable, filter: &RowFilter<'_>) -> Result<(Shape, Normalized)> {
    let shape = detect_shape(table);
    let normalized = match shape {
        Shape::Perspective => PerspectiveNormalizer.normalize(table, filter)?,
        Shape::Fixture => FixtureNormalizer.normalize(table, filter)?,
    };
    Ok((shape, normalized))
}

fn column_names(required: &'static [&'static str]) -> [&'static str; 6] {
    let mut names = [""; 6];
    for (slot, name) in names.iter_mut().zip(required) {
        *slot = *name;
    }
    names
}

struct RowFields<'a> {
    columns: &'a ColumnMap,
    record: &'a StringRecord,
    line: u64,
}

impl RowFields<'_> {
    fn text(&self, column: &str) -> &str {
        self.columns.get(self.record, column)
    }

    fn date(&self, column: &str) -> std::result::Result<NaiveDate, RowIssue> {
        let value = self.text(column);
        parse_date(value).ok_or_else(|| RowIssue::ParseError {
            line: self.line,
            value: value.to_string(),
        })
    }

    fn team(&self, column: &str) -> std::result::Result<TeamId, RowIssue> {
        let value = self.text(column);
        if value.is_empty() {
            return Err(RowIssue::DomainError {
                line: self.line,
                reason: format!("missing {}", column),
            });
        }
        Ok(TeamId::new(value))
    }

    fn score(&self, column: &str) -> std::result::Result<u16, RowIssue> {
        let value = self.text(column);
        parse_score(value).ok_or_else(|| RowIssue::DomainError {
            line: self.line,
            reason: format!("invalid {} '{}'", column, value),
        })
    }
}

/// Parse a calendar date in any of the layouts seen in match exports
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a non-negative whole-number score; `"24.0"` is accepted
pub fn parse_score(value: &str) -> Option<u16> {
    let value = value.trim();
    if let Ok(score) = value.parse::<u16>() {
        return Some(score);
    }

    let float: f64 = value.parse().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u16::MAX as f64 {
        Some(float as u16)
    } else {
        None
    }
}
