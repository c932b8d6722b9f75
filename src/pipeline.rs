//! End-to-end build: raw table to rated, scored rows
//!
//! Stages run once, in order: normalize, rate, score. The Elo sweep is the
//! only stage with sequential state. Publishing always replaces every output,
//! including when a build keeps no rows.

use std::path::Path;

use crate::data::export::write_csv;
use crate::data::{normalize_table, Database, IngestReport, RawTable, RowFilter, Shape};
use crate::ratings::{DominanceScorer, EloEngine, RatingState};
use crate::report::{sort_for_output, team_rollup, team_year_rollup, MatchRow};
use crate::{Config, Result};

/// Everything one build produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub shape: Shape,
    pub report: IngestReport,
    /// Rated rows in processing (chronological) order
    pub rows: Vec<MatchRow>,
    /// Ratings after the last match
    pub ratings: RatingState,
}

/// Run the full pipeline over an already loaded table
pub fn run(config: &Config, table: &RawTable) -> Result<PipelineOutput> {
    if table.is_empty() {
        log::warn!("Input table has no data rows");
    }

    let engine = EloEngine::from_config(config);
    let scorer = DominanceScorer::from_config(config);

    let filter = RowFilter {
        min_year: config.filter.min_year,
        classifier: engine.classifier(),
    };
    let (shape, normalized) = normalize_table(table, &filter)?;

    let run = engine.rate(normalized.batch);
    let rows: Vec<MatchRow> = run
        .matches
        .iter()
        .map(|rated| MatchRow::from_rated(rated, scorer.score_match(rated)))
        .collect();

    log::info!(
        "Rated {} rows for {} teams ({} input)",
        rows.len(),
        run.state.len(),
        shape
    );

    Ok(PipelineOutput {
        shape,
        report: normalized.report,
        rows,
        ratings: run.state,
    })
}

/// Load a CSV file and run the full pipeline over it
pub fn run_file<P: AsRef<Path>>(config: &Config, path: P) -> Result<PipelineOutput> {
    let table = RawTable::from_path(path)?;
    run(config, &table)
}

/// Write the rated match table (sorted by date, team) and both rollups
pub fn write_tables(config: &Config, output_path: &str, out: &PipelineOutput) -> Result<()> {
    let mut sorted = out.rows.clone();
    sort_for_output(&mut sorted);
    write_csv(output_path, &sorted)?;
    write_csv(&config.data.team_stats_path, &team_rollup(&out.rows))?;
    write_csv(
        &config.data.team_year_stats_path,
        &team_year_rollup(&out.rows),
    )?;
    Ok(())
}

/// Replace the stored snapshot with this build's rows and final ratings
pub fn store(db: &mut Database, out: &PipelineOutput) -> Result<()> {
    db.replace_matches(&out.rows)?;
    db.replace_ratings(&out.ratings.leaderboard())?;
    Ok(())
}
