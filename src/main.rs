//! Rugby ratings CLI
//!
//! Builds the rated match tables from a results file and shows rankings,
//! team snapshots, head-to-head records and season trends.

use clap::{Parser, Subcommand};
use rugby_ratings::report::RankMetric;
use rugby_ratings::{Config, Result};

#[derive(Parser)]
#[command(name = "rugby")]
#[command(about = "Elo ratings and analytics for international rugby", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Normalize, rate and score the match file, then write all tables
    Build {
        /// Input CSV (overrides config)
        #[arg(long)]
        input: Option<String>,
        /// Rated match CSV (overrides config)
        #[arg(long)]
        output: Option<String>,
        /// Skip writing the SQLite snapshot
        #[arg(long)]
        no_db: bool,
    },
    /// Team rankings
    Rankings {
        /// Order by: win, elo, or dominance
        #[arg(long, default_value = "win")]
        by: RankMetric,
        /// Only matches from this year
        #[arg(long)]
        year: Option<i32>,
        /// Show only the first N teams
        #[arg(long)]
        top: Option<usize>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Current Elo leaderboard
    Elo {
        /// Show only the first N teams
        #[arg(long)]
        top: Option<usize>,
    },
    /// Snapshot for one team
    Team {
        name: String,
        /// Number of recent matches to list
        #[arg(long, default_value = "5")]
        recent: usize,
    },
    /// Head-to-head record between two teams
    H2h { team_a: String, team_b: String },
    /// Season-by-season trend for one or more teams
    Trend {
        #[arg(required = true)]
        teams: Vec<String>,
    },
    /// Rugby World Cup winners
    WorldCups,
    /// Show database status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Build {
            input,
            output,
            no_db,
        } => commands::build(&config, input, output, no_db),
        Commands::Rankings {
            by,
            year,
            top,
            format,
        } => commands::rankings(&config, by, year, top, format),
        Commands::Elo { top } => commands::elo(&config, top),
        Commands::Team { name, recent } => commands::team(&config, &name, recent),
        Commands::H2h { team_a, team_b } => commands::h2h(&config, &team_a, &team_b),
        Commands::Trend { teams } => commands::trend(&config, &teams),
        Commands::WorldCups => commands::world_cups(),
        Commands::Status => commands::status(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use rugby_ratings::data::Database;
    use rugby_ratings::report::display::{
        format_head_to_head, format_leaderboard, format_rankings, format_team_snapshot,
        format_trend, format_world_cups,
    };
    use rugby_ratings::report::{
        head_to_head, sort_by_metric, team_rollup, team_rows, team_year_rollup, MatchRow,
    };
    use rugby_ratings::{pipeline, RugbyError, TeamId};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Place match results at {}", config.data.input_path);
        println!("  3. Run 'rugby build' to compute ratings");
        println!("  4. Run 'rugby rankings' or 'rugby team \"Ireland\"' to explore");

        Ok(())
    }

    pub fn build(
        config: &Config,
        input: Option<String>,
        output: Option<String>,
        no_db: bool,
    ) -> Result<()> {
        let input = input.unwrap_or_else(|| config.data.input_path.clone());
        let output = output.unwrap_or_else(|| config.data.output_path.clone());

        println!("Building ratings from {}...", input);
        let out = pipeline::run_file(config, &input)?;

        println!("Ingest ({} layout)", out.shape);
        println!("{}", out.report);

        // Replaced even when no rows survived
        pipeline::write_tables(config, &output, &out)?;
        if !no_db {
            let mut db = Database::open(&config.data.database_path)?;
            pipeline::store(&mut db, &out)?;
        }

        if out.rows.is_empty() {
            println!("No matches survived filtering. Check the input file and filters.");
            return Err(RugbyError::NoData);
        }

        println!("\nBuild complete!");
        println!("  Rated rows:  {}", out.rows.len());
        println!("  Teams rated: {}", out.ratings.leaderboard().len());
        println!("  Output:      {}", output);

        Ok(())
    }

    fn open_rows(config: &Config) -> Result<(Database, Vec<MatchRow>)> {
        let db = Database::open(&config.data.database_path)?;
        let rows = db.get_all_matches()?;
        if rows.is_empty() {
            return Err(RugbyError::NoData);
        }
        Ok((db, rows))
    }

    fn resolve_team(db: &Database, name: &str) -> Result<TeamId> {
        db.find_team(name)?
            .ok_or_else(|| RugbyError::UnknownTeam(name.to_string()))
    }

    pub fn rankings(
        config: &Config,
        by: RankMetric,
        year: Option<i32>,
        top: Option<usize>,
        format: OutputFormat,
    ) -> Result<()> {
        let (_, rows) = open_rows(config)?;

        let rows: Vec<MatchRow> = match year {
            Some(y) => rows.into_iter().filter(|r| r.year == y).collect(),
            None => rows,
        };
        let mut summaries = team_rollup(&rows);
        sort_by_metric(&mut summaries, by);
        if let Some(n) = top {
            summaries.truncate(n);
        }

        match format {
            OutputFormat::Table => print!("{}", format_rankings(&summaries)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&summaries)
                    .map_err(|e| RugbyError::Parse(e.to_string()))?;
                println!("{}", json);
            }
            OutputFormat::Csv => {
                rugby_ratings::data::export::write_rows(std::io::stdout().lock(), &summaries)?
            }
        }
        Ok(())
    }

    pub fn elo(config: &Config, top: Option<usize>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let mut board = db.get_ratings()?;
        if board.is_empty() {
            return Err(RugbyError::NoData);
        }
        if let Some(n) = top {
            board.truncate(n);
        }
        print!("{}", format_leaderboard(&board));
        Ok(())
    }

    pub fn team(config: &Config, name: &str, recent: usize) -> Result<()> {
        let (db, rows) = open_rows(config)?;
        let team = resolve_team(&db, name)?;

        let summaries = team_rollup(&rows);
        let summary = summaries
            .iter()
            .find(|s| s.team == team)
            .ok_or_else(|| RugbyError::UnknownTeam(name.to_string()))?;

        let own = team_rows(&rows, &team);
        let skip = own.len().saturating_sub(recent);

        print!("{}", format_team_snapshot(summary, &own[skip..]));
        Ok(())
    }

    pub fn h2h(config: &Config, team_a: &str, team_b: &str) -> Result<()> {
        let (db, rows) = open_rows(config)?;
        let a = resolve_team(&db, team_a)?;
        let b = resolve_team(&db, team_b)?;
        print!("{}", format_head_to_head(&head_to_head(&rows, &a, &b)));
        Ok(())
    }

    pub fn trend(config: &Config, teams: &[String]) -> Result<()> {
        let (db, rows) = open_rows(config)?;
        let seasons = team_year_rollup(&rows);

        for name in teams {
            let team = resolve_team(&db, name)?;
            let own: Vec<_> = seasons.iter().filter(|s| s.team == team).collect();
            println!("{}", format_trend(&team, &own));
        }
        Ok(())
    }

    pub fn world_cups() -> Result<()> {
        print!("{}", format_world_cups());
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Teams:    {}", stats.team_count);
        println!("  Rows:     {}", stats.match_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:    {} to {}", earliest, latest);
        }

        Ok(())
    }
}
