//! Football form CLI
//!
//! Imports match sheets, computes rolling team features and reports on them.

use clap::{Parser, Subcommand};
use football::{Config, Result};

#[derive(Parser)]
#[command(name = "football")]
#[command(about = "Rolling-window team form statistics for football matches", long_about = None)]
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
    /// Load a raw match CSV into the database
    Import {
        /// Raw match sheet (CSV)
        csv: String,
    },
    /// Compute rolling features and store the processed table
    Process {
        /// Read matches from this CSV instead of the database
        #[arg(long)]
        input: Option<String>,
        /// Also write the processed table to this CSV
        #[arg(long)]
        output: Option<String>,
        /// Window size (repeatable, overrides config)
        #[arg(long = "window")]
        windows: Vec<usize>,
    },
    /// Show database status
    Status,
    /// Show a team's matches and rolling form
    Team {
        /// Team name as it appears in the match sheet
        name: String,
        /// Window size (defaults to the smallest processed window)
        #[arg(long)]
        window: Option<usize>,
        /// Also show the opponent's features under each match
        #[arg(long)]
        opponent_side: bool,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// League-wide outcome, correlation and card analysis
    Overview {
        /// Window size (defaults to the smallest processed window)
        #[arg(long)]
        window: Option<usize>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Data quality report for the processed table
    Quality,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

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

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Import { csv } => commands::import(&config, &csv),
        Commands::Process {
            input,
            output,
            windows,
        } => commands::process(&config, input, output, windows),
        Commands::Status => commands::status(&config),
        Commands::Team {
            name,
            window,
            opponent_side,
            format,
        } => commands::team(&config, &name, window, opponent_side, format),
        Commands::Overview { window, format } => commands::overview(&config, window, format),
        Commands::Quality => commands::quality(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use football::analysis::{self, DataQuality, Overview, TeamReport};
    use football::data::{load_matches, save_table, Database, LoadReport, MatchStore};
    use football::features::{FeatureEngine, ResultTable};
    use football::FootballError;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'football import <matches.csv>' to load match data");
        println!("  3. Run 'football process' to compute rolling features");
        println!("  4. Run 'football team \"Team Name\"' to inspect a team");

        Ok(())
    }

    pub fn import(config: &Config, csv_path: &str) -> Result<()> {
        println!("Importing {}...", csv_path);
        let (store, report) = load_matches(csv_path, config.engine.invalid_rows)?;
        print_load_report(&report);

        let mut db = Database::open(&config.data.database_path, &config.data)?;
        let count = db.upsert_matches(store.records())?;
        println!(
            "Stored {} matches in {} ({})",
            count, config.data.database_path, config.data.raw_table
        );

        Ok(())
    }

    pub fn process(
        config: &Config,
        input: Option<String>,
        output: Option<String>,
        windows: Vec<usize>,
    ) -> Result<()> {
        let mut db = Database::open(&config.data.database_path, &config.data)?;

        let from_input = input.is_some();
        let store = match input {
            Some(path) => {
                println!("Reading matches from {}...", path);
                let (store, report) = load_matches(&path, config.engine.invalid_rows)?;
                print_load_report(&report);
                store
            }
            None => MatchStore::new(db.get_all_matches()?)?,
        };
        if store.is_empty() {
            return Err(FootballError::NoMatches);
        }
        if let Some((first, last)) = store.date_range() {
            println!(
                "{} matches, {} teams, {} to {}",
                store.len(),
                store.teams().len(),
                first,
                last
            );
        }

        let engine = if windows.is_empty() {
            FeatureEngine::from_config(&config.engine)?
        } else {
            FeatureEngine::new(&windows)?
        };
        println!(
            "Processing {} matches with windows {:?}...",
            store.len(),
            engine.windows()
        );

        let result = engine.run(&store)?;
        let table = &result.table;

        let new_columns = table.new_columns();
        println!("\nNew columns added ({}):", new_columns.len());
        for name in &new_columns {
            println!("  {}", name);
        }

        if result.missing.is_empty() {
            println!("\nAll feature cells populated");
        } else {
            println!(
                "\nWarning: {} missing feature groups across {} rows (left empty)",
                result.missing.len(),
                result.missing.affected_rows()
            );
        }

        // Keep the raw table in step with the processed one
        if from_input {
            let stored = db.replace_matches(store.records())?;
            println!(
                "Stored {} matches in {} ({})",
                stored, config.data.database_path, config.data.raw_table
            );
        }
        let rows = db.write_processed(table)?;
        println!(
            "Stored {} rows in {} ({})",
            rows, config.data.database_path, config.data.processed_table
        );

        if let Some(path) = output {
            save_table(&path, table)?;
            println!("Wrote {}", path);
        }

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path, &config.data)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Teams:      {}", stats.team_count);
        println!("  Matches:    {}", stats.raw_rows);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:      {} to {}", earliest, latest);
        }
        match stats.processed_rows {
            Some(n) => println!("  Processed:  {} rows", n),
            None => println!("  Processed:  not yet (run 'football process')"),
        }

        Ok(())
    }

    pub fn team(
        config: &Config,
        name: &str,
        window: Option<usize>,
        opponent_side: bool,
        format: OutputFormat,
    ) -> Result<()> {
        let table = load_processed(config)?;
        let window = resolve_window(&table, window)?;
        let report = analysis::team_report(&table, name, window)?;

        match format {
            OutputFormat::Table => print!("{}", format_team(&report, opponent_side)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }

    pub fn overview(config: &Config, window: Option<usize>, format: OutputFormat) -> Result<()> {
        let table = load_processed(config)?;
        let window = resolve_window(&table, window)?;
        let overview = analysis::overview(&table, window)?;

        match format {
            OutputFormat::Table => print!("{}", format_overview(&overview)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&overview)?),
        }
        Ok(())
    }

    pub fn quality(config: &Config) -> Result<()> {
        let table = load_processed(config)?;
        print!("{}", format_quality(&analysis::assess(&table)));
        Ok(())
    }

    fn load_processed(config: &Config) -> Result<ResultTable> {
        let db = Database::open(&config.data.database_path, &config.data)?;
        db.load_processed()?.ok_or(FootballError::NotProcessed)
    }

    fn resolve_window(table: &ResultTable, window: Option<usize>) -> Result<usize> {
        match window {
            Some(w) => Ok(w),
            None => table.windows().first().copied().ok_or(FootballError::NotProcessed),
        }
    }

    fn print_load_report(report: &LoadReport) {
        println!(
            "Read {} rows, loaded {}, skipped {}",
            report.rows_read,
            report.rows_loaded,
            report.skipped.len()
        );
        for issue in &report.skipped {
            println!("  line {}: {}", issue.line, issue.message);
        }
    }

    fn cell(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.2}", v),
            None => "-".to_string(),
        }
    }

    fn format_team(report: &TeamReport, opponent_side: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n{} (last {} matches)\n", report.team, report.window));
        out.push_str("═══════════════════════════════════════════════════════════════\n");

        out.push_str(&format!(
            "{:<6} {:<10} {:<4} {:<20} {:>5} {:>2}",
            "ID", "Date", "H/A", "Opponent", "Score", ""
        ));
        for metric in football::analysis::team::TEAM_METRICS {
            out.push_str(&format!(" {:>8}", abbreviate(metric.name())));
        }
        out.push('\n');

        for m in &report.matches {
            let venue = match m.role {
                football::Role::Home => "H",
                football::Role::Away => "A",
            };
            out.push_str(&format!(
                "{:<6} {:<10} {:<4} {:<20} {:>5} {:>2}",
                m.match_id,
                m.date.format("%Y-%m-%d"),
                venue,
                m.opponent,
                format!("{}-{}", m.goals_for, m.goals_against),
                m.outcome.letter()
            ));
            for v in &m.features {
                out.push_str(&format!(" {:>8}", cell(v.value)));
            }
            out.push('\n');

            if opponent_side {
                out.push_str(&format!("{:<51}", format!("  vs {}", m.opponent)));
                for v in &m.opponent_features {
                    out.push_str(&format!(" {:>8}", cell(v.value)));
                }
                out.push('\n');
            }
        }

        out.push_str("───────────────────────────────────────────────────────────────\n");
        out.push_str(&format!("{:<51}", "Average"));
        for v in &report.averages {
            out.push_str(&format!(" {:>8}", cell(v.value)));
        }
        out.push('\n');
        out
    }

    fn abbreviate(name: &str) -> String {
        name.chars().take(8).collect()
    }

    fn format_overview(o: &Overview) -> String {
        let mut out = String::new();
        out.push_str(&format!("\nOverview ({} matches, window {})\n", o.matches, o.window));
        out.push_str("═══════════════════════════════════════\n");

        let pct = |n: usize| {
            if o.matches == 0 {
                0.0
            } else {
                n as f64 / o.matches as f64 * 100.0
            }
        };
        out.push_str("Outcomes:\n");
        out.push_str(&format!(
            "  Home wins:  {:>5} ({:.1}%)\n",
            o.outcomes.home_wins,
            pct(o.outcomes.home_wins)
        ));
        out.push_str(&format!(
            "  Away wins:  {:>5} ({:.1}%)\n",
            o.outcomes.away_wins,
            pct(o.outcomes.away_wins)
        ));
        out.push_str(&format!(
            "  Draws:      {:>5} ({:.1}%)\n",
            o.outcomes.draws,
            pct(o.outcomes.draws)
        ));
        out.push_str(&format!(
            "Mean goals: home {}, away {}\n",
            cell(o.mean_home_goals),
            cell(o.mean_away_goals)
        ));

        out.push_str("\nCorrelations:\n");
        out.push_str(&format!("{:<24}", ""));
        for i in 0..o.correlations.columns.len() {
            out.push_str(&format!(" {:>6}", format!("[{}]", i)));
        }
        out.push('\n');
        let matrix = &o.correlations;
        for (i, (name, row)) in matrix.columns.iter().zip(&matrix.values).enumerate() {
            out.push_str(&format!("{:<24}", format!("[{}] {}", i, name)));
            for v in row {
                out.push_str(&format!(" {:>6}", cell(*v)));
            }
            out.push('\n');
        }

        out.push_str(&format!("\nHome win rate by Home_YellowCards_L{}:\n", o.window));
        for bucket in &o.yellow_card_levels {
            out.push_str(&format!(
                "  {:<10} (<= {:>6}) {:>5} matches  {:>7}%\n",
                bucket.label,
                cell(bucket.upper),
                bucket.matches,
                cell(bucket.home_win_rate)
            ));
        }

        out.push_str(&format!("\nHome win rate by Home_RedCards_L{}:\n", o.window));
        for bucket in &o.red_card_impact {
            out.push_str(&format!(
                "  {:<14} {:>5} matches  {:>7}%\n",
                bucket.label,
                bucket.matches,
                cell(bucket.home_win_rate)
            ));
        }

        out.push_str("\nBy month:\n");
        out.push_str(&format!(
            "  {:<6} {:>7} {:>7} {:>7} {:>9}\n",
            "Month", "Matches", "FTHG", "FTAG", "Form"
        ));
        for (month, m) in &o.monthly {
            out.push_str(&format!(
                "  {:<6} {:>7} {:>7} {:>7} {:>9}\n",
                month,
                m.matches,
                cell(m.home_goals),
                cell(m.away_goals),
                cell(m.home_form)
            ));
        }
        out
    }

    fn format_quality(q: &DataQuality) -> String {
        let mut out = String::new();
        out.push_str("\nData Quality\n");
        out.push_str("───────────────────────────────\n");
        out.push_str(&format!("  Rows:           {}\n", q.rows));
        out.push_str(&format!("  Columns:        {}\n", q.columns));
        out.push_str(&format!("  Missing cells:  {}\n", q.missing_cells));
        out.push_str(&format!("  Completeness:   {:.2}%\n", q.completeness));
        out.push_str(&format!("  Duplicate rows: {}\n", q.duplicate_rows));
        if !q.missing_by_column.is_empty() {
            out.push_str("\nMissing by column:\n");
            for (column, n) in &q.missing_by_column {
                out.push_str(&format!("  {:<32} {}\n", column, n));
            }
        }
        out
    }
}
