//! StockLab CLI: aligned ticker histories, returns, and studies.
//!
//! Commands:
//! - `show`: one ticker's close and volume over its full history
//! - `compare`: close prices of several tickers on one business-day index
//! - `normalize`: the same, divided by a baseline row
//! - `returns`: daily returns and their distribution
//! - `cumulative`: running sum of the daily returns
//! - `study`: run configured studies and save artifacts

mod render;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stocklab_core::analysis::{
    column_histograms, cumulative_return, daily_return, describe, normalize, period_change,
    FillMethod, DEFAULT_BINS,
};
use stocklab_core::data::{
    Aligner, CsvDirSource, DateRange, MissingSymbolPolicy, SeriesSource, DEFAULT_SUFFIX,
};
use stocklab_core::domain::PriceField;
use stocklab_core::Table;
use stocklab_runner::{run_config, save_artifacts, StudyConfig, StudyResult, DEFAULT_DATA_DIR};

const SPARK_WIDTH: usize = 60;

#[derive(Parser)]
#[command(
    name = "stocklab",
    about = "StockLab CLI: compare, normalize, and study local ticker histories"
)]
struct Cli {
    /// Directory of per-ticker files.
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// File suffix after the lowercase symbol.
    #[arg(long, global = true, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Log more (-v for debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Symbols and business-day range shared by the table commands.
#[derive(Args)]
struct RangeArgs {
    /// Symbols to align (e.g., googl msft aapl).
    #[arg(required = true)]
    symbols: Vec<String>,

    /// First date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: String,

    /// Last date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: String,

    /// Drop symbols with no file instead of failing.
    #[arg(long, default_value_t = false)]
    skip_missing: bool,

    /// Fill gaps before display: none, forward, interpolate.
    #[arg(long, default_value_t = FillMethod::None)]
    fill: FillMethod,

    /// Rows shown at each end of the table.
    #[arg(long, default_value_t = 5)]
    rows: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// One ticker's close and volume over its full history.
    Show {
        symbol: String,
    },
    /// Close prices of several tickers on one business-day index.
    Compare {
        #[command(flatten)]
        range: RangeArgs,

        /// Print the full table as CSV instead.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Close prices divided by each column's value at a baseline row.
    Normalize {
        #[command(flatten)]
        range: RangeArgs,

        /// Row whose values become 1.0.
        #[arg(long, default_value_t = 0)]
        baseline_row: usize,
    },
    /// Daily returns (previous / current - 1) with histograms.
    Returns {
        #[command(flatten)]
        range: RangeArgs,

        /// Histogram bins.
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },
    /// Running sum of the daily returns.
    Cumulative {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Run configured studies and save their artifacts.
    Study {
        /// Path to a TOML study file. Defaults to the built-in notebook studies.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run only the study with this name.
        #[arg(long)]
        name: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = CsvDirSource::new(&cli.data_dir).with_suffix(&cli.suffix);

    match cli.command {
        Commands::Show { symbol } => run_show(&source, &symbol),
        Commands::Compare { range, csv } => run_compare(&source, &range, csv),
        Commands::Normalize {
            range,
            baseline_row,
        } => run_normalize(&source, &range, baseline_row),
        Commands::Returns { range, bins } => run_returns(&source, &range, bins),
        Commands::Cumulative { range } => run_cumulative(&source, &range),
        Commands::Study {
            config,
            name,
            output,
        } => run_study_cmd(&cli.data_dir, &cli.suffix, config, name, output),
    }
}

fn init_tracing(verbose: u8) {
    let default = if verbose > 0 { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn align(source: &dyn SeriesSource, args: &RangeArgs) -> Result<Table> {
    let range = DateRange::parse_business_days(&args.start, &args.end)?;
    if range.is_empty() {
        bail!("no business days between {} and {}", args.start, args.end);
    }
    let policy = if args.skip_missing {
        MissingSymbolPolicy::Skip
    } else {
        MissingSymbolPolicy::Fail
    };
    let table = Aligner::new(source)
        .policy(policy)
        .align(&args.symbols, &range)?;
    info!(rows = table.n_rows(), columns = table.n_cols(), "aligned");
    Ok(table)
}

fn print_table(table: &Table, args: &RangeArgs) {
    let shown = args.fill.apply(table);
    print!("{}", render::table(&shown, args.rows, args.rows));
    println!();
    print!("{}", render::sparklines(&shown, SPARK_WIDTH));
}

fn run_show(source: &dyn SeriesSource, symbol: &str) -> Result<()> {
    let series = source.fetch(symbol)?;
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        bail!("{symbol} has no records");
    };

    let close: Vec<Option<f64>> = series.records().iter().map(|r| r.close).collect();
    let volume: Vec<Option<f64>> = series
        .records()
        .iter()
        .map(|r| r.field(PriceField::Volume))
        .collect();
    let table = Table::from_columns(
        series.records().iter().map(|r| r.date).collect(),
        vec![("close".into(), close), ("volume".into(), volume)],
    )?;

    println!("=== {symbol} ===");
    println!("Period:  {first} to {last}");
    println!("Records: {}", series.len());
    println!();
    print!("{}", render::table(&table, 5, 5));
    println!();
    print!("{}", render::sparklines(&table, SPARK_WIDTH));
    Ok(())
}

fn run_compare(source: &dyn SeriesSource, args: &RangeArgs, csv: bool) -> Result<()> {
    let table = align(source, args)?;
    if csv {
        print!("{}", stocklab_runner::table_to_csv(&args.fill.apply(&table))?);
        return Ok(());
    }
    print_table(&table, args);
    println!();
    print!("{}", render::changes(&period_change(&table)));
    Ok(())
}

fn run_normalize(source: &dyn SeriesSource, args: &RangeArgs, baseline_row: usize) -> Result<()> {
    let table = align(source, args)?;
    let normalized = normalize(&table, baseline_row)?;

    println!("Percentage change, first to last row:");
    print!("{}", render::changes(&period_change(&table)));
    println!();
    print_table(&normalized.table, args);
    for column in &normalized.undefined {
        println!("WARNING: {column} has a zero or missing value at row {baseline_row}");
    }
    Ok(())
}

fn run_returns(source: &dyn SeriesSource, args: &RangeArgs, bins: usize) -> Result<()> {
    let table = align(source, args)?;
    let returns = daily_return(&table);

    print_table(&returns, args);
    println!();
    print!("{}", render::stats(&describe(&returns)));
    for (name, hist) in column_histograms(&returns, bins)? {
        println!();
        print!("{}", render::histogram(&name, &hist, 40));
    }
    Ok(())
}

fn run_cumulative(source: &dyn SeriesSource, args: &RangeArgs) -> Result<()> {
    let table = align(source, args)?;
    print_table(&cumulative_return(&daily_return(&table)), args);
    Ok(())
}

fn run_study_cmd(
    data_dir: &Path,
    suffix: &str,
    config_path: Option<PathBuf>,
    name: Option<String>,
    output: PathBuf,
) -> Result<()> {
    let config = match config_path {
        Some(path) => StudyConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = StudyConfig::notebook();
            config.data.dir = data_dir.to_path_buf();
            config.data.suffix = suffix.to_string();
            config
        }
    };

    let results = run_config(&config, name.as_deref())?;
    for result in &results {
        print_summary(result);
        let dir = save_artifacts(result, &output)?;
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn print_summary(result: &StudyResult) {
    let s = &result.summary;
    println!();
    println!("=== Study: {} ===", s.study.name);
    println!("Symbols:    {}", s.study.symbols.join(", "));
    println!("Period:     {} to {}", s.study.start, s.study.end);
    println!("Transform:  {}", s.study.transform);
    println!("Fill:       {}", s.study.fill);
    println!("Rows:       {}", s.rows);
    println!("Table hash: {}", &s.table_fingerprint[..16]);
    println!();
    print!("{}", render::table(&result.table, 3, 3));
    println!();
    print!("{}", render::changes(&s.changes));
    for h in &s.histograms {
        println!();
        print!("{}", render::histogram(&h.column, &h.histogram, 40));
    }
    for symbol in &s.skipped {
        println!("WARNING: skipped missing symbol {symbol}");
    }
    for column in &s.undefined {
        println!("WARNING: {column} could not be normalized");
    }
}
