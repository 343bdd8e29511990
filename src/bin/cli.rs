//! F1 Features CLI - build leakage-free history features from race results

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use f1_features::config::parse_sentinels;
use f1_features::data::{load_records, write_csv, write_model_csv};
use f1_features::modeling::{time_based_split, Imputer};
use f1_features::{EngineConfig, FeatureEngine, FeatureTable, SeasonRange, SplitConfig};

/// Environment variable selecting the log level (error, warn, info, debug, trace)
const ENV_LOG_LEVEL: &str = "F1_FEATURES_LOG";
const DEFAULT_OUTPUT: &str = "data/processed/features.csv";

#[derive(Parser)]
#[command(name = "f1-features")]
#[command(author, version, about = "Historical driver/constructor features for F1 results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Comma-separated starting positions meaning "unknown" (default: 0)
    #[arg(long, global = true)]
    sentinels: Option<String>,

    /// Map unrecognized status text to retired instead of failing
    #[arg(long, global = true)]
    lenient_status: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the feature table from a joined results CSV
    Build {
        /// Joined results CSV (season/year, round, raceId, driverId, constructorId, grid, positionOrder, points, status)
        #[arg(short, long)]
        input: PathBuf,

        /// Output feature CSV
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Summarize the feature table without writing it
    Summary {
        /// Joined results CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Impute with training medians and write time-based train/test CSVs
    Split {
        /// Joined results CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for train.csv and test.csv
        #[arg(short, long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// Training seasons, inclusive (e.g. 2018-2022)
        #[arg(long, default_value = "2018-2022")]
        train: SeasonRange,

        /// Test seasons, inclusive (e.g. 2023-2024)
        #[arg(long, default_value = "2023-2024")]
        test: SeasonRange,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = engine_config(&cli)?;
    info!("Engine config: {:?}", config);

    println!("{}", "F1 Features CLI v0.1.0".cyan().bold());
    println!();

    match &cli.command {
        Commands::Build { input, output } => run_build(config, input, output),
        Commands::Summary { input, json } => run_summary(config, input, *json),
        Commands::Split {
            input,
            output_dir,
            train,
            test,
        } => run_split(
            config,
            input,
            output_dir,
            SplitConfig {
                train: *train,
                test: *test,
            },
        ),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => std::env::var(ENV_LOG_LEVEL)
            .ok()
            .and_then(|v| v.parse::<Level>().ok())
            .unwrap_or(Level::WARN),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}

/// Defaults, then config file, then environment, then flags
fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let base = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => EngineConfig::default(),
    };
    let mut config = base.with_env_overrides()?;

    if let Some(raw) = &cli.sentinels {
        config.start_position_sentinels = parse_sentinels(raw)?;
    }
    if cli.lenient_status {
        config.lenient_status = true;
    }
    config.validate()?;
    Ok(config)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

fn build_table(config: EngineConfig, input: &Path) -> Result<FeatureTable> {
    let pb = spinner("Loading race results...");
    let records = load_records(input)
        .with_context(|| format!("Failed to load CSV from {:?}", input))?;

    pb.set_message(format!("Computing features for {} records...", records.len()));
    let engine = FeatureEngine::new(config)?;
    let table = engine
        .build(&records)
        .with_context(|| format!("Failed to build features from {:?}", input))?;

    pb.finish_and_clear();
    Ok(table)
}

fn run_build(config: EngineConfig, input: &Path, output: &Path) -> Result<()> {
    println!("{}: {:?}", "Building features from".green(), input);

    let table = build_table(config, input)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    write_csv(&table.rows, output).with_context(|| format!("Failed to write {:?}", output))?;

    println!("Saved {} feature rows to {:?}", table.len(), output);
    Ok(())
}

fn run_summary(config: EngineConfig, input: &Path, json: bool) -> Result<()> {
    let table = build_table(config, input)?;
    let summary = table.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Feature table:".yellow().bold());
    println!("  {:<28} {:>8}", "rows", summary.rows);
    println!("  {:<28} {:>8}", "races", summary.races);
    println!("  {:<28} {:>8}", "drivers", summary.drivers);
    println!("  {:<28} {:>8}", "constructors", summary.constructors);
    match (summary.seasons.first(), summary.seasons.last()) {
        (Some(first), Some(last)) => println!("  {:<28} {:>8}", "seasons", format!("{}-{}", first, last)),
        _ => println!("  {:<28} {:>8}", "seasons", "-"),
    }
    println!();

    println!("{}", "Missing values:".yellow().bold());
    println!("{}", "-".repeat(46));
    for (column, missing) in &summary.missing {
        let pct = if summary.rows > 0 {
            *missing as f64 / summary.rows as f64 * 100.0
        } else {
            0.0
        };
        let line = format!("  {:<28} {:>8} {:>6.1}%", column, missing, pct);
        if *missing > 0 {
            println!("{}", line.as_str().dimmed());
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}

fn run_split(config: EngineConfig, input: &Path, output_dir: &Path, split: SplitConfig) -> Result<()> {
    println!(
        "{}: train {} / test {}",
        "Splitting by season".green(),
        split.train,
        split.test
    );

    let table = build_table(config, input)?;

    // Medians come from training seasons only
    let imputer = Imputer::fit(&table.rows, split.train);
    let inputs = imputer.transform(&table.rows)?;
    let parts = time_based_split(&inputs, &split)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {:?}", output_dir))?;
    let train_path = output_dir.join("train.csv");
    let test_path = output_dir.join("test.csv");
    write_model_csv(&parts.train, &train_path)
        .with_context(|| format!("Failed to write {:?}", train_path))?;
    write_model_csv(&parts.test, &test_path)
        .with_context(|| format!("Failed to write {:?}", test_path))?;

    let medians = imputer.medians();
    println!(
        "Medians: driver_consistency_past={:?}, constructor_avg_finish_past={:?}",
        medians.driver_consistency_past, medians.constructor_avg_finish_past
    );
    println!("Saved {} train rows to {:?}", parts.train.len(), train_path);
    println!("Saved {} test rows to {:?}", parts.test.len(), test_path);
    Ok(())
}
