use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};

use collexions::activation;
use collexions::catalog::SnapshotCatalog;
use collexions::config::{Config, EngineConfig};
use collexions::cycle::CycleOutcome;
use collexions::history::{self, HistoryStore, format_timestamp};
use collexions::pinning::{LogNotifier, LogPinner};
use collexions::runner::CycleRunner;

mod cli;

use cli::Cli;
use cli::commands::Commands;

/// Environment variable that overrides the configured log level.
const LOG_ENV: &str = "RUST_LOG";

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("collexions")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("collexions.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Filter is wide open; the effective level is the global max level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .target(env_logger::Target::Pipe(target))
        .init();
    if std::env::var_os(LOG_ENV).is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn apply_log_level(level: Option<&str>) {
    if std::env::var_os(LOG_ENV).is_some() {
        return;
    }
    let Some(level) = level else {
        return;
    };
    match level.parse::<LevelFilter>() {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => log::warn!("Unknown log_level '{}', keeping info", level),
    }
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let engine = config.resolve();

    match &cli.command {
        Commands::Run { catalog, seed } => handle_run_command(catalog, *seed, config, engine),
        Commands::Preview { catalog, seed } => handle_preview_command(catalog, *seed, config, engine),
        Commands::Specials { date } => handle_specials_command(*date, &engine),
        Commands::History => handle_history_command(config, &engine),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn build_runner(
    catalog: &Path,
    seed: Option<u64>,
    config: &Config,
    engine: EngineConfig,
    read_only: bool,
) -> Result<CycleRunner> {
    let catalog = SnapshotCatalog::from_file(catalog).context("Failed to load catalog snapshot")?;
    let store = if read_only {
        HistoryStore::open_read_only(&config.history_file)
    } else {
        HistoryStore::open(&config.history_file)
    }
    .context(format!("Failed to open pin history {}", config.history_file.display()))?
    .with_retention(engine.retention);

    let mut runner = CycleRunner::new(engine, store, Box::new(catalog), Box::new(LogPinner::new()))
        .with_notifier(Box::new(LogNotifier));
    if let Some(seed) = seed {
        runner = runner.with_rng(StdRng::seed_from_u64(seed));
    }
    Ok(runner)
}

fn print_outcome(outcome: &CycleOutcome) {
    for selection in &outcome.selections {
        println!(
            "{} {} ({}/{})",
            "Library:".green(),
            selection.library.bold(),
            selection.collections.len(),
            selection.budget
        );
        if selection.collections.is_empty() {
            println!("  {}", "nothing to pin".dimmed());
        }
        for collection in &selection.collections {
            let marker = if outcome.active_specials.contains(&collection.title) {
                "*".yellow()
            } else {
                "-".normal()
            };
            println!("  {} {} ({} items)", marker, collection.title, collection.item_count);
        }
    }
}

fn handle_run_command(catalog: &Path, seed: Option<u64>, config: &Config, engine: EngineConfig) -> Result<()> {
    info!("Running pinning cycle with catalog {}", catalog.display());
    let mut runner = build_runner(catalog, seed, config, engine, false)?;
    let (outcome, report) = runner.run_once(now()).context("Pinning cycle failed")?;

    print_outcome(&outcome);
    println!(
        "{} {} pinned, {} failed",
        "Done:".green(),
        report.pinned,
        report.failed.to_string().red()
    );
    Ok(())
}

fn handle_preview_command(catalog: &Path, seed: Option<u64>, config: &Config, engine: EngineConfig) -> Result<()> {
    info!("Previewing pinning cycle with catalog {}", catalog.display());
    let mut runner = build_runner(catalog, seed, config, engine, true)?;
    let outcome = runner.preview(now());

    println!("{}", "Preview (nothing pinned, history unchanged)".cyan());
    print_outcome(&outcome);
    Ok(())
}

fn handle_specials_command(date: Option<NaiveDate>, engine: &EngineConfig) -> Result<()> {
    let date = date.unwrap_or_else(|| now().date());
    info!("Listing special collections active on {}", date);

    println!("{} {}", "Specials active on".green(), date);
    let mut found = false;
    for special in &engine.specials {
        if activation::is_active(special, date) {
            found = true;
            println!("  {} to {}: {}", special.start, special.end, special.titles.join(", "));
        }
    }
    if !found {
        println!("  {}", "none".dimmed());
    }
    Ok(())
}

fn handle_history_command(config: &Config, engine: &EngineConfig) -> Result<()> {
    info!("Showing pin history from {}", config.history_file.display());
    let records = HistoryStore::load(&config.history_file)
        .context(format!("Failed to read pin history {}", config.history_file.display()))?;

    if records.is_empty() {
        println!("{}", "No pin history".dimmed());
        return Ok(());
    }

    for record in &records {
        println!("{} {}", format_timestamp(&record.timestamp).cyan(), record.titles.join(", "));
    }

    let mut recent: Vec<String> = history::recently_pinned(&records, engine.cooldown, now())
        .difference(&activation::all_titles(&engine.specials))
        .cloned()
        .collect();
    recent.sort();
    println!(
        "{} {}",
        "In cool-down:".yellow(),
        if recent.is_empty() { "none".to_string() } else { recent.join(", ") }
    );
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(config.log_level.as_deref());

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
