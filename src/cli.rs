//! CLI commands for fars-ingest.
//!
//! One subcommand per ingestion stream, plus database bootstrap and a
//! status report. Every invocation processes exactly one window and
//! exits; scheduling repeated runs drives the full backfill.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::checkpoint::{CheckpointStore, Stream};
use crate::client::{CrashApiClient, WeatherClient};
use crate::config::AppConfig;
use crate::ingest::{self, WindowOutcome};
use crate::storage::CrashRepository;

#[derive(Parser)]
#[command(name = "fars-ingest")]
#[command(version, about = "Incremental FARS crash and Meteostat weather ingestion", long_about = None)]
pub struct Cli {
    /// Database path override
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Checkpoint directory override
    #[arg(long, global = true)]
    pub checkpoints: Option<PathBuf>,

    /// Window size override (records or days per invocation)
    #[arg(short, long, global = true)]
    pub batch_size: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest one window of crash records from the case-list API
    Crashes,

    /// Ingest one window of per-case crash details
    Details,

    /// Ingest one window of daily weather observations
    Weather,

    /// Create the database and tables without ingesting
    Init,

    /// Report cursor positions and table row counts
    Status,
}

/// Apply CLI overrides onto the loaded configuration.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(ref db) = cli.db {
        config.database.path = db.to_string_lossy().to_string();
    }
    if let Some(ref dir) = cli.checkpoints {
        config.database.checkpoint_dir = dir.to_string_lossy().to_string();
    }
    if let Some(batch) = cli.batch_size {
        config.ingest.batch_size = batch;
    }
}

/// Run the selected command. Everything the drivers need lives for one
/// invocation and is dropped on every exit path.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    apply_overrides(&mut config, &cli);

    let repo = CrashRepository::open(Path::new(&config.database.path))?;
    let checkpoints = CheckpointStore::new(&config.database.checkpoint_dir);

    match cli.command {
        Commands::Crashes => {
            let client = CrashApiClient::new(config.crash_api.base_url.clone());
            let outcome = ingest::crashes::run(
                &repo,
                &checkpoints,
                &client,
                &config.crash_api,
                config.ingest.batch_size,
            )
            .await?;
            print_outcome("crashes", &outcome);
        }
        Commands::Details => {
            let client = CrashApiClient::new(config.crash_api.base_url.clone());
            let outcome =
                ingest::details::run(&repo, &checkpoints, &client, config.ingest.batch_size)
                    .await?;
            print_outcome("details", &outcome);
        }
        Commands::Weather => {
            let client = WeatherClient::new(
                config.weather.base_url.clone(),
                config.weather.api_key.clone(),
            );
            let outcome = ingest::weather::run(
                &repo,
                &checkpoints,
                &client,
                &config.weather,
                config.ingest.batch_size,
            )
            .await?;
            print_outcome("weather", &outcome);
        }
        Commands::Init => {
            // Opening the repository created the tables already.
            println!("database ready at {}", config.database.path);
        }
        Commands::Status => {
            print_status(&repo, &checkpoints)?;
        }
    }

    Ok(())
}

/// Print a one-window summary for the operator.
fn print_outcome(stream: &str, outcome: &WindowOutcome) {
    let stats = outcome.stats();
    let state = if outcome.is_exhausted() {
        "exhausted"
    } else {
        "advanced"
    };
    println!(
        "{}: {} (cursor {}, processed {}, skipped {}, failed {})",
        stream,
        state,
        outcome.cursor(),
        stats.processed,
        stats.skipped,
        stats.failed
    );
}

/// Print per-stream cursors and table row counts.
fn print_status(repo: &CrashRepository, checkpoints: &CheckpointStore) -> anyhow::Result<()> {
    let counts = repo.counts()?;

    println!("=== Cursors ===");
    for (name, stream) in [
        ("crash list", Stream::CrashList),
        ("crash details", Stream::CrashDetails),
        ("weather", Stream::Weather),
    ] {
        match checkpoints.read(stream)? {
            Some(cursor) => println!("  {:>13}: {}", name, cursor),
            None => println!("  {:>13}: (first run)", name),
        }
    }

    println!("=== Rows ===");
    println!("  {:>18}: {}", "crashes", counts.crashes);
    println!("  {:>18}: {}", "crash_details", counts.crash_details);
    println!("  {:>18}: {}", "counties", counts.counties);
    println!("  {:>18}: {}", "intersection_types", counts.intersection_types);
    println!("  {:>18}: {}", "weather days", counts.weather_days);

    Ok(())
}
