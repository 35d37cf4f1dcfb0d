//! fars-ingest
//!
//! Incremental, checkpointed ingestion of NHTSA FARS crash data and
//! Meteostat daily weather into a shared SQLite database.

mod checkpoint;
mod cli;
mod client;
mod config;
mod error;
mod ingest;
mod normalize;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fars_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    cli::run(cli).await
}
