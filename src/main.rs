//! Hoops Harvest
//!
//! Resumable scrapers for player bios and all-star rosters, written to CSV.

mod cli;
mod collector;
mod config;
mod error;
mod jobs;
mod scraper;
mod stages;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoops_harvest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Commands::Index => cli::run_index(&config).await,
        Commands::Bios {
            visible,
            batch_size,
        } => cli::run_bios(&config, visible, batch_size).await,
        Commands::AllStars {
            from_year,
            to_year,
            batch_size,
        } => cli::run_all_stars(&config, from_year, to_year, batch_size).await,
        Commands::Dedupe { file, keys } => cli::run_dedupe(file, keys),
    }
}
