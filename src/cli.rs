//! CLI commands for hoops-harvest.
//!
//! One subcommand per stage, plus the dedupe finishing pass.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::collector::{Collector, TracingObserver};
use crate::config::AppConfig;
use crate::jobs::{BioJob, RosterJob};
use crate::scraper::parsers::{BioParser, RosterParser};
use crate::scraper::{build_source, CachedSource, PageCache, Pacer};
use crate::stages::{collect_player_index, discover_seasons};
use crate::storage::{load_player_units, DatasetWriter};

#[derive(Parser)]
#[command(name = "hoops-harvest")]
#[command(version, about = "Scrape player bios and all-star rosters into CSV datasets", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./harvest.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the players index from the per-letter pages
    Index,

    /// Collect birthplace and debut year for every indexed player
    Bios {
        /// Show the browser window
        #[arg(long)]
        visible: bool,

        /// Rows per flush
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Collect all-star rosters per season
    AllStars {
        /// First season (inclusive)
        #[arg(long = "from")]
        from_year: Option<u16>,

        /// Last season (inclusive)
        #[arg(long = "to")]
        to_year: Option<u16>,

        /// Rows per flush
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Keep the first row for each key in a CSV dataset
    Dedupe {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Key column; repeat for a composite key
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,
    },
}

/// Stage 1: players index.
pub async fn run_index(config: &AppConfig) -> anyhow::Result<()> {
    let cfg = &config.index;
    let source = build_source(cfg.strategy, &config.http, &config.browser)?;
    let pacer = Pacer::from_config(&cfg.pacing);

    let records = collect_player_index(source.as_ref(), &pacer, &cfg.index_url).await?;

    let writer = DatasetWriter::new(&cfg.output);
    let written = writer
        .replace(&records)
        .with_context(|| format!("failed to write {}", cfg.output.display()))?;
    info!("Saved {} players to {}", written, cfg.output.display());

    Ok(())
}

/// Stage 2: player bios, cache-first and resumable.
pub async fn run_bios(
    config: &AppConfig,
    visible: bool,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let cfg = &config.bios;

    let units = load_player_units(&cfg.input)?;
    info!("Loaded {} players from {}", units.len(), cfg.input.display());

    let mut browser = config.browser.clone();
    if visible {
        browser.headless = false;
    }

    let inner = build_source(cfg.strategy, &config.http, &browser)?;
    let source = CachedSource::new(inner, PageCache::new(&cfg.cache_dir));
    let parser = BioParser::new(&cfg.born_label, &cfg.debut_label);

    let mut collector = Collector::new(
        source,
        Pacer::from_config(&cfg.pacing),
        batch_size.unwrap_or(cfg.batch_size),
    )
    .with_observer(TracingObserver);
    let mut sink = DatasetWriter::new(&cfg.output);

    let summary = collector.run(&BioJob::new(parser), &units, &mut sink).await?;
    info!(
        "Done: {} processed, {} skipped, {} errored, {} rows in {} batches written to {}",
        summary.processed,
        summary.skipped,
        summary.errored,
        summary.written,
        summary.batches,
        cfg.output.display()
    );

    Ok(())
}

/// Stage 3: all-star rosters, resumable by season.
pub async fn run_all_stars(
    config: &AppConfig,
    from_year: Option<u16>,
    to_year: Option<u16>,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let cfg = &config.all_stars;
    let min_year = from_year.unwrap_or(cfg.min_year);
    let max_year = to_year.unwrap_or(cfg.max_year);
    anyhow::ensure!(
        min_year <= max_year,
        "empty season range {}-{}",
        min_year,
        max_year
    );

    let source = build_source(cfg.strategy, &config.http, &config.browser)?;
    let pacer = Pacer::from_config(&cfg.pacing);
    let seasons =
        discover_seasons(source.as_ref(), &pacer, &cfg.index_url, min_year, max_year).await?;

    let mut collector = Collector::new(source, pacer, batch_size.unwrap_or(cfg.batch_size))
        .with_observer(TracingObserver);
    let mut sink = DatasetWriter::new(&cfg.output);
    let job = RosterJob::new(RosterParser::new(&cfg.source_tag));

    let summary = collector.run(&job, &seasons, &mut sink).await?;
    info!(
        "Done: {} seasons processed, {} skipped, {} errored, {} rows in {} batches written to {}",
        summary.processed,
        summary.skipped,
        summary.errored,
        summary.written,
        summary.batches,
        cfg.output.display()
    );

    Ok(())
}

/// Finishing pass: drop repeated keys, keeping the first row.
pub fn run_dedupe(file: PathBuf, keys: Vec<String>) -> anyhow::Result<()> {
    let writer = DatasetWriter::new(&file);
    let (kept, dropped) = writer
        .dedupe(&keys)
        .with_context(|| format!("failed to dedupe {}", file.display()))?;
    info!(
        "{}: kept {} rows, dropped {} duplicates by [{}]",
        file.display(),
        kept,
        dropped,
        keys.join(", ")
    );
    Ok(())
}
