//! Index-page steps that run before (or instead of) the collector.
//!
//! A structural failure here aborts the whole stage.

use std::collections::HashSet;

use anyhow::Context;
use tracing::{info, warn};
use url::Url;

use crate::scraper::parsers::{extract_letter_links, extract_player_index, extract_year_links};
use crate::scraper::{Pacer, PageSource};
use crate::types::{IndexRecord, SeasonUnit};

/// Walk the players index: one page per starting letter, every profile link
/// on each. Letters whose page fails or lacks a players table are skipped.
pub async fn collect_player_index(
    source: &dyn PageSource,
    pacer: &Pacer,
    index_url: &str,
) -> anyhow::Result<Vec<IndexRecord>> {
    let base = Url::parse(index_url).with_context(|| format!("invalid index URL {}", index_url))?;
    let origin = base.origin().ascii_serialization();

    info!("Fetching index: {}", index_url);
    let html = source
        .fetch(index_url)
        .await
        .context("failed to fetch players index")?;
    pacer.pause().await;
    let letters = extract_letter_links(&html, index_url)?;
    info!("Found {} letter pages", letters.len());

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for href in &letters {
        let url = base.join(href)?.to_string();
        info!("Fetching: {}", url);

        match source.fetch(&url).await {
            Ok(page) => match extract_player_index(&page, &origin) {
                Some(rows) => {
                    let before = records.len();
                    records.extend(rows.into_iter().filter(|r| seen.insert(r.clone())));
                    info!("  {} players", records.len() - before);
                }
                None => warn!("players table not found, skipping: {}", url),
            },
            Err(e) => warn!("{} failed: {}", url, e),
        }

        pacer.pause().await;
    }

    Ok(records)
}

/// All-star season pages in `[min_year, max_year]`, one unit per year.
pub async fn discover_seasons(
    source: &dyn PageSource,
    pacer: &Pacer,
    index_url: &str,
    min_year: u16,
    max_year: u16,
) -> anyhow::Result<Vec<SeasonUnit>> {
    let base = Url::parse(index_url).with_context(|| format!("invalid index URL {}", index_url))?;

    info!("Fetching index: {}", index_url);
    let html = source
        .fetch(index_url)
        .await
        .context("failed to fetch all-star index")?;
    pacer.pause().await;
    let links = extract_year_links(&html, &base, min_year, max_year)?;
    info!("Found {} season pages ({}-{})", links.len(), min_year, max_year);

    Ok(links
        .into_iter()
        .map(|(year, url)| SeasonUnit { year, url })
        .collect())
}
