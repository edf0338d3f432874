//! Players table on a letter page of the stats site.

use std::collections::HashSet;

use scraper::{Html, Selector};

use super::text::element_text;
use crate::types::IndexRecord;

/// Profile links in the page's `players` table, deduplicated.
///
/// `None` when the page has no players table at all.
pub fn extract_player_index(html: &str, base_url: &str) -> Option<Vec<IndexRecord>> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table#players").expect("static selector");
    let link_selector =
        Selector::parse("a[href^='/players/'][href$='.html']").expect("static selector");

    let table = document.select(&table_selector).next()?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for a in table.select(&link_selector) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let record = IndexRecord {
            player_name: element_text(&a),
            player_url: format!("{}{}", base_url, href),
        };
        if seen.insert(record.clone()) {
            records.push(record);
        }
    }

    Some(records)
}
