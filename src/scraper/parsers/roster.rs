//! All-star roster tables on an encyclopedia season page.
//!
//! Tables are picked by an ordered list of [`TableStrategy`] values. The
//! first strategy that accepts at least one table wins.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use super::text::element_text;
use crate::types::RosterRecord;

const PROFILE_LINK: &str = r#"a[href^="/wiki/"]"#;

/// Names shorter than this are stray icon or footnote links.
const MIN_NAME_CHARS: usize = 4;

/// Rule for deciding which tables on a page are rosters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStrategy {
    /// Header mentions "player" and one of "team", "pos", "club"
    RosterHeader,
    /// The `n` tables with the most profile links in their cells
    MostProfileLinks(usize),
}

impl TableStrategy {
    /// Default order: header rule, then the two densest tables.
    pub const DEFAULT_ORDER: [TableStrategy; 2] =
        [TableStrategy::RosterHeader, TableStrategy::MostProfileLinks(2)];

    /// Tables accepted by this strategy, in page order.
    pub fn select<'a>(&self, tables: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
        match *self {
            TableStrategy::RosterHeader => tables
                .iter()
                .filter(|t| is_roster_header(&header_text(t)))
                .copied()
                .collect(),
            TableStrategy::MostProfileLinks(n) => {
                let mut scored: Vec<(usize, usize)> = tables
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (i, profile_link_count(t)))
                    .filter(|(_, score)| *score > 0)
                    .collect();
                // Stable sort keeps page order among equal scores
                scored.sort_by(|a, b| b.1.cmp(&a.1));
                let mut picked: Vec<usize> = scored.into_iter().take(n).map(|(i, _)| i).collect();
                picked.sort_unstable();
                picked.into_iter().map(|i| tables[i]).collect()
            }
        }
    }
}

fn header_text(table: &ElementRef) -> String {
    let th = Selector::parse("tr th").expect("static selector");
    table
        .select(&th)
        .map(|cell| element_text(&cell))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_roster_header(header: &str) -> bool {
    header.contains("player")
        && (header.contains("team") || header.contains("pos") || header.contains("club"))
}

fn profile_link_count(table: &ElementRef) -> usize {
    let links = Selector::parse(&format!("td {}", PROFILE_LINK)).expect("static selector");
    table.select(&links).count()
}

/// Index of the player column, from the first row's cells; 0 if absent.
fn player_column(table: &ElementRef) -> usize {
    let tr = Selector::parse("tr").expect("static selector");
    let cell = Selector::parse("th, td").expect("static selector");

    table
        .select(&tr)
        .next()
        .and_then(|row| {
            row.select(&cell)
                .position(|c| element_text(&c).to_lowercase().contains("player"))
        })
        .unwrap_or(0)
}

/// Parser for all-star season pages
pub struct RosterParser {
    strategies: Vec<TableStrategy>,
    source_tag: String,
}

impl RosterParser {
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self::with_strategies(source_tag, TableStrategy::DEFAULT_ORDER.to_vec())
    }

    pub fn with_strategies(source_tag: impl Into<String>, strategies: Vec<TableStrategy>) -> Self {
        Self {
            strategies,
            source_tag: source_tag.into(),
        }
    }

    /// Roster rows for `season_year`, deduplicated by player name.
    pub fn extract_roster_rows(&self, html: &str, season_year: u16) -> Vec<RosterRecord> {
        let document = Html::parse_document(html);
        let table_selector = Selector::parse("table.wikitable").expect("static selector");
        let tables: Vec<ElementRef> = document.select(&table_selector).collect();

        let roster_tables = self
            .strategies
            .iter()
            .map(|s| s.select(&tables))
            .find(|picked| !picked.is_empty())
            .unwrap_or_default();

        let tr = Selector::parse("tr").expect("static selector");
        let td = Selector::parse("td").expect("static selector");
        let link = Selector::parse(PROFILE_LINK).expect("static selector");

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for table in roster_tables {
            let column = player_column(&table);

            for row in table.select(&tr) {
                let cells: Vec<_> = row.select(&td).collect();
                let Some(cell) = cells.get(column) else {
                    continue;
                };
                let Some(a) = cell.select(&link).next() else {
                    continue;
                };

                let name = element_text(&a);
                if name.chars().count() < MIN_NAME_CHARS {
                    continue;
                }
                if seen.insert(name.clone()) {
                    records.push(RosterRecord {
                        season_year,
                        player_name: name,
                        source: self.source_tag.clone(),
                    });
                }
            }
        }

        records
    }
}
