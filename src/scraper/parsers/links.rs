//! Sub-page discovery on index pages.
//!
//! Zero matches is a [`StructureError`]: every later step assumes the list
//! is non-empty.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::error::StructureError;

fn letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/players/[a-z]/$").expect("static regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/wiki/(\d{4})_NBA_All-Star_Game$").expect("static regex"))
}

/// Every `href` matching `pattern`, deduplicated in first-seen order.
pub fn extract_section_links(
    document: &Html,
    pattern: &Regex,
    page: &str,
) -> Result<Vec<String>, StructureError> {
    let selector = Selector::parse("a[href]").expect("static selector");
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for a in document.select(&selector) {
        if let Some(href) = a.value().attr("href") {
            if pattern.is_match(href) && seen.insert(href) {
                links.push(href.to_string());
            }
        }
    }

    if links.is_empty() {
        return Err(StructureError::new(
            format!("links matching `{}`", pattern.as_str()),
            page,
        ));
    }
    Ok(links)
}

/// Letter pages (`/players/a/` ... `/players/z/`) of the players index.
pub fn extract_letter_links(html: &str, page: &str) -> Result<Vec<String>, StructureError> {
    let document = Html::parse_document(html);
    extract_section_links(&document, letter_re(), page)
}

/// All-star game pages within `[min_year, max_year]`, resolved against
/// `base` and ordered by year. One page per year.
pub fn extract_year_links(
    html: &str,
    base: &Url,
    min_year: u16,
    max_year: u16,
) -> Result<Vec<(u16, String)>, StructureError> {
    let document = Html::parse_document(html);
    let page = base.as_str();
    let hrefs = extract_section_links(&document, year_re(), page)?;

    let mut by_year = BTreeMap::new();
    for href in &hrefs {
        let Some(year) = year_re()
            .captures(href)
            .and_then(|caps| caps[1].parse::<u16>().ok())
        else {
            continue;
        };
        if year < min_year || year > max_year {
            continue;
        }
        if let Ok(url) = base.join(href) {
            by_year.insert(year, url.to_string());
        }
    }

    if by_year.is_empty() {
        return Err(StructureError::new(
            format!("all-star game pages for {}-{}", min_year, max_year),
            page,
        ));
    }
    Ok(by_year.into_iter().collect())
}
