//! Player profile extraction: birth line, country and debut year.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::text::{element_text, normalize_ws, page_text};

/// Fields pulled from one profile page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BioFields {
    pub born_line: Option<String>,
    pub country: Option<String>,
    pub debut_year: Option<i32>,
}

/// Parser for player profile pages
pub struct BioParser {
    born_label: String,
    debut_label: String,
}

impl BioParser {
    pub fn new(born_label: impl Into<String>, debut_label: impl Into<String>) -> Self {
        Self {
            born_label: born_label.into(),
            debut_label: debut_label.into(),
        }
    }

    /// Parse a profile page. Missing fields come back as `None`.
    pub fn parse(&self, html: &str) -> BioFields {
        let document = Html::parse_document(html);

        let born_line = extract_labeled_line(&document, &self.born_label);
        let country = born_line.as_deref().and_then(derive_country);
        let debut_year = derive_debut_year(&page_text(&document), &self.debut_label);

        BioFields {
            born_line,
            country,
            debut_year,
        }
    }
}

impl Default for BioParser {
    fn default() -> Self {
        Self::new("Born:", "NBA Debut")
    }
}

/// Full line around a label element such as `<strong>Born:</strong>`.
///
/// Tries an exact match on the label text first, then a case-insensitive
/// substring match. The line is the label's parent element text,
/// whitespace-normalized.
pub fn extract_labeled_line(document: &Html, label: &str) -> Option<String> {
    let selector = Selector::parse("strong").expect("static selector");
    let labels: Vec<ElementRef> = document.select(&selector).collect();

    let exact = labels.iter().find(|el| element_text(el) == label);
    let found = exact.or_else(|| {
        let needle = label.to_lowercase();
        labels
            .iter()
            .find(|el| element_text(el).to_lowercase().contains(&needle))
    })?;

    let parent = found.parent().and_then(ElementRef::wrap)?;
    let line = element_text(&parent);
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn trailing_us_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bus$").expect("static regex"))
}

fn state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("static regex"))
}

fn has_letter(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic())
}

const UNITED_STATES: &str = "United States";

/// Country or region from a birth line, first matching rule wins:
///
/// 1. trailing `us` token
/// 2. last comma segment is a two-letter state code
/// 3. last comma segment has letters and at least 3 chars, taken verbatim
/// 4. the last word under the `us` / 3-char rules
///
/// A trailing two-letter country code is read as a US state.
pub fn derive_country(born_line: &str) -> Option<String> {
    let text = normalize_ws(born_line);
    if text.is_empty() {
        return None;
    }

    if trailing_us_re().is_match(&text) {
        return Some(UNITED_STATES.to_string());
    }

    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        let last = parts[parts.len() - 1];
        if state_re().is_match(last) {
            return Some(UNITED_STATES.to_string());
        }
        if has_letter(last) && last.chars().count() >= 3 {
            return Some(last.to_string());
        }
    }

    let last = text.split_whitespace().last()?;
    if last.eq_ignore_ascii_case("us") {
        return Some(UNITED_STATES.to_string());
    }
    if has_letter(last) && last.chars().count() >= 3 {
        return Some(last.to_string());
    }

    None
}

/// Year from a `<label>: <Month> <Day>, <Year>` phrase in flattened page text.
pub fn derive_debut_year(page_text: &str, label: &str) -> Option<i32> {
    let pattern = format!(r"{}:\s*[A-Za-z]+\s+\d{{1,2}},\s+(\d{{4}})", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(page_text)?.get(1)?.as_str().parse().ok()
}
