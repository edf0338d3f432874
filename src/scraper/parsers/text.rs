//! Text helpers shared by the extractors.

use scraper::{ElementRef, Html};

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element, text nodes joined by spaces and normalized.
pub fn element_text(element: &ElementRef) -> String {
    normalize_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// The whole document flattened to a single line of text.
pub fn page_text(document: &Html) -> String {
    element_text(&document.root_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  Born:\n\t March 5,   1990  "), "Born: March 5, 1990");
        assert_eq!(normalize_ws(""), "");
        assert_eq!(normalize_ws(" \n "), "");
    }

    #[test]
    fn test_page_text_joins_nodes() {
        let doc = Html::parse_document("<p><b>NBA Debut:</b><a>October 29, 2003</a></p>");
        assert_eq!(page_text(&doc), "NBA Debut: October 29, 2003");
    }
}
