//! Page acquisition and HTML extraction for basketball-reference.com and
//! en.wikipedia.org.

pub mod browser;
pub mod cache;
pub mod pacing;
pub mod parsers;
pub mod source;

pub use cache::{CachedSource, PageCache};
pub use pacing::Pacer;
pub use source::{build_source, FetchStrategy, PageSource};

/// Base URL of the stats site
pub const STATS_BASE_URL: &str = "https://www.basketball-reference.com";

/// Base URL of the encyclopedia
pub const WIKI_BASE_URL: &str = "https://en.wikipedia.org";
