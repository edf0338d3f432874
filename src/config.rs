//! Configuration for the harvest pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scraper::{FetchStrategy, STATS_BASE_URL, WIKI_BASE_URL};

const DESKTOP_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_user_agent() -> String {
    DESKTOP_UA.to_string()
}

/// Plain HTTP fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

fn default_http_timeout() -> u64 {
    30
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Browser rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_browser_timeout")]
    pub timeout_ms: u64,
    /// Chrome executable; platform default when unset
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_settle_min")]
    pub settle_min_ms: u64,
    #[serde(default = "default_settle_max")]
    pub settle_max_ms: u64,
}

fn default_headless() -> bool {
    true
}

fn default_browser_timeout() -> u64 {
    60_000
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_settle_min() -> u64 {
    1200
}

fn default_settle_max() -> u64 {
    2100
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout_ms: default_browser_timeout(),
            chrome_path: None,
            user_agent: default_user_agent(),
            locale: default_locale(),
            settle_min_ms: default_settle_min(),
            settle_max_ms: default_settle_max(),
        }
    }
}

/// Bounds of the randomized pause after each unit, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl PacingConfig {
    fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }
}

/// Stage 1: players index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub index_url: String,
    #[serde(default = "default_index_output")]
    pub output: PathBuf,
    #[serde(default = "default_browser_strategy")]
    pub strategy: FetchStrategy,
    #[serde(default = "default_index_pacing")]
    pub pacing: PacingConfig,
}

fn default_index_url() -> String {
    format!("{}/players/", STATS_BASE_URL)
}

fn default_index_output() -> PathBuf {
    PathBuf::from("data/raw/players_index.csv")
}

fn default_browser_strategy() -> FetchStrategy {
    FetchStrategy::Browser
}

fn default_index_pacing() -> PacingConfig {
    PacingConfig::new(0.8, 1.4)
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            output: default_index_output(),
            strategy: default_browser_strategy(),
            pacing: default_index_pacing(),
        }
    }
}

/// Stage 2: player bios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiosConfig {
    #[serde(default = "default_index_output")]
    pub input: PathBuf,
    #[serde(default = "default_bios_output")]
    pub output: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_bios_batch")]
    pub batch_size: usize,
    #[serde(default = "default_browser_strategy")]
    pub strategy: FetchStrategy,
    #[serde(default = "default_bios_pacing")]
    pub pacing: PacingConfig,
    #[serde(default = "default_born_label")]
    pub born_label: String,
    #[serde(default = "default_debut_label")]
    pub debut_label: String,
}

fn default_bios_output() -> PathBuf {
    PathBuf::from("data/raw/players_bios.csv")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/raw/cache/player_pages")
}

fn default_bios_batch() -> usize {
    50
}

fn default_bios_pacing() -> PacingConfig {
    PacingConfig::new(0.8, 1.6)
}

fn default_born_label() -> String {
    "Born:".to_string()
}

fn default_debut_label() -> String {
    "NBA Debut".to_string()
}

impl Default for BiosConfig {
    fn default() -> Self {
        Self {
            input: default_index_output(),
            output: default_bios_output(),
            cache_dir: default_cache_dir(),
            batch_size: default_bios_batch(),
            strategy: default_browser_strategy(),
            pacing: default_bios_pacing(),
            born_label: default_born_label(),
            debut_label: default_debut_label(),
        }
    }
}

/// Stage 3: all-star rosters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllStarsConfig {
    #[serde(default = "default_all_star_url")]
    pub index_url: String,
    #[serde(default = "default_all_star_output")]
    pub output: PathBuf,
    #[serde(default = "default_min_year")]
    pub min_year: u16,
    #[serde(default = "default_max_year")]
    pub max_year: u16,
    #[serde(default = "default_all_star_batch")]
    pub batch_size: usize,
    #[serde(default = "default_http_strategy")]
    pub strategy: FetchStrategy,
    #[serde(default = "default_all_star_pacing")]
    pub pacing: PacingConfig,
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

fn default_all_star_url() -> String {
    format!("{}/wiki/NBA_All-Star_Game", WIKI_BASE_URL)
}

fn default_all_star_output() -> PathBuf {
    PathBuf::from("data/raw/all_star_selections.csv")
}

fn default_min_year() -> u16 {
    1990
}

// Completed seasons only
fn default_max_year() -> u16 {
    2024
}

fn default_all_star_batch() -> usize {
    10
}

fn default_http_strategy() -> FetchStrategy {
    FetchStrategy::Http
}

fn default_all_star_pacing() -> PacingConfig {
    PacingConfig::new(0.3, 0.8)
}

fn default_source_tag() -> String {
    "en.wikipedia".to_string()
}

impl Default for AllStarsConfig {
    fn default() -> Self {
        Self {
            index_url: default_all_star_url(),
            output: default_all_star_output(),
            min_year: default_min_year(),
            max_year: default_max_year(),
            batch_size: default_all_star_batch(),
            strategy: default_http_strategy(),
            pacing: default_all_star_pacing(),
            source_tag: default_source_tag(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub bios: BiosConfig,
    #[serde(default)]
    pub all_stars: AllStarsConfig,
}

impl AppConfig {
    /// Load configuration from defaults, `harvest.toml` (or `path`) and
    /// `HARVEST__`-prefixed environment variables, in that order.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("harvest").required(false),
        };

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // HARVEST__BIOS__BATCH_SIZE=20, HARVEST__BROWSER__HEADLESS=false, ...
            .add_source(
                config::Environment::with_prefix("HARVEST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.browser.headless);
        assert_eq!(config.browser.timeout_ms, 60_000);
        assert_eq!(config.bios.batch_size, 50);
        assert_eq!(config.bios.strategy, FetchStrategy::Browser);
        assert_eq!(config.all_stars.strategy, FetchStrategy::Http);
        assert_eq!((config.all_stars.min_year, config.all_stars.max_year), (1990, 2024));
        assert_eq!(config.bios.input, config.index.output);
        assert_eq!(
            config.index.index_url,
            "https://www.basketball-reference.com/players/"
        );
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.toml");
        std::fs::write(
            &path,
            r#"
[browser]
headless = false

[bios]
batch_size = 5
pacing = { min_secs = 0.1, max_secs = 0.2 }

[all_stars]
min_year = 2000
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.bios.batch_size, 5);
        assert_eq!(config.bios.pacing.max_secs, 0.2);
        assert_eq!(config.all_stars.min_year, 2000);
        assert_eq!(config.all_stars.max_year, 2024);
        assert_eq!(config.bios.output, PathBuf::from("data/raw/players_bios.csv"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/harvest.toml"))).is_err());
    }
}
