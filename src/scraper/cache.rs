//! On-disk page cache keyed by URL slug.
//!
//! Entries never expire. A cached URL is never fetched again until its file
//! is deleted by hand.

use std::path::PathBuf;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::source::PageSource;
use crate::error::FetchError;

fn profile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/players/[a-z]/([a-z0-9]+)\.html$").expect("static regex"))
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W+").expect("static regex"))
}

/// Byte budget for the readable part of a fallback slug
const FALLBACK_PREFIX_BYTES: usize = 150;

/// Hex chars of the URL digest appended to a fallback slug
const FALLBACK_HASH_CHARS: usize = 16;

/// Derive the cache key for a URL.
///
/// Profile pages (`/players/j/jamesle01.html`) map to their short id
/// (`jamesle01`). Any other URL maps to its first bytes with runs of
/// non-word characters replaced by `_`, followed by a digest of the full
/// URL. The result always fits in a file name.
pub fn stable_slug(url: &str) -> String {
    if let Some(caps) = profile_re().captures(url) {
        return caps[1].to_string();
    }

    let sanitized = non_word_re().replace_all(url, "_");
    let mut end = sanitized.len().min(FALLBACK_PREFIX_BYTES);
    while !sanitized.is_char_boundary(end) {
        end -= 1;
    }
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("{}_{}", &sanitized[..end], &digest[..FALLBACK_HASH_CHARS])
}

/// Directory of raw HTML files, one per slug.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File that holds (or would hold) the HTML for `url`
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.html", stable_slug(url)))
    }

    /// Cached HTML for `url`, if its file exists.
    pub fn get(&self, url: &str) -> Result<Option<String>, FetchError> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|source| FetchError::Cache {
            path: path.clone(),
            source,
        })?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Store HTML for `url`.
    ///
    /// Written to a temporary file and renamed, so a partial write never
    /// becomes a cache hit.
    pub fn put(&self, url: &str, html: &str) -> Result<PathBuf, FetchError> {
        let path = self.path_for(url);
        let tmp = path.with_extension("html.part");
        let io = |source| FetchError::Cache {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io)?;
        std::fs::write(&tmp, html).map_err(io)?;
        std::fs::rename(&tmp, &path).map_err(io)?;
        Ok(path)
    }
}

/// Cache-first wrapper around another page source.
pub struct CachedSource<S> {
    inner: S,
    cache: PageCache,
}

impl<S: PageSource> CachedSource<S> {
    pub fn new(inner: S, cache: PageCache) -> Self {
        Self { inner, cache }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Return the cached page, or fetch it and cache it before returning.
    ///
    /// A failed cache write is logged and the fetched page is still returned.
    pub async fn fetch_cached(&self, url: &str) -> Result<String, FetchError> {
        if let Some(html) = self.cache.get(url)? {
            debug!("Cache hit: {}", url);
            return Ok(html);
        }

        let html = self.inner.fetch(url).await?;
        match self.cache.put(url, &html) {
            Ok(path) => debug!("Cached {} -> {}", url, path.display()),
            Err(e) => warn!("Not cached: {}", e),
        }
        Ok(html)
    }
}

#[async_trait]
impl<S: PageSource> PageSource for CachedSource<S> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_cached(url).await
    }
}
