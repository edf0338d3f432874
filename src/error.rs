//! Error types shared by the fetch, parse and storage layers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to obtain the HTML for a single URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("browser failed loading {url}: {message}")]
    Browser { url: String, message: String },

    #[error("cannot build HTTP client: {0}")]
    Client(String),

    #[error("page cache error at {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An index or listing page no longer has the layout the pipeline expects.
#[derive(Debug, Error)]
#[error("no {what} found on {page}; the site layout may have changed")]
pub struct StructureError {
    pub what: String,
    pub page: String,
}

impl StructureError {
    pub fn new(what: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            page: page.into(),
        }
    }
}

/// Errors surfaced by a pipeline stage as a whole.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("missing input file {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{} has no `{column}` column", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
