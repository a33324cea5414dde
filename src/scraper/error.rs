//! Shared error type for fetching and parsing the PEP index and PEP pages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a crawl, plus the per-request errors the fetcher logs and
/// turns into a skipped row.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Failed to create HTTP client: {source}")]
    ClientBuild { source: reqwest::Error },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    /// The index page could not be fetched; there is nothing to crawl.
    #[error("Could not fetch the PEP index at {url}")]
    IndexUnavailable { url: String },

    // Page structure
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Expected <{selector}> not found in {context} (page layout may have changed)")]
    MissingTag { selector: String, context: String },

    #[error("No status tables found on the PEP index at {url} (page layout may have changed)")]
    NoStatusTables { url: String },

    // Response cache
    #[error("Response cache error at {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
