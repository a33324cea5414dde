//! pepcheck: crawls the PEP index, checks each PEP's index status marker against
//! the status declared on its PEP page, and counts PEPs per status.

pub mod cli;
pub mod config;
pub mod model;
pub mod reconcile;
pub mod scraper;
pub mod tally;

// Re-exports for CLI and consumers.
pub use model::{IndexRow, StatusCode};
pub use reconcile::{crawl, reconcile_row, CrawlOptions, CrawlReport, RowOutcome};
pub use self::scraper::{
    Fetch, PageFetcher, PoliteClient, PoliteClientBuilder, ResponseCache, ScraperError,
};
pub use tally::{StatusCounts, StatusTally, TOTAL_KEY};
