//! Crawl the PEP index, check each PEP's index marker against its page, and count statuses.
//!
//! Rows are processed one at a time. Per row:
//! fetch the PEP page (failure skips the row), read its declared status (none
//! found skips the row), then count it only if the index code accepts it.
//! Structural errors on either page abort the crawl.

use crate::model::IndexRow;
use crate::scraper::index::index_rows;
use crate::scraper::{detail, Fetch, ScraperError};
use crate::tally::{StatusCounts, StatusTally};
use reqwest::Url;
use scraper::Html;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// What happened to one index row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Status matched the index code and was counted.
    Counted(String),
    /// The PEP page could not be fetched.
    FetchFailed,
    /// The PEP page declares no status.
    StatusNotFound,
    /// The declared status is not accepted for the index code (or the code is unknown).
    Mismatch(String),
}

/// Options for a crawl: progress callback and cancellation flag.
#[derive(Default)]
pub struct CrawlOptions<'a> {
    /// Called after each row with (rows processed so far, rows on the index).
    pub progress: Option<&'a dyn Fn(u32, u32)>,
    /// Checked before each row; when set the crawl stops and reports what it has.
    pub cancel: Option<&'a AtomicBool>,
}

/// Result of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub counts: StatusCounts,
    pub rows: u32,
    pub mismatches: u32,
    pub skipped: u32,
    /// True when the crawl stopped early; `counts` covers the rows seen before that.
    pub cancelled: bool,
}

/// Reconcile one row, counting its status in `tally` when it matches.
pub fn reconcile_row<F: Fetch + ?Sized>(
    fetcher: &mut F,
    row: &IndexRow,
    tally: &mut StatusTally,
) -> Result<RowOutcome, ScraperError> {
    let url = row.url.as_str();
    if !row.code.is_known() {
        info!(url, code = %row.code, "unexpected status code on index page");
    }
    let Some(html) = fetcher.fetch(url) else {
        return Ok(RowOutcome::FetchFailed);
    };
    let Some(status) = detail::parse_status(&html, url)? else {
        debug!(url, "no status declared on PEP page");
        return Ok(RowOutcome::StatusNotFound);
    };

    if !row.code.accepts(&status) {
        info!(
            url,
            found = %status,
            expected = ?row.code.accepted(),
            "status mismatch between index and PEP page"
        );
        return Ok(RowOutcome::Mismatch(status));
    }

    tally.increment(&status);
    Ok(RowOutcome::Counted(status))
}

/// Crawl the index at `index_url` and every PEP page it links to.
///
/// A failed index fetch, a missing status table, or a malformed row or PEP page
/// is an error. PEP pages that fail to fetch, or disagree with the index, are
/// logged and left out of the counts.
pub fn crawl<F: Fetch + ?Sized>(
    fetcher: &mut F,
    index_url: &str,
    options: &CrawlOptions<'_>,
) -> Result<CrawlReport, ScraperError> {
    let base = Url::parse(index_url).map_err(|e| ScraperError::InvalidUrl {
        input: index_url.to_string(),
        reason: e.to_string(),
    })?;
    let html = fetcher
        .fetch(base.as_str())
        .ok_or_else(|| ScraperError::IndexUnavailable {
            url: base.to_string(),
        })?;
    let doc = Html::parse_document(&html);

    let mut tally = StatusTally::new();
    let mut rows = 0u32;
    let mut mismatches = 0u32;
    let mut skipped = 0u32;
    let mut cancelled = false;

    let index = index_rows(&doc, &base)?;
    let total = index.size_hint().0 as u32;
    for row in index {
        if options
            .cancel
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(false)
        {
            info!(rows, "crawl cancelled");
            cancelled = true;
            break;
        }
        let row = row?;
        match reconcile_row(fetcher, &row, &mut tally)? {
            RowOutcome::Counted(_) => {}
            RowOutcome::Mismatch(_) => mismatches += 1,
            RowOutcome::FetchFailed | RowOutcome::StatusNotFound => skipped += 1,
        }
        rows += 1;
        if let Some(p) = options.progress {
            p(rows, total);
        }
    }

    let counts = tally.finish();
    info!(
        rows,
        counted = counts.total(),
        mismatches,
        skipped,
        "crawl finished"
    );
    Ok(CrawlReport {
        counts,
        rows,
        mismatches,
        skipped,
        cancelled,
    })
}
