//! Fetching and parsing: HTTP client, response cache, and the PEP index and PEP page parsers.

mod cache;
mod client;
mod error;
mod fetch;

pub mod detail;
pub mod index;

pub use cache::ResponseCache;
pub use client::{PoliteClient, PoliteClientBuilder};
pub(crate) use client::{DEFAULT_DELAY_MS, DEFAULT_TIMEOUT_SECS};
pub use error::ScraperError;
pub use fetch::{Fetch, PageFetcher};

use scraper::{ElementRef, Selector};

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// First element under `scope` matching `selector`.
///
/// A miss is a [ScraperError::MissingTag]: callers use this only for tags the page
/// layout guarantees, so absence means the layout changed.
pub(crate) fn find_tag<'a>(
    scope: ElementRef<'a>,
    selector: &str,
    context: &str,
) -> Result<ElementRef<'a>, ScraperError> {
    let sel = parse_selector(selector)?;
    scope
        .select(&sel)
        .next()
        .ok_or_else(|| ScraperError::MissingTag {
            selector: selector.to_string(),
            context: context.to_string(),
        })
}

/// Next sibling that is an element, skipping text and comment nodes.
pub(crate) fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}
