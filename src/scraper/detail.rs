//! PEP page: read the declared status from the header field list.

use crate::scraper::error::ScraperError;
use crate::scraper::{element_text, find_tag, next_element_sibling, parse_selector};
use scraper::Html;

const STATUS_TERM: &str = "Status:";

/// Status declared on a PEP page.
///
/// Looks in the page's first `<dl>` for the first `<dt>` reading `Status:` and
/// returns the text of the element right after it. `Ok(None)` when the list has
/// no such term; a page without any `<dl>` is a layout error.
pub fn parse_status(html: &str, url: &str) -> Result<Option<String>, ScraperError> {
    let doc = Html::parse_document(html);
    let dl = find_tag(doc.root_element(), "dl", &format!("PEP page {}", url))?;
    let dt_sel = parse_selector("dt")?;
    let Some(term) = dl
        .select(&dt_sel)
        .find(|dt| element_text(*dt).trim() == STATUS_TERM)
    else {
        return Ok(None);
    };
    Ok(next_element_sibling(term).map(|dd| element_text(dd).trim().to_string()))
}
