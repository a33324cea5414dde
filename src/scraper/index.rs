//! PEP index page: one (status code, PEP page URL) per row of the status tables.

use crate::model::{IndexRow, StatusCode};
use crate::scraper::error::ScraperError;
use crate::scraper::{element_text, next_element_sibling, parse_selector};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Tables listing PEPs by status on the index page.
const STATUS_TABLE_SELECTOR: &str = "table.pep-zero-table";
/// Body rows only; header rows live in `thead`.
const ROW_SELECTOR: &str = "tbody > tr";
const CELL_SELECTOR: &str = "td";
const LINK_SELECTOR: &str = "a";

/// Single-pass iterator over the index rows of a parsed index page.
///
/// Yields an error (and the crawl should stop) when a row is missing its status
/// cell, its link cell, or the link itself.
pub struct IndexRows<'a> {
    rows: std::vec::IntoIter<ElementRef<'a>>,
    base: Url,
    cell_sel: Selector,
    link_sel: Selector,
}

/// Locate the status tables in `doc` and return an iterator over their rows.
///
/// `base` is the index page URL; links are resolved against it. A page with no
/// status tables is a layout change and returns [ScraperError::NoStatusTables].
pub fn index_rows<'a>(doc: &'a Html, base: &Url) -> Result<IndexRows<'a>, ScraperError> {
    let table_sel = parse_selector(STATUS_TABLE_SELECTOR)?;
    let row_sel = parse_selector(ROW_SELECTOR)?;
    let tables: Vec<ElementRef<'a>> = doc.select(&table_sel).collect();
    if tables.is_empty() {
        return Err(ScraperError::NoStatusTables {
            url: base.to_string(),
        });
    }
    let rows: Vec<ElementRef<'a>> = tables
        .iter()
        .flat_map(|table| table.select(&row_sel))
        .collect();
    Ok(IndexRows {
        rows: rows.into_iter(),
        base: base.clone(),
        cell_sel: parse_selector(CELL_SELECTOR)?,
        link_sel: parse_selector(LINK_SELECTOR)?,
    })
}

impl IndexRows<'_> {
    fn parse_row(&self, row: ElementRef<'_>) -> Result<IndexRow, ScraperError> {
        let row_context = || format!("index row {:?}", element_text(row).trim().to_string());
        let status_cell = row
            .select(&self.cell_sel)
            .next()
            .ok_or_else(|| ScraperError::MissingTag {
                selector: CELL_SELECTOR.to_string(),
                context: row_context(),
            })?;
        let code = StatusCode::from_cell_text(&element_text(status_cell));

        let link_cell =
            next_element_sibling(status_cell).ok_or_else(|| ScraperError::MissingTag {
                selector: CELL_SELECTOR.to_string(),
                context: format!("{} (link cell)", row_context()),
            })?;
        let link = link_cell
            .select(&self.link_sel)
            .next()
            .ok_or_else(|| ScraperError::MissingTag {
                selector: LINK_SELECTOR.to_string(),
                context: row_context(),
            })?;
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| ScraperError::MissingTag {
                selector: "a[href]".to_string(),
                context: format!("{} (first link has no href)", row_context()),
            })?;
        let url = self.base.join(href).map_err(|e| ScraperError::InvalidUrl {
            input: href.to_string(),
            reason: e.to_string(),
        })?;
        Ok(IndexRow { code, url })
    }
}

impl Iterator for IndexRows<'_> {
    type Item = Result<IndexRow, ScraperError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.parse_row(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
