//! Page fetching with the response cache in front of the network.

use crate::scraper::cache::ResponseCache;
use crate::scraper::client::PoliteClient;
use crate::scraper::error::ScraperError;
use tracing::{debug, error, warn};

/// Source of page bodies.
///
/// Returns `None` when the page could not be retrieved; implementations log the
/// reason. Callers treat `None` as "skip this page", never as a crash.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Option<String>;
}

/// [Fetch] over HTTP, with an optional on-disk cache.
#[derive(Debug)]
pub struct PageFetcher {
    client: PoliteClient,
    cache: Option<ResponseCache>,
}

impl PageFetcher {
    pub fn new(client: PoliteClient, cache: Option<ResponseCache>) -> Self {
        Self { client, cache }
    }

    fn fetch_network(&mut self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).map_err(|e| ScraperError::Network {
            url: url.to_string(),
            source: e,
        })?;
        read_body(response, url)
    }
}

/// Check the status and decode the body as UTF-8 regardless of the declared charset.
fn read_body(response: reqwest::blocking::Response, url: &str) -> Result<String, ScraperError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let bytes = response.bytes().map_err(|e| ScraperError::BodyRead {
        url: url.to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl Fetch for PageFetcher {
    fn fetch(&mut self, url: &str) -> Option<String> {
        if let Some(cache) = &self.cache {
            match cache.get(url) {
                Ok(Some(body)) => {
                    debug!(url, "cache hit");
                    return Some(body);
                }
                Ok(None) => {}
                Err(e) => warn!(url, error = %e, "cache read failed; fetching from network"),
            }
        }
        let body = match self.fetch_network(url) {
            Ok(body) => body,
            Err(e) => {
                error!(url, error = %e, "fetch failed");
                return None;
            }
        };
        debug!(url, bytes = body.len(), "fetched");
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &body) {
                warn!(url, error = %e, "could not store response in cache");
            }
        }
        Some(body)
    }
}
