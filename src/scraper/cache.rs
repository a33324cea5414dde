//! On-disk response cache: one file per URL, named by the SHA-256 of the URL.
//!
//! Only successful bodies are stored. Writes go through a temp file and a rename,
//! so a reader never sees a half-written entry and repeated writes for a URL are
//! harmless.

use crate::scraper::error::ScraperError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const ENTRY_EXT: &str = "html";

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ScraperError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ScraperError::Cache {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// `<user cache dir>/pepcheck/http`, if the platform has a cache dir.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("pepcheck").join("http"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXT))
    }

    /// Cached body for `url`, or `None` on a miss.
    pub fn get(&self, url: &str) -> Result<Option<String>, ScraperError> {
        let path = self.entry_path(url);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScraperError::Cache { path, source: e }),
        }
    }

    pub fn put(&self, url: &str, body: &str) -> Result<(), ScraperError> {
        let path = self.entry_path(url);
        let tmp = path.with_extension(format!("{}.tmp", ENTRY_EXT));
        fs::write(&tmp, body.as_bytes())
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| ScraperError::Cache { path, source: e })
    }

    /// Remove every cached entry. Returns how many entries were removed.
    pub fn clear(&self) -> Result<usize, ScraperError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ScraperError::Cache {
            path: self.dir.clone(),
            source: e,
        })?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| ScraperError::Cache {
                    path: self.dir.clone(),
                    source: e,
                })?
                .path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| ScraperError::Cache {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
