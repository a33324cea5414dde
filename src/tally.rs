//! Per-status counters for one crawl, and the frozen result handed to output.

use crate::model::known_statuses;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Key under which the grand total is reported.
pub const TOTAL_KEY: &str = "Total";

/// Mutable accumulator. Seeded with every known status at zero.
#[derive(Debug, Clone)]
pub struct StatusTally {
    counts: Vec<(&'static str, u32)>,
}

impl Default for StatusTally {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTally {
    pub fn new() -> Self {
        Self {
            counts: known_statuses().into_iter().map(|s| (s, 0)).collect(),
        }
    }

    /// Count one PEP under `status`. Returns false (and counts nothing) if
    /// `status` is not one of the seeded statuses.
    pub fn increment(&mut self, status: &str) -> bool {
        match self.counts.iter_mut().find(|(s, _)| *s == status) {
            Some((_, n)) => {
                *n += 1;
                true
            }
            None => {
                debug!(status, "ignoring count for status outside the status table");
                false
            }
        }
    }

    pub fn get(&self, status: &str) -> Option<u32> {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
    }

    /// Compute the total and freeze the counts.
    pub fn finish(self) -> StatusCounts {
        let total = self.counts.iter().map(|(_, n)| *n).sum();
        StatusCounts {
            counts: self.counts,
            total,
        }
    }
}

/// Final counts: every known status in table order, then `Total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts {
    counts: Vec<(&'static str, u32)>,
    total: u32,
}

impl StatusCounts {
    /// Count for a status, or the total for [TOTAL_KEY].
    pub fn get(&self, key: &str) -> Option<u32> {
        if key == TOTAL_KEY {
            return Some(self.total);
        }
        self.counts.iter().find(|(s, _)| *s == key).map(|(_, n)| *n)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// All entries in output order, `Total` last.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.counts
            .iter()
            .copied()
            .chain(std::iter::once((TOTAL_KEY, self.total)))
    }
}

impl Serialize for StatusCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 1))?;
        for (status, count) in self.iter() {
            map.serialize_entry(status, &count)?;
        }
        map.end()
    }
}
