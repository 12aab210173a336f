//! The persisted release feed
//!
//! The feed file is both the client's durable state and the document external
//! torrent clients subscribe to. Responsibilities are split three ways:
//!
//! - [`codec`] converts between bytes on disk and a [`Feed`]
//! - [`store`] owns the file: locking, loading and atomic replacement
//! - [`crate::queue`] decides what a submission does to the feed

pub mod codec;
pub mod store;

pub use codec::{Decoded, decode, encode, feed_text, format_pub_date};
pub use store::{FeedChange, FeedStore};

use crate::config::FeedMetadata;
use crate::types::ReleaseRecord;
use std::collections::VecDeque;

/// Ordered, hash-unique collection of announced releases, oldest first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feed {
    metadata: FeedMetadata,
    records: VecDeque<ReleaseRecord>,
}

impl Feed {
    /// A feed with headers but no records
    pub fn empty(metadata: FeedMetadata) -> Self {
        Self {
            metadata,
            records: VecDeque::new(),
        }
    }

    /// Channel headers
    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    /// Records in insertion order
    pub fn records(&self) -> impl ExactSizeIterator<Item = &ReleaseRecord> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the feed holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record carries `hash` (case-insensitive)
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.records.iter().any(|r| r.has_hash(hash))
    }

    /// Append a record as the newest entry
    ///
    /// Callers must check [`Feed::contains_hash`] first; the queue engine is the
    /// only mutation path and does so inside the store lock.
    pub fn push_newest(&mut self, record: ReleaseRecord) {
        self.records.push_back(record);
    }

    /// Remove and return the oldest record
    pub fn pop_oldest(&mut self) -> Option<ReleaseRecord> {
        self.records.pop_front()
    }

    /// Drop every record, keeping the headers
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    /// Record with a deterministic hash derived from `n`
    pub fn record(n: u32, title: &str) -> ReleaseRecord {
        let hash = format!("{n:040X}");
        ReleaseRecord {
            title: title.to_string(),
            magnet_uri: format!("magnet:?xt=urn:btih:{hash}"),
            content_hash: hash,
            published_at: FixedOffset::east_opt(2 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 9, 4, 10, 15, n % 60)
                .unwrap(),
            description: None,
        }
    }
}
