//! Bounded, deduplicating release queue
//!
//! A submission runs as one feed-store transaction:
//! 1. A record with the same content hash already present: report
//!    [`SubmissionOutcome::Duplicate`] and write nothing
//! 2. Evict oldest records until there is room for one more
//! 3. Append the new record as the newest entry and persist

use crate::error::{Error, Result};
use crate::feed::{FeedChange, FeedStore, feed_text};
use crate::types::{Release, ReleaseRecord, SubmissionOutcome};
use chrono::{Local, Timelike};
use std::sync::Arc;
use tracing::{debug, error};

/// Release queue backed by a [`FeedStore`]
#[derive(Debug)]
pub struct ReleaseQueue {
    store: Arc<FeedStore>,
    capacity: usize,
}

impl ReleaseQueue {
    /// Create a queue holding at most `capacity` records
    ///
    /// # Errors
    /// Returns [`Error::Config`] when `capacity` is zero
    pub fn new(store: Arc<FeedStore>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config(
                "max_items",
                "maximum number of feed items must be greater than zero",
            ));
        }
        Ok(Self { store, capacity })
    }

    /// Announce a release
    ///
    /// A corrupt feed file is logged and reported as
    /// [`SubmissionOutcome::FeedUnusable`] rather than an error; nothing is
    /// written until an operator repairs or removes the file.
    ///
    /// # Errors
    /// Returns [`Error::Persistence`] when the updated feed cannot be written
    pub async fn submit(
        &self,
        release: &Release,
        content_hash: &str,
        payload_uri: &str,
    ) -> Result<SubmissionOutcome> {
        let capacity = self.capacity;
        let result = self
            .store
            .with_lock(|feed| {
                if feed.contains_hash(content_hash) {
                    debug!(
                        "Release {} ({}) already in feed, skipping",
                        release.title, content_hash
                    );
                    return FeedChange::Discard(SubmissionOutcome::Duplicate);
                }

                while feed.len() >= capacity {
                    if let Some(evicted) = feed.pop_oldest() {
                        debug!(
                            "Feed at capacity ({}), evicted oldest item {}",
                            capacity, evicted.title
                        );
                    }
                }

                feed.push_newest(new_record(release, content_hash, payload_uri));
                FeedChange::Commit(SubmissionOutcome::Accepted)
            })
            .await;

        match result {
            Ok(outcome) => {
                if outcome == SubmissionOutcome::Accepted {
                    debug!(
                        "Added {} to feed {}",
                        release.title,
                        self.store.path().display()
                    );
                }
                Ok(outcome)
            }
            Err(e) if e.is_corrupt_feed() => {
                error!("Not announcing {}: {}", release.title, e);
                Ok(SubmissionOutcome::FeedUnusable)
            }
            Err(e) => Err(e),
        }
    }
}

fn new_record(release: &Release, content_hash: &str, payload_uri: &str) -> ReleaseRecord {
    let now = Local::now().fixed_offset();
    // Every field holds what decodes back: normalized text, whole-second pubDate
    ReleaseRecord {
        title: feed_text(&release.title),
        content_hash: content_hash.to_string(),
        magnet_uri: feed_text(payload_uri),
        published_at: now.with_nanosecond(0).unwrap_or(now),
        description: release
            .description
            .as_deref()
            .map(feed_text)
            .filter(|d| !d.is_empty()),
    }
}
