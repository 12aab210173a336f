//! Item listing for the host orchestrator
//!
//! The feed only records what was announced; it never learns whether a consumer
//! fetched anything. Completion is therefore observed on disk:
//!
//! - [`WatchFolderSource`] delegates to a [`WatchFolderScanner`] over the
//!   configured watch folder and reports what it finds
//! - [`FeedItemSource`] is used when no watch folder is configured and lists
//!   the feed itself, with no completion detection
//!
//! Both implement [`ItemSource`]; the client picks one at construction.

use crate::error::Result;
use crate::feed::FeedStore;
use crate::types::{ItemStatus, ItemView, WatchFolderItem};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Scans a folder for finished downloads
///
/// Implemented by the host; entries younger than `grace_period` must be left
/// out so half-written output is never reported.
#[async_trait]
pub trait WatchFolderScanner: Send + Sync {
    /// Entries currently in `directory`
    async fn scan(&self, directory: &Path, grace_period: Duration) -> Result<Vec<WatchFolderItem>>;
}

/// Source of the item list reported to the host
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Current items
    async fn list_items(&self) -> Result<Vec<ItemView>>;

    /// Folder the host should expect output in
    fn output_root(&self) -> &Path;
}

/// Items observed in a watch folder
pub struct WatchFolderSource {
    scanner: Arc<dyn WatchFolderScanner>,
    watch_folder: PathBuf,
    grace_period: Duration,
    client_name: String,
    category: String,
    read_only: bool,
}

impl WatchFolderSource {
    /// Create a source scanning `watch_folder`
    pub fn new(
        scanner: Arc<dyn WatchFolderScanner>,
        watch_folder: impl Into<PathBuf>,
        grace_period: Duration,
        client_name: impl Into<String>,
        category: impl Into<String>,
        read_only: bool,
    ) -> Self {
        Self {
            scanner,
            watch_folder: watch_folder.into(),
            grace_period,
            client_name: client_name.into(),
            category: category.into(),
            read_only,
        }
    }

    fn to_view(&self, item: WatchFolderItem) -> ItemView {
        ItemView {
            download_id: format!("{}_{}", self.client_name, item.download_id),
            category: self.category.clone(),
            title: item.title,
            total_size: item.total_size,
            remaining_time: item.remaining_time,
            output_path: Some(item.output_path),
            status: item.status,
            can_move_files: !self.read_only,
            can_be_removed: !self.read_only,
        }
    }
}

#[async_trait]
impl ItemSource for WatchFolderSource {
    async fn list_items(&self) -> Result<Vec<ItemView>> {
        let scanned = self
            .scanner
            .scan(&self.watch_folder, self.grace_period)
            .await?;
        debug!(
            "Watch folder {} yielded {} items",
            self.watch_folder.display(),
            scanned.len()
        );
        Ok(scanned.into_iter().map(|item| self.to_view(item)).collect())
    }

    fn output_root(&self) -> &Path {
        &self.watch_folder
    }
}

/// Items read back from the feed document
pub struct FeedItemSource {
    store: Arc<FeedStore>,
    feed_dir: PathBuf,
    client_name: String,
    category: String,
}

impl FeedItemSource {
    /// Create a source listing the feed in `store`
    pub fn new(
        store: Arc<FeedStore>,
        feed_dir: impl Into<PathBuf>,
        client_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            store,
            feed_dir: feed_dir.into(),
            client_name: client_name.into(),
            category: category.into(),
        }
    }
}

#[async_trait]
impl ItemSource for FeedItemSource {
    async fn list_items(&self) -> Result<Vec<ItemView>> {
        let feed = match self.store.read_snapshot().await {
            Ok(feed) => feed,
            Err(e) if e.is_corrupt_feed() => {
                error!("Cannot list items: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(feed
            .records()
            .map(|record| ItemView {
                download_id: format!("{}_{}", self.client_name, record.title),
                category: self.category.clone(),
                title: record.title.clone(),
                total_size: 0,
                remaining_time: None,
                output_path: None,
                status: ItemStatus::Queued,
                can_move_files: false,
                can_be_removed: false,
            })
            .collect())
    }

    fn output_root(&self) -> &Path {
        &self.feed_dir
    }
}
