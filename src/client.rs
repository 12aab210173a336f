//! RSS pseudo download client
//!
//! [`TorrentRssClient`] looks like any other download client to the host:
//! releases are submitted, items are listed and removed, status and settings
//! are checked. Underneath, a submission only appends the release to the feed
//! file; an external torrent client subscribed to that feed does the fetching
//! and drops its output in the watch folder.

use crate::config::FeedClientConfig;
use crate::disk::{DiskProvider, LocalDisk};
use crate::error::{Error, Result};
use crate::feed::{Feed, FeedChange, FeedStore};
use crate::hash::{InfoHashReader, TorrentHashReader, magnet_from_hash, parse_magnet_hash};
use crate::queue::ReleaseQueue;
use crate::reconciler::{FeedItemSource, ItemSource, WatchFolderScanner, WatchFolderSource};
use crate::types::{ClientStatus, ItemView, Release, SubmissionOutcome, TorrentPayload};
use crate::validation::{ValidationFailure, validate};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// External services the client delegates to
#[derive(Clone)]
pub struct Collaborators {
    /// Filesystem access
    pub disk: Arc<dyn DiskProvider>,
    /// Info-hash computation for torrent files
    pub hash_reader: Arc<dyn TorrentHashReader>,
    /// Watch folder scanner; required when a watch folder is configured
    pub scanner: Option<Arc<dyn WatchFolderScanner>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            disk: Arc::new(LocalDisk),
            hash_reader: Arc::new(InfoHashReader),
            scanner: None,
        }
    }
}

/// Download client that announces releases through an RSS feed file
pub struct TorrentRssClient {
    config: FeedClientConfig,
    disk: Arc<dyn DiskProvider>,
    hash_reader: Arc<dyn TorrentHashReader>,
    store: Arc<FeedStore>,
    queue: ReleaseQueue,
    items: Box<dyn ItemSource>,
}

impl TorrentRssClient {
    /// Create a client using the local filesystem and no watch folder scanner
    ///
    /// # Errors
    /// Returns [`Error::Config`] for invalid settings, or when a watch folder is
    /// configured (it needs a scanner, see [`TorrentRssClient::with_collaborators`])
    pub fn new(config: FeedClientConfig) -> Result<Self> {
        Self::with_collaborators(config, Collaborators::default())
    }

    /// Create a client with explicit collaborators
    ///
    /// # Errors
    /// Returns [`Error::Config`] for invalid settings or a watch folder without a scanner
    pub fn with_collaborators(config: FeedClientConfig, collaborators: Collaborators) -> Result<Self> {
        if let Some(failure) = validate(&config).into_iter().next() {
            return Err(Error::config(&failure.property, failure.message));
        }

        let store = Arc::new(FeedStore::new(
            config.feed_path(),
            config.metadata.clone(),
            Arc::clone(&collaborators.disk),
        ));
        let queue = ReleaseQueue::new(Arc::clone(&store), config.max_items)?;

        let items: Box<dyn ItemSource> = match (&config.watch_folder, collaborators.scanner) {
            (Some(watch_folder), Some(scanner)) => Box::new(WatchFolderSource::new(
                scanner,
                watch_folder.clone(),
                config.scan_grace_period,
                config.name.clone(),
                config.category.clone(),
                config.read_only,
            )),
            (Some(_), None) => {
                return Err(Error::config(
                    "watch_folder",
                    "a watch folder requires a watch folder scanner",
                ));
            }
            (None, _) => Box::new(FeedItemSource::new(
                Arc::clone(&store),
                config.feed_dir.clone(),
                config.name.clone(),
                config.category.clone(),
            )),
        };

        debug!(
            "Created RSS client {} writing {}",
            config.name,
            store.path().display()
        );

        Ok(Self {
            config,
            disk: collaborators.disk,
            hash_reader: collaborators.hash_reader,
            store,
            queue,
            items,
        })
    }

    /// Client settings
    pub fn config(&self) -> &FeedClientConfig {
        &self.config
    }

    /// Submit a release to the host-facing contract
    ///
    /// Always yields `None`: the release is announced, not fetched, so there is
    /// no download handle to track. Duplicates and a corrupt feed are logged and
    /// are not errors.
    ///
    /// # Errors
    /// Returns an error when the release carries no usable info-hash or the feed
    /// cannot be written
    pub async fn submit(&self, release: &Release) -> Result<Option<String>> {
        self.announce(release).await?;
        Ok(None)
    }

    /// Append a release to the feed and report what happened
    ///
    /// Magnet releases are announced with their own link; torrent files are
    /// announced with a magnet link synthesized from their info-hash.
    pub async fn announce(&self, release: &Release) -> Result<SubmissionOutcome> {
        let (content_hash, payload_uri) = match &release.payload {
            TorrentPayload::Magnet { uri } => (parse_magnet_hash(uri)?, uri.clone()),
            TorrentPayload::TorrentFile { file_name, content } => {
                let hash = self.hash_reader.hash_from_torrent_file(content).await?;
                debug!("Read info-hash {} from {}", hash, file_name);
                let magnet = magnet_from_hash(&hash, &release.title);
                (hash, magnet)
            }
        };

        let outcome = self
            .queue
            .submit(release, &content_hash, &payload_uri)
            .await?;

        match outcome {
            SubmissionOutcome::Accepted => {
                info!("Announced {} in {}", release.title, self.store.path().display())
            }
            SubmissionOutcome::Duplicate => {
                debug!("{} was already announced", release.title)
            }
            SubmissionOutcome::FeedUnusable => {
                warn!(
                    "{} was not announced: feed file needs repair",
                    release.title
                )
            }
        }

        Ok(outcome)
    }

    /// Current items, from the watch folder or the feed
    pub async fn list_items(&self) -> Result<Vec<ItemView>> {
        self.items.list_items().await
    }

    /// Remove an item by deleting its output
    ///
    /// An item whose output is not on disk is treated as already removed.
    ///
    /// # Errors
    /// Always returns [`Error::NotSupported`] when `delete_data` is false: an
    /// announcement cannot be withdrawn without deleting what it produced.
    pub async fn remove_item(&self, item: &ItemView, delete_data: bool) -> Result<()> {
        if !delete_data {
            return Err(Error::NotSupported(
                "RSS cannot remove an item without deleting its data".to_string(),
            ));
        }

        let Some(path) = &item.output_path else {
            debug!("Item {} has no output to delete", item.download_id);
            return Ok(());
        };

        if self.disk.file_exists(path).await {
            self.disk.delete_file(path).await?;
            info!("Deleted {}", path.display());
        } else if self.disk.folder_exists(path).await {
            self.disk.delete_folder(path).await?;
            info!("Deleted folder {}", path.display());
        } else {
            warn!(
                "Output of {} not found at {}, nothing to delete",
                item.download_id,
                path.display()
            );
        }

        Ok(())
    }

    /// Where output appears
    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            is_localhost: true,
            output_root_folders: vec![self.items.output_root().to_path_buf()],
        }
    }

    /// Check settings and prove the feed file can be written
    ///
    /// The current feed is rewritten as-is (an empty feed when none exists yet),
    /// so announced releases survive the test.
    pub async fn self_test(&self) -> Vec<ValidationFailure> {
        let mut failures = validate(&self.config);

        if let Some(watch_folder) = &self.config.watch_folder
            && !self.disk.folder_exists(watch_folder).await
        {
            failures.push(
                ValidationFailure::new("watch_folder", "Watch folder does not exist")
                    .with_detail(format!("Create {} or fix the path", watch_folder.display())),
            );
        }

        match self.store.with_lock(|_| FeedChange::Commit(())).await {
            Ok(()) => {}
            Err(e @ Error::CorruptFeed { .. }) => {
                warn!("Self-test found a corrupt feed: {}", e);
                failures.push(
                    ValidationFailure::new("feed_dir", "RSS file is corrupt").with_detail(format!(
                        "{}. Repair or delete the file so a fresh feed can be written.",
                        e
                    )),
                );
            }
            Err(e) => {
                warn!("Self-test could not write the feed: {}", e);
                failures.push(
                    ValidationFailure::new("feed_dir", "Cannot write to RSS file").with_detail(
                        format!(
                            "The folder you specified does not exist or is inaccessible. \
                             Please verify the folder permissions for the user account '{}'.",
                            current_user()
                        ),
                    ),
                );
            }
        }

        failures
    }

    /// Drop every announced release, leaving an empty feed
    pub async fn reset_feed(&self) -> Result<()> {
        let dropped = self
            .store
            .with_lock(|feed| {
                let dropped = feed.len();
                feed.clear();
                FeedChange::Commit(dropped)
            })
            .await?;
        info!("Reset feed {}, dropped {} items", self.store.path().display(), dropped);
        Ok(())
    }

    /// Current feed contents
    pub async fn feed_snapshot(&self) -> Result<Feed> {
        self.store.read_snapshot().await
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
