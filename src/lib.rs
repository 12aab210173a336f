//! # torrent-rss
//!
//! A download client that does not download. Releases handed to it are
//! appended to an RSS feed file; a real torrent client subscribes to that feed,
//! fetches the torrents and writes its output to a watch folder, which is
//! scanned to report progress back to the host.
//!
//! ## Guarantees
//!
//! - **Bounded** - the feed never holds more than `max_items` releases; the
//!   oldest is evicted to make room for a new one
//! - **Deduplicating** - a release whose info-hash is already in the feed is
//!   not added again, and the file is not rewritten
//! - **Ordered** - items appear in submission order, newest last
//! - **Crash-safe** - the feed file is replaced atomically; a failed write
//!   leaves the previous feed intact
//!
//! ## Quick Start
//!
//! ```no_run
//! use torrent_rss::{FeedClientConfig, Release, TorrentPayload, TorrentRssClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = FeedClientConfig::new("/srv/feeds");
//!     config.max_items = 50;
//!
//!     let client = TorrentRssClient::new(config)?;
//!
//!     for failure in client.self_test().await {
//!         eprintln!("{}: {}", failure.property, failure.message);
//!     }
//!
//!     client
//!         .submit(&Release {
//!             title: "Show.S01E01.720p".to_string(),
//!             description: Some("Pilot".to_string()),
//!             payload: TorrentPayload::magnet(
//!                 "magnet:?xt=urn:btih:755248817d32b00cc853e633ecdc48e4c21bff15",
//!             ),
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Pseudo download client facade
pub mod client;
/// Configuration types
pub mod config;
/// Filesystem access
pub mod disk;
/// Error types
pub mod error;
/// Feed document, codec and store
pub mod feed;
/// Content hashes and magnet links
pub mod hash;
/// Bounded, deduplicating release queue
pub mod queue;
/// Item listing from the watch folder or the feed
pub mod reconciler;
/// Core types
pub mod types;
/// Settings validation
pub mod validation;

// Re-export commonly used types
pub use client::{Collaborators, TorrentRssClient};
pub use config::{FeedClientConfig, FeedMetadata};
pub use disk::{DiskProvider, LocalDisk};
pub use error::{Error, FeedError, Result};
pub use feed::{Feed, FeedStore};
pub use hash::{InfoHashReader, TorrentHashReader};
pub use queue::ReleaseQueue;
pub use reconciler::{ItemSource, WatchFolderScanner};
pub use types::{
    ClientStatus, ItemStatus, ItemView, Release, ReleaseRecord, SubmissionOutcome,
    TorrentPayload, WatchFolderItem,
};
pub use validation::{ValidationFailure, validate};
