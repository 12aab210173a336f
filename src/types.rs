//! Core types for torrent-rss

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a release's torrent is handed to the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TorrentPayload {
    /// Magnet URI carrying a BitTorrent info-hash
    Magnet {
        /// Magnet URI as published by the indexer
        uri: String,
    },
    /// Raw `.torrent` metainfo bytes
    TorrentFile {
        /// File name reported by the indexer
        file_name: String,
        /// Bencoded metainfo payload
        content: Vec<u8>,
    },
}

impl TorrentPayload {
    /// Convenience constructor for magnet-based payloads
    #[must_use]
    pub fn magnet(uri: impl Into<String>) -> Self {
        Self::Magnet { uri: uri.into() }
    }

    /// Convenience constructor for torrent-file payloads
    #[must_use]
    pub fn torrent_file(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::TorrentFile {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// A release the host wants announced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release title
    pub title: String,

    /// Optional description (typically the episode overview)
    #[serde(default)]
    pub description: Option<String>,

    /// Torrent reference
    pub payload: TorrentPayload,
}

/// One announced release as persisted in the feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Release title
    pub title: String,

    /// Identity key; compared case-insensitively
    pub content_hash: String,

    /// Payload URI handed to feed consumers
    pub magnet_uri: String,

    /// Time the record was appended, at whole-second precision
    pub published_at: DateTime<FixedOffset>,

    /// Optional description
    pub description: Option<String>,
}

impl ReleaseRecord {
    /// Whether this record carries the given content hash
    pub fn has_hash(&self, hash: &str) -> bool {
        self.content_hash.eq_ignore_ascii_case(hash)
    }
}

/// Result of submitting a release to the queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// A new record was appended and persisted
    Accepted,
    /// A record with the same content hash already exists; nothing was written
    Duplicate,
    /// The feed file is corrupt; nothing was written
    FeedUnusable,
}

/// Lifecycle state reported for an item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Announced, nothing observed yet
    Queued,
    /// Output present but still changing
    Downloading,
    /// Output present and stable
    Completed,
    /// Output present but unusable
    Warning,
    /// Paused by the consumer
    Paused,
}

/// One entry returned by a watch folder scan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchFolderItem {
    /// Scanner-assigned id, stable across scans
    pub download_id: String,
    /// Display title
    pub title: String,
    /// Total size in bytes
    pub total_size: u64,
    /// Estimated time until the output is stable
    pub remaining_time: Option<Duration>,
    /// File or folder holding the output
    pub output_path: PathBuf,
    /// Observed status
    pub status: ItemStatus,
}

/// Item view handed to the host orchestrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    /// Id namespaced by the client instance name
    pub download_id: String,
    /// Category
    pub category: String,
    /// Display title
    pub title: String,
    /// Total size in bytes (0 when unknown)
    pub total_size: u64,
    /// Estimated remaining time
    pub remaining_time: Option<Duration>,
    /// Output location, when one has been observed
    pub output_path: Option<PathBuf>,
    /// Lifecycle state
    pub status: ItemStatus,
    /// Whether the host may move the output files
    pub can_move_files: bool,
    /// Whether the host may remove the item and its data
    pub can_be_removed: bool,
}

/// Client status reported to the host orchestrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatus {
    /// Always true: the client lives on the local filesystem
    pub is_localhost: bool,
    /// Folders the host should expect output in
    pub output_root_folders: Vec<PathBuf>,
}
