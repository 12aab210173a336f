//! Configuration types for torrent-rss

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Channel headers written into every feed document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMetadata {
    /// Channel title (default: "Torrent RSS Feed")
    #[serde(default = "default_feed_title")]
    pub title: String,

    /// Channel link
    #[serde(default = "default_feed_link")]
    pub link: String,

    /// Channel description
    #[serde(default = "default_feed_title")]
    pub description: String,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            title: default_feed_title(),
            link: default_feed_link(),
            description: default_feed_title(),
        }
    }
}

/// Settings for one RSS pseudo download client
///
/// A client announces releases by appending them to a single feed file inside
/// `feed_dir`. Completion is tracked by scanning `watch_folder` when one is set;
/// otherwise the feed itself is listed back as the item list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedClientConfig {
    /// Client instance name, used to namespace item ids (default: "torrent-rss")
    #[serde(default = "default_name")]
    pub name: String,

    /// Directory the feed file is written into
    pub feed_dir: PathBuf,

    /// Feed file name inside `feed_dir` (default: "torrents.rss")
    #[serde(default = "default_feed_file_name")]
    pub feed_file_name: String,

    /// Directory scanned for finished downloads (None = list the feed itself)
    #[serde(default)]
    pub watch_folder: Option<PathBuf>,

    /// Maximum number of items kept in the feed (default: 200)
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Forbid the host from moving or removing output data (default: true)
    #[serde(default = "default_true")]
    pub read_only: bool,

    /// Minimum age of a watch folder entry before it is reported (default: 30 seconds)
    #[serde(default = "default_scan_grace_period", with = "duration_serde")]
    pub scan_grace_period: Duration,

    /// Category reported on item views (default: "torrent-rss")
    #[serde(default = "default_name")]
    pub category: String,

    /// Channel headers
    #[serde(default)]
    pub metadata: FeedMetadata,
}

impl FeedClientConfig {
    /// Create a config with defaults for everything but the feed directory
    pub fn new(feed_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: default_name(),
            feed_dir: feed_dir.into(),
            feed_file_name: default_feed_file_name(),
            watch_folder: None,
            max_items: default_max_items(),
            read_only: true,
            scan_grace_period: default_scan_grace_period(),
            category: default_name(),
            metadata: FeedMetadata::default(),
        }
    }

    /// Full path of the feed file
    pub fn feed_path(&self) -> PathBuf {
        self.feed_dir.join(&self.feed_file_name)
    }
}

fn default_name() -> String {
    "torrent-rss".to_string()
}

fn default_feed_file_name() -> String {
    "torrents.rss".to_string()
}

fn default_feed_title() -> String {
    "Torrent RSS Feed".to_string()
}

fn default_feed_link() -> String {
    "http://localhost/".to_string()
}

fn default_max_items() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_scan_grace_period() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
