//! Error types for torrent-rss
//!
//! This module provides the error handling for the library:
//! - A top-level [`Error`] covering configuration, feed corruption, persistence and
//!   unsupported client operations
//! - [`FeedError`] describing why a persisted feed document could not be decoded
//! - Machine-readable error codes for hosts that surface errors to users

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for torrent-rss operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for torrent-rss
///
/// Each variant includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_items")
        key: Option<String>,
    },

    /// The persisted feed document is malformed and cannot be used
    ///
    /// No mutation is attempted on a corrupt feed. An operator has to repair or
    /// delete the file.
    #[error("feed file {} is corrupt or malformed: {source}", path.display())]
    CorruptFeed {
        /// Path of the corrupt feed file
        path: PathBuf,
        /// Why decoding failed
        #[source]
        source: FeedError,
    },

    /// Writing the feed file failed; the previous on-disk state is untouched
    #[error("failed to persist feed file {}: {source}", path.display())]
    Persistence {
        /// Path of the feed file that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not supported by this client type
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Magnet link is missing or carries an unusable BitTorrent info-hash
    #[error("invalid magnet link: {0}")]
    InvalidMagnet(String),

    /// Torrent file could not be read
    #[error("invalid torrent file: {0}")]
    InvalidTorrent(String),

    /// Watch folder scan failed
    #[error("watch folder error: {0}")]
    WatchFolder(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a settings key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error means the feed document is unusable
    pub fn is_corrupt_feed(&self) -> bool {
        matches!(self, Error::CorruptFeed { .. })
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::CorruptFeed { .. } => "corrupt_feed",
            Error::Persistence { .. } => "persistence_error",
            Error::Io(_) => "io_error",
            Error::NotSupported(_) => "not_supported",
            Error::InvalidMagnet(_) => "invalid_magnet",
            Error::InvalidTorrent(_) => "invalid_torrent",
            Error::WatchFolder(_) => "watch_folder_error",
        }
    }
}

/// Reasons a feed document fails to decode
#[derive(Debug, Error)]
pub enum FeedError {
    /// The document is not well-formed RSS
    #[error("malformed document: {0}")]
    Malformed(String),

    /// An item lacks an element every record needs
    #[error("item {index} is missing <{field}>")]
    MissingField {
        /// Zero-based item position in the channel
        index: usize,
        /// Name of the missing element
        field: &'static str,
    },

    /// An item's publication date does not parse
    #[error("item {index} has an invalid pubDate {value:?}")]
    InvalidDate {
        /// Zero-based item position in the channel
        index: usize,
        /// The offending text
        value: String,
    },

    /// Two items share the same content hash
    #[error("item {index} repeats content hash {hash}")]
    DuplicateHash {
        /// Zero-based item position of the repeat
        index: usize,
        /// The repeated hash
        hash: String,
    },

    /// Serializing the document failed
    #[error("failed to serialize feed: {0}")]
    Serialize(String),
}
