//! Locked, atomically persisted access to the feed file
//!
//! Every mutation runs as a transaction: take the per-file lock, load the
//! current feed, let the caller change it, write the result, release the lock.
//! The lock is shared by every [`FeedStore`] in the process that points at the
//! same path, so two client instances configured with one feed file cannot
//! clobber each other.

use crate::config::FeedMetadata;
use crate::disk::DiskProvider;
use crate::error::{Error, Result};
use crate::feed::{Decoded, Feed, codec};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex as StdMutex, PoisonError, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What a transaction wants done with the feed it was handed
#[derive(Debug, PartialEq, Eq)]
pub enum FeedChange<T> {
    /// Persist the modified feed, then return the value
    Commit(T),
    /// Write nothing, then return the value; any modification is dropped
    Discard(T),
}

type LockRegistry = StdMutex<HashMap<PathBuf, Weak<Mutex<()>>>>;

static FEED_LOCKS: LazyLock<LockRegistry> = LazyLock::new(|| StdMutex::new(HashMap::new()));

/// Lock shared by all stores on `path` for as long as any of them is alive
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    // The registry is only touched for map bookkeeping, so a poisoned guard is still consistent
    let mut locks = FEED_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.retain(|_, lock| lock.strong_count() > 0);

    if let Some(lock) = locks.get(path).and_then(Weak::upgrade) {
        return lock;
    }

    let lock = Arc::new(Mutex::new(()));
    locks.insert(path.to_path_buf(), Arc::downgrade(&lock));
    lock
}

/// Owner of one feed file
pub struct FeedStore {
    path: PathBuf,
    metadata: FeedMetadata,
    disk: Arc<dyn DiskProvider>,
    lock: Arc<Mutex<()>>,
}

impl FeedStore {
    /// Open the store for `path`
    ///
    /// Nothing is read or written until the first transaction. `metadata` only
    /// seeds the headers of a feed created from scratch.
    pub fn new(path: impl Into<PathBuf>, metadata: FeedMetadata, disk: Arc<dyn DiskProvider>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self {
            path,
            metadata,
            disk,
            lock,
        }
    }

    /// Path of the feed file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `change` against the current feed under the exclusive lock
    ///
    /// With [`FeedChange::Commit`] the new feed is written before the lock is
    /// released. A failed write returns [`Error::Persistence`] and leaves the
    /// previous file in place.
    ///
    /// # Errors
    /// [`Error::CorruptFeed`] when the existing file cannot be decoded; `change`
    /// is not called in that case.
    pub async fn with_lock<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Feed) -> FeedChange<T>,
    {
        let _guard = self.lock.lock().await;
        let mut feed = self.load().await?;

        match change(&mut feed) {
            FeedChange::Commit(value) => {
                self.persist(&feed).await?;
                Ok(value)
            }
            FeedChange::Discard(value) => Ok(value),
        }
    }

    /// Current feed, read under the same lock writers take
    pub async fn read_snapshot(&self) -> Result<Feed> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn load(&self) -> Result<Feed> {
        if !self.disk.file_exists(&self.path).await {
            debug!("Feed file {} absent, starting empty", self.path.display());
            return Ok(Feed::empty(self.metadata.clone()));
        }

        let bytes = self.disk.read(&self.path).await?;
        match codec::decode(&bytes) {
            Ok(Decoded::Feed(feed)) => Ok(feed),
            Ok(Decoded::Empty) => Ok(Feed::empty(self.metadata.clone())),
            Err(source) => Err(Error::CorruptFeed {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn persist(&self, feed: &Feed) -> Result<()> {
        let persistence = |source: std::io::Error| Error::Persistence {
            path: self.path.clone(),
            source,
        };

        let bytes = codec::encode(feed).map_err(|e| persistence(std::io::Error::other(e)))?;
        let created = !self.disk.file_exists(&self.path).await;

        self.disk
            .write_atomic(&self.path, &bytes)
            .await
            .map_err(persistence)?;

        if created {
            info!("Created feed file {}", self.path.display());
        }
        debug!(
            "Persisted {} items to {}",
            feed.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl std::fmt::Debug for FeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStore")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::LocalDisk;
    use crate::feed::test_helpers::record;
    use tempfile::TempDir;

    fn store_in(dir: &Path) -> FeedStore {
        FeedStore::new(
            dir.join("torrents.rss"),
            FeedMetadata::default(),
            Arc::new(LocalDisk),
        )
    }

    #[tokio::test]
    async fn absent_file_reads_as_empty_feed() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(temp_dir.path());

        let feed = store.read_snapshot().await.unwrap();
        assert!(feed.is_empty());
        assert_eq!(feed.metadata(), &FeedMetadata::default());
        assert!(!store.path().exists(), "reading must not create the file");
    }

    #[tokio::test]
    async fn commit_persists_and_discard_does_not() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(temp_dir.path());

        store
            .with_lock(|feed| {
                feed.push_newest(record(1, "one"));
                FeedChange::Commit(())
            })
            .await
            .unwrap();
        assert!(store.path().exists());

        let returned = store
            .with_lock(|feed| {
                feed.push_newest(record(2, "two"));
                FeedChange::Discard(feed.len())
            })
            .await
            .unwrap();
        assert_eq!(returned, 2);

        let feed = store.read_snapshot().await.unwrap();
        let titles: Vec<_> = feed.records().map(|r| r.title.clone()).collect();
        assert_eq!(titles, ["one"]);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_and_left_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(temp_dir.path());
        std::fs::write(store.path(), "this is not a feed").unwrap();

        let mut called = false;
        let err = store
            .with_lock(|_| {
                called = true;
                FeedChange::Commit(())
            })
            .await
            .unwrap_err();

        assert!(err.is_corrupt_feed());
        assert!(!called);
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "this is not a feed"
        );
    }

    #[tokio::test]
    async fn write_failure_surfaces_as_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir.path().join("does-not-exist"));

        let err = store
            .with_lock(|feed| {
                feed.push_newest(record(1, "one"));
                FeedChange::Commit(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Persistence { .. }));
    }

    /// Local disk whose atomic writes always fail before touching the target
    struct ReadOnlyDisk;

    #[async_trait::async_trait]
    impl DiskProvider for ReadOnlyDisk {
        async fn file_exists(&self, path: &Path) -> bool {
            LocalDisk.file_exists(path).await
        }

        async fn folder_exists(&self, path: &Path) -> bool {
            LocalDisk.folder_exists(path).await
        }

        async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            LocalDisk.read(path).await
        }

        async fn write_atomic(&self, _: &Path, _: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            ))
        }

        async fn delete_file(&self, path: &Path) -> std::io::Result<()> {
            LocalDisk.delete_file(path).await
        }

        async fn delete_folder(&self, path: &Path) -> std::io::Result<()> {
            LocalDisk.delete_folder(path).await
        }

        async fn list_dirs(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
            LocalDisk.list_dirs(path).await
        }

        async fn list_files(&self, path: &Path, recursive: bool) -> std::io::Result<Vec<PathBuf>> {
            LocalDisk.list_files(path, recursive).await
        }

        async fn file_size(&self, path: &Path) -> std::io::Result<u64> {
            LocalDisk.file_size(path).await
        }
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_feed() {
        let temp_dir = TempDir::new().unwrap();
        let writable = store_in(temp_dir.path());
        writable
            .with_lock(|feed| {
                feed.push_newest(record(1, "one"));
                feed.push_newest(record(2, "two"));
                FeedChange::Commit(())
            })
            .await
            .unwrap();
        let before = std::fs::read(writable.path()).unwrap();

        let failing = FeedStore::new(
            writable.path().to_path_buf(),
            FeedMetadata::default(),
            Arc::new(ReadOnlyDisk),
        );
        let err = failing
            .with_lock(|feed| {
                feed.pop_oldest();
                feed.push_newest(record(3, "three"));
                FeedChange::Commit(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Persistence { ref path, .. } if path == writable.path()));
        assert_eq!(std::fs::read(writable.path()).unwrap(), before);

        let feed = failing.read_snapshot().await.unwrap();
        let titles: Vec<_> = feed.records().map(|r| r.title.clone()).collect();
        assert_eq!(titles, ["one", "two"]);
    }

    #[tokio::test]
    async fn stores_on_the_same_path_share_a_lock() {
        let temp_dir = TempDir::new().unwrap();
        let first = store_in(temp_dir.path());
        let second = store_in(temp_dir.path());
        let other = store_in(&temp_dir.path().join(".."));

        assert!(Arc::ptr_eq(&first.lock, &second.lock));
        assert!(!Arc::ptr_eq(&first.lock, &other.lock));
    }

    #[tokio::test]
    async fn concurrent_transactions_do_not_lose_updates() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(temp_dir.path()));

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .with_lock(|feed| {
                        feed.push_newest(record(n, &n.to_string()));
                        FeedChange::Commit(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.read_snapshot().await.unwrap().len(), 16);
    }
}
