//! Test doubles for the client's collaborators

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use torrent_rss::{DiskProvider, LocalDisk, Result, WatchFolderItem, WatchFolderScanner};

/// Local disk that counts writes and deletions per path
#[derive(Default)]
pub struct CountingDisk {
    inner: LocalDisk,
    writes: Mutex<HashMap<PathBuf, usize>>,
    deleted_files: Mutex<Vec<PathBuf>>,
    deleted_folders: Mutex<Vec<PathBuf>>,
}

impl CountingDisk {
    /// Number of writes to `path` so far
    pub fn writes_to(&self, path: &Path) -> usize {
        self.writes.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Files deleted so far
    pub fn deleted_files(&self) -> Vec<PathBuf> {
        self.deleted_files.lock().unwrap().clone()
    }

    /// Folders deleted so far
    pub fn deleted_folders(&self) -> Vec<PathBuf> {
        self.deleted_folders.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiskProvider for CountingDisk {
    async fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path).await
    }

    async fn folder_exists(&self, path: &Path) -> bool {
        self.inner.folder_exists(path).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        *self
            .writes
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.inner.write_atomic(path, contents).await
    }

    async fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.deleted_files.lock().unwrap().push(path.to_path_buf());
        self.inner.delete_file(path).await
    }

    async fn delete_folder(&self, path: &Path) -> io::Result<()> {
        self.deleted_folders.lock().unwrap().push(path.to_path_buf());
        self.inner.delete_folder(path).await
    }

    async fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_dirs(path).await
    }

    async fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        self.inner.list_files(path, recursive).await
    }

    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        self.inner.file_size(path).await
    }
}

/// Scanner that reports each subdirectory of the watch folder as one item
///
/// Entries with a `.part` file inside are still downloading; everything else
/// is complete. The grace period is recorded but not applied.
#[derive(Default)]
pub struct DirectoryScanner {
    grace_periods: Mutex<Vec<Duration>>,
}

impl DirectoryScanner {
    /// Grace periods passed to every scan so far
    pub fn grace_periods(&self) -> Vec<Duration> {
        self.grace_periods.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatchFolderScanner for DirectoryScanner {
    async fn scan(&self, directory: &Path, grace_period: Duration) -> Result<Vec<WatchFolderItem>> {
        self.grace_periods.lock().unwrap().push(grace_period);

        let mut items = Vec::new();
        for (index, dir) in LocalDisk.list_dirs(directory).await?.into_iter().enumerate() {
            let files = LocalDisk.list_files(&dir, true).await?;
            let mut total_size = 0;
            for file in &files {
                total_size += LocalDisk.file_size(file).await?;
            }
            let downloading = files
                .iter()
                .any(|f| f.extension().is_some_and(|ext| ext == "part"));
            let title = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            items.push(WatchFolderItem {
                download_id: format!("{title}_{index}"),
                title,
                total_size,
                remaining_time: downloading.then_some(Duration::from_secs(60)),
                output_path: dir,
                status: if downloading {
                    torrent_rss::ItemStatus::Downloading
                } else {
                    torrent_rss::ItemStatus::Completed
                },
            });
        }
        Ok(items)
    }
}
