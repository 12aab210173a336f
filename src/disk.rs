//! Filesystem access behind a trait
//!
//! Everything the client does on disk goes through [`DiskProvider`], so hosts can
//! substitute their own provider and tests can observe every write. [`LocalDisk`]
//! is the tokio-backed implementation used by default.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Filesystem operations used by the feed store and the client facade
#[async_trait]
pub trait DiskProvider: Send + Sync {
    /// Whether a regular file exists at `path`
    async fn file_exists(&self, path: &Path) -> bool;

    /// Whether a directory exists at `path`
    async fn folder_exists(&self, path: &Path) -> bool;

    /// Read the whole file
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the file contents so readers see either the old or the new bytes, never a mix
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Delete a single file
    async fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Delete a directory and everything below it
    async fn delete_folder(&self, path: &Path) -> io::Result<()>;

    /// Immediate subdirectories of `path`
    async fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Files in `path`, descending into subdirectories when `recursive` is set
    async fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>>;

    /// Size of a file in bytes
    async fn file_size(&self, path: &Path) -> io::Result<u64>;
}

/// [`DiskProvider`] backed by the local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalDisk;

impl LocalDisk {
    /// Sibling path the new contents are staged in before the rename
    fn staging_path(path: &Path) -> io::Result<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            )
        })?;
        let mut staged = std::ffi::OsString::from(".");
        staged.push(file_name);
        staged.push(".tmp");
        Ok(path.with_file_name(staged))
    }
}

#[async_trait]
impl DiskProvider for LocalDisk {
    async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn folder_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let staged = Self::staging_path(path)?;

        let write = async {
            let mut file = tokio::fs::File::create(&staged).await?;
            file.write_all(contents).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&staged, path).await
        };

        if let Err(e) = write.await {
            // Leave the target alone and clean up the partial staging file
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e);
        }

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn delete_folder(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn list_dirs(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        let mut entries = tokio::fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_file() {
                    files.push(entry.path());
                } else if recursive && file_type.is_dir() {
                    pending.push(entry.path());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }
}
