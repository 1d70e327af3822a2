//! Filesystem port used by every store.
//!
//! Stores never call `std::fs` directly; they go through a [`StoragePort`] so
//! the backing filesystem can be swapped.

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem operations needed by the stores.
pub trait StoragePort: Send + Sync {
    /// Reads a UTF-8 file. Returns `None` if it does not exist.
    fn read_to_string(&self, path: &Path) -> Result<Option<String>>;

    /// Reads a file as raw bytes. Returns `None` if it does not exist.
    fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Returns the size of a file, or `None` if it cannot be inspected.
    fn file_size(&self, path: &Path) -> Option<u64>;

    /// Replaces `path` with `contents` so readers see either the old or the
    /// new file, never a partial one. Parent directories are created.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Removes a file. Returns `false` if it did not exist.
    fn remove_file(&self, path: &Path) -> Result<bool>;

    /// Recursively lists files under `dir` with the given extension, sorted.
    ///
    /// A missing directory yields an empty list.
    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>>;

    /// Returns `true` if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// [`StoragePort`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Creates the local filesystem port.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn temp_sibling(path: &Path) -> Result<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::failed("write_atomic", "target has no parent directory"))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("entry");
        Ok(parent.join(format!(
            ".{name}.tmp-{}-{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        )))
    }
}

impl StoragePort for LocalStorage {
    fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::failed("read_file", format!("{}: {e}", path.display()))),
        }
    }

    fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::failed("read_file", format!("{}: {e}", path.display()))),
        }
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        fs::metadata(path).ok().map(|m| m.len())
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::failed("create_store_dir", format!("{}: {e}", parent.display()))
            })?;
        }

        let tmp = Self::temp_sibling(path)?;
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Error::failed("write_temp_file", format!("{}: {e}", tmp.display())));
        }

        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::failed(
                "rename_temp_file",
                format!("{} -> {}: {e}", tmp.display(), path.display()),
            )
        })
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::failed("remove_file", format!("{}: {e}", path.display()))),
        }
    }

    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, dir = %dir.display(), "Skipping unreadable store entry");
                    continue;
                },
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden || path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
