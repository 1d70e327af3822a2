//! Enumeration of files eligible for coverage.

use crate::storage::DATA_DIR_NAME;
use crate::{Error, Result};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::ffi::OsStr;
use std::path::{Component, Path};

/// Per-repository ignore file, using `.gitignore` syntax.
pub const CUSTOM_IGNORE_FILE: &str = ".anchorageignore";

/// Kind of an enumerated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// A file or directory that counts toward coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleEntry {
    /// `/`-separated path relative to the root.
    pub relative_path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Lowercase extension, if any.
    pub extension: Option<String>,
}

/// What to enumerate.
#[derive(Debug, Clone, Default)]
pub struct EnumerationOptions {
    /// Also report directories.
    pub include_directories: bool,
    /// Additional `.gitignore`-style patterns to exclude.
    pub extra_ignore_patterns: Vec<String>,
}

/// Lists the paths under a root that are not ignored.
pub trait FileEnumerator: Send + Sync {
    /// Enumerates eligible entries below `root`, excluding the root itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be applied.
    fn enumerate(&self, root: &Path, options: &EnumerationOptions) -> Result<Vec<EligibleEntry>>;
}

/// [`FileEnumerator`] honouring `.gitignore`, `.ignore` and
/// [`CUSTOM_IGNORE_FILE`]. The `.git` and data directories are always
/// skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreWalkEnumerator;

impl IgnoreWalkEnumerator {
    /// Creates the enumerator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileEnumerator for IgnoreWalkEnumerator {
    fn enumerate(&self, root: &Path, options: &EnumerationOptions) -> Result<Vec<EligibleEntry>> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .parents(false)
            .add_custom_ignore_filename(CUSTOM_IGNORE_FILE);

        if !options.extra_ignore_patterns.is_empty() {
            let mut overrides = OverrideBuilder::new(root);
            for pattern in &options.extra_ignore_patterns {
                overrides
                    .add(&format!("!{pattern}"))
                    .map_err(|e| Error::InvalidInput(format!("ignore pattern {pattern:?}: {e}")))?;
            }
            let overrides = overrides
                .build()
                .map_err(|e| Error::failed("build_ignore_overrides", e))?;
            builder.overrides(overrides);
        }

        builder.filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name();
            !(is_dir && (name == OsStr::new(".git") || name == OsStr::new(DATA_DIR_NAME)))
        });

        let mut entries = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry during coverage walk");
                    continue;
                },
            };
            if entry.depth() == 0 {
                continue;
            }

            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let kind = if file_type.is_dir() {
                if !options.include_directories {
                    continue;
                }
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            let Some(relative_path) = relative_slash_path(root, entry.path()) else {
                continue;
            };
            let size = match kind {
                EntryKind::File => entry.metadata().map(|m| m.len()).unwrap_or(0),
                EntryKind::Directory => 0,
            };
            let extension = match kind {
                EntryKind::File => entry
                    .path()
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase()),
                EntryKind::Directory => None,
            };

            entries.push(EligibleEntry {
                relative_path,
                kind,
                size,
                extension,
            });
        }

        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(entries)
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn paths(entries: &[EligibleEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.relative_path.as_str()).collect()
    }

    #[test]
    fn test_respects_ignore_files_and_skips_store() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/main.rs", "fn main() {}");
        touch(root, "target/debug/out", "bin");
        touch(root, "notes.tmp", "scratch");
        touch(root, ".gitignore", "target/\n");
        touch(root, CUSTOM_IGNORE_FILE, "*.tmp\n");
        touch(root, ".git/HEAD", "ref: refs/heads/main");
        touch(root, ".anchorage/config.json", "{}");

        let options = EnumerationOptions::default();
        let entries = IgnoreWalkEnumerator::new().enumerate(root, &options).unwrap();

        assert_eq!(paths(&entries), vec![".anchorageignore", ".gitignore", "src/main.rs"]);
        let main = &entries[2];
        assert_eq!(main.kind, EntryKind::File);
        assert_eq!(main.size, 12);
        assert_eq!(main.extension.as_deref(), Some("rs"));
    }

    #[test]
    fn test_directories_and_extra_patterns() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/lib.rs", "");
        touch(root, "vendor/dep.rs", "");

        let options = EnumerationOptions {
            include_directories: true,
            extra_ignore_patterns: vec!["vendor/".to_string()],
        };
        let entries = IgnoreWalkEnumerator::new().enumerate(root, &options).unwrap();

        assert_eq!(paths(&entries), vec!["src", "src/lib.rs"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
    }
}
