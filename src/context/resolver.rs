//! Path resolution relative to a repository root.

use crate::{Error, Result};
use git2::Repository;
use std::path::{Component, Path, PathBuf};

/// The root-relative form of the repository root itself.
pub const ROOT_ANCHOR: &str = ".";

/// Finds the canonical work-tree root of the git repository containing `path`.
///
/// Uses `git2::Repository::discover()`, so any path inside the work tree
/// (including nested directories) is accepted.
///
/// # Errors
///
/// Returns [`Error::RepositoryNotFound`] if no repository contains the path or
/// the repository is bare.
pub fn find_repo_root(path: impl AsRef<Path>) -> Result<PathBuf> {
    let start = path.as_ref();
    let not_found = || Error::RepositoryNotFound {
        path: start.display().to_string(),
    };

    let repo = Repository::discover(start).map_err(|_| not_found())?;
    let workdir = repo.workdir().ok_or_else(not_found)?;

    workdir
        .canonicalize()
        .map_err(|e| Error::failed("canonicalize_repo_root", e))
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the filesystem root.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {},
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            },
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Returns `true` when two root-relative paths are equal or one is an
/// ancestor of the other.
///
/// The comparison is component-wise: `src/a` relates to `src/a/b.rs` but not
/// to `src/ab.rs`. The root anchor relates to everything.
#[must_use]
pub fn relate(a: &str, b: &str) -> bool {
    a == ROOT_ANCHOR || b == ROOT_ANCHOR || a == b || is_nested(a, b) || is_nested(b, a)
}

fn is_nested(child: &str, parent: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes().get(parent.len()) == Some(&b'/')
}

/// Number of path segments between the root and a root-relative path.
#[must_use]
pub fn depth(relative: &str) -> usize {
    if relative == ROOT_ANCHOR || relative.is_empty() {
        0
    } else {
        relative.split('/').count()
    }
}

/// Converts user-supplied paths into root-relative anchors.
///
/// Input forms:
/// - absolute paths are relativized against the root
/// - `./x`, `../x`, `.` and `..` are resolved against the caller's working
///   directory (the root when none is given)
/// - anything else is taken as already root-relative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for an already-canonical repository root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a resolver by discovering the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RepositoryNotFound`] when `path` is not inside a work tree.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        find_repo_root(path).map(Self::new)
    }

    /// Returns the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `input` to a lexically-normalized absolute path.
    ///
    /// The result may lie outside the repository.
    #[must_use]
    pub fn to_absolute(&self, input: &str, cwd: Option<&Path>) -> PathBuf {
        let cleaned = input.trim().replace('\\', "/");
        let path = Path::new(&cleaned);

        if path.is_absolute() {
            return normalize_lexically(path);
        }

        if is_working_dir_relative(&cleaned) {
            let base = cwd.map_or_else(|| self.root.clone(), |dir| self.root.join(dir));
            return normalize_lexically(&base.join(path));
        }

        normalize_lexically(&self.root.join(path))
    }

    /// Converts `input` into a `/`-separated path relative to the root.
    ///
    /// The root itself is returned as [`ROOT_ANCHOR`]. Normalizing an
    /// already-normalized anchor returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathEscapesRepository`] if the resolved path is not the
    /// root or a descendant of it.
    pub fn to_repo_relative(&self, input: &str, cwd: Option<&Path>) -> Result<String> {
        let absolute = self.to_absolute(input, cwd);
        if let Some(relative) = self.relative_to_root(&absolute) {
            return Ok(relative);
        }

        // Absolute inputs may reach the root through a symlink.
        if Path::new(input.trim()).is_absolute() {
            if let Some(relative) = absolute
                .canonicalize()
                .ok()
                .and_then(|canonical| self.relative_to_root(&canonical))
            {
                return Ok(relative);
            }
        }

        Err(Error::PathEscapesRepository {
            path: input.to_string(),
        })
    }

    /// Joins a root-relative anchor onto the root.
    #[must_use]
    pub fn absolute_anchor(&self, anchor: &str) -> PathBuf {
        if anchor == ROOT_ANCHOR {
            self.root.clone()
        } else {
            self.root.join(anchor)
        }
    }

    fn relative_to_root(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let joined = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        if joined.is_empty() {
            Some(ROOT_ANCHOR.to_string())
        } else {
            Some(joined)
        }
    }
}

fn is_working_dir_relative(input: &str) -> bool {
    input == "." || input == ".." || input.starts_with("./") || input.starts_with("../")
}
