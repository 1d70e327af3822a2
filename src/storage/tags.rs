//! Tag description files.

use super::{StoragePort, StorePaths};
use crate::models::TagDescription;
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

/// Tag names double as file names, so they are restricted to a safe subset.
// Static pattern, guaranteed to compile.
#[allow(clippy::expect_used)]
static TAG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("static regex: tag name pattern")
});

/// Returns `true` if `tag` is a valid tag name.
#[must_use]
pub fn is_valid_tag_name(tag: &str) -> bool {
    TAG_NAME.is_match(tag)
}

/// Stores one Markdown file per described tag.
#[derive(Clone)]
pub struct TagDescriptionStore {
    port: Arc<dyn StoragePort>,
    paths: StorePaths,
}

impl TagDescriptionStore {
    /// Creates a tag description store.
    #[must_use]
    pub fn new(port: Arc<dyn StoragePort>, paths: StorePaths) -> Self {
        Self { port, paths }
    }

    /// Reads a tag description.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn get(&self, tag: &str) -> Result<Option<String>> {
        if !is_valid_tag_name(tag) {
            return Ok(None);
        }
        self.port.read_to_string(&self.paths.tag_path(tag))
    }

    /// Creates or replaces a tag description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid tag name, or an error if
    /// the write fails.
    pub fn save(&self, tag: &str, description: &str) -> Result<()> {
        ensure_valid(tag)?;
        self.port
            .write_atomic(&self.paths.tag_path(tag), description.as_bytes())
    }

    /// Removes a tag description. Returns `false` if none existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self, tag: &str) -> Result<bool> {
        if !is_valid_tag_name(tag) {
            return Ok(false);
        }
        self.port.remove_file(&self.paths.tag_path(tag))
    }

    /// Lists every described tag, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags directory cannot be listed.
    pub fn list(&self) -> Result<Vec<TagDescription>> {
        let mut tags = Vec::new();
        for path in self.port.list_files(&self.paths.tags_dir(), "md")? {
            let Some(tag) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_valid_tag_name(tag) {
                continue;
            }
            match self.port.read_to_string(&path) {
                Ok(Some(description)) => tags.push(TagDescription {
                    tag: tag.to_string(),
                    description,
                }),
                Ok(None) => {},
                Err(e) => tracing::warn!(tag, error = %e, "Skipping unreadable tag description"),
            }
        }
        tags.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(tags)
    }

    /// Returns the set of described tag names.
    ///
    /// # Errors
    ///
    /// See [`Self::list`].
    pub fn described_tags(&self) -> Result<BTreeSet<String>> {
        Ok(self.list()?.into_iter().map(|t| t.tag).collect())
    }
}

/// Rejects names that are not valid tags.
pub(crate) fn ensure_valid(tag: &str) -> Result<()> {
    if is_valid_tag_name(tag) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "tag names must start with a letter or digit and contain only letters, digits, '.', '_' or '-': {tag:?}"
        )))
    }
}
