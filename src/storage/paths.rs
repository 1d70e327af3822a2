//! Centralized path management for store locations.

use chrono::{Datelike, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Name of the repo-local data directory.
pub const DATA_DIR_NAME: &str = ".anchorage";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Builds every on-disk location used by a repository's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    data_dir: PathBuf,
}

impl StorePaths {
    /// Creates paths for the store of the repository at `root`.
    #[must_use]
    pub fn for_repo(root: impl AsRef<Path>) -> Self {
        Self {
            data_dir: root.as_ref().join(DATA_DIR_NAME),
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `{data_dir}/config.json`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    /// `{data_dir}/notes`
    #[must_use]
    pub fn notes_dir(&self) -> PathBuf {
        self.data_dir.join("notes")
    }

    /// `{data_dir}/notes/<YYYY>/<MM>/<id>.json`, sharded by the UTC date of
    /// `timestamp_ms`.
    #[must_use]
    pub fn note_path(&self, id: &str, timestamp_ms: u64) -> PathBuf {
        let millis = i64::try_from(timestamp_ms).unwrap_or(i64::MAX);
        let (year, month) = Utc
            .timestamp_millis_opt(millis)
            .single()
            .map_or((1970, 1), |dt| (dt.year(), dt.month()));

        self.notes_dir()
            .join(format!("{year:04}"))
            .join(format!("{month:02}"))
            .join(format!("{id}.json"))
    }

    /// `{data_dir}/tags`
    #[must_use]
    pub fn tags_dir(&self) -> PathBuf {
        self.data_dir.join("tags")
    }

    /// `{data_dir}/tags/<tag>.md`
    #[must_use]
    pub fn tag_path(&self, tag: &str) -> PathBuf {
        self.tags_dir().join(format!("{tag}.md"))
    }

    /// `{data_dir}/views`
    #[must_use]
    pub fn views_dir(&self) -> PathBuf {
        self.data_dir.join("views")
    }

    /// `{data_dir}/views/<id>.json`
    #[must_use]
    pub fn view_path(&self, view_id: &str) -> PathBuf {
        self.views_dir().join(format!("{view_id}.json"))
    }
}
