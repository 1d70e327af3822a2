//! Note types and identifiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a note.
///
/// Generated as `note-<epoch-ms>-<base36 random>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a new note ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the ID can be used as a file name without escaping
    /// its directory.
    ///
    /// Only alphanumerics, dashes and underscores are accepted.
    #[must_use]
    pub fn is_safe_filename(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 255
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Position of a note inside a spatial view, as `[row, col]`.
pub type CellCoordinates = [u32; 2];

/// A knowledge note anchored to one or more repository paths.
///
/// Serialized with camelCase keys; this is the on-disk format of
/// `notes/<YYYY>/<MM>/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier.
    pub id: NoteId,
    /// The note text.
    pub content: String,
    /// Root-relative anchor paths, never empty.
    pub anchors: Vec<String>,
    /// Tags for categorization.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Open key/value metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Creation timestamp (Unix epoch milliseconds).
    pub timestamp: u64,
    /// Whether a human has reviewed the note.
    #[serde(default)]
    pub reviewed: bool,
    /// Identifier of the associated spatial view.
    pub view_id: String,
    /// Optional cell inside the view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_coordinates: Option<CellCoordinates>,
}

impl Note {
    /// Returns `true` if the note carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// How a note was matched against a query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// An anchor equals, contains, or is contained by the query path.
    Anchor,
    /// No anchor matched; the note is included because the query lies inside
    /// the same repository.
    Ambient,
}

/// A note returned for a path query, with its relevance distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNote {
    /// The matched note.
    pub note: Note,
    /// 0 for anchor matches, otherwise the query depth below the root.
    pub distance: usize,
    /// How the note matched.
    pub kind: MatchKind,
}
