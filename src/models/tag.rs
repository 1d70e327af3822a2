//! Tag ledger types.

use serde::Serialize;

/// A described tag, stored as `tags/<tag>.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDescription {
    /// Tag name.
    pub tag: String,
    /// Free-text description.
    pub description: String,
}

/// A tag together with how often notes use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
    /// Tag name.
    pub tag: String,
    /// Number of notes carrying the tag.
    pub note_count: usize,
    /// Description, if one is recorded.
    pub description: Option<String>,
}

/// Result of deleting a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDeleteOutcome {
    /// Whether a description file was removed.
    pub description_removed: bool,
    /// Notes rewritten without the tag.
    pub notes_updated: usize,
}

/// Result of renaming a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRenameOutcome {
    /// Notes rewritten with the new tag.
    pub notes_updated: usize,
    /// Whether the old description now lives under the new tag.
    pub description_moved: bool,
}
