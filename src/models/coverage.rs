//! Coverage audit results.

use super::NoteId;
use serde::Serialize;
use std::collections::BTreeMap;

/// An anchor whose target no longer exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleAnchor {
    /// The note carrying the anchor.
    pub note_id: NoteId,
    /// The root-relative anchor path.
    pub anchor: String,
}

/// Coverage figures for one file extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtensionCoverage {
    /// Eligible files with this extension.
    pub total: usize,
    /// Files with at least one note.
    pub covered: usize,
    /// `covered / total * 100`, 0 when `total` is 0.
    pub percentage: f64,
}

/// A file referenced by at least one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveredFile {
    /// Root-relative path.
    pub path: String,
    /// Number of anchors that matched this file.
    pub hits: usize,
    /// Notes contributing those anchors.
    pub note_ids: Vec<NoteId>,
}

/// An eligible file that no note references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncoveredFile {
    /// Root-relative path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
}

/// Snapshot of how much of a repository is covered by notes.
///
/// Derived on every call; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Number of notes considered.
    pub total_notes: usize,
    /// Eligible files.
    pub total_files: usize,
    /// Files matched by at least one anchor.
    pub covered_files: usize,
    /// `covered_files / total_files * 100`.
    pub coverage_percentage: f64,
    /// Eligible directories (0 when directories were not requested).
    pub total_directories: usize,
    /// Directories matched by at least one anchor.
    pub covered_directories: usize,
    /// `covered_directories / total_directories * 100`.
    pub directory_coverage_percentage: f64,
    /// Per-extension breakdown, keyed by lowercase extension.
    pub by_extension: BTreeMap<String, ExtensionCoverage>,
    /// Most documented files, by hit count.
    pub top_covered: Vec<CoveredFile>,
    /// Largest files without any note.
    pub largest_uncovered: Vec<UncoveredFile>,
    /// Missing targets that resolve to no eligible entry, capped. A directory
    /// that only encloses the anchor does not resolve it.
    pub stale_anchors: Vec<StaleAnchor>,
    /// Total stale anchors before capping.
    pub stale_anchor_count: usize,
}
