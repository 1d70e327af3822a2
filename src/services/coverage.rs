//! Documentation coverage audit.
//!
//! Every note anchor is compared against every eligible entry with
//! [`relate`], so an anchor on `src` covers everything below it and an anchor
//! on a file also marks its ancestor directories as covered.

use super::enumerator::{EligibleEntry, EntryKind, EnumerationOptions, FileEnumerator};
use crate::Result;
use crate::context::{PathResolver, relate};
use crate::models::{
    CoverageReport, CoveredFile, Note, NoteId, StaleAnchor, UncoveredFile,
};
use crate::storage::StoragePort;
use std::collections::BTreeSet;

/// Extension bucket for files without one.
pub const NO_EXTENSION: &str = "(none)";

/// Tunables for [`CoverageAuditor::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageOptions {
    /// Include directory coverage figures.
    pub include_directories: bool,
    /// Additional `.gitignore`-style exclusions.
    pub extra_ignore_patterns: Vec<String>,
    /// Length of the top-covered and largest-uncovered lists.
    pub top_n: usize,
    /// Maximum number of stale anchors listed.
    pub max_stale: usize,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            include_directories: true,
            extra_ignore_patterns: Vec::new(),
            top_n: 10,
            max_stale: 50,
        }
    }
}

#[derive(Default)]
struct Hits {
    count: usize,
    note_ids: Vec<NoteId>,
}

/// Computes coverage reports and stale anchors.
pub struct CoverageAuditor<'a> {
    resolver: &'a PathResolver,
    port: &'a dyn StoragePort,
    enumerator: &'a dyn FileEnumerator,
}

impl<'a> CoverageAuditor<'a> {
    /// Creates an auditor.
    #[must_use]
    pub const fn new(
        resolver: &'a PathResolver,
        port: &'a dyn StoragePort,
        enumerator: &'a dyn FileEnumerator,
    ) -> Self {
        Self {
            resolver,
            port,
            enumerator,
        }
    }

    /// Builds a coverage report for `notes`.
    ///
    /// An anchor that resolves to no eligible entry is stale only if its
    /// target is also missing on disk; anchors on ignored but existing paths
    /// are not reported. A directory entry that merely encloses the anchor
    /// still counts toward its coverage but does not resolve it, so a deleted
    /// file under `src` is stale whether or not directories are included.
    ///
    /// # Errors
    ///
    /// Returns an error if the enumerator rejects the options.
    pub fn audit(&self, notes: &[Note], options: &CoverageOptions) -> Result<CoverageReport> {
        let entries = self.enumerator.enumerate(
            self.resolver.root(),
            &EnumerationOptions {
                include_directories: options.include_directories,
                extra_ignore_patterns: options.extra_ignore_patterns.clone(),
            },
        )?;

        let mut hits: Vec<Hits> = entries.iter().map(|_| Hits::default()).collect();
        let mut stale = Vec::new();

        for note in notes {
            for anchor in unique_anchors(note) {
                let mut resolved = false;
                for (entry, slot) in entries.iter().zip(hits.iter_mut()) {
                    if relate(anchor, &entry.relative_path) {
                        slot.count += 1;
                        if !slot.note_ids.contains(&note.id) {
                            slot.note_ids.push(note.id.clone());
                        }
                        resolved |= !encloses(entry, anchor);
                    }
                }
                if !resolved && !self.port.exists(&self.resolver.absolute_anchor(anchor)) {
                    stale.push(StaleAnchor {
                        note_id: note.id.clone(),
                        anchor: anchor.to_string(),
                    });
                }
            }
        }

        let mut report = summarize(&entries, hits, options.top_n);
        report.total_notes = notes.len();
        report.stale_anchor_count = stale.len();
        stale.truncate(options.max_stale);
        report.stale_anchors = stale;
        Ok(report)
    }

    /// Lists every anchor whose target no longer exists.
    #[must_use]
    pub fn stale_anchors(&self, notes: &[Note]) -> Vec<StaleAnchor> {
        notes
            .iter()
            .flat_map(move |note| {
                unique_anchors(note)
                    .filter(move |anchor| !self.port.exists(&self.resolver.absolute_anchor(anchor)))
                    .map(move |anchor| StaleAnchor {
                        note_id: note.id.clone(),
                        anchor: anchor.to_string(),
                    })
            })
            .collect()
    }
}

/// `true` if `entry` is a directory strictly above `anchor`.
fn encloses(entry: &EligibleEntry, anchor: &str) -> bool {
    entry.kind == EntryKind::Directory
        && anchor
            .strip_prefix(entry.relative_path.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
}

fn unique_anchors(note: &Note) -> impl Iterator<Item = &str> {
    let mut seen = BTreeSet::new();
    note.anchors
        .iter()
        .map(String::as_str)
        .filter(move |anchor| seen.insert(*anchor))
}

fn summarize(entries: &[EligibleEntry], hits: Vec<Hits>, top_n: usize) -> CoverageReport {
    let mut report = CoverageReport::default();
    let mut covered = Vec::new();
    let mut uncovered = Vec::new();

    for (entry, slot) in entries.iter().zip(hits) {
        let is_covered = slot.count > 0;
        match entry.kind {
            EntryKind::Directory => {
                report.total_directories += 1;
                if is_covered {
                    report.covered_directories += 1;
                }
            },
            EntryKind::File => {
                report.total_files += 1;
                let ext = entry.extension.clone().unwrap_or_else(|| NO_EXTENSION.to_string());
                let bucket = report.by_extension.entry(ext).or_default();
                bucket.total += 1;
                if is_covered {
                    report.covered_files += 1;
                    bucket.covered += 1;
                    covered.push(CoveredFile {
                        path: entry.relative_path.clone(),
                        hits: slot.count,
                        note_ids: slot.note_ids,
                    });
                } else {
                    uncovered.push(UncoveredFile {
                        path: entry.relative_path.clone(),
                        size: entry.size,
                    });
                }
            },
        }
    }

    report.coverage_percentage = percentage(report.covered_files, report.total_files);
    report.directory_coverage_percentage =
        percentage(report.covered_directories, report.total_directories);
    for bucket in report.by_extension.values_mut() {
        bucket.percentage = percentage(bucket.covered, bucket.total);
    }

    covered.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.path.cmp(&b.path)));
    covered.truncate(top_n);
    uncovered.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    uncovered.truncate(top_n);
    report.top_covered = covered;
    report.largest_uncovered = uncovered;
    report
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
