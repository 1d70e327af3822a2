//! Data models for anchorage.
//!
//! This module contains the core data structures persisted by the store or
//! produced by its audits.

mod coverage;
mod note;
mod tag;
mod view;

pub use coverage::{
    CoverageReport, CoveredFile, ExtensionCoverage, StaleAnchor, UncoveredFile,
};
pub use note::{CellCoordinates, MatchKind, Note, NoteId, RankedNote};
pub use tag::{TagDescription, TagDeleteOutcome, TagRenameOutcome, TagUsage};
pub use view::{CellStatistics, View, ViewCell, ViewStatistics};
