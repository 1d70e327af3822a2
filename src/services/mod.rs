//! Business logic services.
//!
//! Services sit on top of the storage layer and implement the note store's
//! operations:
//! - [`NoteService`]: facade used by hosting layers
//! - validation, anchor matching and the tag ledger
//! - coverage audit and view statistics

mod coverage;
mod enumerator;
mod guidance;
mod matcher;
mod notes;
mod tag_ledger;
mod validator;
mod views;

pub use coverage::{CoverageAuditor, CoverageOptions, NO_EXTENSION};
pub use enumerator::{
    CUSTOM_IGNORE_FILE, EligibleEntry, EntryKind, EnumerationOptions, FileEnumerator,
    IgnoreWalkEnumerator,
};
pub use guidance::GuidanceTokenValidator;
pub use matcher::AnchorMatcher;
pub use notes::{NoteService, SaveNoteRequest};
pub use tag_ledger::TagLedger;
pub use validator::{
    MessageFormatter, NoteCandidate, ValidationContext, ValidationError, ValidationErrorKind,
    ValidationErrors, ValidationMessages, normalize_tags, validate,
};
pub use views::{CellMatch, cell_confidence, view_statistics};
