//! # Anchorage
//!
//! Path-anchored knowledge notes for git repositories.
//!
//! Anchorage stores short, human-authored notes that are anchored to files or
//! directories inside a repository, and surfaces them again when somebody (a
//! person or an agent) asks about a path.
//!
//! ## Features
//!
//! - One JSON file per note, date-sharded, written atomically
//! - Bidirectional anchor matching with ambient repository-wide notes
//! - Tag vocabulary with rename/delete propagation across notes
//! - Documentation coverage audit and stale-anchor detection
//!
//! ## Example
//!
//! ```rust,ignore
//! use anchorage::{NoteService, SaveNoteRequest};
//!
//! let service = NoteService::open(".")?;
//! let note = service.save_note(
//!     SaveNoteRequest::new("Retries are handled by the caller", ["src/net/client.rs"], "main")
//!         .with_tag("networking"),
//! )?;
//! let hits = service.get_notes_for_path("src/net", true)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod context;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{ConfigUpdate, ConfigurationStore, StoreConfig};
pub use context::PathResolver;
pub use models::{
    CoverageReport, MatchKind, Note, NoteId, RankedNote, StaleAnchor, TagDescription,
};
pub use services::{
    CoverageOptions, NoteService, SaveNoteRequest, ValidationError, ValidationErrors,
};
pub use storage::{LocalStorage, StoragePort, StorePaths};

/// Error type for anchorage operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed ids or tag names, unusable arguments |
/// | `OperationFailed` | Filesystem writes, serialization, git discovery fail |
/// | `Validation` | A note violates configured limits (all violations listed) |
/// | `RepositoryNotFound` | No git work tree contains the given path |
/// | `PathEscapesRepository` | A path resolves outside the repository root |
/// | `GuidanceRejected` | A guidance token is required but missing or invalid |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Writing, renaming or removing a store file fails
    /// - JSON serialization fails
    /// - A directory walk fails before any entry is produced
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A note was rejected by validation. Nothing was persisted.
    #[error("validation failed: {0}")]
    Validation(services::ValidationErrors),

    /// No repository contains the given path.
    #[error("repository not found for path: {path}")]
    RepositoryNotFound {
        /// The path that was searched from.
        path: String,
    },

    /// A path resolved outside of the repository root.
    #[error("path escapes repository: {path}")]
    PathEscapesRepository {
        /// The offending input path.
        path: String,
    },

    /// The guidance token gate refused the write.
    #[error("guidance token rejected: {0}")]
    GuidanceRejected(String),
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and cause.
    pub(crate) fn failed(operation: &str, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for anchorage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
