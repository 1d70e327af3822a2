//! Note validation.
//!
//! Every check runs independently and all violations are collected, so a
//! caller sees the full list at once. Any violation rejects the whole note.

use crate::config::StoreConfig;
use crate::context::PathResolver;
use crate::storage::is_valid_tag_name;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Content is empty or whitespace.
    EmptyContent,
    /// Content exceeds the configured limit.
    ContentTooLong {
        /// Content length in characters.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// No anchors were supplied.
    MissingAnchors,
    /// An anchor is empty or whitespace.
    BlankAnchor {
        /// Position in the supplied list.
        index: usize,
    },
    /// More anchors than allowed.
    TooManyAnchors {
        /// Number supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// An anchor resolves outside the repository.
    AnchorEscapesRepository {
        /// The anchor as supplied.
        anchor: String,
    },
    /// More tags than allowed.
    TooManyTags {
        /// Number supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A tag is not a valid tag name.
    InvalidTagName {
        /// The tag as supplied.
        tag: String,
    },
    /// Tag enforcement is on and the tag has no description.
    UndescribedTag {
        /// The tag as supplied.
        tag: String,
    },
    /// A tag description exceeds the configured limit.
    TagDescriptionTooLong {
        /// Description length in characters.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The view id is empty.
    MissingViewId,
    /// The serialized note would exceed the configured file size.
    NoteTooLarge {
        /// Projected size of the note file in bytes.
        bytes: u64,
        /// Configured maximum.
        max: u64,
    },
}

/// Discriminant of [`ValidationError`], used to look up message formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// See [`ValidationError::EmptyContent`].
    EmptyContent,
    /// See [`ValidationError::ContentTooLong`].
    ContentTooLong,
    /// See [`ValidationError::MissingAnchors`].
    MissingAnchors,
    /// See [`ValidationError::BlankAnchor`].
    BlankAnchor,
    /// See [`ValidationError::TooManyAnchors`].
    TooManyAnchors,
    /// See [`ValidationError::AnchorEscapesRepository`].
    AnchorEscapesRepository,
    /// See [`ValidationError::TooManyTags`].
    TooManyTags,
    /// See [`ValidationError::InvalidTagName`].
    InvalidTagName,
    /// See [`ValidationError::UndescribedTag`].
    UndescribedTag,
    /// See [`ValidationError::TagDescriptionTooLong`].
    TagDescriptionTooLong,
    /// See [`ValidationError::MissingViewId`].
    MissingViewId,
    /// See [`ValidationError::NoteTooLarge`].
    NoteTooLarge,
}

impl ValidationError {
    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::EmptyContent => ValidationErrorKind::EmptyContent,
            Self::ContentTooLong { .. } => ValidationErrorKind::ContentTooLong,
            Self::MissingAnchors => ValidationErrorKind::MissingAnchors,
            Self::BlankAnchor { .. } => ValidationErrorKind::BlankAnchor,
            Self::TooManyAnchors { .. } => ValidationErrorKind::TooManyAnchors,
            Self::AnchorEscapesRepository { .. } => ValidationErrorKind::AnchorEscapesRepository,
            Self::TooManyTags { .. } => ValidationErrorKind::TooManyTags,
            Self::InvalidTagName { .. } => ValidationErrorKind::InvalidTagName,
            Self::UndescribedTag { .. } => ValidationErrorKind::UndescribedTag,
            Self::TagDescriptionTooLong { .. } => ValidationErrorKind::TagDescriptionTooLong,
            Self::MissingViewId => ValidationErrorKind::MissingViewId,
            Self::NoteTooLarge { .. } => ValidationErrorKind::NoteTooLarge,
        }
    }

    /// Built-in message template.
    #[must_use]
    pub fn default_message(&self) -> String {
        match self {
            Self::EmptyContent => "Content cannot be empty".to_string(),
            Self::ContentTooLong { length, max } => {
                format!("Content is {length} characters; the limit is {max}")
            },
            Self::MissingAnchors => "At least one anchor is required".to_string(),
            Self::BlankAnchor { index } => format!("Anchor #{} is empty", index + 1),
            Self::TooManyAnchors { count, max } => {
                format!("{count} anchors given; the limit is {max}")
            },
            Self::AnchorEscapesRepository { anchor } => {
                format!("Anchor '{anchor}' resolves outside the repository")
            },
            Self::TooManyTags { count, max } => format!("{count} tags given; the limit is {max}"),
            Self::InvalidTagName { tag } => format!("'{tag}' is not a valid tag name"),
            Self::UndescribedTag { tag } => {
                format!("Tag '{tag}' has no description and tag enforcement is enabled")
            },
            Self::TagDescriptionTooLong { length, max } => {
                format!("Tag description is {length} characters; the limit is {max}")
            },
            Self::MissingViewId => "A view id is required".to_string(),
            Self::NoteTooLarge { bytes, max } => {
                format!("Note would be stored as {bytes} bytes; the limit is {max}")
            },
        }
    }
}

/// Renders a validation error into a user-facing message.
pub type MessageFormatter = fn(&ValidationError) -> String;

/// Message strategy: per-kind formatter overrides on top of the built-in
/// templates.
#[derive(Debug, Clone, Default)]
pub struct ValidationMessages {
    overrides: HashMap<ValidationErrorKind, MessageFormatter>,
}

impl ValidationMessages {
    /// Creates the default message set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the formatter for one error kind.
    #[must_use]
    pub fn with_formatter(mut self, kind: ValidationErrorKind, formatter: MessageFormatter) -> Self {
        self.overrides.insert(kind, formatter);
        self
    }

    /// Renders an error with the override for its kind, if any.
    #[must_use]
    pub fn render(&self, error: &ValidationError) -> String {
        self.overrides
            .get(&error.kind())
            .map_or_else(|| error.default_message(), |format| format(error))
    }
}

/// All violations found for one write, with rendered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
    messages: Vec<String>,
}

impl ValidationErrors {
    /// Renders `errors` with the given message strategy.
    #[must_use]
    pub fn new(errors: Vec<ValidationError>, messages: &ValidationMessages) -> Self {
        let rendered = errors.iter().map(|e| messages.render(e)).collect();
        Self {
            errors,
            messages: rendered,
        }
    }

    /// The individual violations.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The rendered messages, in the same order as [`Self::errors`].
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Returns `true` if an error of the given kind is present.
    #[must_use]
    pub fn contains(&self, kind: ValidationErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

/// Everything a note is validated against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Repository configuration.
    pub config: &'a StoreConfig,
    /// Resolver for the repository root.
    pub resolver: &'a PathResolver,
    /// Tags that have a description.
    pub described_tags: &'a BTreeSet<String>,
    /// Working directory for `./` and `../` anchors.
    pub cwd: Option<&'a Path>,
}

/// The fields of a note that are subject to validation.
#[derive(Debug, Clone, Copy)]
pub struct NoteCandidate<'a> {
    /// Note text.
    pub content: &'a str,
    /// Anchors as supplied.
    pub anchors: &'a [String],
    /// Tags after normalization.
    pub tags: &'a [String],
    /// View id.
    pub view_id: &'a str,
}

/// Validates a candidate note. An empty result means the note is valid.
#[must_use]
pub fn validate(candidate: &NoteCandidate<'_>, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
    let limits = &ctx.config.limits;
    let mut errors = Vec::new();

    if candidate.content.trim().is_empty() {
        errors.push(ValidationError::EmptyContent);
    }
    let length = candidate.content.chars().count();
    if length > limits.max_content_length {
        errors.push(ValidationError::ContentTooLong {
            length,
            max: limits.max_content_length,
        });
    }

    if candidate.anchors.is_empty() {
        errors.push(ValidationError::MissingAnchors);
    }
    if candidate.anchors.len() > limits.max_anchors {
        errors.push(ValidationError::TooManyAnchors {
            count: candidate.anchors.len(),
            max: limits.max_anchors,
        });
    }
    for (index, anchor) in candidate.anchors.iter().enumerate() {
        if anchor.trim().is_empty() {
            errors.push(ValidationError::BlankAnchor { index });
        } else if ctx.resolver.to_repo_relative(anchor, ctx.cwd).is_err() {
            errors.push(ValidationError::AnchorEscapesRepository {
                anchor: anchor.clone(),
            });
        }
    }

    if candidate.tags.len() > limits.max_tags {
        errors.push(ValidationError::TooManyTags {
            count: candidate.tags.len(),
            max: limits.max_tags,
        });
    }
    let enforce = ctx.config.tags.enforce && !ctx.described_tags.is_empty();
    for tag in candidate.tags {
        if !is_valid_tag_name(tag) {
            errors.push(ValidationError::InvalidTagName { tag: tag.clone() });
        } else if enforce && !ctx.described_tags.contains(tag) {
            errors.push(ValidationError::UndescribedTag { tag: tag.clone() });
        }
    }

    if candidate.view_id.trim().is_empty() {
        errors.push(ValidationError::MissingViewId);
    }

    errors
}

/// Trims tags, drops blanks and duplicates, keeping first occurrences.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_string()))
        .map(String::from)
        .collect()
}
