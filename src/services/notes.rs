//! Note service facade.
//!
//! [`NoteService`] is the single entry point for hosting layers (tool
//! servers, CLIs). It wires the stores to one repository root and runs the
//! validate, normalize, persist pipeline for writes.

use super::coverage::{CoverageAuditor, CoverageOptions};
use super::enumerator::{FileEnumerator, IgnoreWalkEnumerator};
use super::guidance::GuidanceTokenValidator;
use super::matcher::AnchorMatcher;
use super::tag_ledger::TagLedger;
use super::validator::{
    NoteCandidate, ValidationContext, ValidationError, ValidationErrors, ValidationMessages, normalize_tags,
    validate,
};
use super::views::view_statistics;
use crate::config::{ConfigUpdate, ConfigurationStore, StoreConfig};
use crate::context::PathResolver;
use crate::models::{
    CellCoordinates, CoverageReport, Note, NoteId, RankedNote, StaleAnchor, TagDeleteOutcome,
    TagDescription, TagRenameOutcome, TagUsage, ViewStatistics,
};
use crate::storage::{
    LocalStorage, NewNote, NoteRecordStore, StoragePort, StorePaths, TagDescriptionStore,
    ViewStore,
};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Input for [`NoteService::save_note`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveNoteRequest {
    /// Note text.
    pub content: String,
    /// Anchors in any accepted input form.
    pub anchors: Vec<String>,
    /// Tags, normalized before validation.
    pub tags: Vec<String>,
    /// Associated view.
    pub view_id: String,
    /// Open metadata.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Initial review flag.
    pub reviewed: bool,
    /// Optional view cell.
    pub cell_coordinates: Option<CellCoordinates>,
    /// Guidance token, checked when the repository requires one.
    pub guidance_token: Option<String>,
    /// Root-relative working directory for `./` and `../` anchors.
    pub cwd: Option<PathBuf>,
}

impl SaveNoteRequest {
    /// Creates a request with content, anchors and view id.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        anchors: impl IntoIterator<Item = impl Into<String>>,
        view_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            anchors: anchors.into_iter().map(Into::into).collect(),
            view_id: view_id.into(),
            ..Self::default()
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sets the review flag.
    #[must_use]
    pub const fn reviewed(mut self, reviewed: bool) -> Self {
        self.reviewed = reviewed;
        self
    }

    /// Places the note in a view cell.
    #[must_use]
    pub const fn with_cell(mut self, coordinates: CellCoordinates) -> Self {
        self.cell_coordinates = Some(coordinates);
        self
    }

    /// Attaches a guidance token.
    #[must_use]
    pub fn with_guidance_token(mut self, token: impl Into<String>) -> Self {
        self.guidance_token = Some(token.into());
        self
    }

    /// Sets the working directory for relative anchors.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Facade over every store of one repository.
#[derive(Clone)]
pub struct NoteService {
    resolver: PathResolver,
    paths: StorePaths,
    port: Arc<dyn StoragePort>,
    enumerator: Arc<dyn FileEnumerator>,
    guidance: Option<Arc<dyn GuidanceTokenValidator>>,
    messages: ValidationMessages,
}

impl NoteService {
    /// Opens the store of the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RepositoryNotFound`] if `path` is not inside a git
    /// work tree.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let resolver = PathResolver::discover(path)?;
        Ok(Self::with_storage(
            resolver.root().to_path_buf(),
            Arc::new(LocalStorage::new()),
        ))
    }

    /// Creates a service for an already-canonical root and storage port.
    #[must_use]
    pub fn with_storage(root: PathBuf, port: Arc<dyn StoragePort>) -> Self {
        let paths = StorePaths::for_repo(&root);
        Self {
            resolver: PathResolver::new(root),
            paths,
            port,
            enumerator: Arc::new(IgnoreWalkEnumerator::new()),
            guidance: None,
            messages: ValidationMessages::new(),
        }
    }

    /// Replaces the coverage file enumerator.
    #[must_use]
    pub fn with_enumerator(mut self, enumerator: Arc<dyn FileEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }

    /// Installs the guidance token validator.
    #[must_use]
    pub fn with_guidance_validator(mut self, validator: Arc<dyn GuidanceTokenValidator>) -> Self {
        self.guidance = Some(validator);
        self
    }

    /// Replaces the validation message strategy.
    #[must_use]
    pub fn with_messages(mut self, messages: ValidationMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Returns the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Returns the store file layout.
    #[must_use]
    pub const fn paths(&self) -> &StorePaths {
        &self.paths
    }

    fn config_store(&self) -> ConfigurationStore {
        ConfigurationStore::new(Arc::clone(&self.port), self.paths.clone())
    }

    fn note_store(&self, config: &StoreConfig) -> NoteRecordStore {
        NoteRecordStore::new(Arc::clone(&self.port), self.paths.clone())
            .with_settings(config.storage.clone())
    }

    fn tag_store(&self) -> TagDescriptionStore {
        TagDescriptionStore::new(Arc::clone(&self.port), self.paths.clone())
    }

    fn notes(&self) -> Result<NoteRecordStore> {
        Ok(self.note_store(&self.config_store().get()?))
    }

    fn tag_ledger(&self) -> Result<TagLedger<'_>> {
        let config = self.config_store().get()?;
        Ok(TagLedger::new(
            self.tag_store(),
            self.note_store(&config),
            config.limits.max_tag_description_length,
            &self.messages,
        ))
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    /// Validates, normalizes and persists a new note.
    ///
    /// Nothing is written unless every check passes.
    ///
    /// # Errors
    ///
    /// - [`Error::GuidanceRejected`] if a required guidance token is missing
    ///   or invalid
    /// - [`Error::Validation`] listing every violation
    /// - an I/O error if the note cannot be written
    #[instrument(skip(self, request), fields(anchors = request.anchors.len(), tags = request.tags.len()))]
    pub fn save_note(&self, request: SaveNoteRequest) -> Result<Note> {
        let start = Instant::now();
        let config = self.config_store().get()?;

        if config.guidance.require_token {
            self.check_guidance(request.guidance_token.as_deref())?;
        }

        let described = if config.tags.enforce {
            self.tag_store().described_tags()?
        } else {
            BTreeSet::new()
        };
        let tags = normalize_tags(&request.tags);
        let cwd = request.cwd.as_deref();

        let errors = validate(
            &NoteCandidate {
                content: &request.content,
                anchors: &request.anchors,
                tags: &tags,
                view_id: &request.view_id,
            },
            &ValidationContext {
                config: &config,
                resolver: &self.resolver,
                described_tags: &described,
                cwd,
            },
        );
        if !errors.is_empty() {
            return Err(self.reject(errors));
        }

        let mut anchors: Vec<String> = Vec::with_capacity(request.anchors.len());
        for anchor in &request.anchors {
            let normalized = self.resolver.to_repo_relative(anchor, cwd)?;
            if !anchors.contains(&normalized) {
                anchors.push(normalized);
            }
        }

        let new = NewNote {
            content: request.content,
            anchors,
            tags,
            metadata: request.metadata,
            reviewed: request.reviewed,
            view_id: request.view_id,
            cell_coordinates: request.cell_coordinates,
        };
        let store = self.note_store(&config);
        let bytes = store.projected_size(&new)?;
        if bytes > store.max_file_bytes() {
            return Err(self.reject(vec![ValidationError::NoteTooLarge {
                bytes,
                max: store.max_file_bytes(),
            }]));
        }
        let note = store.create(new)?;

        tracing::info!(
            note_id = %note.id,
            timestamp = note.timestamp,
            elapsed_ms = start.elapsed().as_millis(),
            "Saved note"
        );
        metrics::counter!("anchorage_notes_saved_total").increment(1);
        Ok(note)
    }

    fn reject(&self, errors: Vec<ValidationError>) -> Error {
        metrics::counter!("anchorage_validation_failures_total").increment(1);
        let errors = ValidationErrors::new(errors, &self.messages);
        tracing::debug!(violations = errors.errors().len(), "Rejected note");
        Error::Validation(errors)
    }

    fn check_guidance(&self, token: Option<&str>) -> Result<()> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::GuidanceRejected("a guidance token is required".to_string()))?;
        let validator = self.guidance.as_ref().ok_or_else(|| {
            Error::GuidanceRejected("no guidance token validator is configured".to_string())
        })?;
        if validator.validate(self.root(), token) {
            Ok(())
        } else {
            Err(Error::GuidanceRejected(
                "guidance token is invalid or expired".to_string(),
            ))
        }
    }

    /// Returns notes relevant to `path`, resolving `./` forms against the
    /// root. See [`Self::get_notes_for_path_from`].
    ///
    /// # Errors
    ///
    /// Returns an error if the notes directory cannot be listed.
    pub fn get_notes_for_path(&self, path: &str, include_ambient: bool) -> Result<Vec<RankedNote>> {
        self.get_notes_for_path_from(path, None, include_ambient)
    }

    /// Returns notes whose anchors relate to `path`, plus ambient notes when
    /// requested, ordered by distance then newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the notes directory cannot be listed.
    #[instrument(skip(self, cwd))]
    pub fn get_notes_for_path_from(
        &self,
        path: &str,
        cwd: Option<&Path>,
        include_ambient: bool,
    ) -> Result<Vec<RankedNote>> {
        let notes = self.notes()?.list()?;
        let ranked = AnchorMatcher::new(&self.resolver).rank(notes, path, cwd, include_ambient);
        tracing::debug!(matches = ranked.len(), "Matched notes");
        Ok(ranked)
    }

    /// Lists every note, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the notes directory cannot be listed.
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        self.notes()?.list()
    }

    /// Looks up a note by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the notes directory cannot be listed.
    pub fn get_note_by_id(&self, id: &str) -> Result<Option<Note>> {
        Ok(self.notes()?.get_by_id(&NoteId::new(id))?.map(|s| s.note))
    }

    /// Deletes a note. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the note file cannot be removed.
    #[instrument(skip(self))]
    pub fn delete_note_by_id(&self, id: &str) -> Result<bool> {
        let deleted = self.notes()?.delete_by_id(&NoteId::new(id))?;
        if deleted {
            tracing::info!(note_id = id, "Deleted note");
        }
        Ok(deleted)
    }

    /// Marks one note as reviewed and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be rewritten.
    #[instrument(skip(self))]
    pub fn mark_reviewed(&self, id: &str) -> Result<Option<Note>> {
        let store = self.notes()?;
        let Some(mut stored) = store.get_by_id(&NoteId::new(id))? else {
            return Ok(None);
        };
        if !stored.note.reviewed {
            stored.note.reviewed = true;
            store.rewrite(&stored)?;
        }
        Ok(Some(stored.note))
    }

    /// Marks every unreviewed note as reviewed, or only those with an anchor
    /// relating to `path`. Returns the number of notes changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a note cannot be rewritten.
    #[instrument(skip(self))]
    pub fn mark_all_reviewed(&self, path: Option<&str>) -> Result<usize> {
        let store = self.notes()?;
        let matcher = AnchorMatcher::new(&self.resolver);
        let target = path.map(|p| self.resolver.to_absolute(p, None));

        let mut changed = 0;
        for mut stored in store.read_all()? {
            if stored.note.reviewed {
                continue;
            }
            if let Some(target) = &target {
                if !matcher.matches(&stored.note, target) {
                    continue;
                }
            }
            stored.note.reviewed = true;
            store.rewrite(&stored)?;
            changed += 1;
        }

        tracing::info!(changed, "Marked notes reviewed");
        Ok(changed)
    }

    /// Lists every anchor whose target no longer exists on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the notes directory cannot be listed.
    pub fn check_stale_anchors(&self) -> Result<Vec<StaleAnchor>> {
        let notes = self.notes()?.list()?;
        let auditor =
            CoverageAuditor::new(&self.resolver, self.port.as_ref(), self.enumerator.as_ref());
        Ok(auditor.stale_anchors(&notes))
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Creates or replaces a tag description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid tag name or
    /// [`Error::Validation`] for an over-long description.
    pub fn save_tag_description(&self, tag: &str, description: &str) -> Result<TagDescription> {
        self.tag_ledger()?.save_description(tag, description)
    }

    /// Reads a tag description.
    ///
    /// # Errors
    ///
    /// Returns an error if the description cannot be read.
    pub fn get_tag_description(&self, tag: &str) -> Result<Option<TagDescription>> {
        self.tag_ledger()?.get(tag)
    }

    /// Lists described tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags directory cannot be listed.
    pub fn list_tags(&self) -> Result<Vec<TagDescription>> {
        self.tag_ledger()?.list()
    }

    /// Reports every described or used tag with its note count.
    ///
    /// # Errors
    ///
    /// Returns an error if notes or tags cannot be listed.
    pub fn tag_usage(&self) -> Result<Vec<TagUsage>> {
        self.tag_ledger()?.usage()
    }

    /// Deletes a tag description, optionally stripping the tag from notes.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be removed or rewritten.
    #[instrument(skip(self))]
    pub fn delete_tag_description(&self, tag: &str, cascade: bool) -> Result<TagDeleteOutcome> {
        self.tag_ledger()?.delete(tag, cascade)
    }

    /// Renames a tag across all notes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid new name, or an error if
    /// a file cannot be written.
    #[instrument(skip(self))]
    pub fn rename_tag(&self, old_tag: &str, new_tag: &str, transfer: bool) -> Result<TagRenameOutcome> {
        self.tag_ledger()?.rename(old_tag, new_tag, transfer)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Returns the configuration, creating it with defaults if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be written.
    pub fn get_configuration(&self) -> Result<StoreConfig> {
        self.config_store().get()
    }

    /// Merges a partial update into the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn update_configuration(&self, update: ConfigUpdate) -> Result<StoreConfig> {
        self.config_store().update(update)
    }

    /// Restores the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn reset_configuration(&self) -> Result<StoreConfig> {
        self.config_store().reset()
    }

    /// Returns whether a tool is enabled for this repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn is_tool_enabled(&self, name: &str) -> Result<bool> {
        Ok(self.config_store().get()?.is_tool_enabled(name))
    }

    // ------------------------------------------------------------------
    // Audits
    // ------------------------------------------------------------------

    /// Computes the documentation coverage report.
    ///
    /// # Errors
    ///
    /// Returns an error if notes cannot be listed or an ignore pattern is
    /// invalid.
    #[instrument(skip(self, options), fields(include_directories = options.include_directories))]
    pub fn compute_coverage(&self, options: &CoverageOptions) -> Result<CoverageReport> {
        let start = Instant::now();
        let notes = self.notes()?.list()?;
        let auditor =
            CoverageAuditor::new(&self.resolver, self.port.as_ref(), self.enumerator.as_ref());
        let report = auditor.audit(&notes, options)?;

        tracing::info!(
            total_files = report.total_files,
            covered_files = report.covered_files,
            stale_anchors = report.stale_anchor_count,
            elapsed_ms = start.elapsed().as_millis(),
            "Computed coverage"
        );
        metrics::counter!("anchorage_coverage_runs_total").increment(1);
        Ok(report)
    }

    /// Counts the notes of a view per cell. Returns `None` for an unknown view.
    ///
    /// # Errors
    ///
    /// Returns an error if the view or notes cannot be read.
    pub fn view_statistics(&self, view_id: &str) -> Result<Option<ViewStatistics>> {
        let Some(view) = ViewStore::new(Arc::clone(&self.port), self.paths.clone()).get(view_id)?
        else {
            return Ok(None);
        };
        let notes = self.notes()?.list()?;
        Ok(Some(view_statistics(&view, &notes)))
    }
}
