//! Tag vocabulary maintenance.
//!
//! Descriptions live in `tags/<tag>.md`; tag usage lives on the notes
//! themselves. Renames and cascading deletes rewrite every affected note.

use super::validator::{ValidationError, ValidationErrors, ValidationMessages};
use crate::models::{TagDeleteOutcome, TagDescription, TagRenameOutcome, TagUsage};
use crate::storage::{NoteRecordStore, TagDescriptionStore, ensure_valid_tag};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Tag descriptions plus propagation of tag changes to notes.
pub struct TagLedger<'a> {
    descriptions: TagDescriptionStore,
    notes: NoteRecordStore,
    max_description_length: usize,
    messages: &'a ValidationMessages,
}

impl<'a> TagLedger<'a> {
    /// Creates a ledger.
    #[must_use]
    pub const fn new(
        descriptions: TagDescriptionStore,
        notes: NoteRecordStore,
        max_description_length: usize,
        messages: &'a ValidationMessages,
    ) -> Self {
        Self {
            descriptions,
            notes,
            max_description_length,
            messages,
        }
    }

    /// Creates or replaces a tag description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid tag name,
    /// [`Error::Validation`] if the description is too long, or an error if
    /// the write fails.
    pub fn save_description(&self, tag: &str, description: &str) -> Result<TagDescription> {
        ensure_valid_tag(tag)?;

        let length = description.chars().count();
        if length > self.max_description_length {
            return Err(Error::Validation(ValidationErrors::new(
                vec![ValidationError::TagDescriptionTooLong {
                    length,
                    max: self.max_description_length,
                }],
                self.messages,
            )));
        }

        self.descriptions.save(tag, description)?;
        Ok(TagDescription {
            tag: tag.to_string(),
            description: description.to_string(),
        })
    }

    /// Reads a tag description.
    ///
    /// # Errors
    ///
    /// Returns an error if the description exists but cannot be read.
    pub fn get(&self, tag: &str) -> Result<Option<TagDescription>> {
        Ok(self.descriptions.get(tag)?.map(|description| TagDescription {
            tag: tag.to_string(),
            description,
        }))
    }

    /// Lists all described tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags directory cannot be listed.
    pub fn list(&self) -> Result<Vec<TagDescription>> {
        self.descriptions.list()
    }

    /// Reports every tag that is described or used, with its note count.
    ///
    /// # Errors
    ///
    /// Returns an error if notes or descriptions cannot be listed.
    pub fn usage(&self) -> Result<Vec<TagUsage>> {
        let mut usage: BTreeMap<String, TagUsage> = self
            .descriptions
            .list()?
            .into_iter()
            .map(|d| {
                (
                    d.tag.clone(),
                    TagUsage {
                        tag: d.tag,
                        note_count: 0,
                        description: Some(d.description),
                    },
                )
            })
            .collect();

        for stored in self.notes.read_all()? {
            for tag in &stored.note.tags {
                usage
                    .entry(tag.clone())
                    .or_insert_with(|| TagUsage {
                        tag: tag.clone(),
                        note_count: 0,
                        description: None,
                    })
                    .note_count += 1;
            }
        }

        Ok(usage.into_values().collect())
    }

    /// Deletes a tag description and, with `cascade`, strips the tag from
    /// every note.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be removed or rewritten.
    pub fn delete(&self, tag: &str, cascade: bool) -> Result<TagDeleteOutcome> {
        let description_removed = self.descriptions.delete(tag)?;

        let mut notes_updated = 0;
        if cascade {
            for mut stored in self.notes.read_all()? {
                if !stored.note.has_tag(tag) {
                    continue;
                }
                stored.note.tags.retain(|t| t != tag);
                self.notes.rewrite(&stored)?;
                notes_updated += 1;
            }
        }

        tracing::info!(tag, cascade, description_removed, notes_updated, "Deleted tag");
        Ok(TagDeleteOutcome {
            description_removed,
            notes_updated,
        })
    }

    /// Renames a tag on every note. With `transfer`, the old description is
    /// moved to the new name unless the new name already has one.
    ///
    /// The old description is removed whenever `transfer` is set, so the old
    /// name disappears from the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either name is blank or `new_tag` is
    /// not a valid tag name, or an error if a file cannot be written.
    pub fn rename(&self, old_tag: &str, new_tag: &str, transfer: bool) -> Result<TagRenameOutcome> {
        if old_tag.trim().is_empty() {
            return Err(Error::InvalidInput("tag to rename cannot be empty".to_string()));
        }
        ensure_valid_tag(new_tag)?;
        if old_tag == new_tag {
            return Ok(TagRenameOutcome::default());
        }

        let mut notes_updated = 0;
        for mut stored in self.notes.read_all()? {
            if !stored.note.has_tag(old_tag) {
                continue;
            }
            stored.note.tags = renamed(&stored.note.tags, old_tag, new_tag);
            self.notes.rewrite(&stored)?;
            notes_updated += 1;
        }

        let mut description_moved = false;
        if transfer {
            if let Some(description) = self.descriptions.get(old_tag)? {
                if self.descriptions.get(new_tag)?.is_none() {
                    self.descriptions.save(new_tag, &description)?;
                    description_moved = true;
                }
                self.descriptions.delete(old_tag)?;
            }
        }

        tracing::info!(old_tag, new_tag, notes_updated, description_moved, "Renamed tag");
        Ok(TagRenameOutcome {
            notes_updated,
            description_moved,
        })
    }
}

/// Replaces `old` with `new`, dropping the duplicate if `new` was present.
fn renamed(tags: &[String], old: &str, new: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = if tag == old { new } else { tag.as_str() };
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, NewNote, StorePaths};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        descriptions: TagDescriptionStore,
        notes: NoteRecordStore,
        messages: ValidationMessages,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let port = Arc::new(LocalStorage::new());
            let paths = StorePaths::for_repo(dir.path());
            Self {
                descriptions: TagDescriptionStore::new(port.clone(), paths.clone()),
                notes: NoteRecordStore::new(port, paths),
                messages: ValidationMessages::new(),
                _dir: dir,
            }
        }

        fn ledger(&self) -> TagLedger<'_> {
            TagLedger::new(self.descriptions.clone(), self.notes.clone(), 20, &self.messages)
        }

        fn add_note(&self, tags: &[&str]) {
            self.notes
                .create(NewNote {
                    content: "note".to_string(),
                    anchors: vec!["src".to_string()],
                    tags: tags.iter().map(|t| (*t).to_string()).collect(),
                    view_id: "main".to_string(),
                    ..NewNote::default()
                })
                .unwrap();
        }
    }

    #[test]
    fn test_description_length_limit() {
        let fx = Fixture::new();
        let err = fx.ledger().save_description("auth", &"x".repeat(21)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(fx.ledger().save_description("auth", "short").is_ok());
    }

    #[test]
    fn test_rename_merges_duplicates() {
        assert_eq!(
            renamed(&["a".into(), "b".into(), "c".into()], "a", "c"),
            vec!["c".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_rename_keeps_existing_destination_description() {
        let fx = Fixture::new();
        let ledger = fx.ledger();
        ledger.save_description("old", "old text").unwrap();
        ledger.save_description("new", "new text").unwrap();
        fx.add_note(&["old"]);

        let outcome = ledger.rename("old", "new", true).unwrap();
        assert_eq!(outcome.notes_updated, 1);
        assert!(!outcome.description_moved);
        assert_eq!(ledger.get("new").unwrap().unwrap().description, "new text");
        assert!(ledger.get("old").unwrap().is_none());
    }

    #[test]
    fn test_rename_without_transfer_leaves_descriptions() {
        let fx = Fixture::new();
        let ledger = fx.ledger();
        ledger.save_description("old", "old text").unwrap();

        let outcome = ledger.rename("old", "new", false).unwrap();
        assert_eq!(outcome, TagRenameOutcome::default());
        assert!(ledger.get("old").unwrap().is_some());
        assert!(ledger.get("new").unwrap().is_none());
    }

    #[test]
    fn test_usage_counts_described_and_undescribed() {
        let fx = Fixture::new();
        let ledger = fx.ledger();
        ledger.save_description("documented", "text").unwrap();
        fx.add_note(&["used"]);
        fx.add_note(&["used", "documented"]);

        let usage = ledger.usage().unwrap();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].tag, "documented");
        assert_eq!(usage[0].note_count, 1);
        assert_eq!(usage[1].tag, "used");
        assert_eq!(usage[1].note_count, 2);
        assert!(usage[1].description.is_none());
    }

    #[test]
    fn test_delete_without_cascade_keeps_notes() {
        let fx = Fixture::new();
        let ledger = fx.ledger();
        ledger.save_description("gone", "text").unwrap();
        fx.add_note(&["gone"]);

        let outcome = ledger.delete("gone", false).unwrap();
        assert!(outcome.description_removed);
        assert_eq!(outcome.notes_updated, 0);
        assert!(fx.notes.list().unwrap()[0].has_tag("gone"));
    }
}
