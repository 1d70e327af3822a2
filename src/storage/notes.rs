//! File-per-note persistence.
//!
//! Each note is an individual JSON file under `notes/<YYYY>/<MM>/`. Lookups
//! scan the whole directory; there is no index to keep consistent.
//!
//! # Corruption tolerance
//!
//! Files that cannot be read or fail to parse are skipped with a warning so
//! one damaged record never hides the rest. The same applies to files above
//! the configured size limit; [`NoteRecordStore::create`] never writes one,
//! so those can only come from edits made outside the library.

use super::{StoragePort, StorePaths};
use crate::config::StorageSettings;
use crate::current_timestamp_millis;
use crate::models::{CellCoordinates, Note, NoteId};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Highest timestamp issued by this process, used to keep ids monotonic.
static LAST_ISSUED_MILLIS: AtomicU64 = AtomicU64::new(0);

/// A note together with the file it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNote {
    /// The parsed note.
    pub note: Note,
    /// Location of the note file.
    pub path: PathBuf,
}

/// A validated, normalized note that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewNote {
    /// Note text.
    pub content: String,
    /// Normalized root-relative anchors.
    pub anchors: Vec<String>,
    /// Normalized tags.
    pub tags: Vec<String>,
    /// Open metadata.
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Review flag.
    pub reviewed: bool,
    /// Associated view.
    pub view_id: String,
    /// Optional view cell.
    pub cell_coordinates: Option<CellCoordinates>,
}

impl NewNote {
    fn into_note(self, id: NoteId, timestamp: u64) -> Note {
        Note {
            id,
            content: self.content,
            anchors: self.anchors,
            tags: self.tags,
            metadata: self.metadata,
            timestamp,
            reviewed: self.reviewed,
            view_id: self.view_id,
            cell_coordinates: self.cell_coordinates,
        }
    }
}

/// Atomic CRUD over individual note files.
#[derive(Clone)]
pub struct NoteRecordStore {
    port: Arc<dyn StoragePort>,
    paths: StorePaths,
    settings: StorageSettings,
}

impl NoteRecordStore {
    /// Creates a note store with default storage settings.
    #[must_use]
    pub fn new(port: Arc<dyn StoragePort>, paths: StorePaths) -> Self {
        Self {
            port,
            paths,
            settings: StorageSettings::default(),
        }
    }

    /// Applies storage settings from the repository configuration.
    #[must_use]
    pub fn with_settings(mut self, settings: StorageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Largest note file this store writes or reads.
    #[must_use]
    pub const fn max_file_bytes(&self) -> u64 {
        self.settings.max_note_file_bytes
    }

    /// Size in bytes the note file for `new` would have, assuming the longest
    /// possible id.
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be serialized.
    pub fn projected_size(&self, new: &NewNote) -> Result<u64> {
        let timestamp = next_monotonic_millis(current_timestamp_millis());
        let id = NoteId::new(format!("note-{timestamp}-{}", to_base36(u64::MAX)));
        let encoded = self.encode(&new.clone().into_note(id, timestamp))?;
        Ok(encoded.len() as u64)
    }

    /// Reads every parsable note file.
    ///
    /// # Errors
    ///
    /// Returns an error only if the notes directory itself cannot be listed.
    pub fn read_all(&self) -> Result<Vec<StoredNote>> {
        let files = self.port.list_files(&self.paths.notes_dir(), "json")?;
        let mut notes = Vec::with_capacity(files.len());

        for path in files {
            if let Some(size) = self.port.file_size(&path) {
                if size > self.settings.max_note_file_bytes {
                    tracing::warn!(
                        path = %path.display(),
                        size,
                        limit = self.settings.max_note_file_bytes,
                        "Skipping oversize note file"
                    );
                    continue;
                }
            }

            let raw = match self.port.read_to_string(&path) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable note file");
                    continue;
                },
            };

            match serde_json::from_str::<Note>(&raw) {
                Ok(note) => notes.push(StoredNote { note, path }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping corrupt note file");
                },
            }
        }

        Ok(notes)
    }

    /// Returns all notes, most recent first.
    ///
    /// # Errors
    ///
    /// See [`Self::read_all`].
    pub fn list(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self.read_all()?.into_iter().map(|s| s.note).collect();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(notes)
    }

    /// Finds a note by id.
    ///
    /// # Errors
    ///
    /// See [`Self::read_all`].
    pub fn get_by_id(&self, id: &NoteId) -> Result<Option<StoredNote>> {
        if !id.is_safe_filename() {
            return Ok(None);
        }
        Ok(self.read_all()?.into_iter().find(|s| &s.note.id == id))
    }

    /// Assigns an identity to `new` and writes it.
    ///
    /// The timestamp is bumped by 1 ms until no existing note carries the same
    /// value. Two processes saving in the same millisecond can still race;
    /// the random id suffix keeps their files apart.
    ///
    /// # Errors
    ///
    /// Returns an error if existing notes cannot be listed, the encoded note
    /// exceeds [`Self::max_file_bytes`], or the file cannot be written.
    pub fn create(&self, new: NewNote) -> Result<Note> {
        let existing: HashSet<u64> = self
            .read_all()?
            .into_iter()
            .map(|s| s.note.timestamp)
            .collect();

        let mut timestamp = next_monotonic_millis(current_timestamp_millis());
        while existing.contains(&timestamp) {
            tracing::debug!(timestamp, "Timestamp collision, bumping by 1 ms");
            timestamp += 1;
        }
        LAST_ISSUED_MILLIS.fetch_max(timestamp, Ordering::SeqCst);

        let note = new.into_note(generate_id(timestamp), timestamp);
        let encoded = self.encode(&note)?;
        if encoded.len() as u64 > self.max_file_bytes() {
            return Err(Error::InvalidInput(format!(
                "note file would be {} bytes; the limit is {}",
                encoded.len(),
                self.max_file_bytes()
            )));
        }

        let path = self.paths.note_path(note.id.as_str(), note.timestamp);
        self.port.write_atomic(&path, &encoded)?;
        Ok(note)
    }

    /// Rewrites a stored note in place.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn rewrite(&self, stored: &StoredNote) -> Result<()> {
        let encoded = self.encode(&stored.note)?;
        self.port.write_atomic(&stored.path, &encoded)
    }

    /// Deletes a note by id. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete_by_id(&self, id: &NoteId) -> Result<bool> {
        match self.get_by_id(id)? {
            Some(stored) => self.port.remove_file(&stored.path),
            None => Ok(false),
        }
    }

    fn encode(&self, note: &Note) -> Result<Vec<u8>> {
        if self.settings.pretty_json {
            serde_json::to_vec_pretty(note)
        } else {
            serde_json::to_vec(note)
        }
        .map_err(|e| Error::failed("serialize_note", e))
    }
}

/// Returns `now`, or one past the last timestamp issued by this process.
fn next_monotonic_millis(now: u64) -> u64 {
    let last = LAST_ISSUED_MILLIS.load(Ordering::SeqCst);
    if now > last { now } else { last + 1 }
}

/// Builds `note-<timestamp>-<base36 random>`.
// Truncation to the low 64 bits is intended.
#[allow(clippy::cast_possible_truncation)]
fn generate_id(timestamp: u64) -> NoteId {
    // Low 64 bits of a v4 UUID are random apart from the variant bits.
    let random = uuid::Uuid::new_v4().as_u128() as u64;
    NoteId::new(format!("note-{timestamp}-{}", to_base36(random)))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
