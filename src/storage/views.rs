//! Read-only access to spatial view documents.

use super::{StoragePort, StorePaths};
use crate::Result;
use crate::models::{NoteId, View};
use std::sync::Arc;

/// Reads `views/<id>.json`. Views are never written by anchorage.
#[derive(Clone)]
pub struct ViewStore {
    port: Arc<dyn StoragePort>,
    paths: StorePaths,
}

impl ViewStore {
    /// Creates a view store.
    #[must_use]
    pub fn new(port: Arc<dyn StoragePort>, paths: StorePaths) -> Self {
        Self { port, paths }
    }

    /// Loads a view. Unknown ids and unparsable documents yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn get(&self, view_id: &str) -> Result<Option<View>> {
        // View ids follow the same file-name rules as note ids.
        if !NoteId::new(view_id).is_safe_filename() {
            return Ok(None);
        }

        let Some(raw) = self.port.read_to_string(&self.paths.view_path(view_id))? else {
            return Ok(None);
        };

        match serde_json::from_str::<View>(&raw) {
            Ok(view) => Ok(Some(view)),
            Err(e) => {
                tracing::warn!(view_id, error = %e, "Ignoring unparsable view document");
                Ok(None)
            },
        }
    }
}
