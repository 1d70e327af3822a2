//! Spatial view documents.
//!
//! Views are owned by an external editor. Anchorage only reads them to
//! report how notes distribute over a view's cells.

use super::CellCoordinates;
use serde::{Deserialize, Serialize};

/// One cell of a view grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCell {
    /// Grid row.
    pub row: u32,
    /// Grid column.
    pub col: u32,
    /// Human label.
    #[serde(default)]
    pub label: String,
    /// Glob patterns (root-relative) describing the code this cell covers.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ViewCell {
    /// Returns the cell position.
    #[must_use]
    pub const fn coordinates(&self) -> CellCoordinates {
        [self.row, self.col]
    }
}

/// A view document, read from `views/<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// View identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Cells of the grid.
    #[serde(default)]
    pub cells: Vec<ViewCell>,
}

/// Note count for a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStatistics {
    /// Cell position.
    pub coordinates: CellCoordinates,
    /// Cell label.
    pub label: String,
    /// Notes assigned to the cell.
    pub note_count: usize,
}

/// How the notes of a view distribute over its cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatistics {
    /// View identifier.
    pub view_id: String,
    /// Notes referencing the view.
    pub total_notes: usize,
    /// Per-cell counts in view order.
    pub cells: Vec<CellStatistics>,
    /// Notes that could not be placed in any cell.
    pub unassigned: usize,
}
