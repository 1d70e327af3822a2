//! Placement of notes on spatial views.

use crate::models::{CellCoordinates, CellStatistics, Note, View, ViewCell, ViewStatistics};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// A cell together with how well a note's anchors fit it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMatch {
    /// Cell position.
    pub coordinates: CellCoordinates,
    /// Fraction of the note's anchors matched by the cell's patterns.
    pub confidence: f64,
}

fn compile(cell: &ViewCell) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in &cell.patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            },
            Err(e) => tracing::warn!(pattern, error = %e, "Ignoring invalid view cell pattern"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring view cell with unbuildable patterns");
        GlobSet::empty()
    })
}

#[allow(clippy::cast_precision_loss)]
fn confidence(note: &Note, globs: &GlobSet) -> f64 {
    if note.anchors.is_empty() {
        return 0.0;
    }
    let matched = note.anchors.iter().filter(|a| globs.is_match(a.as_str())).count();
    matched as f64 / note.anchors.len() as f64
}

fn best_cell(note: &Note, view: &View, compiled: &[GlobSet]) -> Option<CellMatch> {
    view.cells
        .iter()
        .zip(compiled)
        .map(|(cell, globs)| CellMatch {
            coordinates: cell.coordinates(),
            confidence: confidence(note, globs),
        })
        // First cell wins ties.
        .fold(None, |best: Option<CellMatch>, candidate| match best {
            Some(best) if best.confidence >= candidate.confidence => Some(best),
            _ => Some(candidate),
        })
}

/// Finds the cell whose patterns match the largest share of a note's
/// anchors. Returns `None` for a view without cells.
#[must_use]
pub fn cell_confidence(note: &Note, view: &View) -> Option<CellMatch> {
    let compiled: Vec<GlobSet> = view.cells.iter().map(compile).collect();
    best_cell(note, view, &compiled)
}

/// Counts notes per cell of `view`.
///
/// Only notes whose `view_id` names the view are counted. Explicit cell
/// coordinates win; otherwise the best-matching cell is used when its
/// confidence is above zero. Everything else is unassigned.
#[must_use]
pub fn view_statistics(view: &View, notes: &[Note]) -> ViewStatistics {
    let compiled: Vec<GlobSet> = view.cells.iter().map(compile).collect();
    let mut cells: Vec<CellStatistics> = view
        .cells
        .iter()
        .map(|cell| CellStatistics {
            coordinates: cell.coordinates(),
            label: cell.label.clone(),
            note_count: 0,
        })
        .collect();

    let mut total_notes = 0;
    let mut unassigned = 0;
    for note in notes.iter().filter(|n| n.view_id == view.id) {
        total_notes += 1;
        let target = note.cell_coordinates.or_else(|| {
            best_cell(note, view, &compiled)
                .filter(|m| m.confidence > 0.0)
                .map(|m| m.coordinates)
        });

        match target.and_then(|coords| cells.iter().position(|c| c.coordinates == coords)) {
            Some(index) => cells[index].note_count += 1,
            None => unassigned += 1,
        }
    }

    ViewStatistics {
        view_id: view.id.clone(),
        total_notes,
        cells,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteId;
    use std::collections::BTreeMap;

    fn view() -> View {
        View {
            id: "main".to_string(),
            name: "Main".to_string(),
            cells: vec![
                ViewCell {
                    row: 0,
                    col: 0,
                    label: "Core".to_string(),
                    patterns: vec!["src/core/**".to_string()],
                },
                ViewCell {
                    row: 0,
                    col: 1,
                    label: "Net".to_string(),
                    patterns: vec!["src/net/**".to_string(), "[".to_string()],
                },
            ],
        }
    }

    fn note(view_id: &str, anchors: &[&str], cell: Option<CellCoordinates>) -> Note {
        Note {
            id: NoteId::new("n"),
            content: "c".to_string(),
            anchors: anchors.iter().map(|a| (*a).to_string()).collect(),
            tags: vec![],
            metadata: BTreeMap::new(),
            timestamp: 1,
            reviewed: false,
            view_id: view_id.to_string(),
            cell_coordinates: cell,
        }
    }

    #[test]
    fn test_cell_confidence_is_anchor_fraction() {
        let n = note("main", &["src/net/a.rs", "src/net/b.rs", "docs/x.md"], None);
        let best = cell_confidence(&n, &view()).unwrap();
        assert_eq!(best.coordinates, [0, 1]);
        assert!((best.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_prefers_explicit_coordinates() {
        let notes = vec![
            note("main", &["src/net/a.rs"], Some([0, 0])),
            note("main", &["src/net/a.rs"], None),
            note("main", &["README.md"], None),
            note("main", &["src/core/x.rs"], Some([9, 9])),
            note("other", &["src/core/x.rs"], None),
        ];

        let stats = view_statistics(&view(), &notes);
        assert_eq!(stats.total_notes, 4);
        assert_eq!(stats.cells[0].note_count, 1);
        assert_eq!(stats.cells[1].note_count, 1);
        assert_eq!(stats.unassigned, 2);
    }
}
