//! Path-to-note matching.

use crate::context::{PathResolver, normalize_lexically};
use crate::models::{MatchKind, Note, RankedNote};
use std::path::{Component, Path, PathBuf};

/// Matches notes against a query path.
///
/// An anchor matches when it equals the query, is an ancestor of it, or is a
/// descendant of it. Matching runs on absolute paths, so a query above the
/// root still finds notes anchored inside it. Notes without a matching
/// anchor are *ambient* when the query lies inside the repository.
#[derive(Debug, Clone, Copy)]
pub struct AnchorMatcher<'a> {
    resolver: &'a PathResolver,
}

impl<'a> AnchorMatcher<'a> {
    /// Creates a matcher for the resolver's repository.
    #[must_use]
    pub const fn new(resolver: &'a PathResolver) -> Self {
        Self { resolver }
    }

    /// Ranks `notes` for a query path.
    ///
    /// Anchor matches have distance 0. Ambient notes are included only when
    /// `include_ambient` is set, at the query's depth below the root. Results
    /// are ordered by distance, then newest first.
    #[must_use]
    pub fn rank(
        &self,
        notes: Vec<Note>,
        query: &str,
        cwd: Option<&Path>,
        include_ambient: bool,
    ) -> Vec<RankedNote> {
        let target = self.resolver.to_absolute(query, cwd);
        let ambient_distance = include_ambient
            .then(|| self.depth_below_root(&target))
            .flatten();

        let mut ranked: Vec<RankedNote> = notes
            .into_iter()
            .filter_map(|note| {
                if self.matches(&note, &target) {
                    Some(RankedNote {
                        note,
                        distance: 0,
                        kind: MatchKind::Anchor,
                    })
                } else {
                    ambient_distance.map(|distance| RankedNote {
                        note,
                        distance,
                        kind: MatchKind::Ambient,
                    })
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| b.note.timestamp.cmp(&a.note.timestamp))
                .then_with(|| a.note.id.cmp(&b.note.id))
        });
        ranked
    }

    /// Returns `true` if any anchor of `note` relates to the absolute `target`.
    #[must_use]
    pub fn matches(&self, note: &Note, target: &Path) -> bool {
        note.anchors.iter().any(|anchor| {
            let anchor = self.anchor_path(anchor);
            target.starts_with(&anchor) || anchor.starts_with(target)
        })
    }

    fn anchor_path(&self, anchor: &str) -> PathBuf {
        normalize_lexically(&self.resolver.absolute_anchor(anchor))
    }

    fn depth_below_root(&self, target: &Path) -> Option<usize> {
        let relative = target.strip_prefix(self.resolver.root()).ok()?;
        Some(
            relative
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count(),
        )
    }
}
