//! Property-based tests for path arithmetic and note handling.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Anchor normalization is idempotent
//! - Anchor relation is symmetric
//! - Normalized anchors never escape the root
//! - Tag normalization yields unique, trimmed tags

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use anchorage::context::{PathResolver, depth, relate};
use anchorage::services::normalize_tags;
use proptest::prelude::*;
use std::collections::HashSet;

fn resolver() -> PathResolver {
    PathResolver::new("/repo")
}

/// Relative paths built from a small alphabet, with optional `.`/`..` segments.
fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-c]{1,3}",
            1 => Just(".".to_string()),
            1 => Just("..".to_string()),
        ],
        1..6,
    )
    .prop_map(|segments| segments.join("/"))
}

proptest! {
    /// Property: normalizing an already-normalized anchor is a no-op.
    #[test]
    fn prop_normalization_is_idempotent(path in relative_path()) {
        let resolver = resolver();
        if let Ok(once) = resolver.to_repo_relative(&path, None) {
            let twice = resolver.to_repo_relative(&once, None).unwrap();
            prop_assert_eq!(twice, once);
        }
    }

    /// Property: normalized anchors are root-relative and free of `.`/`..`.
    #[test]
    fn prop_normalized_anchor_stays_inside(path in relative_path()) {
        if let Ok(anchor) = resolver().to_repo_relative(&path, None) {
            prop_assert!(!anchor.starts_with('/'));
            prop_assert!(anchor == "." || anchor.split('/').all(|s| s != "." && s != ".." && !s.is_empty()));
        }
    }

    /// Property: `relate` is symmetric.
    #[test]
    fn prop_relate_is_symmetric(a in "[a-c]{1,2}(/[a-c]{1,2}){0,3}", b in "[a-c]{1,2}(/[a-c]{1,2}){0,3}") {
        prop_assert_eq!(relate(&a, &b), relate(&b, &a));
    }

    /// Property: a path relates to its own descendants and the root relates to everything.
    #[test]
    fn prop_relate_ancestor(parent in "[a-c]{1,2}(/[a-c]{1,2}){0,2}", child in "[a-c]{1,2}") {
        let nested = format!("{parent}/{child}");
        prop_assert!(relate(&parent, &nested));
        prop_assert!(relate(".", &nested));
        prop_assert_eq!(depth(&nested), depth(&parent) + 1);
    }

    /// Property: normalized tags are trimmed, non-empty and unique.
    #[test]
    fn prop_tag_normalization(tags in prop::collection::vec("[ ]{0,2}[a-d]{0,2}[ ]{0,2}", 0..10)) {
        let normalized = normalize_tags(&tags);
        let unique: HashSet<_> = normalized.iter().collect();
        prop_assert_eq!(unique.len(), normalized.len());
        prop_assert!(normalized.iter().all(|t| !t.is_empty() && t.trim() == t));
    }
}
