//! `NoteService` integration tests.
//!
//! Exercises the store end to end against throwaway git repositories:
//! - Save/read round trip and on-disk layout
//! - Anchor containment and aggregated validation
//! - Path matching with ambient notes
//! - Review marking, deletion and corruption tolerance
//! - Configuration drift repair

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use anchorage::config::{ConfigUpdate, LimitsUpdate, StorageUpdate, TagSettingsUpdate};
use anchorage::services::ValidationErrorKind;
use anchorage::{Error, MatchKind, NoteService, SaveNoteRequest, StoreConfig};
use git2::Repository;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a git repository with a few source files and opens its store.
fn create_repo() -> (TempDir, NoteService) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    Repository::init(dir.path()).expect("Failed to init git repo");
    for file in ["src/net/client.rs", "src/lib.rs", "docs/guide.md"] {
        write_file(dir.path(), file, "// placeholder\n");
    }
    let service = NoteService::open(dir.path()).expect("Failed to open store");
    (dir, service)
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn validation_kinds(err: &Error) -> Vec<ValidationErrorKind> {
    match err {
        Error::Validation(errors) => errors.errors().iter().map(|e| e.kind()).collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ============================================================================
// Round Trip & Layout
// ============================================================================

#[test]
fn test_round_trip_preserves_every_field() {
    let (_dir, service) = create_repo();

    let saved = service
        .save_note(
            SaveNoteRequest::new("Retries belong to the caller", ["src/net/client.rs"], "main")
                .with_tag("networking")
                .with_metadata("author", json!("dana"))
                .reviewed(true)
                .with_cell([1, 2]),
        )
        .unwrap();

    let loaded = service.get_note_by_id(saved.id.as_str()).unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.metadata["author"], json!("dana"));
    assert_eq!(loaded.cell_coordinates, Some([1, 2]));
}

#[test]
fn test_note_too_large_to_read_back_is_rejected() {
    let (_dir, service) = create_repo();
    let request = SaveNoteRequest::new("Small body", ["src"], "main")
        .with_metadata("blob", json!("x".repeat(2 * 1024 * 1024)));

    let err = service.save_note(request).unwrap_err();
    assert_eq!(validation_kinds(&err), vec![ValidationErrorKind::NoteTooLarge]);
    assert!(service.list_notes().unwrap().is_empty());

    // A lowered file limit applies to content that is otherwise within bounds.
    service
        .update_configuration(ConfigUpdate {
            storage: Some(StorageUpdate {
                max_note_file_bytes: Some(512),
                ..StorageUpdate::default()
            }),
            ..ConfigUpdate::default()
        })
        .unwrap();
    let err = service
        .save_note(SaveNoteRequest::new("y".repeat(1000), ["src"], "main"))
        .unwrap_err();
    assert_eq!(validation_kinds(&err), vec![ValidationErrorKind::NoteTooLarge]);

    let saved = service
        .save_note(SaveNoteRequest::new("fits", ["src"], "main"))
        .unwrap();
    assert_eq!(service.get_note_by_id(saved.id.as_str()).unwrap(), Some(saved));
}

#[test]
fn test_note_file_is_date_sharded_inside_data_dir() {
    let (_dir, service) = create_repo();
    let note = service
        .save_note(SaveNoteRequest::new("Body", ["src"], "main"))
        .unwrap();

    let path = service.paths().note_path(note.id.as_str(), note.timestamp);
    assert!(path.exists());
    assert!(path.starts_with(service.root().join(".anchorage").join("notes")));

    let raw = fs::read_to_string(path).unwrap();
    assert!(raw.contains("\"viewId\": \"main\""));
}

#[test]
fn test_store_is_shared_by_nested_openers() {
    let (dir, service) = create_repo();
    service
        .save_note(SaveNoteRequest::new("Shared", ["docs"], "main"))
        .unwrap();

    let nested = NoteService::open(dir.path().join("src/net")).unwrap();
    assert_eq!(nested.root(), service.root());
    assert_eq!(nested.list_notes().unwrap().len(), 1);
}

#[test]
fn test_open_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let err = NoteService::open(dir.path()).err().unwrap();
    assert!(matches!(err, Error::RepositoryNotFound { .. }));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_anchor_outside_root_is_rejected_and_nothing_persisted() {
    let (dir, service) = create_repo();
    let outside = dir.path().parent().unwrap().join("elsewhere.rs");

    for anchor in ["../escape.rs", outside.to_str().unwrap()] {
        let err = service
            .save_note(SaveNoteRequest::new("Body", [anchor], "main"))
            .unwrap_err();
        assert_eq!(
            validation_kinds(&err),
            vec![ValidationErrorKind::AnchorEscapesRepository]
        );
    }
    assert!(service.list_notes().unwrap().is_empty());
}

#[test]
fn test_absolute_anchor_inside_root_is_relativized() {
    let (_dir, service) = create_repo();
    let absolute = service.root().join("src/lib.rs");

    let note = service
        .save_note(SaveNoteRequest::new("Body", [absolute.to_str().unwrap()], "main"))
        .unwrap();
    assert_eq!(note.anchors, vec!["src/lib.rs"]);
}

#[test]
fn test_relative_anchor_resolves_against_cwd() {
    let (_dir, service) = create_repo();
    let note = service
        .save_note(
            SaveNoteRequest::new("Body", ["./client.rs", "../lib.rs"], "main").with_cwd("src/net"),
        )
        .unwrap();
    assert_eq!(note.anchors, vec!["src/net/client.rs", "src/lib.rs"]);
}

#[test]
fn test_all_violations_are_reported_together() {
    let (_dir, service) = create_repo();
    service
        .update_configuration(ConfigUpdate {
            limits: Some(LimitsUpdate {
                max_content_length: Some(10),
                max_tags: Some(1),
                max_anchors: Some(1),
                ..LimitsUpdate::default()
            }),
            ..ConfigUpdate::default()
        })
        .unwrap();

    let err = service
        .save_note(
            SaveNoteRequest::new("This content is too long", ["src", "docs"], "main")
                .with_tag("a")
                .with_tag("b"),
        )
        .unwrap_err();

    let kinds = validation_kinds(&err);
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&ValidationErrorKind::ContentTooLong));
    assert!(kinds.contains(&ValidationErrorKind::TooManyAnchors));
    assert!(kinds.contains(&ValidationErrorKind::TooManyTags));
    assert!(err.to_string().contains("; "));
}

#[test]
fn test_tag_enforcement_once_a_tag_is_described() {
    let (_dir, service) = create_repo();
    service
        .update_configuration(ConfigUpdate {
            tags: Some(TagSettingsUpdate {
                enforce: Some(true),
            }),
            ..ConfigUpdate::default()
        })
        .unwrap();

    // No described tags yet: anything goes.
    service
        .save_note(SaveNoteRequest::new("Body", ["src"], "main").with_tag("adhoc"))
        .unwrap();

    service.save_tag_description("security", "Auth and secrets").unwrap();
    let err = service
        .save_note(SaveNoteRequest::new("Body", ["src"], "main").with_tag("adhoc"))
        .unwrap_err();
    assert_eq!(validation_kinds(&err), vec![ValidationErrorKind::UndescribedTag]);

    service
        .save_note(SaveNoteRequest::new("Body", ["src"], "main").with_tag("security"))
        .unwrap();
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_query_equal_to_anchor_has_distance_zero() {
    let (_dir, service) = create_repo();
    service
        .save_note(SaveNoteRequest::new("Client", ["src/net/client.rs"], "main"))
        .unwrap();

    let ranked = service.get_notes_for_path("src/net/client.rs", false).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].distance, 0);
    assert_eq!(ranked[0].kind, MatchKind::Anchor);
}

#[test]
fn test_bidirectional_matching_and_ambient_depth() {
    let (_dir, service) = create_repo();
    service
        .save_note(SaveNoteRequest::new("Directory note", ["src/net"], "main"))
        .unwrap();
    service
        .save_note(SaveNoteRequest::new("Overview", ["docs/guide.md"], "main"))
        .unwrap();

    // Query below the anchor.
    let ranked = service.get_notes_for_path("src/net/client.rs", false).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].note.content, "Directory note");

    // Query above the anchor.
    assert_eq!(service.get_notes_for_path("src", false).unwrap().len(), 1);

    // Unrelated query inside the repository.
    assert!(service.get_notes_for_path("src/lib.rs", false).unwrap().is_empty());
    let ambient = service.get_notes_for_path("src/lib.rs", true).unwrap();
    assert_eq!(ambient.len(), 2);
    assert!(ambient.iter().all(|r| r.kind == MatchKind::Ambient && r.distance == 2));
    // Ties are newest first.
    assert_eq!(ambient[0].note.content, "Overview");
}

#[test]
fn test_query_outside_repository_has_no_ambient_notes() {
    let (dir, service) = create_repo();
    service
        .save_note(SaveNoteRequest::new("Note", ["src/lib.rs"], "main"))
        .unwrap();

    let sibling = dir.path().parent().unwrap().join("other-project");
    let ranked = service
        .get_notes_for_path(sibling.to_str().unwrap(), true)
        .unwrap();
    assert!(ranked.is_empty());
}

// ============================================================================
// Review, Deletion, Corruption
// ============================================================================

#[test]
fn test_mark_reviewed_and_delete() {
    let (_dir, service) = create_repo();
    let note = service
        .save_note(SaveNoteRequest::new("Body", ["src"], "main"))
        .unwrap();

    let reviewed = service.mark_reviewed(note.id.as_str()).unwrap().unwrap();
    assert!(reviewed.reviewed);
    assert_eq!(reviewed.content, note.content);

    assert!(service.delete_note_by_id(note.id.as_str()).unwrap());
    assert!(!service.delete_note_by_id(note.id.as_str()).unwrap());
    assert!(service.get_note_by_id(note.id.as_str()).unwrap().is_none());
    assert!(service.mark_reviewed(note.id.as_str()).unwrap().is_none());
}

#[test]
fn test_corrupt_note_does_not_hide_others() {
    let (_dir, service) = create_repo();
    service
        .save_note(SaveNoteRequest::new("Healthy", ["src"], "main"))
        .unwrap();

    let broken = service.paths().notes_dir().join("1999/12/note-broken.json");
    fs::create_dir_all(broken.parent().unwrap()).unwrap();
    fs::write(&broken, "{\"id\": \"note-broken\", ").unwrap();

    let notes = service.list_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "Healthy");
    assert_eq!(service.get_notes_for_path("src", false).unwrap().len(), 1);
}

#[test]
fn test_stale_anchor_check() {
    let (dir, service) = create_repo();
    let note = service
        .save_note(SaveNoteRequest::new("Body", ["src/lib.rs", "src/old.rs"], "main"))
        .unwrap();
    fs::remove_file(dir.path().join("src/lib.rs")).unwrap();

    let stale = service.check_stale_anchors().unwrap();
    let anchors: Vec<_> = stale.iter().map(|s| s.anchor.as_str()).collect();
    assert_eq!(anchors, vec!["src/lib.rs", "src/old.rs"]);
    assert!(stale.iter().all(|s| s.note_id == note.id));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_configuration_drift_is_repaired() {
    let (_dir, service) = create_repo();
    let config_path = service.paths().config_path();
    fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    fs::write(&config_path, r#"{ "limits": { "maxTags": 2 }, "tools": { "coverage": false } }"#)
        .unwrap();

    let config = service.get_configuration().unwrap();
    assert_eq!(config.limits.max_tags, 2);
    assert_eq!(config.limits.max_anchors, StoreConfig::default().limits.max_anchors);
    assert!(!service.is_tool_enabled("coverage").unwrap());
    assert!(service.is_tool_enabled("save_note").unwrap());

    fs::write(&config_path, "not json").unwrap();
    assert_eq!(service.get_configuration().unwrap(), StoreConfig::default());

    fs::write(&config_path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();
    assert!(service.get_notes_for_path("src", true).is_ok());
    assert_eq!(service.get_configuration().unwrap(), StoreConfig::default());

    let reset = service.reset_configuration().unwrap();
    assert_eq!(reset, StoreConfig::default());
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn test_view_statistics() {
    let (_dir, service) = create_repo();
    let view_path = service.paths().view_path("main");
    fs::create_dir_all(view_path.parent().unwrap()).unwrap();
    fs::write(
        &view_path,
        r#"{
            "id": "main",
            "name": "Architecture",
            "cells": [
                { "row": 0, "col": 0, "label": "Network", "patterns": ["src/net/**"] },
                { "row": 0, "col": 1, "label": "Docs", "patterns": ["docs/**"] }
            ]
        }"#,
    )
    .unwrap();

    service
        .save_note(SaveNoteRequest::new("A", ["src/net/client.rs"], "main"))
        .unwrap();
    service
        .save_note(SaveNoteRequest::new("B", ["docs/guide.md"], "main"))
        .unwrap();
    service
        .save_note(SaveNoteRequest::new("C", ["src/lib.rs"], "main"))
        .unwrap();

    let stats = service.view_statistics("main").unwrap().unwrap();
    assert_eq!(stats.total_notes, 3);
    assert_eq!(stats.cells[0].note_count, 1);
    assert_eq!(stats.cells[1].note_count, 1);
    assert_eq!(stats.unassigned, 1);

    assert!(service.view_statistics("unknown").unwrap().is_none());
}
