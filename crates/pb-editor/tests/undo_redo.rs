//! Integration tests: undo/redo through the editing session (pb-editor).
//!
//! Every mutation kind is undone and redone and compared against the exact
//! document before and after it.

use pb_core::*;
use pb_editor::{EditorConfig, EditorSession};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, Instant};

fn seeded() -> (EditorSession, ComponentId, ComponentId) {
    let mut session = EditorSession::default();
    let root = session
        .add(ComponentDraft::new("Container").named("root").sized(400.0, 300.0))
        .unwrap();
    let child = session
        .add(ComponentDraft::new("Text").named("child").inside(root))
        .unwrap();
    (session, root, child)
}

/// Run `mutate`, then check undo restores the state before it and redo the
/// state after it.
fn assert_round_trip(session: &mut EditorSession, mutate: impl FnOnce(&mut EditorSession)) {
    let before = session.document().clone();
    mutate(session);
    let after = session.document().clone();
    assert_ne!(before, after, "mutation should change the document");

    assert!(session.undo());
    assert_eq!(session.document(), &before);
    assert!(session.redo());
    assert_eq!(session.document(), &after);
}

#[test]
fn add_round_trips() {
    let (mut session, root, _) = seeded();
    assert_round_trip(&mut session, |s| {
        s.add(ComponentDraft::new("Button").inside(root));
    });
}

#[test]
fn update_round_trips() {
    let (mut session, _, child) = seeded();
    assert_round_trip(&mut session, |s| {
        s.update(
            child,
            &ComponentPatch {
                properties: Some([("text".to_string(), json!("Hello"))].into()),
                ..Default::default()
            },
        );
    });
}

#[test]
fn delete_round_trips() {
    let (mut session, root, _) = seeded();
    assert_round_trip(&mut session, |s| {
        s.delete(root);
    });
}

#[test]
fn move_round_trips() {
    let (mut session, _, child) = seeded();
    assert_round_trip(&mut session, |s| {
        s.move_component(child, None, Position::new(0.0, 0.0));
    });
}

#[test]
fn duplicate_round_trips() {
    let (mut session, root, _) = seeded();
    assert_round_trip(&mut session, |s| {
        s.duplicate(root);
    });
}

#[test]
fn paste_round_trips() {
    let (mut session, root, _) = seeded();
    session.select(Some(root), false);
    session.copy();
    assert_round_trip(&mut session, |s| {
        s.paste();
    });
}

#[test]
fn undo_at_empty_boundary_is_noop() {
    let mut session = EditorSession::default();
    assert!(!session.undo());
    assert!(!session.redo());
    assert!(session.document().is_empty());
}

#[test]
fn new_change_after_undo_drops_redo() {
    let (mut session, root, _) = seeded();
    session.undo();
    assert!(session.can_redo());
    session.add(ComponentDraft::new("Footer"));
    assert!(!session.can_redo());
    assert!(session.document().contains(root));
}

#[test]
fn history_depth_is_capped() {
    let config = EditorConfig {
        history_max_size: 4,
        ..Default::default()
    };
    let mut session = EditorSession::new(config);
    for _ in 0..10 {
        session.add(ComponentDraft::new("Box"));
    }
    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    assert_eq!(session.document().len(), 6);
}

#[test]
fn stored_snapshots_are_not_aliased() {
    let (mut session, root, child) = seeded();
    let stored: Vec<Document> = session.history().past().cloned().collect();

    session.update(
        child,
        &ComponentPatch {
            name: Some("changed".into()),
            ..Default::default()
        },
    );
    session.delete(root);

    let now: Vec<Document> = session.history().past().take(stored.len()).cloned().collect();
    assert_eq!(now, stored);

    session.undo();
    session.undo();
    let live_name = session.document().get(child).unwrap().name.clone();
    assert_eq!(live_name, "child");
    let redo_has_root: Vec<bool> = session
        .history()
        .future()
        .iter()
        .map(|d| d.contains(root))
        .collect();
    assert_eq!(redo_has_root, vec![false, true]);
}

// ─── Debounced edits ────────────────────────────────────────────────────

#[test]
fn debounced_typing_is_one_undo_step() {
    let (mut session, _, child) = seeded();
    let before = session.document().clone();
    let start = Instant::now();
    let mut last = None;
    for (i, text) in ["H", "He", "Hel", "Hell", "Hello"].iter().enumerate() {
        let patch = ComponentPatch {
            properties: Some([("text".to_string(), json!(text))].into()),
            ..Default::default()
        };
        let now = start + Duration::from_millis(100 * i as u64);
        last = session.update_debounced_at(child, patch, now);
    }
    let steps = session.history().past().count();

    // An early poll does nothing; the quiet period runs from the last edit.
    assert!(!session.poll_debounce(start + Duration::from_millis(600)));
    assert!(session.fire_debounced(last.unwrap()));
    assert_eq!(session.history().past().count(), steps + 1);

    assert_eq!(session.document().get(child).unwrap().properties["text"], json!("Hello"));
    session.undo();
    assert_eq!(session.document(), &before);
}

#[test]
fn stale_ticket_does_not_record() {
    let (mut session, _, child) = seeded();
    let patch = |t: &str| ComponentPatch {
        name: Some(t.to_string()),
        ..Default::default()
    };
    let first = session.update_debounced(child, patch("a")).unwrap();
    let second = session.update_debounced(child, patch("ab")).unwrap();
    let steps = session.history().past().count();

    assert!(!session.fire_debounced(first));
    assert_eq!(session.history().past().count(), steps);
    assert!(session.fire_debounced(second));
    assert_eq!(session.history().past().count(), steps + 1);
}

#[test]
fn structural_change_flushes_pending_edit_first() {
    let (mut session, root, child) = seeded();
    let after_seed = session.document().clone();
    session.update_debounced(
        child,
        ComponentPatch {
            name: Some("typed".into()),
            ..Default::default()
        },
    );
    session.move_component(child, None, Position::new(1.0, 1.0));

    // Undo the move, then the typing, separately.
    session.undo();
    assert_eq!(session.document().get(child).unwrap().parent_id, Some(root));
    assert_eq!(session.document().get(child).unwrap().name, "typed");
    session.undo();
    assert_eq!(session.document(), &after_seed);
}

#[test]
fn undo_while_edit_pending_reverts_the_edit() {
    let (mut session, _, child) = seeded();
    let before = session.document().clone();
    session.update_debounced(
        child,
        ComponentPatch {
            name: Some("draft".into()),
            ..Default::default()
        },
    );
    assert!(session.can_undo());
    assert!(session.undo());
    assert_eq!(session.document(), &before);
}

// ─── Example scenario ───────────────────────────────────────────────────

#[test]
fn add_add_move_to_root_and_back() {
    let mut session = EditorSession::default();
    let root = session.add(ComponentDraft::new("Container").named("root")).unwrap();
    let child = session
        .add(ComponentDraft::new("Text").named("child").inside(root))
        .unwrap();
    assert!(session.move_component(child, None, Position::new(0.0, 0.0)));

    let doc = session.document();
    assert!(doc.get(root).unwrap().child_ids.is_empty());
    assert_eq!(doc.root_ids(), &[root, child]);
    assert!(check_invariants(doc).is_empty());

    session.undo();
    assert_eq!(session.document().get(root).unwrap().child_ids.as_slice(), &[child]);
}
