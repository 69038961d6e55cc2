//! Structural invariant checks for documents.
//!
//! Reports violations without modifying the document. The mutation API never
//! produces any of these; the checker exists for documents built from
//! external data (project import) and for tests.

use crate::id::ComponentId;
use crate::model::Document;
use std::collections::HashSet;

// ─── Violation types ─────────────────────────────────────────────────────

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The component the violation refers to.
    pub component_id: ComponentId,
    /// Human-readable message.
    pub message: String,
    /// Short rule identifier (e.g. "dangling-child", "cycle").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run every invariant rule over the document and return the violations.
#[must_use]
pub fn check_invariants(doc: &Document) -> Vec<InvariantViolation> {
    let mut out = Vec::new();
    check_id_index(doc, &mut out);
    check_roots(doc, &mut out);
    check_links(doc, &mut out);
    check_acyclic(doc, &mut out);
    out
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// `all_ids` is exactly the key set of `by_id`.
fn check_id_index(doc: &Document, out: &mut Vec<InvariantViolation>) {
    let store = &doc.components;
    let mut seen = HashSet::new();
    for id in &store.all_ids {
        if !seen.insert(*id) {
            out.push(violation(*id, "duplicate-id", format!("`{id}` appears twice in allIds")));
        }
        if !store.by_id.contains_key(id) {
            out.push(violation(*id, "unindexed-id", format!("`{id}` is listed but has no record")));
        }
    }
    for id in store.by_id.keys() {
        if !seen.contains(id) {
            out.push(violation(
                *id,
                "unlisted-record",
                format!("`{id}` has a record but is not listed"),
            ));
        }
    }
}

/// `id ∈ root_ids ⇔ parent_id = None`.
fn check_roots(doc: &Document, out: &mut Vec<InvariantViolation>) {
    let store = &doc.components;
    let roots: HashSet<ComponentId> = store.root_ids.iter().copied().collect();
    if roots.len() != store.root_ids.len()
        && let Some(first) = store.root_ids.first()
    {
        out.push(violation(*first, "duplicate-root", "rootIds contains duplicates".into()));
    }
    for (id, component) in &store.by_id {
        let listed = roots.contains(id);
        match (component.parent_id.is_none(), listed) {
            (true, false) => out.push(violation(
                *id,
                "missing-root",
                format!("parentless `{id}` is not in rootIds"),
            )),
            (false, true) => out.push(violation(
                *id,
                "stray-root",
                format!("`{id}` has a parent but is in rootIds"),
            )),
            _ => {}
        }
    }
    for id in &store.root_ids {
        if !store.by_id.contains_key(id) {
            out.push(violation(*id, "dangling-root", format!("rootIds references unknown `{id}`")));
        }
    }
}

/// Parent and child links agree in both directions, child lists are unique
/// and only reference existing components.
fn check_links(doc: &Document, out: &mut Vec<InvariantViolation>) {
    let store = &doc.components;
    for (id, component) in &store.by_id {
        if let Some(parent) = component.parent_id {
            match store.by_id.get(&parent) {
                None => out.push(violation(
                    *id,
                    "dangling-parent",
                    format!("`{id}` points at unknown parent `{parent}`"),
                )),
                Some(p) if !p.child_ids.contains(id) => out.push(violation(
                    *id,
                    "unlinked-child",
                    format!("`{id}` is missing from `{parent}`.childIds"),
                )),
                Some(_) => {}
            }
        }

        let mut seen = HashSet::new();
        for child in &component.child_ids {
            if !seen.insert(*child) {
                out.push(violation(
                    *id,
                    "duplicate-child",
                    format!("`{child}` listed twice under `{id}`"),
                ));
            }
            match store.by_id.get(child) {
                None => out.push(violation(
                    *id,
                    "dangling-child",
                    format!("`{id}` lists unknown child `{child}`"),
                )),
                Some(c) if c.parent_id != Some(*id) => out.push(violation(
                    *child,
                    "misparented-child",
                    format!("`{child}` is listed under `{id}` but names another parent"),
                )),
                Some(_) => {}
            }
        }
    }
}

/// No component is its own ancestor.
fn check_acyclic(doc: &Document, out: &mut Vec<InvariantViolation>) {
    let store = &doc.components;
    for (id, component) in &store.by_id {
        let mut visited = HashSet::from([*id]);
        let mut current = component.parent_id;
        while let Some(parent) = current {
            if !visited.insert(parent) {
                if parent == *id {
                    out.push(violation(*id, "cycle", format!("`{id}` is its own ancestor")));
                }
                break;
            }
            current = store.by_id.get(&parent).and_then(|p| p.parent_id);
        }
    }
}

fn violation(component_id: ComponentId, rule: &'static str, message: String) -> InvariantViolation {
    InvariantViolation {
        component_id,
        message,
        rule,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────
