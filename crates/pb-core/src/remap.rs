//! Subtree capture and id remapping.
//!
//! Duplicate, paste, and project import all copy a set of components under
//! fresh ids. They share one rule: build the complete old → new map first,
//! then rewrite every `id`, `parent_id`, and `child_ids` entry through it, so
//! internal links stay consistent no matter the record order.

use crate::id::ComponentId;
use crate::model::{ComponentInstance, Document};
use std::collections::HashMap;

/// Old id → new id.
pub type IdMap = HashMap<ComponentId, ComponentId>;

/// Copy `id` and all of its descendants by value, root first, depth-first
/// pre-order. Empty when `id` is absent.
pub fn capture_subtree(doc: &Document, id: ComponentId) -> Vec<ComponentInstance> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if let Some(component) = doc.get(current) {
            out.push(component.clone());
            stack.extend(component.child_ids.iter().rev().copied());
        }
    }
    out
}

/// Allocate a fresh id for every component in `components`.
pub fn fresh_id_map(components: &[ComponentInstance]) -> IdMap {
    components
        .iter()
        .map(|c| (c.id, ComponentId::generate()))
        .collect()
}

/// Rewrite ids through `map`. References to ids outside the map are left
/// untouched; a subtree root keeps pointing at its original parent until the
/// caller relinks it.
pub fn remap_components(components: &[ComponentInstance], map: &IdMap) -> Vec<ComponentInstance> {
    let lookup = |id: ComponentId| map.get(&id).copied().unwrap_or(id);
    components
        .iter()
        .map(|c| {
            let mut copy = c.clone();
            copy.id = lookup(c.id);
            copy.parent_id = c.parent_id.map(lookup);
            copy.child_ids = c.child_ids.iter().map(|child| lookup(*child)).collect();
            copy
        })
        .collect()
}

/// Capture the subtree at `id` and return it under fresh ids, root first.
pub fn clone_subtree_with_fresh_ids(doc: &Document, id: ComponentId) -> Vec<ComponentInstance> {
    let subtree = capture_subtree(doc, id);
    let map = fresh_id_map(&subtree);
    remap_components(&subtree, &map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentDraft;

    #[test]
    fn capture_is_preorder_and_by_value() {
        let mut doc = Document::new();
        let root = doc.add_component(ComponentDraft::new("Container")).unwrap();
        let a = doc.add_component(ComponentDraft::new("Text").inside(root)).unwrap();
        let b = doc.add_component(ComponentDraft::new("Button").inside(root)).unwrap();
        let a1 = doc.add_component(ComponentDraft::new("Icon").inside(a)).unwrap();

        let captured = capture_subtree(&doc, root);
        let ids: Vec<ComponentId> = captured.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![root, a, a1, b]);

        doc.delete_component(root);
        assert_eq!(captured.len(), 4, "captured copy is detached from the document");
    }

    #[test]
    fn remap_keeps_internal_links() {
        let mut doc = Document::new();
        let outer = doc.add_component(ComponentDraft::new("Container")).unwrap();
        let root = doc.add_component(ComponentDraft::new("Container").inside(outer)).unwrap();
        let child = doc.add_component(ComponentDraft::new("Text").inside(root)).unwrap();

        let copies = clone_subtree_with_fresh_ids(&doc, root);
        assert_eq!(copies.len(), 2);
        let (new_root, new_child) = (&copies[0], &copies[1]);
        assert_ne!(new_root.id, root);
        assert_ne!(new_child.id, child);
        assert_eq!(new_child.parent_id, Some(new_root.id));
        assert_eq!(new_root.child_ids.as_slice(), &[new_child.id]);
        // The root still references the external parent until relinked.
        assert_eq!(new_root.parent_id, Some(outer));
    }

    #[test]
    fn missing_root_captures_nothing() {
        let doc = Document::new();
        assert!(capture_subtree(&doc, ComponentId::intern("ghost_r")).is_empty());
    }
}
