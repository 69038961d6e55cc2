//! Structural edits on a [`Document`].
//!
//! Every operation either completes with all five store invariants intact or
//! leaves the document untouched. Operations on ids that are not in the
//! document, and moves that would create a cycle, are silent no-ops reported
//! through the return value, so stale UI callbacks can never corrupt state.

use crate::id::ComponentId;
use crate::model::{ChildIds, ComponentDraft, ComponentInstance, ComponentPatch, Document, Position};
use crate::query;
use crate::remap;
use chrono::Utc;
use std::collections::HashSet;

/// Name suffix given to the root of a duplicated subtree.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Default translation applied to a duplicated subtree root.
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 20.0;

impl Document {
    /// Insert a new component. Returns its id, or `None` when the draft names
    /// a parent that does not exist.
    pub fn add_component(&mut self, draft: ComponentDraft) -> Option<ComponentId> {
        if let Some(parent) = draft.parent_id
            && !self.contains(parent)
        {
            log::debug!("add: parent {parent} not found, ignoring");
            return None;
        }

        let now = Utc::now();
        let id = ComponentId::generate();
        let name = draft.name.unwrap_or_else(|| draft.kind.clone());
        let component = ComponentInstance {
            id,
            kind: draft.kind,
            name,
            parent_id: draft.parent_id,
            child_ids: ChildIds::new(),
            position: draft.position,
            size: draft.size,
            properties: draft.properties,
            styles: draft.styles,
            locked: draft.locked,
            hidden: draft.hidden,
            created_at: now,
            updated_at: now,
        };
        self.components.by_id.insert(id, component);
        self.components.all_ids.push(id);
        self.link(id, draft.parent_id, None);
        log::trace!("add {id}");
        Some(id)
    }

    /// Shallow-merge `patch` into a component and refresh `updated_at`.
    /// Returns false for unknown ids and empty patches.
    pub fn update_component(&mut self, id: ComponentId, patch: &ComponentPatch) -> bool {
        let Some(component) = self.get_mut(id) else {
            log::debug!("update: {id} not found, ignoring");
            return false;
        };
        if !patch.apply_to(component) {
            return false;
        }
        component.updated_at = Utc::now();
        true
    }

    /// Delete a component and its whole subtree. Returns the removed ids
    /// (descendants first, `id` last); empty when `id` is absent.
    pub fn delete_component(&mut self, id: ComponentId) -> Vec<ComponentId> {
        let Some(parent_id) = self.get(id).map(|c| c.parent_id) else {
            return Vec::new();
        };

        let mut removed = query::descendants(self, id);
        removed.reverse();
        removed.push(id);

        self.unlink(id, parent_id);
        for gone in &removed {
            self.components.by_id.remove(gone);
        }
        let gone: HashSet<ComponentId> = removed.iter().copied().collect();
        self.components.all_ids.retain(|c| !gone.contains(c));
        log::trace!("delete {id} ({} components)", removed.len());
        removed
    }

    /// Re-parent `id` under `new_parent` (`None` = root level), appending it
    /// to the new sibling list, and set its position.
    pub fn move_component(
        &mut self,
        id: ComponentId,
        new_parent: Option<ComponentId>,
        position: Position,
    ) -> bool {
        self.move_component_at(id, new_parent, None, position)
    }

    /// Like [`Document::move_component`] but inserts at `index` in the new
    /// sibling list. The index is interpreted after `id` has been unlinked
    /// and is clamped to the list length.
    ///
    /// Rejected (returns false, nothing changes) when `id` is missing or
    /// locked, or `new_parent` is missing, is `id`, or is a descendant of `id`.
    pub fn move_component_at(
        &mut self,
        id: ComponentId,
        new_parent: Option<ComponentId>,
        index: Option<usize>,
        position: Position,
    ) -> bool {
        if !self.can_move(id, new_parent) {
            return false;
        }
        let old_parent = self.get(id).and_then(|c| c.parent_id);
        self.unlink(id, old_parent);
        if let Some(component) = self.get_mut(id) {
            component.parent_id = new_parent;
            component.position = position;
            component.updated_at = Utc::now();
        }
        self.link(id, new_parent, index);
        log::trace!("move {id} -> {new_parent:?}");
        true
    }

    /// Whether moving `id` under `new_parent` would be accepted.
    pub fn can_move(&self, id: ComponentId, new_parent: Option<ComponentId>) -> bool {
        let Some(component) = self.get(id) else {
            log::debug!("move: {id} not found, ignoring");
            return false;
        };
        if component.locked {
            log::debug!("move: {id} is locked, ignoring");
            return false;
        }
        match new_parent {
            None => true,
            Some(parent) if parent == id || !self.contains(parent) => false,
            Some(parent) => {
                let cycle = query::is_descendant(self, parent, id);
                if cycle {
                    log::debug!("move: {parent} is inside {id}, rejecting cycle");
                }
                !cycle
            }
        }
    }

    /// Clone the subtree at `id` under fresh ids and insert it right after
    /// the original. The clone's root gets [`COPY_SUFFIX`] and is offset by
    /// `(offset, offset)`. Returns the new root id.
    pub fn duplicate_component(&mut self, id: ComponentId, offset: f64) -> Option<ComponentId> {
        let original = self.get(id)?;
        let parent = original.parent_id;
        let index = self
            .child_ids_of(parent)
            .iter()
            .position(|c| *c == id)
            .map(|i| i + 1);

        let mut copies = remap::clone_subtree_with_fresh_ids(self, id);
        if let Some(root) = copies.first_mut() {
            root.name.push_str(COPY_SUFFIX);
            root.position = root.position.offset(offset, offset);
        }
        self.insert_subtree(copies, parent, index)
    }

    /// Insert a detached subtree (root first, already carrying fresh ids)
    /// under `parent` at `index`. Timestamps are refreshed. Returns the root
    /// id, or `None` when the subtree is empty, `parent` is missing, or an id
    /// is already taken.
    pub fn insert_subtree(
        &mut self,
        mut components: Vec<ComponentInstance>,
        parent: Option<ComponentId>,
        index: Option<usize>,
    ) -> Option<ComponentId> {
        let root_id = components.first()?.id;
        if parent.is_some_and(|p| !self.contains(p)) {
            log::debug!("insert: parent {parent:?} not found, ignoring");
            return None;
        }
        if components.iter().any(|c| self.contains(c.id)) {
            log::debug!("insert: id collision in subtree {root_id}, ignoring");
            return None;
        }

        let now = Utc::now();
        for component in &mut components {
            component.created_at = now;
            component.updated_at = now;
        }
        components[0].parent_id = parent;

        for component in components {
            self.components.all_ids.push(component.id);
            self.components.by_id.insert(component.id, component);
        }
        self.link(root_id, parent, index);
        Some(root_id)
    }

    // ─── Linking ─────────────────────────────────────────────────────────

    fn sibling_list_mut(&mut self, parent: Option<ComponentId>) -> Option<&mut ChildIds> {
        match parent {
            Some(p) => self.get_mut(p).map(|c| &mut c.child_ids),
            None => None,
        }
    }

    fn link(&mut self, id: ComponentId, parent: Option<ComponentId>, index: Option<usize>) {
        match parent {
            None => {
                let roots = &mut self.components.root_ids;
                let at = index.map_or(roots.len(), |i| i.min(roots.len()));
                roots.insert(at, id);
            }
            Some(_) => {
                if let Some(list) = self.sibling_list_mut(parent) {
                    let at = index.map_or(list.len(), |i| i.min(list.len()));
                    list.insert(at, id);
                }
            }
        }
    }

    fn unlink(&mut self, id: ComponentId, parent: Option<ComponentId>) {
        match parent {
            None => self.components.root_ids.retain(|c| *c != id),
            Some(_) => {
                if let Some(list) = self.sibling_list_mut(parent) {
                    list.retain(|c| *c != id);
                }
            }
        }
    }
}
