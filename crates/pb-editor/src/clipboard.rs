//! Copy / cut / paste of component subtrees.
//!
//! The clipboard stores detached copies. Pasting remaps every copy through a
//! fresh id map, the same path duplicate takes, so repeated pastes never
//! collide with each other or with the originals.

use pb_core::remap::{capture_subtree, fresh_id_map, remap_components};
use pb_core::{ComponentId, ComponentInstance, Document, query};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipboardOperation {
    #[default]
    None,
    Copy,
    Cut,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    operation: ClipboardOperation,
    /// One entry per captured subtree, root first.
    subtrees: Vec<Vec<ComponentInstance>>,
    /// Pastes since the last capture; drives the cascading offset.
    paste_count: u32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the subtrees rooted at `ids`. Ids nested under another
    /// captured id are covered by that subtree and skipped. Returns the ids
    /// actually captured, in `ids` order.
    pub fn capture(
        &mut self,
        doc: &Document,
        ids: &[ComponentId],
        operation: ClipboardOperation,
    ) -> Vec<ComponentId> {
        let tops = top_most(doc, ids);
        if tops.is_empty() {
            return tops;
        }
        self.subtrees = tops.iter().map(|id| capture_subtree(doc, *id)).collect();
        self.operation = operation;
        self.paste_count = 0;
        log::debug!("clipboard: {operation:?} {} subtree(s)", tops.len());
        tops
    }

    /// Insert a fresh-id copy of every stored subtree into `doc`, each under
    /// its original parent when that parent still exists, otherwise at root
    /// level. Roots are offset by `offset × (paste number)`. Returns the new
    /// root ids. A cut clipboard empties after its first paste.
    pub fn paste(&mut self, doc: &mut Document, offset: f64) -> Vec<ComponentId> {
        if self.operation == ClipboardOperation::None {
            return Vec::new();
        }
        self.paste_count += 1;
        let delta = offset * f64::from(self.paste_count);

        let mut pasted = Vec::with_capacity(self.subtrees.len());
        for subtree in &self.subtrees {
            let Some(original) = subtree.first() else {
                continue;
            };
            let parent = original.parent_id.filter(|p| doc.contains(*p));
            let map = fresh_id_map(subtree);
            let mut copies = remap_components(subtree, &map);
            copies[0].position = copies[0].position.offset(delta, delta);
            if let Some(root) = doc.insert_subtree(copies, parent, None) {
                pasted.push(root);
            }
        }

        if self.operation == ClipboardOperation::Cut {
            self.clear();
        }
        pasted
    }

    pub fn clear(&mut self) {
        self.operation = ClipboardOperation::None;
        self.subtrees.clear();
        self.paste_count = 0;
    }

    pub fn operation(&self) -> ClipboardOperation {
        self.operation
    }

    /// Stored subtrees, each root first.
    pub fn subtrees(&self) -> &[Vec<ComponentInstance>] {
        &self.subtrees
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }
}

/// Keep the existing ids of `ids` that have no ancestor in `ids`.
fn top_most(doc: &Document, ids: &[ComponentId]) -> Vec<ComponentId> {
    let mut out: Vec<ComponentId> = Vec::new();
    for id in ids {
        if !doc.contains(*id) || out.contains(id) {
            continue;
        }
        let nested = ids
            .iter()
            .any(|other| other != id && query::is_ancestor(doc, *other, *id));
        if !nested {
            out.push(*id);
        }
    }
    out
}
