//! Selection, hover, and focus state.
//!
//! All three are plain references into a [`Document`]; ids the document does
//! not contain are ignored on the way in and pruned after undo/redo.

use pb_core::{ComponentId, Document};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Ordered; the first entry is the primary selection.
    selected: Vec<ComponentId>,
    hovered: Option<ComponentId>,
    focused: Option<ComponentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-select replaces the set; `multi` toggles membership.
    /// `None` clears a single selection and is ignored in multi mode.
    pub fn select(&mut self, doc: &Document, id: Option<ComponentId>, multi: bool) {
        let Some(id) = id else {
            if !multi {
                self.selected.clear();
            }
            return;
        };
        if !doc.contains(id) {
            log::debug!("select: {id} not found, ignoring");
            return;
        }
        if multi {
            if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                self.selected.remove(pos);
            } else {
                self.selected.push(id);
            }
        } else {
            self.selected = vec![id];
        }
    }

    /// Replace the selection with the known ids of `ids`, in order, without
    /// duplicates.
    pub fn select_many(&mut self, doc: &Document, ids: impl IntoIterator<Item = ComponentId>) {
        self.selected.clear();
        for id in ids {
            if doc.contains(id) && !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn set_hovered(&mut self, doc: &Document, id: Option<ComponentId>) {
        self.hovered = id.filter(|id| doc.contains(*id));
    }

    pub fn set_focused(&mut self, doc: &Document, id: Option<ComponentId>) {
        self.focused = id.filter(|id| doc.contains(*id));
    }

    pub fn selected(&self) -> &[ComponentId] {
        &self.selected
    }

    pub fn primary(&self) -> Option<ComponentId> {
        self.selected.first().copied()
    }

    pub fn hovered(&self) -> Option<ComponentId> {
        self.hovered
    }

    pub fn focused(&self) -> Option<ComponentId> {
        self.focused
    }

    pub fn is_selected(&self, id: ComponentId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop every reference the document no longer contains.
    pub fn retain_existing(&mut self, doc: &Document) {
        self.selected.retain(|id| doc.contains(*id));
        self.hovered = self.hovered.filter(|id| doc.contains(*id));
        self.focused = self.focused.filter(|id| doc.contains(*id));
    }
}
