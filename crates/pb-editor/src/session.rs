//! The editing session.
//!
//! [`EditorSession`] owns one document together with its history, selection,
//! clipboard, drag engine, and pending debounced edit. Hosts construct one
//! per open document and call into it; there is no shared global state.
//!
//! Every structural change goes through the same two steps: capture the
//! document before the change, then record that capture once the change has
//! succeeded. A rejected change records nothing.

use crate::clipboard::{Clipboard, ClipboardOperation};
use crate::config::EditorConfig;
use crate::debounce::{DebounceTicket, Debouncer};
use crate::drag::{self, DragEngine, DragItem, DragSource, DropTarget};
use crate::history::History;
use crate::selection::Selection;
use kurbo::Point;
use pb_core::{ComponentDraft, ComponentId, ComponentPatch, Document, Position};
use std::time::Instant;

const ZOOM_MIN: f64 = 0.1;
const ZOOM_MAX: f64 = 8.0;

/// A change a host can request as data, e.g. from a command palette or a
/// scripted replay.
#[derive(Debug, Clone)]
pub enum Mutation {
    Add {
        draft: ComponentDraft,
    },
    Update {
        id: ComponentId,
        patch: ComponentPatch,
        debounced: bool,
    },
    Delete {
        id: ComponentId,
    },
    Move {
        id: ComponentId,
        parent: Option<ComponentId>,
        index: Option<usize>,
        position: Position,
    },
    Duplicate {
        id: ComponentId,
    },
    Reorder {
        id: ComponentId,
        to: ZOrder,
    },
}

/// Z-order steps within a sibling list. Later siblings paint on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Backward,
    Forward,
    ToBack,
    ToFront,
}

pub struct EditorSession {
    document: Document,
    history: History,
    selection: Selection,
    clipboard: Clipboard,
    drag: DragEngine,
    debouncer: Debouncer,
    config: EditorConfig,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let mut document = Document::new();
        document.grid = config.grid;
        Self::with_document(document, config)
    }

    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: History::new(config.history_max_size),
            selection: Selection::new(),
            clipboard: Clipboard::new(),
            drag: DragEngine::new(),
            debouncer: Debouncer::new(config.debounce()),
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn drag(&self) -> &DragEngine {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragEngine {
        &mut self.drag
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.debouncer.is_pending()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && !self.debouncer.is_pending()
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a [`Mutation`]. Returns whether the document changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        match mutation {
            Mutation::Add { draft } => self.add(draft).is_some(),
            Mutation::Update {
                id,
                patch,
                debounced: true,
            } => {
                let known = self.document.contains(id) && !patch.is_empty();
                self.update_debounced(id, patch);
                known
            }
            Mutation::Update { id, patch, .. } => self.update(id, &patch),
            Mutation::Delete { id } => !self.delete(id).is_empty(),
            Mutation::Move {
                id,
                parent,
                index,
                position,
            } => self.move_to(id, parent, index, position),
            Mutation::Duplicate { id } => self.duplicate(id).is_some(),
            Mutation::Reorder { id, to } => self.reorder(id, to),
        }
    }

    /// Insert a component and select it.
    pub fn add(&mut self, draft: ComponentDraft) -> Option<ComponentId> {
        let before = self.begin_step();
        let id = self.document.add_component(draft)?;
        self.commit(before);
        self.selection.select(&self.document, Some(id), false);
        Some(id)
    }

    /// Merge `patch` into `id` and record a history step right away.
    pub fn update(&mut self, id: ComponentId, patch: &ComponentPatch) -> bool {
        let before = self.begin_step();
        if !self.document.update_component(id, patch) {
            return false;
        }
        self.commit(before);
        true
    }

    /// Merge `patch` into `id` now, deferring the history step until the
    /// edits go quiet. Structural patches are recorded immediately and yield
    /// no ticket.
    pub fn update_debounced(
        &mut self,
        id: ComponentId,
        patch: ComponentPatch,
    ) -> Option<DebounceTicket> {
        self.update_debounced_at(id, patch, Instant::now())
    }

    /// [`EditorSession::update_debounced`] with an explicit clock reading.
    pub fn update_debounced_at(
        &mut self,
        id: ComponentId,
        patch: ComponentPatch,
        now: Instant,
    ) -> Option<DebounceTicket> {
        if patch.is_structural() {
            self.update(id, &patch);
            return None;
        }
        if !self.document.contains(id) || patch.is_empty() {
            return None;
        }
        if self.history.is_batching() {
            self.document.update_component(id, &patch);
            return None;
        }
        let doc = &self.document;
        let ticket = self.debouncer.request(now, || doc.clone());
        self.document.update_component(id, &patch);
        Some(ticket)
    }

    /// Timer callback for a debounced edit. Records the pending step only
    /// when `ticket` is the latest one.
    pub fn fire_debounced(&mut self, ticket: DebounceTicket) -> bool {
        match self.debouncer.fire(ticket) {
            Some(before) => self.record_pending(before),
            None => false,
        }
    }

    /// Record the pending debounced step if its quiet period is over.
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(before) => self.record_pending(before),
            None => false,
        }
    }

    /// Record the pending debounced step now.
    pub fn flush_pending(&mut self) -> bool {
        match self.debouncer.take() {
            Some(before) => self.record_pending(before),
            None => false,
        }
    }

    /// Delete `id` with its subtree. Returns the removed ids.
    pub fn delete(&mut self, id: ComponentId) -> Vec<ComponentId> {
        let before = self.begin_step();
        let removed = self.document.delete_component(id);
        if removed.is_empty() {
            return removed;
        }
        self.commit(before);
        self.selection.retain_existing(&self.document);
        removed
    }

    /// Delete every selected component as one history step.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.selected().to_vec();
        if ids.is_empty() {
            return 0;
        }
        let before = self.begin_step();
        let removed: usize = ids.iter().map(|id| self.document.delete_component(*id).len()).sum();
        if removed > 0 {
            self.commit(before);
            self.selection.retain_existing(&self.document);
        }
        removed
    }

    pub fn move_component(
        &mut self,
        id: ComponentId,
        parent: Option<ComponentId>,
        position: Position,
    ) -> bool {
        self.move_to(id, parent, None, position)
    }

    /// Move with an explicit sibling index (see
    /// [`Document::move_component_at`]).
    pub fn move_to(
        &mut self,
        id: ComponentId,
        parent: Option<ComponentId>,
        index: Option<usize>,
        position: Position,
    ) -> bool {
        let before = self.begin_step();
        if !self.document.move_component_at(id, parent, index, position) {
            return false;
        }
        self.commit(before);
        true
    }

    /// Duplicate `id` next to itself and select the copy.
    pub fn duplicate(&mut self, id: ComponentId) -> Option<ComponentId> {
        let before = self.begin_step();
        let copy = self.document.duplicate_component(id, self.config.duplicate_offset)?;
        self.commit(before);
        self.selection.select(&self.document, Some(copy), false);
        Some(copy)
    }

    /// Duplicate every selected component; the copies become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ComponentId> {
        let ids = self.selection.selected().to_vec();
        let before = self.begin_step();
        let copies: Vec<ComponentId> = ids
            .iter()
            .filter_map(|id| self.document.duplicate_component(*id, self.config.duplicate_offset))
            .collect();
        if !copies.is_empty() {
            self.commit(before);
            self.selection.select_many(&self.document, copies.iter().copied());
        }
        copies
    }

    /// Change `id`'s place among its siblings.
    pub fn reorder(&mut self, id: ComponentId, to: ZOrder) -> bool {
        let Some(component) = self.document.get(id) else {
            return false;
        };
        let (parent, position) = (component.parent_id, component.position);
        let siblings = self.document.child_ids_of(parent);
        let Some(current) = siblings.iter().position(|s| *s == id) else {
            return false;
        };
        let last = siblings.len() - 1;
        let target = match to {
            ZOrder::Backward => current.saturating_sub(1),
            ZOrder::Forward => (current + 1).min(last),
            ZOrder::ToBack => 0,
            ZOrder::ToFront => last,
        };
        if target == current {
            return false;
        }
        self.move_to(id, parent, Some(target), position)
    }

    /// Translate every unlocked selected component as one history step.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> bool {
        let ids = self.selection.selected().to_vec();
        let before = self.begin_step();
        let mut moved = false;
        for id in ids {
            let Some(component) = self.document.get(id) else {
                continue;
            };
            if component.locked {
                continue;
            }
            let patch = ComponentPatch {
                position: Some(component.position.offset(dx, dy)),
                ..Default::default()
            };
            moved |= self.document.update_component(id, &patch);
        }
        if moved {
            self.commit(before);
        }
        moved
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: Option<ComponentId>, multi: bool) {
        self.selection.select(&self.document, id, multi);
    }

    pub fn select_many(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.selection.select_many(&self.document, ids);
    }

    /// Select every component in creation order.
    pub fn select_all(&mut self) {
        let ids = self.document.all_ids().to_vec();
        self.selection.select_many(&self.document, ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_hovered(&mut self, id: Option<ComponentId>) {
        self.selection.set_hovered(&self.document, id);
    }

    pub fn set_focused(&mut self, id: Option<ComponentId>) {
        self.selection.set_focused(&self.document, id);
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the selected subtrees. Returns how many were captured.
    pub fn copy(&mut self) -> usize {
        let ids = self.selection.selected().to_vec();
        self.clipboard.capture(&self.document, &ids, ClipboardOperation::Copy).len()
    }

    /// Copy the selected subtrees, then delete them as one history step.
    pub fn cut(&mut self) -> usize {
        let ids = self.selection.selected().to_vec();
        let captured = self.clipboard.capture(&self.document, &ids, ClipboardOperation::Cut);
        if captured.is_empty() {
            return 0;
        }
        let before = self.begin_step();
        for id in &captured {
            self.document.delete_component(*id);
        }
        self.commit(before);
        self.selection.retain_existing(&self.document);
        captured.len()
    }

    /// Insert the clipboard contents and select the pasted roots.
    pub fn paste(&mut self) -> Vec<ComponentId> {
        let before = self.begin_step();
        let pasted = self.clipboard.paste(&mut self.document, self.config.paste_offset);
        if !pasted.is_empty() {
            self.commit(before);
            self.selection.select_many(&self.document, pasted.iter().copied());
        }
        pasted
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        if self.history.is_batching() {
            log::debug!("undo: batch open, ignoring");
            return false;
        }
        self.flush_pending();
        let viewport = self.document.viewport;
        let changed = self.history.undo(&mut self.document);
        if changed {
            self.after_history_jump(viewport);
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        if self.history.is_batching() {
            log::debug!("redo: batch open, ignoring");
            return false;
        }
        self.flush_pending();
        let viewport = self.document.viewport;
        let changed = self.history.redo(&mut self.document);
        if changed {
            self.after_history_jump(viewport);
        }
        changed
    }

    /// Group the following changes into one undo step.
    pub fn begin_batch(&mut self) {
        self.flush_pending();
        self.history.begin_batch(&self.document);
    }

    /// Close a group opened with [`EditorSession::begin_batch`].
    pub fn end_batch(&mut self) -> bool {
        self.history.end_batch(&self.document)
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    /// Start a gesture. Locked components cannot be dragged.
    pub fn start_drag(&mut self, item: DragItem) -> bool {
        if let Some(id) = item.component_id {
            match self.document.get(id) {
                Some(component) if !component.locked => {}
                _ => {
                    log::debug!("drag: {id} missing or locked, ignoring");
                    return false;
                }
            }
        }
        if !self.drag.start_drag(item) {
            return false;
        }
        self.begin_batch();
        true
    }

    /// Feed a pointer move. Canvas drags move the component live.
    pub fn update_drag(&mut self, pointer: Point) -> Option<Point> {
        let ghost = self.drag.update_position(pointer, &self.document.grid)?;
        let dragged = self
            .drag
            .item()
            .filter(|item| item.source == DragSource::Canvas)
            .and_then(|item| item.component_id);
        if let Some(id) = dragged {
            let patch = ComponentPatch {
                position: Some(ghost.into()),
                ..Default::default()
            };
            self.document.update_component(id, &patch);
        }
        Some(ghost)
    }

    /// Finish the gesture over `target`. A valid drop adds the palette item
    /// or moves the canvas item and returns its id; anything else reverts
    /// the gesture. The whole gesture is one undo step.
    pub fn end_drag(&mut self, target: Option<&DropTarget>) -> Option<ComponentId> {
        let outcome = self.drag.end_drag()?;
        let placement = target.and_then(|t| drag::resolve_drop(&self.document, &outcome, t));
        let Some(placement) = placement else {
            log::debug!("drag: no valid drop target, reverting");
            self.revert_gesture(&outcome.item);
            return None;
        };

        let position: Position = placement.position.into();
        let placed = match (outcome.item.source, outcome.item.component_id) {
            (DragSource::Canvas, Some(id)) => self
                .document
                .move_component_at(id, placement.parent, placement.index, position)
                .then_some(id),
            _ => {
                let mut draft = ComponentDraft::new(outcome.item.kind.clone())
                    .at(position.x, position.y)
                    .sized(outcome.item.size.width, outcome.item.size.height);
                draft.parent_id = placement.parent;
                let added = self.document.add_component(draft);
                if let Some(id) = added
                    && placement.index.is_some()
                {
                    self.document
                        .move_component_at(id, placement.parent, placement.index, position);
                }
                added
            }
        };
        match placed {
            Some(id) => {
                self.end_batch();
                self.selection.select(&self.document, Some(id), false);
                Some(id)
            }
            None => {
                self.revert_gesture(&outcome.item);
                None
            }
        }
    }

    /// Abandon the gesture and restore the document. Idempotent.
    pub fn cancel_drag(&mut self) {
        if let Some(outcome) = self.drag.end_drag() {
            self.revert_gesture(&outcome.item);
        }
    }

    fn revert_gesture(&mut self, item: &DragItem) {
        match self.history.abort_batch() {
            Some(start) => self.document = start,
            None => {
                // Nested inside a caller's batch: put the component back.
                if let Some(id) = item.component_id {
                    let patch = ComponentPatch {
                        position: Some(item.origin.into()),
                        ..Default::default()
                    };
                    self.document.update_component(id, &patch);
                }
            }
        }
    }

    // ─── Viewport ───────────────────────────────────────────────────────

    /// Set the viewport zoom. View state is not part of undo history.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        if zoom == self.document.viewport.zoom {
            return false;
        }
        self.document.viewport.zoom = zoom;
        true
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.document.viewport.pan_x += dx;
        self.document.viewport.pan_y += dy;
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Replace the document wholesale (project load). History, selection,
    /// any pending edit, and any gesture are dropped; the clipboard stays.
    pub fn load_document(&mut self, document: Document) {
        self.document = document;
        self.history.clear();
        self.selection = Selection::new();
        self.debouncer.cancel();
        self.drag.cancel_drag();
    }

    /// Start over with an empty document.
    pub fn reset(&mut self) {
        let mut document = Document::new();
        document.grid = self.config.grid;
        self.load_document(document);
    }

    /// Consume the session and keep its document.
    pub fn into_document(self) -> Document {
        self.document
    }

    // ─── Step recording ──────────────────────────────────────────────────

    /// Flush any pending debounced edit and capture the document before a
    /// change. No capture while batching; the batch start covers it.
    fn begin_step(&mut self) -> Option<Document> {
        self.flush_pending();
        (!self.history.is_batching()).then(|| self.document.clone())
    }

    fn commit(&mut self, before: Option<Document>) {
        if let Some(before) = before {
            self.history.push(before);
        }
    }

    fn record_pending(&mut self, before: Document) -> bool {
        if before == self.document {
            return false;
        }
        self.history.push(before);
        true
    }

    fn after_history_jump(&mut self, viewport: pb_core::Viewport) {
        self.document.viewport = viewport;
        self.selection.retain_existing(&self.document);
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
