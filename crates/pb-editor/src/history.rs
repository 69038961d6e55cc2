//! Snapshot-based undo/redo history.
//!
//! `past` holds documents older than the live one (newest last), `future`
//! holds redo candidates (next redo last). Every entry is an owned
//! [`Document`] value: cloning a document copies every record, so later
//! edits to the live document can never reach a stored snapshot.
//!
//! Drag gestures use **snapshot batching**: the document is captured when
//! the outermost batch opens, and one step is recorded when it closes if
//! anything changed, so undo reverses the whole gesture at once.

use pb_core::Document;
use std::collections::VecDeque;

/// Undo/redo stacks with batch grouping.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Document>,
    future: Vec<Document>,
    /// Maximum undo depth.
    max_size: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Document captured when the outermost batch opened.
    batch_snapshot: Option<Document>,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(max_size.min(256)),
            future: Vec::new(),
            max_size,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Push a deep copy of `doc` onto `past`, clear `future`, and trim the
    /// oldest entries beyond `max_size`.
    pub fn snapshot(&mut self, doc: &Document) {
        self.push(doc.clone());
    }

    /// Like [`History::snapshot`], taking an already detached copy.
    pub fn push(&mut self, doc: Document) {
        if self.batch_depth > 0 {
            // The batch start snapshot already covers this step.
            return;
        }
        self.past.push_back(doc);
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Install the previous document. Returns false at the empty boundary.
    pub fn undo(&mut self, current: &mut Document) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let live = std::mem::replace(current, previous);
        self.future.push(live);
        true
    }

    /// Re-install the most recently undone document. Returns false at the
    /// empty boundary.
    pub fn redo(&mut self, current: &mut Document) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let live = std::mem::replace(current, next);
        self.past.push_back(live);
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
        true
    }

    /// Start a batch group. The first (outermost) call captures `doc`.
    pub fn begin_batch(&mut self, doc: &Document) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(doc.clone());
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and `doc` differs
    /// from the captured start, one step is recorded. Returns whether a
    /// step was recorded.
    pub fn end_batch(&mut self, doc: &Document) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        match self.batch_snapshot.take() {
            Some(before) if before != *doc => {
                self.push(before);
                true
            }
            _ => false,
        }
    }

    /// Close a batch group without recording it. When the outermost batch
    /// closes, returns the document captured at its start so the caller can
    /// roll back.
    pub fn abort_batch(&mut self) -> Option<Document> {
        if self.batch_depth == 0 {
            return None;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return None;
        }
        self.batch_snapshot.take()
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Stored undo snapshots, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &Document> {
        self.past.iter()
    }

    /// Stored redo snapshots, next redo last.
    pub fn future(&self) -> &[Document] {
        &self.future
    }

    /// Drop all history (e.g. after a project load).
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
