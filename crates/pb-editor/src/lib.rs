//! Editing layer for page-builder documents.
//!
//! [`EditorSession`] is the entry point: it wraps a [`pb_core::Document`]
//! with undo/redo, selection, clipboard, debounced edits, and drag-and-drop
//! placement.

pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod drag;
pub mod history;
pub mod selection;
pub mod session;

pub use clipboard::{Clipboard, ClipboardOperation};
pub use config::EditorConfig;
pub use debounce::{DebounceTicket, Debouncer};
pub use drag::{
    DragEngine, DragItem, DragOutcome, DragSource, DropIntent, DropPlacement, DropTarget,
};
pub use history::History;
pub use selection::Selection;
pub use session::{EditorSession, Mutation, ZOrder};
