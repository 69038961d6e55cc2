//! Project persistence for page-builder documents.
//!
//! - [`export`] turns a [`Project`] into the versioned transfer format.
//! - [`validate`] checks raw payloads and reports findings by severity.
//! - [`migrate`] upgrades older payloads step by step.
//! - [`import`] combines the three and resolves page conflicts.
//! - [`storage`] saves snapshots to key-value stores and project files.

pub mod export;
pub mod format;
pub mod import;
pub mod migrate;
pub mod project;
pub mod storage;
pub mod validate;
pub mod version;

pub use export::{ExportMetadata, export};
pub use format::{Metadata, SerializedPage, SerializedProject};
pub use import::{
    ConflictKind, ConflictRecord, ConflictResolution, ConflictStrategy, ImportMode, ImportOptions,
    ImportResult, import,
};
pub use migrate::{MigrationError, MigrationRegistry, migrate};
pub use project::{Page, Project};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use validate::{Severity, ValidationFinding, has_errors, validate};
pub use version::{CURRENT_VERSION, Version};
