//! Persistence: key-value snapshots and project files.
//!
//! Key-value entries hold MessagePack-encoded [`SerializedProject`]s
//! (compact, for autosave). Project files are pretty-printed JSON, the
//! human-readable transfer format.

use crate::export::export;
use crate::format::SerializedProject;
use crate::project::Project;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key `{0}`")]
    InvalidKey(String),
}

// ─── Key-value stores ────────────────────────────────────────────────────

/// Byte store addressed by string keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<bool, StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

const ENTRY_EXTENSION: &str = "msgpack";

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.entry_path(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        // Atomic replace.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.entry_path(key)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ─── Project snapshots ───────────────────────────────────────────────────

pub fn save_project(
    store: &mut dyn KeyValueStore,
    key: &str,
    project: &SerializedProject,
) -> Result<(), StorageError> {
    let bytes = rmp_serde::to_vec_named(project)?;
    store.set(key, &bytes)
}

pub fn load_project(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<SerializedProject>, StorageError> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Export and save `project`. Failures are logged and reported as `false`
/// so callers can carry on without the snapshot.
pub fn autosave(store: &mut dyn KeyValueStore, key: &str, project: &Project) -> bool {
    match save_project(store, key, &export(project, None)) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("autosave to `{key}` failed: {e}");
            false
        }
    }
}

// ─── Project files ───────────────────────────────────────────────────────

pub fn write_project_file(path: &Path, project: &SerializedProject) -> Result<(), StorageError> {
    let text = project.to_json_pretty()?;
    fs::write(path, text + "\n")?;
    Ok(())
}

/// Read a project file as raw JSON, ready for [`crate::import`] or
/// [`crate::validate`].
pub fn read_project_file(path: &Path) -> Result<serde_json::Value, StorageError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Page;
    use pb_core::ComponentDraft;
    use pretty_assertions::assert_eq;

    fn sample() -> Project {
        let mut page = Page::new("Home", "/");
        let root = page
            .document
            .add_component(
                ComponentDraft::new("Container").with_style("padding", serde_json::json!(8)),
            )
            .unwrap();
        page.document.add_component(ComponentDraft::new("Text").inside(root));
        let mut project = Project::new("Site");
        project.add_page(page);
        project
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let exported = export(&sample(), None);
        save_project(&mut store, "site", &exported).unwrap();
        assert_eq!(load_project(&store, "site").unwrap(), Some(exported));
        assert_eq!(load_project(&store, "missing").unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("kv")).unwrap();
        assert!(autosave(&mut store, "autosave", &sample()));
        assert_eq!(store.keys().unwrap(), vec!["autosave".to_string()]);

        let loaded = load_project(&store, "autosave").unwrap().unwrap();
        assert_eq!(loaded.component_count(), 2);
        assert!(store.remove("autosave").unwrap());
        assert!(!store.remove("autosave").unwrap());
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(!autosave(&mut store, "../escape", &sample()));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn project_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        let exported = export(&sample(), None);
        write_project_file(&path, &exported).unwrap();

        let value = read_project_file(&path).unwrap();
        assert_eq!(value["version"], serde_json::json!("2.0.0"));
        let decoded: SerializedProject = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, exported);
    }
}
