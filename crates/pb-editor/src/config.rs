//! Editor session configuration.

use pb_core::GridSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for an [`EditorSession`](crate::session::EditorSession).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo depth. Oldest steps are discarded first. Default: **100**.
    pub history_max_size: usize,

    /// Quiet period before a debounced property edit records history.
    /// Default: **500 ms**.
    pub debounce_ms: u64,

    /// Translation of a duplicated subtree root. Default: **20**.
    pub duplicate_offset: f64,

    /// Translation of pasted subtree roots, cascading per paste. Default: **20**.
    pub paste_offset: f64,

    /// Grid applied to newly created documents.
    pub grid: GridSettings,
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse a config from JSON, falling back to defaults for missing keys.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_max_size: 100,
            debounce_ms: 500,
            duplicate_offset: pb_core::DEFAULT_DUPLICATE_OFFSET,
            paste_offset: 20.0,
            grid: GridSettings::default(),
        }
    }
}
