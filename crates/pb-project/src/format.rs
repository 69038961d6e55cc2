//! The serialized project transfer format.
//!
//! Field names are camelCase and stable within a format version. Component
//! trees are flattened: each page lists its components as an array and
//! links them by id through `parentId` / `childIds`.

use chrono::{DateTime, Utc};
use pb_core::{ComponentId, ComponentInstance, GridSettings, Viewport};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a page or an export.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedProject {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub exported_at: DateTime<Utc>,
    pub pages: Vec<SerializedPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPage {
    pub id: String,
    pub name: String,
    pub path: String,
    pub components: Vec<ComponentInstance>,
    /// Canvas order of the parentless components. Older exports omit it and
    /// fall back to array order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_ids: Option<Vec<ComponentId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl SerializedProject {
    pub fn component_count(&self) -> usize {
        self.pages.iter().map(|p| p.components.len()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
