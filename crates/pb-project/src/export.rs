//! Project → transfer format.

use crate::format::{Metadata, SerializedPage, SerializedProject};
use crate::project::{Page, Project};
use crate::version::CURRENT_VERSION;
use chrono::{DateTime, Utc};

/// Optional overrides applied to an export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Defaults to the current time.
    pub exported_at: Option<DateTime<Utc>>,
    pub extra: Option<Metadata>,
}

/// Serialize `project` at [`CURRENT_VERSION`]. Each page's components are
/// flattened in creation order and the root order is kept alongside.
pub fn export(project: &Project, metadata: Option<&ExportMetadata>) -> SerializedProject {
    let meta = metadata.cloned().unwrap_or_default();
    let exported = SerializedProject {
        version: CURRENT_VERSION.to_string(),
        name: meta.name.unwrap_or_else(|| project.name.clone()),
        description: meta.description.unwrap_or_else(|| project.description.clone()),
        exported_at: meta.exported_at.unwrap_or_else(Utc::now),
        pages: project.pages.iter().map(export_page).collect(),
        metadata: meta.extra,
    };
    log::debug!(
        "export: {} page(s), {} component(s)",
        exported.pages.len(),
        exported.component_count()
    );
    exported
}

pub fn export_page(page: &Page) -> SerializedPage {
    SerializedPage {
        id: page.id.clone(),
        name: page.name.clone(),
        path: page.path.clone(),
        components: page.document.iter().cloned().collect(),
        root_ids: Some(page.document.root_ids().to_vec()),
        viewport: Some(page.document.viewport),
        grid: Some(page.document.grid),
        metadata: page.metadata.clone(),
    }
}
