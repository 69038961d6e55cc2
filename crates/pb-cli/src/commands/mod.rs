pub mod inspect;
pub mod merge;
pub mod migrate;
pub mod validate;

pub use inspect::{InspectArgs, inspect};
pub use merge::{MergeArgs, merge};
pub use migrate::{MigrateArgs, migrate};
pub use validate::{ValidateArgs, validate};

use anyhow::{Context, Result};
use pb_project::{ImportMode, ImportOptions, Project, storage};
use std::path::Path;

/// Read `path` as JSON.
pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value> {
    storage::read_project_file(path).with_context(|| format!("reading {}", path.display()))
}

/// Load a project file into memory, keeping its ids.
pub(crate) fn load_project(path: &Path) -> Result<Project> {
    let value = read_json(path)?;
    let name = value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = value
        .get("description")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let options = ImportOptions {
        mode: ImportMode::Replace,
        preserve_ids: true,
        ..Default::default()
    };
    let result = pb_project::import(value, &[], &options);
    if !result.success {
        anyhow::bail!("{} could not be loaded:\n  {}", path.display(), result.errors.join("\n  "));
    }
    for warning in &result.warnings {
        log::warn!("{}: {warning}", path.display());
    }

    let mut project = Project::new(name);
    project.description = description;
    project.apply_import(result);
    Ok(project)
}
