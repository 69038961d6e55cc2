//! Transfer format → pages, with conflict resolution.
//!
//! Import is all-or-nothing. The payload is migrated, validated, and
//! decoded before any page is built; a failure at any of those stages
//! returns a result with zero pages and the reasons in `errors`.
//!
//! Import never touches the caller's pages. The result carries the pages to
//! install and, for every path conflict, a record naming the existing page
//! involved. [`Project::apply_import`](crate::Project::apply_import)
//! performs the installation, including removal of replaced pages.

use crate::format::SerializedPage;
use crate::migrate::MigrationRegistry;
use crate::project::Page;
use crate::validate::{Severity, ValidationFinding, validate};
use chrono::{DateTime, Utc};
use pb_core::remap::{IdMap, remap_components};
use pb_core::{ComponentId, ComponentInstance, Document, check_invariants, generate_page_id};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

// ─── Options ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Add the incoming pages next to the existing ones.
    #[default]
    Merge,
    /// The incoming pages take the place of all existing ones.
    Replace,
    /// Like merge, limited to [`ImportOptions::selected_pages`].
    Selective,
}

/// What to do when an incoming page's path is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Keep the existing page; drop the incoming one.
    Skip,
    /// Import under a suffixed name and path.
    #[default]
    Rename,
    /// Import and supersede the existing page.
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: ImportMode,
    pub handle_conflicts: ConflictStrategy,
    /// Keep page and component ids instead of regenerating them.
    pub preserve_ids: bool,
    /// Incoming page ids or paths to take in [`ImportMode::Selective`].
    pub selected_pages: Vec<String>,
}

// ─── Result ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    Skipped,
    Renamed,
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    /// Id of the incoming page as it appeared in the payload.
    pub id: String,
    pub name: String,
    /// The contested path.
    pub path: String,
    pub resolution: ConflictResolution,
    /// The existing page holding `path`.
    pub existing_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub success: bool,
    pub mode: ImportMode,
    pub imported_pages: usize,
    pub imported_components: usize,
    /// Names of incoming pages that were not imported.
    pub skipped: Vec<String>,
    pub conflicts: Vec<ConflictRecord>,
    pub errors: Vec<String>,
    /// Non-blocking validation findings.
    pub warnings: Vec<ValidationFinding>,
    /// Pages ready to install.
    pub pages: Vec<Page>,
}

impl ImportResult {
    fn new(mode: ImportMode) -> Self {
        Self {
            success: false,
            mode,
            imported_pages: 0,
            imported_components: 0,
            skipped: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn fail(mut self, errors: Vec<String>) -> Self {
        log::warn!("import aborted: {}", errors.join("; "));
        self.success = false;
        self.errors = errors;
        self.pages.clear();
        self.conflicts.clear();
        self.skipped.clear();
        self.imported_pages = 0;
        self.imported_components = 0;
        self
    }
}

// ─── Import ──────────────────────────────────────────────────────────────

/// Import a serialized project against `existing` pages.
pub fn import(value: Value, existing: &[Page], options: &ImportOptions) -> ImportResult {
    let result = ImportResult::new(options.mode);

    let migrated = match MigrationRegistry::default().migrate(value) {
        Ok(m) => m,
        Err(e) => return result.fail(vec![format!("migration failed: {e}")]),
    };
    let mut value = migrated.value;

    let findings = validate(&value);
    let (errors, warnings): (Vec<_>, Vec<_>) = findings
        .into_iter()
        .partition(|f| f.severity == Severity::Error);
    let mut result = ImportResult { warnings, ..result };
    if !errors.is_empty() {
        return result.fail(errors.iter().map(ToString::to_string).collect());
    }

    fill_component_defaults(&mut value);
    let pages: Vec<SerializedPage> = match value.get_mut("pages").map(Value::take) {
        Some(pages) => match serde_json::from_value(pages) {
            Ok(pages) => pages,
            Err(e) => return result.fail(vec![format!("malformed page data: {e}")]),
        },
        None => Vec::new(),
    };

    // In replace mode the existing pages are going away, so nothing conflicts.
    let existing_paths: HashMap<String, String> = match options.mode {
        ImportMode::Replace => HashMap::new(),
        _ => existing.iter().map(|p| (p.path.clone(), p.id.clone())).collect(),
    };
    let mut taken_ids: HashSet<String> = match options.mode {
        ImportMode::Replace => HashSet::new(),
        _ => existing.iter().map(|p| p.id.clone()).collect(),
    };
    // Paths claimed by pages of this payload.
    let mut claimed: HashSet<String> = HashSet::new();

    for incoming in pages {
        if options.mode == ImportMode::Selective
            && !options
                .selected_pages
                .iter()
                .any(|s| *s == incoming.id || *s == incoming.path)
        {
            result.skipped.push(incoming.name);
            continue;
        }

        let path_taken = |p: &str| claimed.contains(p) || existing_paths.contains_key(p);
        let mut name = incoming.name.clone();
        let mut path = incoming.path.clone();
        if claimed.contains(&incoming.path) {
            // Repeated path within the payload: the later page moves aside.
            (name, path) = unique_name_and_path(&incoming.name, &incoming.path, path_taken);
            log::warn!("import: page path `{}` repeated in payload, using `{path}`", incoming.path);
        } else if let Some(existing_id) = existing_paths.get(&incoming.path).cloned() {
            let resolution = match options.handle_conflicts {
                ConflictStrategy::Skip => ConflictResolution::Skipped,
                ConflictStrategy::Rename => {
                    (name, path) = unique_name_and_path(&incoming.name, &incoming.path, path_taken);
                    ConflictResolution::Renamed
                }
                ConflictStrategy::Replace => {
                    taken_ids.remove(&existing_id);
                    ConflictResolution::Replaced
                }
            };
            result.conflicts.push(ConflictRecord {
                kind: ConflictKind::Page,
                id: incoming.id.clone(),
                name: incoming.name.clone(),
                path: incoming.path.clone(),
                resolution,
                existing_id,
            });
            if resolution == ConflictResolution::Skipped {
                result.skipped.push(incoming.name);
                continue;
            }
        }

        let page = match build_page(incoming, name, path, options.preserve_ids, &taken_ids) {
            Ok(page) => page,
            Err(e) => return result.fail(vec![e]),
        };
        claimed.insert(page.path.clone());
        taken_ids.insert(page.id.clone());
        result.imported_components += page.document.len();
        result.pages.push(page);
    }

    result.imported_pages = result.pages.len();
    result.success = true;
    log::debug!(
        "import: {} page(s), {} component(s), {} conflict(s), {} skipped",
        result.imported_pages,
        result.imported_components,
        result.conflicts.len(),
        result.skipped.len()
    );
    result
}

// ─── Page building ───────────────────────────────────────────────────────

fn build_page(
    incoming: SerializedPage,
    name: String,
    path: String,
    preserve_ids: bool,
    taken_ids: &HashSet<String>,
) -> Result<Page, String> {
    let page_id = if preserve_ids && !taken_ids.contains(&incoming.id) {
        incoming.id.clone()
    } else {
        if preserve_ids {
            log::warn!("import: page id `{}` already in use, regenerating", incoming.id);
        }
        generate_page_id()
    };

    let (components, root_ids) = if preserve_ids {
        (incoming.components, incoming.root_ids)
    } else {
        // One map for the whole page, built before any record is rewritten.
        let map: IdMap = incoming
            .components
            .iter()
            .map(|c| (c.id, ComponentId::generate()))
            .collect();
        let remapped = remap_components(&incoming.components, &map);
        let roots = incoming
            .root_ids
            .map(|ids| ids.iter().map(|id| map.get(id).copied().unwrap_or(*id)).collect());
        (remapped, roots)
    };

    let mut document = Document::from_components(repair_links(components), root_ids.as_deref());
    if let Some(viewport) = incoming.viewport {
        document.viewport = viewport;
    }
    if let Some(grid) = incoming.grid {
        document.grid = grid;
    }
    let violations = check_invariants(&document);
    if let Some(first) = violations.first() {
        return Err(format!(
            "page `{}` is structurally invalid: {} ({})",
            incoming.name, first.message, first.rule
        ));
    }

    Ok(Page {
        id: page_id,
        name,
        path,
        document,
        metadata: incoming.metadata,
    })
}

/// Make parent and child links agree. Dangling references are dropped, a
/// child missing from its parent's list is appended, and a child listed
/// under the wrong parent is removed from that list. Duplicate records keep
/// the first occurrence.
fn repair_links(components: Vec<ComponentInstance>) -> Vec<ComponentInstance> {
    let mut seen = HashSet::new();
    let mut components: Vec<ComponentInstance> = components
        .into_iter()
        .filter(|c| seen.insert(c.id))
        .collect();

    let parents: HashMap<ComponentId, Option<ComponentId>> = components
        .iter()
        .map(|c| (c.id, c.parent_id.filter(|p| seen.contains(p))))
        .collect();

    for component in &mut components {
        component.parent_id = parents.get(&component.id).copied().flatten();
        let own = component.id;
        let mut listed = HashSet::new();
        component.child_ids.retain(|child| {
            let child = *child;
            parents.get(&child) == Some(&Some(own)) && listed.insert(child)
        });
    }

    let position: HashMap<ComponentId, usize> = components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();
    for i in 0..components.len() {
        let (id, parent) = (components[i].id, components[i].parent_id);
        if let Some(parent) = parent
            && let Some(&at) = position.get(&parent)
            && !components[at].child_ids.contains(&id)
        {
            components[at].child_ids.push(id);
        }
    }
    components
}

/// Fill fields older or hand-written payloads may omit: `name` defaults to
/// the type, timestamps default to the export time (or now).
fn fill_component_defaults(value: &mut Value) {
    let fallback_time: DateTime<Utc> = value
        .get("exportedAt")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(Utc::now);
    let stamp = Value::String(fallback_time.to_rfc3339());

    if let Some(obj) = value.as_object_mut() {
        obj.entry("name").or_insert_with(|| Value::String(String::new()));
        obj.entry("exportedAt").or_insert_with(|| stamp.clone());
    }
    let Some(pages) = value.get_mut("pages").and_then(Value::as_array_mut) else {
        return;
    };
    for page in pages {
        let Some(components) = page.get_mut("components").and_then(Value::as_array_mut) else {
            continue;
        };
        for component in components.iter_mut().filter_map(Value::as_object_mut) {
            fill_one(component, &stamp);
        }
    }
}

fn fill_one(component: &mut Map<String, Value>, stamp: &Value) {
    if !component.contains_key("name") {
        let kind = component.get("type").cloned().unwrap_or(Value::String(String::new()));
        component.insert("name".into(), kind);
    }
    component.entry("createdAt").or_insert_with(|| stamp.clone());
    component.entry("updatedAt").or_insert_with(|| stamp.clone());
}

/// `name (n)` / `path-n` with the smallest `n ≥ 1` whose path is free.
pub(crate) fn unique_name_and_path(
    name: &str,
    path: &str,
    taken: impl Fn(&str) -> bool,
) -> (String, String) {
    let base = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let mut n = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return (format!("{name} ({n})"), candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn instance(id: &str, parent: Option<&str>, children: &[&str]) -> ComponentInstance {
        let now = Utc::now();
        ComponentInstance {
            id: ComponentId::intern(id),
            kind: "Box".into(),
            name: id.into(),
            parent_id: parent.map(ComponentId::intern),
            child_ids: children.iter().map(|c| ComponentId::intern(c)).collect(),
            position: Default::default(),
            size: Default::default(),
            properties: Default::default(),
            styles: Default::default(),
            locked: false,
            hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn repair_drops_dangling_and_relinks() {
        let repaired = repair_links(vec![
            instance("rl_a", None, &["rl_ghost", "rl_c"]),
            instance("rl_b", Some("rl_a"), &[]),
            instance("rl_c", Some("rl_b"), &[]),
            instance("rl_d", Some("rl_nowhere"), &[]),
        ]);
        let doc = Document::from_components(repaired, None);
        assert!(check_invariants(&doc).is_empty());

        let a = doc.get(ComponentId::intern("rl_a")).unwrap();
        assert_eq!(a.child_ids.as_slice(), &[ComponentId::intern("rl_b")]);
        assert!(doc.get(ComponentId::intern("rl_d")).unwrap().is_root());
    }

    #[test]
    fn unique_path_skips_taken_suffixes() {
        let taken: HashMap<String, String> = [("/about", "p1"), ("/about-1", "p2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            unique_name_and_path("About", "/about", |p| taken.contains_key(p)),
            ("About (2)".to_string(), "/about-2".to_string())
        );
    }
}
