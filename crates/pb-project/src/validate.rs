//! Structural validation of serialized projects.
//!
//! Works on raw JSON so that malformed payloads still produce findings
//! instead of a single deserialization error. Import aborts on any
//! [`Severity::Error`] finding.

use crate::migrate::MigrationRegistry;
use crate::version::{CURRENT_VERSION, Version};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

// ─── Finding types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Blocks import.
    Error,
    /// Reported, import proceeds.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub severity: Severity,
    /// Location in the payload (e.g. `pages[0].components[2].type`).
    pub path: String,
    pub message: String,
    /// Short rule identifier (e.g. "missing-version", "component-cycle").
    pub rule: &'static str,
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}[{}] {}: {}", self.rule, self.path, self.message)
    }
}

pub fn has_errors(findings: &[ValidationFinding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Check a serialized project. Older payloads with a migration path get
/// their component rules checked against an upgraded copy, so the findings
/// match what import reports.
#[must_use]
pub fn validate(value: &Value) -> Vec<ValidationFinding> {
    let mut out = Vec::new();
    let Some(root) = value.as_object() else {
        out.push(error("$", "not-an-object", "project must be a JSON object".into()));
        return out;
    };

    let version = check_version(root.get("version"), &mut out);

    let pages = match root.get("pages") {
        Some(Value::Array(pages)) => pages,
        Some(_) => {
            out.push(error("pages", "pages-not-array", "`pages` must be an array".into()));
            return out;
        }
        None => {
            out.push(error("pages", "missing-pages", "`pages` is missing".into()));
            return out;
        }
    };
    if pages.is_empty() {
        out.push(warning("pages", "empty-pages", "project has no pages".into()));
    }

    let upgraded = match version {
        Some(v) if v < CURRENT_VERSION && MigrationRegistry::default().has_path(v) => {
            match MigrationRegistry::default().migrate(value.clone()) {
                Ok(migrated) => Some(migrated.value),
                Err(e) => {
                    out.push(error("version", "migration-failed", e.to_string()));
                    None
                }
            }
        }
        _ => None,
    };
    let checked_pages = match version {
        Some(v) if v == CURRENT_VERSION => Some(pages),
        _ => upgraded
            .as_ref()
            .and_then(|v| v.get("pages"))
            .and_then(Value::as_array),
    };

    // path → first page index
    let mut seen_paths: HashMap<&str, usize> = HashMap::new();
    for (i, page) in pages.iter().enumerate() {
        let at = format!("pages[{i}]");
        let Some(page) = page.as_object() else {
            out.push(error(&at, "page-not-object", "page must be an object".into()));
            continue;
        };
        for field in ["id", "name", "path"] {
            if !page.get(field).is_some_and(Value::is_string) {
                out.push(error(
                    &format!("{at}.{field}"),
                    "page-missing-field",
                    format!("page `{field}` is missing or not a string"),
                ));
            }
        }
        if let Some(path) = page.get("path").and_then(Value::as_str)
            && let Some(first) = seen_paths.insert(path, i)
        {
            seen_paths.insert(path, first);
            out.push(warning(
                &format!("{at}.path"),
                "duplicate-page-path",
                format!("path `{path}` is already used by pages[{first}]"),
            ));
        }
        match page.get("components") {
            Some(Value::Array(_)) => {
                let components = checked_pages
                    .and_then(|p| p.get(i))
                    .and_then(|p| p.get("components"))
                    .and_then(Value::as_array);
                if let Some(components) = components {
                    check_components(&at, components, &mut out);
                }
            }
            _ => out.push(error(
                &format!("{at}.components"),
                "page-missing-field",
                "page `components` is missing or not an array".into(),
            )),
        }
    }
    out
}

// ─── Rules ───────────────────────────────────────────────────────────────

fn check_version(value: Option<&Value>, out: &mut Vec<ValidationFinding>) -> Option<Version> {
    let Some(text) = value.and_then(Value::as_str) else {
        out.push(error(
            "version",
            "missing-version",
            "`version` is missing or not a string".into(),
        ));
        return None;
    };
    let version = match text.parse::<Version>() {
        Ok(v) => v,
        Err(e) => {
            out.push(error("version", "invalid-version", e));
            return None;
        }
    };
    if version > CURRENT_VERSION {
        out.push(error(
            "version",
            "unsupported-version",
            format!("version {version} is newer than supported {CURRENT_VERSION}"),
        ));
    } else if version < CURRENT_VERSION && !MigrationRegistry::default().has_path(version) {
        out.push(error(
            "version",
            "unsupported-version",
            format!("no migration from version {version}"),
        ));
    }
    Some(version)
}

fn check_components(page_at: &str, components: &[Value], out: &mut Vec<ValidationFinding>) {
    // id → first array index
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, component) in components.iter().enumerate() {
        let at = format!("{page_at}.components[{i}]");
        let Some(obj) = component.as_object() else {
            out.push(error(&at, "component-not-object", "component must be an object".into()));
            continue;
        };
        match obj.get("id").and_then(Value::as_str) {
            Some(id) => {
                if index.insert(id, i).is_some() {
                    out.push(error(
                        &format!("{at}.id"),
                        "duplicate-component-id",
                        format!("id `{id}` is used twice"),
                    ));
                }
            }
            None => out.push(error(
                &format!("{at}.id"),
                "component-missing-id",
                "component `id` is missing".into(),
            )),
        }
        if !obj.get("type").is_some_and(Value::is_string) {
            out.push(error(
                &format!("{at}.type"),
                "component-missing-type",
                "component `type` is missing".into(),
            ));
        }
    }

    for (i, component) in components.iter().enumerate() {
        let at = format!("{page_at}.components[{i}]");
        let Some(obj) = component.as_object() else { continue };
        if let Some(parent) = obj.get("parentId").and_then(Value::as_str)
            && !index.contains_key(parent)
        {
            out.push(warning(
                &format!("{at}.parentId"),
                "dangling-parent",
                format!("parent `{parent}` is not in this page"),
            ));
        }
        if let Some(children) = obj.get("childIds").and_then(Value::as_array) {
            for child in children.iter().filter_map(Value::as_str) {
                if !index.contains_key(child) {
                    out.push(warning(
                        &format!("{at}.childIds"),
                        "dangling-child",
                        format!("child `{child}` is not in this page"),
                    ));
                }
            }
        }
    }

    check_cycles(page_at, components, &index, out);
}

/// Parent links must form a forest.
fn check_cycles(
    page_at: &str,
    components: &[Value],
    index: &HashMap<&str, usize>,
    out: &mut Vec<ValidationFinding>,
) {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let nodes: HashMap<&str, NodeIndex> = index
        .keys()
        .map(|id| (*id, graph.add_node(*id)))
        .collect();

    for component in components {
        let Some(obj) = component.as_object() else { continue };
        let (Some(id), Some(parent)) = (
            obj.get("id").and_then(Value::as_str),
            obj.get("parentId").and_then(Value::as_str),
        ) else {
            continue;
        };
        if let (Some(&child), Some(&parent)) = (nodes.get(id), nodes.get(parent)) {
            graph.update_edge(parent, child, ());
        }
    }

    let mut reported = HashSet::new();
    for scc in tarjan_scc(&graph) {
        let looped = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
        if !looped {
            continue;
        }
        let mut ids: Vec<&str> = scc.iter().map(|n| graph[*n]).collect();
        ids.sort_unstable();
        if reported.insert(ids.clone()) {
            out.push(error(
                &format!("{page_at}.components"),
                "component-cycle",
                format!("parent chain cycles through {}", ids.join(", ")),
            ));
        }
    }
}

fn error(path: &str, rule: &'static str, message: String) -> ValidationFinding {
    ValidationFinding {
        severity: Severity::Error,
        path: path.to_string(),
        message,
        rule,
    }
}

fn warning(path: &str, rule: &'static str, message: String) -> ValidationFinding {
    ValidationFinding {
        severity: Severity::Warning,
        path: path.to_string(),
        message,
        rule,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: &Value) -> Vec<(&'static str, Severity)> {
        validate(value).into_iter().map(|f| (f.rule, f.severity)).collect()
    }

    fn component(id: &str, parent: Option<&str>, children: &[&str]) -> Value {
        json!({ "id": id, "type": "Box", "name": id, "parentId": parent, "childIds": children })
    }

    #[test]
    fn valid_payload_has_no_findings() {
        let value = json!({
            "version": "2.0.0",
            "pages": [{
                "id": "p1", "name": "Home", "path": "/",
                "components": [component("a", None, &["b"]), component("b", Some("a"), &[])]
            }]
        });
        assert!(validate(&value).is_empty());
    }

    #[test]
    fn missing_and_unknown_versions_are_errors() {
        let cases = [
            (json!({ "pages": [] }), "missing-version"),
            (json!({ "version": "9.0.0", "pages": [] }), "unsupported-version"),
            (json!({ "version": "0.9.0", "pages": [] }), "unsupported-version"),
            (json!({ "version": "abc", "pages": [] }), "invalid-version"),
        ];
        for (value, rule) in cases {
            assert!(rules(&value).contains(&(rule, Severity::Error)), "{value}");
        }
    }

    #[test]
    fn empty_pages_is_only_a_warning() {
        let findings = validate(&json!({ "version": "2.0.0", "pages": [] }));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(!has_errors(&findings));
    }

    #[test]
    fn pages_must_be_an_array() {
        assert_eq!(
            rules(&json!({ "version": "2.0.0", "pages": {} })),
            vec![("pages-not-array", Severity::Error)]
        );
    }

    #[test]
    fn page_fields_are_required() {
        let value = json!({ "version": "2.0.0", "pages": [{ "id": "p1", "components": "nope" }] });
        let findings = validate(&value);
        let paths: Vec<&str> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["pages[0].name", "pages[0].path", "pages[0].components"]);
        assert!(has_errors(&findings));
    }

    #[test]
    fn component_rules() {
        let value = json!({
            "version": "2.0.0",
            "pages": [{
                "id": "p1", "name": "Home", "path": "/",
                "components": [
                    component("a", None, &["ghost"]),
                    component("a", None, &[]),
                    { "id": "c", "name": "no type" },
                    component("d", Some("nowhere"), &[]),
                ]
            }]
        });
        let found = rules(&value);
        assert!(found.contains(&("duplicate-component-id", Severity::Error)));
        assert!(found.contains(&("component-missing-type", Severity::Error)));
        assert!(found.contains(&("dangling-child", Severity::Warning)));
        assert!(found.contains(&("dangling-parent", Severity::Warning)));
    }

    #[test]
    fn parent_cycles_are_errors() {
        let value = json!({
            "version": "2.0.0",
            "pages": [{
                "id": "p1", "name": "Home", "path": "/",
                "components": [
                    component("a", Some("c"), &["b"]),
                    component("b", Some("a"), &["c"]),
                    component("c", Some("b"), &["a"]),
                    component("self", Some("self"), &[]),
                ]
            }]
        });
        let cycles: Vec<String> = validate(&value)
            .into_iter()
            .filter(|f| f.rule == "component-cycle")
            .map(|f| f.message)
            .collect();
        assert_eq!(cycles.len(), 2);
        assert!(cycles.iter().any(|m| m.contains("a, b, c")));
    }

    #[test]
    fn legacy_payloads_are_checked_after_upgrade() {
        let value = json!({
            "version": "1.1.0",
            "pages": [{
                "id": "p1", "name": "Home", "path": "/",
                "components": [
                    { "id": "a", "type": "Box", "name": "a" },
                    { "id": "a", "type": "Box", "name": "again" },
                ]
            }]
        });
        assert_eq!(
            rules(&value),
            vec![("duplicate-component-id", Severity::Error)]
        );
        assert_eq!(validate(&value)[0].path, "pages[0].components[1].id");
    }

    #[test]
    fn repeated_page_path_is_a_warning() {
        let value = json!({
            "version": "2.0.0",
            "pages": [
                { "id": "p1", "name": "One", "path": "/x", "components": [] },
                { "id": "p2", "name": "Two", "path": "/x", "components": [] },
                { "id": "p3", "name": "Three", "path": "/x", "components": [] },
            ]
        });
        let findings = validate(&value);
        let paths: Vec<&str> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["pages[1].path", "pages[2].path"]);
        assert!(findings[1].message.contains("pages[0]"));
        assert!(!has_errors(&findings));
    }
}
