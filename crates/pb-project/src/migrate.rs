//! Version migrations for serialized projects.
//!
//! Migrations are registered as single steps `from → to` and chained until
//! the payload reaches [`CURRENT_VERSION`]. Each step rewrites raw JSON, so
//! it can reshape fields the current types no longer know about.
//!
//! | Step | Change |
//! |------|--------|
//! | 1.0.0 → 1.1.0 | component `children` → `childIds`, `parent` → `parentId` |
//! | 1.1.0 → 2.0.0 | `properties.style` → `styles`; `hidden` / `locked` made explicit |

use crate::version::{CURRENT_VERSION, Version};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("payload has no version")]
    MissingVersion,

    #[error("{0}")]
    InvalidVersion(String),

    #[error("version {found} is newer than supported {current}")]
    Unsupported { found: Version, current: Version },

    #[error("no migration path from version {0}")]
    NoPath(Version),

    #[error("migration {from} → {to} failed: {reason}")]
    StepFailed { from: Version, to: Version, reason: String },
}

/// One registered step.
#[derive(Clone, Copy)]
pub struct Migration {
    pub from: Version,
    pub to: Version,
    pub apply: fn(&mut Value) -> Result<(), String>,
}

/// Outcome of a successful migration.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub value: Value,
    pub from: Version,
    /// Steps applied, in order. Empty when already current.
    pub steps: Vec<(Version, Version)>,
}

pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    pub fn empty() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn register(&mut self, migration: Migration) {
        self.migrations.push(migration);
    }

    fn step_from(&self, version: Version) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.from == version)
    }

    /// Whether a chain of steps leads from `version` to the current version.
    pub fn has_path(&self, version: Version) -> bool {
        let mut current = version;
        // Bounded walk; a misregistered loop must not hang.
        for _ in 0..=self.migrations.len() {
            if current == CURRENT_VERSION {
                return true;
            }
            match self.step_from(current) {
                Some(step) => current = step.to,
                None => return false,
            }
        }
        false
    }

    /// Bring `value` up to [`CURRENT_VERSION`].
    pub fn migrate(&self, mut value: Value) -> Result<Migrated, MigrationError> {
        let from = read_version(&value)?;
        if from > CURRENT_VERSION {
            return Err(MigrationError::Unsupported {
                found: from,
                current: CURRENT_VERSION,
            });
        }
        if !self.has_path(from) {
            return Err(MigrationError::NoPath(from));
        }

        let mut steps = Vec::new();
        let mut current = from;
        while current != CURRENT_VERSION {
            let step = self.step_from(current).ok_or(MigrationError::NoPath(current))?;
            (step.apply)(&mut value).map_err(|reason| MigrationError::StepFailed {
                from: step.from,
                to: step.to,
                reason,
            })?;
            set_version(&mut value, step.to);
            log::debug!("migrate: {} → {}", step.from, step.to);
            steps.push((step.from, step.to));
            current = step.to;
        }
        Ok(Migrated { value, from, steps })
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Migration {
            from: Version::new(1, 0, 0),
            to: Version::new(1, 1, 0),
            apply: rename_link_fields,
        });
        registry.register(Migration {
            from: Version::new(1, 1, 0),
            to: Version::new(2, 0, 0),
            apply: split_styles,
        });
        registry
    }
}

/// Migrate with the built-in registry.
pub fn migrate(value: Value) -> Result<Value, MigrationError> {
    MigrationRegistry::default().migrate(value).map(|m| m.value)
}

pub fn read_version(value: &Value) -> Result<Version, MigrationError> {
    let text = value
        .get("version")
        .and_then(Value::as_str)
        .ok_or(MigrationError::MissingVersion)?;
    text.parse().map_err(MigrationError::InvalidVersion)
}

fn set_version(value: &mut Value, version: Version) {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".into(), Value::String(version.to_string()));
    }
}

/// Visit every component object of every page.
fn for_each_component(
    value: &mut Value,
    mut f: impl FnMut(&mut Map<String, Value>) -> Result<(), String>,
) -> Result<(), String> {
    let Some(pages) = value.get_mut("pages").and_then(Value::as_array_mut) else {
        return Err("`pages` is not an array".into());
    };
    for page in pages {
        let Some(components) = page.get_mut("components").and_then(Value::as_array_mut) else {
            continue;
        };
        for component in components {
            if let Some(obj) = component.as_object_mut() {
                f(obj)?;
            }
        }
    }
    Ok(())
}

// ─── Steps ───────────────────────────────────────────────────────────────

fn rename_link_fields(value: &mut Value) -> Result<(), String> {
    for_each_component(value, |c| {
        if let Some(children) = c.remove("children") {
            c.entry("childIds").or_insert(children);
        }
        if let Some(parent) = c.remove("parent") {
            c.entry("parentId").or_insert(parent);
        }
        Ok(())
    })
}

fn split_styles(value: &mut Value) -> Result<(), String> {
    for_each_component(value, |c| {
        let style = c
            .get_mut("properties")
            .and_then(Value::as_object_mut)
            .and_then(|props| props.remove("style"));
        if let Some(style) = style {
            let Value::Object(style) = style else {
                return Err("`properties.style` is not an object".into());
            };
            let styles = c
                .entry("styles")
                .or_insert_with(|| Value::Object(Map::new()));
            let Some(styles) = styles.as_object_mut() else {
                return Err("`styles` is not an object".into());
            };
            for (key, v) in style {
                styles.entry(key).or_insert(v);
            }
        }
        c.entry("hidden").or_insert(Value::Bool(false));
        c.entry("locked").or_insert(Value::Bool(false));
        Ok(())
    })
}
