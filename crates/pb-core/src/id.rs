use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Process-wide interner backing every [`ComponentId`].
///
/// Entries are never freed. Every id text seen by the process (generated by
/// add, duplicate, paste, or import, or read from a payload) stays resident
/// for its lifetime, roughly 40 bytes each. Known texts map to their
/// existing key, so undo/redo and reloading a saved page add nothing.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for component instances.
/// Backed by a `Spur` index, so copies and comparisons are cheap.
///
/// IDs are opaque: callers must not derive meaning from their text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(Spur);

impl ComponentId {
    /// Intern a string as a ComponentId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ComponentId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh, globally unique component ID. Adds one interner
    /// entry that lives until the process exits.
    pub fn generate() -> Self {
        Self::with_prefix("cmp")
    }

    /// Generate a fresh ID with a prefix (e.g. `cmp_3f2a…`).
    pub fn with_prefix(prefix: &str) -> Self {
        Self::intern(&format!("{prefix}_{}", Uuid::new_v4().simple()))
    }
}

/// Generate a fresh page ID. Pages are keyed by plain strings.
pub fn generate_page_id() -> String {
    format!("page_{}", Uuid::new_v4().simple())
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ComponentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComponentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ComponentId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ComponentId::intern("hero_banner");
        let b = ComponentId::intern("hero_banner");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hero_banner");
    }

    #[test]
    fn reading_a_known_id_reuses_its_key() {
        let generated = ComponentId::generate();
        let text = serde_json::to_string(&generated).unwrap();
        let back: ComponentId = serde_json::from_str(&text).unwrap();
        assert_eq!(back.0, generated.0);
        assert_eq!(ComponentId::intern(generated.as_str()).0, generated.0);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ComponentId::generate();
        let b = ComponentId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("cmp_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ComponentId::intern("card_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"card_1\"");
        let back: ComponentId = serde_json::from_str("\"card_1\"").unwrap();
        assert_eq!(back, id);
    }
}
