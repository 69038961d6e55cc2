//! Core document model for page-builder canvases.
//!
//! The document is a forest of component instances stored in normalized
//! form: an id-indexed map of records plus ordered id lists. Parent/child
//! links are ids, never references, so the whole document is an owned value
//! and `Clone` yields a structurally independent copy.
//!
//! Structural edits live in [`crate::mutate`]; read-only traversal lives in
//! [`crate::query`].

use crate::id::ComponentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

/// Arbitrary configuration / presentation values, deterministically ordered.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Ordered child list. Most containers hold a handful of children.
pub type ChildIds = SmallVec<[ComponentId; 4]>;

// ─── Geometry ────────────────────────────────────────────────────────────

/// Top-left position in document units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<Position> for kurbo::Point {
    fn from(p: Position) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<kurbo::Point> for Position {
    fn from(p: kurbo::Point) -> Self {
        Position::new(p.x, p.y)
    }
}

/// Width / height in document units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ─── Canvas settings ─────────────────────────────────────────────────────

/// Canvas viewport (zoom and pan).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Grid overlay and snapping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    pub enabled: bool,
    pub size: f64,
    pub snap_to_grid: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 8.0,
            snap_to_grid: true,
        }
    }
}

// ─── Component instances ─────────────────────────────────────────────────

/// One placed visual element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    pub id: ComponentId,

    /// Tag naming the visual kind (`"Button"`, `"Container"`, …).
    #[serde(rename = "type")]
    pub kind: String,

    /// User-facing label shown in the layer tree.
    pub name: String,

    /// Containing component, or `None` for a root-level instance.
    #[serde(default)]
    pub parent_id: Option<ComponentId>,

    /// Children in rendering (z) order.
    #[serde(default)]
    pub child_ids: ChildIds,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub size: Size,

    #[serde(default)]
    pub properties: PropertyMap,

    #[serde(default)]
    pub styles: PropertyMap,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub hidden: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComponentInstance {
    /// Bounding rectangle in document units.
    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::from_origin_size(
            (self.position.x, self.position.y),
            (self.size.width, self.size.height),
        )
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// The caller-supplied part of a new component. The document fills in the
/// id, timestamps, and child list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDraft {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<ComponentId>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub properties: PropertyMap,
    #[serde(default)]
    pub styles: PropertyMap,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl ComponentDraft {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn inside(mut self, parent: ComponentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.styles.insert(key.into(), value);
        self
    }
}

/// A shallow patch: every `Some` field replaces the instance's field.
///
/// Structure (`id`, `parent_id`, `child_ids`) cannot be patched; use
/// `move_component` for re-parenting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub properties: Option<PropertyMap>,
    #[serde(default)]
    pub styles: Option<PropertyMap>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

impl ComponentPatch {
    /// Whether the patch touches geometry or eligibility flags. Such patches
    /// always record history immediately, even when debouncing is requested.
    pub fn is_structural(&self) -> bool {
        self.position.is_some()
            || self.size.is_some()
            || self.locked.is_some()
            || self.hidden.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge into `target`. Returns true if any field was supplied.
    pub(crate) fn apply_to(&self, target: &mut ComponentInstance) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(position) = self.position {
            target.position = position;
        }
        if let Some(size) = self.size {
            target.size = size;
        }
        if let Some(properties) = &self.properties {
            target.properties = properties.clone();
        }
        if let Some(styles) = &self.styles {
            target.styles = styles.clone();
        }
        if let Some(locked) = self.locked {
            target.locked = locked;
        }
        if let Some(hidden) = self.hidden {
            target.hidden = hidden;
        }
        true
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// Normalized storage: records by id plus ordered id lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStore {
    pub(crate) by_id: HashMap<ComponentId, ComponentInstance>,
    pub(crate) all_ids: Vec<ComponentId>,
    pub(crate) root_ids: Vec<ComponentId>,
}

impl ComponentStore {
    pub fn by_id(&self) -> &HashMap<ComponentId, ComponentInstance> {
        &self.by_id
    }

    /// Every id, in insertion order.
    pub fn all_ids(&self) -> &[ComponentId] {
        &self.all_ids
    }

    /// Parentless ids, in canvas order.
    pub fn root_ids(&self) -> &[ComponentId] {
        &self.root_ids
    }
}

/// The canvas state: component tree plus viewport and grid settings.
///
/// This is the single source of truth for one page. It is only changed
/// through the invariant-preserving operations in [`crate::mutate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub components: ComponentStore,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub grid: GridSettings,
}

impl Document {
    /// Create a new empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a component by id.
    pub fn get(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.by_id.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.components.by_id.get_mut(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.components.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.all_ids.is_empty()
    }

    pub fn root_ids(&self) -> &[ComponentId] {
        &self.components.root_ids
    }

    pub fn all_ids(&self) -> &[ComponentId] {
        &self.components.all_ids
    }

    /// Iterate components in insertion (`all_ids`) order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.components
            .all_ids
            .iter()
            .filter_map(|id| self.components.by_id.get(id))
    }

    /// Ordered children of `id`, or the root list when `id` is `None`.
    pub fn child_ids_of(&self, id: Option<ComponentId>) -> &[ComponentId] {
        match id {
            None => &self.components.root_ids,
            Some(id) => self
                .components
                .by_id
                .get(&id)
                .map(|c| c.child_ids.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Rebuild a document from flattened records (the transfer shape).
    ///
    /// `all_ids` follows the record order. Root order follows `root_order`
    /// when it names exactly the parentless records, otherwise record order.
    /// The caller is expected to run [`crate::check_invariants`] on the result.
    pub fn from_components(
        components: Vec<ComponentInstance>,
        root_order: Option<&[ComponentId]>,
    ) -> Self {
        let mut store = ComponentStore::default();
        let mut derived_roots = Vec::new();
        for component in components {
            let id = component.id;
            if component.parent_id.is_none() && !derived_roots.contains(&id) {
                derived_roots.push(id);
            }
            if store.by_id.insert(id, component).is_none() {
                store.all_ids.push(id);
            }
        }
        store.root_ids = match root_order {
            Some(order)
                if order.len() == derived_roots.len()
                    && order.iter().all(|id| derived_roots.contains(id)) =>
            {
                order.to_vec()
            }
            _ => derived_roots,
        };
        Self {
            components: store,
            viewport: Viewport::default(),
            grid: GridSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(id: &str, parent: Option<&str>) -> ComponentInstance {
        let now = Utc::now();
        ComponentInstance {
            id: ComponentId::intern(id),
            kind: "Box".into(),
            name: id.into(),
            parent_id: parent.map(ComponentId::intern),
            child_ids: ChildIds::new(),
            position: Position::default(),
            size: Size::new(10.0, 10.0),
            properties: PropertyMap::new(),
            styles: PropertyMap::new(),
            locked: false,
            hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_is_shallow() {
        let mut c = instance("p1", None);
        c.properties.insert("text".into(), json!("old"));
        c.properties.insert("level".into(), json!(2));

        let mut props = PropertyMap::new();
        props.insert("text".into(), json!("new"));
        let patch = ComponentPatch {
            properties: Some(props),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut c));
        // The whole map is replaced, not merged key-by-key.
        assert_eq!(c.properties.len(), 1);
        assert_eq!(c.properties["text"], json!("new"));
    }

    #[test]
    fn structural_patch_detection() {
        let content = ComponentPatch {
            name: Some("Title".into()),
            ..Default::default()
        };
        assert!(!content.is_structural());
        let geometry = ComponentPatch {
            position: Some(Position::new(4.0, 4.0)),
            ..Default::default()
        };
        assert!(geometry.is_structural());
        assert!(ComponentPatch::default().is_empty());
    }

    #[test]
    fn from_components_honors_root_order() {
        let a = instance("fc_a", None);
        let b = instance("fc_b", None);
        let order = [b.id, a.id];
        let doc = Document::from_components(vec![a.clone(), b.clone()], Some(&order));
        assert_eq!(doc.root_ids(), &order);
        assert_eq!(doc.all_ids(), &[a.id, b.id]);

        // A stale order falls back to record order.
        let stale = [b.id];
        let doc = Document::from_components(vec![a.clone(), b.clone()], Some(&stale));
        assert_eq!(doc.root_ids(), &[a.id, b.id]);
    }

    #[test]
    fn component_type_serializes_as_type() {
        let c = instance("ser_1", None);
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["type"], json!("Box"));
        assert!(v.get("parentId").is_some());
        assert!(v.get("childIds").is_some());
    }
}
