//! Drag-and-drop placement.
//!
//! One gesture at a time: `idle → dragging → (dropped | cancelled)`.
//! While dragging, every pointer move is snapped to the grid and then
//! clamped to the optional bounds. Dropping classifies the pointer against
//! a target rectangle (top quarter = above, bottom quarter = below, middle
//! = inside) and checks the target's `accepts` list plus the cycle rule
//! shared with move.
//!
//! The engine never touches the document; [`EditorSession`] turns a
//! [`DropPlacement`] into an add or a move.
//!
//! [`EditorSession`]: crate::session::EditorSession

use kurbo::{Point, Rect, Size as KSize, Vec2};
use pb_core::{ComponentId, Document, GridSettings, Size, query};

/// Fraction of the target height at the top and bottom that means
/// "place beside" rather than "place inside".
pub const EDGE_BAND: f64 = 0.25;

// ─── Items and targets ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    /// A new component dragged in from the palette.
    Palette,
    /// An existing component moved on the canvas.
    Canvas,
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct DragItem {
    /// Set for canvas drags.
    pub component_id: Option<ComponentId>,
    /// Component type tag, checked against [`DropTarget::accepts`].
    pub kind: String,
    pub source: DragSource,
    pub size: Size,
    /// Ghost position when the drag started.
    pub origin: Point,
    /// Pointer position relative to the ghost's top-left corner.
    pub pointer_offset: Vec2,
}

impl DragItem {
    pub fn from_palette(kind: impl Into<String>, size: Size) -> Self {
        Self {
            component_id: None,
            kind: kind.into(),
            source: DragSource::Palette,
            size,
            origin: Point::ZERO,
            pointer_offset: Vec2::ZERO,
        }
    }

    /// Describe an existing component, grabbed at `pointer`. `None` when the
    /// id is unknown.
    pub fn from_component(doc: &Document, id: ComponentId, pointer: Point) -> Option<Self> {
        let component = doc.get(id)?;
        let origin: Point = component.position.into();
        Some(Self {
            component_id: Some(id),
            kind: component.kind.clone(),
            source: DragSource::Canvas,
            size: component.size,
            origin,
            pointer_offset: pointer - origin,
        })
    }
}

/// A candidate parent region reported by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    /// `None` is the canvas itself (root level).
    pub component_id: Option<ComponentId>,
    pub rect: Rect,
    /// Component types this target takes.
    pub accepts: Vec<String>,
}

impl DropTarget {
    pub fn new(component_id: Option<ComponentId>, rect: Rect, accepts: &[&str]) -> Self {
        Self {
            component_id,
            rect,
            accepts: accepts.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn accepts(&self, kind: &str) -> bool {
        self.accepts.iter().any(|k| k == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIntent {
    Above,
    Inside,
    Below,
}

/// Where a drop lands, resolved against the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropPlacement {
    pub parent: Option<ComponentId>,
    /// Sibling index; `None` appends.
    pub index: Option<usize>,
    pub position: Point,
    pub intent: DropIntent,
}

/// A finished gesture, handed back by [`DragEngine::end_drag`].
#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub item: DragItem,
    /// Last snapped and clamped ghost position.
    pub position: Point,
    /// Last raw pointer position.
    pub pointer: Point,
}

// ─── Engine ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ActiveDrag {
    item: DragItem,
    position: Point,
    pointer: Point,
}

#[derive(Debug, Clone, Default)]
pub struct DragEngine {
    active: Option<ActiveDrag>,
    bounds: Option<Rect>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain ghost positions to `bounds` (`None` = unbounded).
    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Begin a gesture. Returns false while another drag is active.
    pub fn start_drag(&mut self, item: DragItem) -> bool {
        if self.active.is_some() {
            log::debug!("drag: gesture already active, ignoring start");
            return false;
        }
        let position = item.origin;
        let pointer = item.origin + item.pointer_offset;
        self.active = Some(ActiveDrag {
            item,
            position,
            pointer,
        });
        true
    }

    /// Move the ghost under `pointer`: subtract the grab offset, snap, then
    /// clamp. Returns the new ghost position, or `None` when idle.
    pub fn update_position(&mut self, pointer: Point, grid: &GridSettings) -> Option<Point> {
        let bounds = self.bounds;
        let active = self.active.as_mut()?;
        let mut ghost = pointer - active.item.pointer_offset;
        if grid.enabled && grid.snap_to_grid {
            ghost = snap_to_grid(ghost, grid.size);
        }
        if let Some(bounds) = bounds {
            ghost = clamp_to_bounds(ghost, active.item.size, bounds);
        }
        active.position = ghost;
        active.pointer = pointer;
        Some(ghost)
    }

    /// Finish the gesture and clear all transient state.
    pub fn end_drag(&mut self) -> Option<DragOutcome> {
        self.active.take().map(|a| DragOutcome {
            item: a.item,
            position: a.position,
            pointer: a.pointer,
        })
    }

    /// Abandon the gesture. Idempotent.
    pub fn cancel_drag(&mut self) {
        if self.active.take().is_some() {
            log::trace!("drag: cancelled");
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn item(&self) -> Option<&DragItem> {
        self.active.as_ref().map(|a| &a.item)
    }

    /// Current ghost position.
    pub fn position(&self) -> Option<Point> {
        self.active.as_ref().map(|a| a.position)
    }

    /// Current ghost rectangle.
    pub fn ghost_rect(&self) -> Option<Rect> {
        self.active.as_ref().map(|a| ghost_rect(a.position, a.item.size))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Round both coordinates to the nearest multiple of `grid_size`.
/// Non-positive sizes leave the point unchanged.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Keep a ghost of `size` at `point` inside `bounds`. A ghost larger than
/// the bounds is pinned to the top-left edge.
pub fn clamp_to_bounds(point: Point, size: Size, bounds: Rect) -> Point {
    let max_x = (bounds.x1 - size.width).max(bounds.x0);
    let max_y = (bounds.y1 - size.height).max(bounds.y0);
    Point::new(point.x.clamp(bounds.x0, max_x), point.y.clamp(bounds.y0, max_y))
}

pub fn ghost_rect(position: Point, size: Size) -> Rect {
    Rect::from_origin_size(position, KSize::new(size.width, size.height))
}

/// Intersection area over the dragged rectangle's area. Zero-area drags
/// never overlap.
pub fn overlap_fraction(dragged: Rect, target: Rect) -> f64 {
    let area = dragged.area();
    if area <= 0.0 {
        return 0.0;
    }
    let hit = dragged.intersect(target);
    (hit.area() / area).clamp(0.0, 1.0)
}

/// Classify a pointer height against `target`.
pub fn drop_intent(pointer_y: f64, target: Rect) -> DropIntent {
    let height = target.height();
    if height <= 0.0 {
        return DropIntent::Inside;
    }
    let relative = (pointer_y - target.y0) / height;
    if relative < EDGE_BAND {
        DropIntent::Above
    } else if relative > 1.0 - EDGE_BAND {
        DropIntent::Below
    } else {
        DropIntent::Inside
    }
}

/// The item's type is accepted and the target is neither the dragged
/// component nor one of its descendants.
pub fn can_drop(doc: &Document, item: &DragItem, target: &DropTarget) -> bool {
    if !target.accepts(&item.kind) {
        return false;
    }
    match (item.component_id, target.component_id) {
        (Some(dragged), Some(over)) => {
            over != dragged && !query::is_descendant(doc, over, dragged)
        }
        _ => true,
    }
}

/// The target with the largest positive overlap, first one wins ties.
pub fn best_target<'t>(dragged: Rect, targets: &'t [DropTarget]) -> Option<&'t DropTarget> {
    let mut best: Option<(&DropTarget, f64)> = None;
    for target in targets {
        let overlap = overlap_fraction(dragged, target.rect);
        if overlap > 0.0 && best.is_none_or(|(_, b)| overlap > b) {
            best = Some((target, overlap));
        }
    }
    best.map(|(t, _)| t)
}

/// Resolve a finished drag over `target` into a placement. `None` when the
/// drop is not allowed or the target vanished.
pub fn resolve_drop(
    doc: &Document,
    outcome: &DragOutcome,
    target: &DropTarget,
) -> Option<DropPlacement> {
    if !can_drop(doc, &outcome.item, target) {
        return None;
    }
    let Some(over) = target.component_id else {
        return Some(DropPlacement {
            parent: None,
            index: None,
            position: outcome.position,
            intent: DropIntent::Inside,
        });
    };
    let over_component = doc.get(over)?;
    let intent = drop_intent(outcome.pointer.y, target.rect);
    let placement = match intent {
        DropIntent::Inside => DropPlacement {
            parent: Some(over),
            index: None,
            position: outcome.position,
            intent,
        },
        DropIntent::Above | DropIntent::Below => {
            let parent = over_component.parent_id;
            let siblings = doc.child_ids_of(parent);
            // Index among the siblings once the dragged item is unlinked.
            let mut index = siblings
                .iter()
                .filter(|s| Some(**s) != outcome.item.component_id)
                .position(|s| *s == over)?;
            if intent == DropIntent::Below {
                index += 1;
            }
            DropPlacement {
                parent,
                index: Some(index),
                position: outcome.position,
                intent,
            }
        }
    };
    Some(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::ComponentDraft;
    use pretty_assertions::assert_eq;

    fn grid(size: f64) -> GridSettings {
        GridSettings {
            enabled: true,
            size,
            snap_to_grid: true,
        }
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap_to_grid(Point::new(13.0, 4.0), 8.0), Point::new(16.0, 8.0));
        assert_eq!(snap_to_grid(Point::new(11.9, 3.9), 8.0), Point::new(8.0, 0.0));
        assert_eq!(snap_to_grid(Point::new(3.3, 4.4), 0.0), Point::new(3.3, 4.4));
    }

    #[test]
    fn clamp_keeps_ghost_inside() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let size = Size {
            width: 30.0,
            height: 30.0,
        };
        assert_eq!(clamp_to_bounds(Point::new(90.0, -5.0), size, bounds), Point::new(70.0, 0.0));
        let huge = Size {
            width: 300.0,
            height: 10.0,
        };
        assert_eq!(clamp_to_bounds(Point::new(50.0, 50.0), huge, bounds), Point::new(0.0, 50.0));
    }

    #[test]
    fn update_snaps_before_clamping() {
        let mut engine = DragEngine::new();
        engine.set_bounds(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let item = DragItem::from_palette(
            "Button",
            Size {
                width: 20.0,
                height: 20.0,
            },
        );
        assert!(engine.start_drag(item.clone()));
        assert!(!engine.start_drag(item));

        // 93 snaps to 96, then clamps to 80.
        assert_eq!(
            engine.update_position(Point::new(93.0, 13.0), &grid(8.0)),
            Some(Point::new(80.0, 16.0))
        );
        let outcome = engine.end_drag().unwrap();
        assert_eq!(outcome.position, Point::new(80.0, 16.0));
        assert!(!engine.is_dragging());
        assert_eq!(engine.update_position(Point::ZERO, &grid(8.0)), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut engine = DragEngine::new();
        engine.cancel_drag();
        engine.start_drag(DragItem::from_palette("Text", Size::default()));
        engine.cancel_drag();
        engine.cancel_drag();
        assert!(engine.end_drag().is_none());
    }

    #[test]
    fn overlap_is_relative_to_dragged_area() {
        let dragged = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(overlap_fraction(dragged, Rect::new(5.0, 0.0, 100.0, 100.0)), 0.5);
        assert_eq!(overlap_fraction(dragged, Rect::new(50.0, 50.0, 60.0, 60.0)), 0.0);
        assert_eq!(overlap_fraction(Rect::ZERO, dragged), 0.0);
    }

    #[test]
    fn intent_bands() {
        let target = Rect::new(0.0, 100.0, 50.0, 200.0);
        assert_eq!(drop_intent(110.0, target), DropIntent::Above);
        assert_eq!(drop_intent(150.0, target), DropIntent::Inside);
        assert_eq!(drop_intent(190.0, target), DropIntent::Below);
    }

    #[test]
    fn can_drop_checks_type_and_cycles() {
        let mut doc = Document::new();
        let outer = doc.add_component(ComponentDraft::new("Container")).unwrap();
        let inner = doc.add_component(ComponentDraft::new("Container").inside(outer)).unwrap();
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);

        let dragged = DragItem::from_component(&doc, outer, Point::ZERO).unwrap();
        let into_inner = DropTarget::new(Some(inner), rect, &["Container"]);
        let into_self = DropTarget::new(Some(outer), rect, &["Container"]);
        let canvas = DropTarget::new(None, rect, &["Container"]);
        let text_only = DropTarget::new(None, rect, &["Text"]);

        assert!(!can_drop(&doc, &dragged, &into_inner));
        assert!(!can_drop(&doc, &dragged, &into_self));
        assert!(can_drop(&doc, &dragged, &canvas));
        assert!(!can_drop(&doc, &dragged, &text_only));
    }

    #[test]
    fn best_target_prefers_largest_overlap() {
        let a = ComponentId::intern("drag_target_a");
        let b = ComponentId::intern("drag_target_b");
        let targets = vec![
            DropTarget::new(Some(a), Rect::new(0.0, 0.0, 12.0, 100.0), &[]),
            DropTarget::new(Some(b), Rect::new(5.0, 0.0, 100.0, 100.0), &[]),
        ];
        let dragged = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert_eq!(best_target(dragged, &targets).unwrap().component_id, Some(b));
        assert!(best_target(Rect::new(500.0, 500.0, 510.0, 510.0), &targets).is_none());
    }

    #[test]
    fn resolve_above_inserts_before_target() {
        let mut doc = Document::new();
        let list = doc.add_component(ComponentDraft::new("Container")).unwrap();
        let first = doc.add_component(ComponentDraft::new("Text").inside(list)).unwrap();
        let second = doc.add_component(ComponentDraft::new("Text").inside(list)).unwrap();

        let item = DragItem::from_component(&doc, second, Point::ZERO).unwrap();
        let target = DropTarget::new(Some(first), Rect::new(0.0, 0.0, 100.0, 40.0), &["Text"]);
        let outcome = DragOutcome {
            item,
            position: Point::new(0.0, 0.0),
            pointer: Point::new(10.0, 5.0),
        };
        let placement = resolve_drop(&doc, &outcome, &target).unwrap();
        assert_eq!(placement.intent, DropIntent::Above);
        assert_eq!(placement.parent, Some(list));
        assert_eq!(placement.index, Some(0));
    }
}
