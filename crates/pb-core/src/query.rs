//! Read-only hierarchy queries over a [`Document`].
//!
//! All traversal follows `child_ids` order (and `root_ids` order at the top
//! level), so results are deterministic. Nothing here mutates the document;
//! these functions back the move-cycle check, drop validation, and any
//! layer-tree view.

use crate::id::ComponentId;
use crate::model::{ComponentInstance, Document};
use std::collections::VecDeque;
use std::ops::ControlFlow;

// ─── Traversal ───────────────────────────────────────────────────────────

/// Per-call traversal filters.
///
/// * Excluding hidden components prunes their whole subtree.
/// * Excluding locked components skips the component but still visits its
///   children.
/// * `filter` only decides whether a component is reported to the visitor.
#[derive(Clone, Copy)]
pub struct TraversalOptions<'a> {
    /// Deepest level visited, relative to the traversal start (start = 0).
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
    pub include_locked: bool,
    pub filter: Option<&'a dyn Fn(&ComponentInstance) -> bool>,
}

impl Default for TraversalOptions<'_> {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_hidden: true,
            include_locked: true,
            filter: None,
        }
    }
}

impl<'a> TraversalOptions<'a> {
    pub fn visible_only() -> Self {
        Self {
            include_hidden: false,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_filter(mut self, filter: &'a dyn Fn(&ComponentInstance) -> bool) -> Self {
        self.filter = Some(filter);
        self
    }

    fn prunes(&self, component: &ComponentInstance, depth: usize) -> bool {
        (!self.include_hidden && component.hidden) || self.max_depth.is_some_and(|max| depth > max)
    }

    fn reports(&self, component: &ComponentInstance) -> bool {
        (self.include_locked || !component.locked) && self.filter.is_none_or(|f| f(component))
    }
}

/// Starting points: one component, or the whole forest in root order.
fn start_ids(doc: &Document, start: Option<ComponentId>) -> Vec<ComponentId> {
    match start {
        Some(id) if doc.contains(id) => vec![id],
        Some(_) => Vec::new(),
        None => doc.root_ids().to_vec(),
    }
}

/// Depth-first, pre-order traversal. The visitor receives each component and
/// its depth relative to the start; returning `ControlFlow::Break` stops the
/// walk immediately.
pub fn traverse_depth_first<'d, F>(
    doc: &'d Document,
    start: Option<ComponentId>,
    options: &TraversalOptions<'_>,
    mut visit: F,
) -> ControlFlow<()>
where
    F: FnMut(&'d ComponentInstance, usize) -> ControlFlow<()>,
{
    let mut stack: Vec<(ComponentId, usize)> = start_ids(doc, start)
        .into_iter()
        .rev()
        .map(|id| (id, 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(component) = doc.get(id) else {
            continue;
        };
        if options.prunes(component, depth) {
            continue;
        }
        if options.reports(component) {
            visit(component, depth)?;
        }
        stack.extend(component.child_ids.iter().rev().map(|c| (*c, depth + 1)));
    }
    ControlFlow::Continue(())
}

/// Breadth-first (level-order) traversal with the same contract as
/// [`traverse_depth_first`].
pub fn traverse_breadth_first<'d, F>(
    doc: &'d Document,
    start: Option<ComponentId>,
    options: &TraversalOptions<'_>,
    mut visit: F,
) -> ControlFlow<()>
where
    F: FnMut(&'d ComponentInstance, usize) -> ControlFlow<()>,
{
    let mut queue: VecDeque<(ComponentId, usize)> = start_ids(doc, start)
        .into_iter()
        .map(|id| (id, 0))
        .collect();

    while let Some((id, depth)) = queue.pop_front() {
        let Some(component) = doc.get(id) else {
            continue;
        };
        if options.prunes(component, depth) {
            continue;
        }
        if options.reports(component) {
            visit(component, depth)?;
        }
        queue.extend(component.child_ids.iter().map(|c| (*c, depth + 1)));
    }
    ControlFlow::Continue(())
}

// ─── Search ──────────────────────────────────────────────────────────────

/// First component (depth-first, document order) matching `predicate`.
pub fn find_component<P>(doc: &Document, predicate: P) -> Option<&ComponentInstance>
where
    P: Fn(&ComponentInstance) -> bool,
{
    let mut found = None;
    let _ = traverse_depth_first(doc, None, &TraversalOptions::default(), |c, _| {
        if predicate(c) {
            found = Some(c);
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    found
}

/// Every component matching `predicate`, depth-first in document order.
pub fn find_components<P>(doc: &Document, predicate: P) -> Vec<&ComponentInstance>
where
    P: Fn(&ComponentInstance) -> bool,
{
    let mut found = Vec::new();
    let _ = traverse_depth_first(doc, None, &TraversalOptions::default(), |c, _| {
        if predicate(c) {
            found.push(c);
        }
        ControlFlow::Continue(())
    });
    found
}

// ─── Relatives ───────────────────────────────────────────────────────────

pub fn parent(doc: &Document, id: ComponentId) -> Option<&ComponentInstance> {
    doc.get(id)?.parent_id.and_then(|p| doc.get(p))
}

/// Direct children in z-order.
pub fn children(doc: &Document, id: ComponentId) -> Vec<&ComponentInstance> {
    doc.child_ids_of(Some(id))
        .iter()
        .filter_map(|c| doc.get(*c))
        .collect()
}

/// Components sharing `id`'s parent (or the root list), excluding `id`.
pub fn siblings(doc: &Document, id: ComponentId) -> Vec<&ComponentInstance> {
    let Some(component) = doc.get(id) else {
        return Vec::new();
    };
    doc.child_ids_of(component.parent_id)
        .iter()
        .filter(|sibling| **sibling != id)
        .filter_map(|sibling| doc.get(*sibling))
        .collect()
}

/// Ancestors of `id`, nearest (parent) first.
pub fn ancestors(doc: &Document, id: ComponentId) -> Vec<ComponentId> {
    let mut chain = Vec::new();
    let mut current = doc.get(id).and_then(|c| c.parent_id);
    // The walk is bounded by the document size so a malformed parent chain
    // cannot loop forever.
    while let Some(parent_id) = current {
        if chain.len() > doc.len() {
            break;
        }
        chain.push(parent_id);
        current = doc.get(parent_id).and_then(|c| c.parent_id);
    }
    chain
}

/// All descendants of `id` in depth-first pre-order, excluding `id`.
pub fn descendants(doc: &Document, id: ComponentId) -> Vec<ComponentId> {
    let mut out = Vec::new();
    let _ = traverse_depth_first(doc, Some(id), &TraversalOptions::default(), |c, depth| {
        if depth > 0 {
            out.push(c.id);
        }
        ControlFlow::Continue(())
    });
    out
}

// ─── Paths ───────────────────────────────────────────────────────────────

/// Root → target id sequence. Empty when `id` is absent.
pub fn component_path(doc: &Document, id: ComponentId) -> Vec<ComponentId> {
    if !doc.contains(id) {
        return Vec::new();
    }
    let mut path = ancestors(doc, id);
    path.reverse();
    path.push(id);
    path
}

/// Component names along the path, joined with ` > `.
pub fn component_path_string(doc: &Document, id: ComponentId) -> Option<String> {
    let path = component_path(doc, id);
    if path.is_empty() {
        return None;
    }
    let names: Vec<&str> = path
        .iter()
        .filter_map(|p| doc.get(*p))
        .map(|c| c.name.as_str())
        .collect();
    Some(names.join(" > "))
}

// ─── Relationship predicates ─────────────────────────────────────────────

/// Whether `ancestor` is a parent/grandparent/etc. of `id`. Never true for
/// `ancestor == id`.
pub fn is_ancestor(doc: &Document, ancestor: ComponentId, id: ComponentId) -> bool {
    ancestor != id && ancestors(doc, id).contains(&ancestor)
}

/// Whether `id` lives somewhere below `ancestor`.
pub fn is_descendant(doc: &Document, id: ComponentId, ancestor: ComponentId) -> bool {
    is_ancestor(doc, ancestor, id)
}

/// Whether `a` and `b` are distinct components with the same parent (both
/// roots counts as the same parent).
pub fn is_sibling(doc: &Document, a: ComponentId, b: ComponentId) -> bool {
    match (doc.get(a), doc.get(b)) {
        (Some(ca), Some(cb)) => a != b && ca.parent_id == cb.parent_id,
        _ => false,
    }
}

// ─── Metrics ─────────────────────────────────────────────────────────────

/// Depth of `id` (roots are 0).
pub fn component_depth(doc: &Document, id: ComponentId) -> Option<usize> {
    doc.get(id).map(|_| ancestors(doc, id).len())
}

/// Number of levels in the tree; 0 for an empty document.
pub fn tree_depth(doc: &Document) -> usize {
    let mut deepest = 0;
    let _ = traverse_depth_first(doc, None, &TraversalOptions::default(), |_, depth| {
        deepest = deepest.max(depth + 1);
        ControlFlow::Continue(())
    });
    deepest
}

/// Size of the subtree rooted at `id`, including `id`; 0 when absent.
pub fn subtree_size(doc: &Document, id: ComponentId) -> usize {
    if doc.contains(id) {
        descendants(doc, id).len() + 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentDraft, ComponentPatch};

    /// page
    /// ├── header
    /// │   ├── logo
    /// │   └── nav
    /// └── body
    ///     └── card
    /// footer
    struct Fixture {
        doc: Document,
        page: ComponentId,
        header: ComponentId,
        logo: ComponentId,
        nav: ComponentId,
        body: ComponentId,
        card: ComponentId,
        footer: ComponentId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let page = doc.add_component(ComponentDraft::new("Container").named("Page")).unwrap();
        let header = doc
            .add_component(ComponentDraft::new("Container").named("Header").inside(page))
            .unwrap();
        let logo = doc
            .add_component(ComponentDraft::new("Image").named("Logo").inside(header))
            .unwrap();
        let nav = doc
            .add_component(ComponentDraft::new("Nav").named("Nav").inside(header))
            .unwrap();
        let body = doc
            .add_component(ComponentDraft::new("Container").named("Body").inside(page))
            .unwrap();
        let card = doc
            .add_component(ComponentDraft::new("Card").named("Card").inside(body))
            .unwrap();
        let footer = doc.add_component(ComponentDraft::new("Footer").named("Footer")).unwrap();
        Fixture {
            doc,
            page,
            header,
            logo,
            nav,
            body,
            card,
            footer,
        }
    }

    fn collect_dfs(doc: &Document, options: &TraversalOptions<'_>) -> Vec<ComponentId> {
        let mut seen = Vec::new();
        let _ = traverse_depth_first(doc, None, options, |c, _| {
            seen.push(c.id);
            ControlFlow::Continue(())
        });
        seen
    }

    #[test]
    fn depth_first_follows_child_order() {
        let f = fixture();
        let seen = collect_dfs(&f.doc, &TraversalOptions::default());
        assert_eq!(
            seen,
            vec![f.page, f.header, f.logo, f.nav, f.body, f.card, f.footer]
        );
    }

    #[test]
    fn breadth_first_visits_by_level() {
        let f = fixture();
        let mut seen = Vec::new();
        let _ = traverse_breadth_first(&f.doc, None, &TraversalOptions::default(), |c, depth| {
            seen.push((c.id, depth));
            ControlFlow::Continue(())
        });
        assert_eq!(
            seen,
            vec![
                (f.page, 0),
                (f.footer, 0),
                (f.header, 1),
                (f.body, 1),
                (f.logo, 2),
                (f.nav, 2),
                (f.card, 2),
            ]
        );
    }

    #[test]
    fn max_depth_limits_walk() {
        let f = fixture();
        let seen = collect_dfs(&f.doc, &TraversalOptions::default().with_max_depth(0));
        assert_eq!(seen, vec![f.page, f.footer]);
    }

    #[test]
    fn hidden_prunes_subtree_locked_skips_node() {
        let mut f = fixture();
        f.doc.update_component(
            f.header,
            &ComponentPatch {
                hidden: Some(true),
                ..Default::default()
            },
        );
        f.doc.update_component(
            f.body,
            &ComponentPatch {
                locked: Some(true),
                ..Default::default()
            },
        );
        let options = TraversalOptions {
            include_hidden: false,
            include_locked: false,
            ..Default::default()
        };
        let seen = collect_dfs(&f.doc, &options);
        assert_eq!(seen, vec![f.page, f.card, f.footer]);
    }

    #[test]
    fn early_exit_stops_traversal() {
        let f = fixture();
        let mut visited = 0;
        let flow = traverse_depth_first(&f.doc, None, &TraversalOptions::default(), |c, _| {
            visited += 1;
            if c.id == f.logo {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(flow.is_break());
        assert_eq!(visited, 3);
    }

    #[test]
    fn custom_filter_only_affects_reporting() {
        let f = fixture();
        let only_leaves = |c: &ComponentInstance| c.child_ids.is_empty();
        let seen = collect_dfs(&f.doc, &TraversalOptions::default().with_filter(&only_leaves));
        assert_eq!(seen, vec![f.logo, f.nav, f.card, f.footer]);
    }

    #[test]
    fn find_by_predicate() {
        let f = fixture();
        assert_eq!(find_component(&f.doc, |c| c.kind == "Card").map(|c| c.id), Some(f.card));
        let containers: Vec<ComponentId> = find_components(&f.doc, |c| c.kind == "Container")
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(containers, vec![f.page, f.header, f.body]);
        assert!(find_component(&f.doc, |c| c.kind == "Video").is_none());
    }

    #[test]
    fn relatives() {
        let f = fixture();
        assert_eq!(parent(&f.doc, f.nav).map(|c| c.id), Some(f.header));
        assert!(parent(&f.doc, f.page).is_none());

        let kids: Vec<ComponentId> = children(&f.doc, f.header).iter().map(|c| c.id).collect();
        assert_eq!(kids, vec![f.logo, f.nav]);

        let sibs: Vec<ComponentId> = siblings(&f.doc, f.logo).iter().map(|c| c.id).collect();
        assert_eq!(sibs, vec![f.nav]);
        let root_sibs: Vec<ComponentId> = siblings(&f.doc, f.page).iter().map(|c| c.id).collect();
        assert_eq!(root_sibs, vec![f.footer]);

        assert_eq!(ancestors(&f.doc, f.card), vec![f.body, f.page]);
        assert_eq!(descendants(&f.doc, f.page), vec![f.header, f.logo, f.nav, f.body, f.card]);
    }

    #[test]
    fn paths() {
        let f = fixture();
        assert_eq!(component_path(&f.doc, f.nav), vec![f.page, f.header, f.nav]);
        assert_eq!(
            component_path_string(&f.doc, f.nav).as_deref(),
            Some("Page > Header > Nav")
        );
        assert!(component_path(&f.doc, ComponentId::intern("missing_q")).is_empty());
        assert!(component_path_string(&f.doc, ComponentId::intern("missing_q")).is_none());
    }

    #[test]
    fn relationship_predicates() {
        let f = fixture();
        assert!(is_ancestor(&f.doc, f.page, f.card));
        assert!(!is_ancestor(&f.doc, f.card, f.page));
        assert!(!is_ancestor(&f.doc, f.page, f.page));
        assert!(is_descendant(&f.doc, f.logo, f.header));
        assert!(!is_descendant(&f.doc, f.footer, f.page));
        assert!(is_sibling(&f.doc, f.logo, f.nav));
        assert!(is_sibling(&f.doc, f.page, f.footer));
        assert!(!is_sibling(&f.doc, f.logo, f.logo));
        assert!(!is_sibling(&f.doc, f.logo, f.card));
    }

    #[test]
    fn metrics() {
        let f = fixture();
        assert_eq!(component_depth(&f.doc, f.page), Some(0));
        assert_eq!(component_depth(&f.doc, f.card), Some(2));
        assert_eq!(tree_depth(&f.doc), 3);
        assert_eq!(tree_depth(&Document::new()), 0);
        assert_eq!(subtree_size(&f.doc, f.page), 6);
        assert_eq!(subtree_size(&f.doc, f.footer), 1);
        assert_eq!(subtree_size(&f.doc, ComponentId::intern("missing_q")), 0);
    }
}
