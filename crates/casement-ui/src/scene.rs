use slotmap::SlotMap;
use smallvec::SmallVec;

use casement_core::{Point, Rect};

use crate::element::{Dock, Element, ElementId, ElementProps};
use crate::layout::{anchor_rect, dock_rect};

pub(crate) type Children = SmallVec<[ElementId; 4]>;

/// Running z bounds of one sibling group, so front/back moves are O(1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ZRange {
    max: i32,
    min: i32,
}

impl ZRange {
    fn include(&mut self, z: i32) {
        self.max = self.max.max(z);
        self.min = self.min.min(z);
    }
}

pub(crate) struct Node {
    pub(crate) props: ElementProps,
    seq: u64,
    parent: Option<ElementId>,
    pub(crate) children: Children,
    child_z: ZRange,
    // bounds and parent client rect captured when the element was placed
    anchor_ref: Option<AnchorRef>,
    pub(crate) needs_redraw: bool,
    pub(crate) element: Box<dyn Element>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AnchorRef {
    bounds: Rect,
    client: Rect,
}

impl AnchorRef {
    fn scale(self, factor: f32) -> Self {
        Self {
            bounds: self.bounds.scale(factor),
            client: self.client.scale(factor),
        }
    }
}

/// Arena of elements owned by a window.
///
/// The window's direct children are the roots. Every element has at most
/// one parent; ordering is meaningful between siblings only.
#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<ElementId, Node>,
    roots: Children,
    root_z: ZRange,
    next_seq: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Adds an element under `parent` (`None` for a window-level child).
    /// A stale parent id falls back to the window level.
    pub fn insert(
        &mut self,
        parent: Option<ElementId>,
        props: ElementProps,
        element: Box<dyn Element>,
    ) -> ElementId {
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let seq = self.next_seq;
        self.next_seq += 1;
        let z = props.z_order;
        let id = self.nodes.insert(Node {
            props,
            seq,
            parent,
            children: Children::new(),
            child_z: ZRange::default(),
            anchor_ref: None,
            needs_redraw: true,
            element,
        });
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => {
                p.children.push(id);
                p.child_z.include(z);
            }
            None => {
                self.roots.push(id);
                self.root_z.include(z);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.element.on_added();
        }
        id
    }

    /// Removes `id` and its subtree, returning every removed id.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent) else {
            return Vec::new();
        };
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(mut node) = self.nodes.remove(next) {
                stack.extend(node.children.iter().copied());
                node.element.on_removed();
                removed.push(next);
            }
        }
        removed
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of `parent` (or the window's children) in insertion order.
    pub fn children(&self, parent: Option<ElementId>) -> &[ElementId] {
        match parent {
            Some(p) => self.nodes.get(p).map_or(&[][..], |n| n.children.as_slice()),
            None => self.roots.as_slice(),
        }
    }

    pub fn props(&self, id: ElementId) -> Option<&ElementProps> {
        self.nodes.get(id).map(|n| &n.props)
    }

    /// Edits the engine state of `id`. Bounds go through
    /// [`SceneGraph::set_bounds`] and z-order through
    /// [`SceneGraph::set_z_order`], so sibling ordering stays consistent.
    /// Returns `false` for a stale id.
    pub fn update_props(&mut self, id: ElementId, f: impl FnOnce(&mut ElementProps)) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let mut props = node.props.clone();
        f(&mut props);
        let (bounds, z) = (props.bounds, props.z_order);
        props.bounds = node.props.bounds;
        props.z_order = node.props.z_order;
        node.props = props;
        node.needs_redraw = true;
        self.set_bounds(id, bounds);
        if self.z_order(id) != Some(z) {
            self.set_z_order(id, z);
        }
        true
    }

    /// Places `id` explicitly. Anchored elements measure later parent
    /// resizes from this placement. Returns `true` if the bounds changed.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.anchor_ref = None;
        assign_bounds(node, bounds)
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id)
            && node.props.visible != visible
        {
            node.props.visible = visible;
            node.needs_redraw = true;
        }
    }

    pub fn element<T: Element>(&self, id: ElementId) -> Option<&T> {
        let node = self.nodes.get(id)?;
        let any: &dyn std::any::Any = &*node.element;
        any.downcast_ref::<T>()
    }

    pub fn element_mut<T: Element>(&mut self, id: ElementId) -> Option<&mut T> {
        let node = self.nodes.get_mut(id)?;
        node.needs_redraw = true;
        let any: &mut dyn std::any::Any = &mut *node.element;
        any.downcast_mut::<T>()
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes.keys()
    }

    pub fn needs_redraw(&self, id: ElementId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.needs_redraw)
    }

    pub fn z_order(&self, id: ElementId) -> Option<i32> {
        self.nodes.get(id).map(|n| n.props.z_order)
    }

    fn group_z(&mut self, parent: Option<ElementId>) -> Option<&mut ZRange> {
        match parent {
            Some(p) => self.nodes.get_mut(p).map(|n| &mut n.child_z),
            None => Some(&mut self.root_z),
        }
    }

    /// Moves `id` above every sibling. Returns `false` for a stale id.
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent) else {
            return false;
        };
        let Some(range) = self.group_z(parent) else {
            return false;
        };
        range.max += 1;
        let z = range.max;
        self.set_z(id, z);
        true
    }

    /// Moves `id` below every sibling. Returns `false` for a stale id.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent) else {
            return false;
        };
        let Some(range) = self.group_z(parent) else {
            return false;
        };
        range.min -= 1;
        let z = range.min;
        self.set_z(id, z);
        true
    }

    pub fn set_z_order(&mut self, id: ElementId, z: i32) {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent) else {
            return;
        };
        if let Some(range) = self.group_z(parent) {
            range.include(z);
        }
        self.set_z(id, z);
    }

    fn set_z(&mut self, id: ElementId, z: i32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.props.z_order = z;
        }
        self.mark_dirty(id);
    }

    fn order_key(&self, id: ElementId) -> (i32, u64) {
        self.nodes
            .get(id)
            .map_or((i32::MIN, 0), |n| (n.props.z_order, n.seq))
    }

    /// Stable ascending sort by (z-order, insertion sequence).
    pub fn sort_paint_order(&self, ids: &mut [ElementId]) {
        ids.sort_by_key(|id| self.order_key(*id));
    }

    /// Exact reverse of the paint order.
    pub fn sort_hit_test_order(&self, ids: &mut [ElementId]) {
        ids.sort_by_key(|id| std::cmp::Reverse(self.order_key(*id)));
    }

    pub fn paint_order(&self, parent: Option<ElementId>) -> Vec<ElementId> {
        let mut ids = self.children(parent).to_vec();
        self.sort_paint_order(&mut ids);
        ids
    }

    pub fn hit_test_order(&self, parent: Option<ElementId>) -> Vec<ElementId> {
        let mut ids = self.children(parent).to_vec();
        self.sort_hit_test_order(&mut ids);
        ids
    }

    /// Bounds of `id` in window space, following the parent chain.
    pub fn window_bounds(&self, id: ElementId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let mut rect = node.props.bounds;
        let mut parent = node.parent;
        while let Some(p) = parent.and_then(|p| self.nodes.get(p)) {
            rect = rect.translate(p.props.bounds.x, p.props.bounds.y);
            parent = p.parent;
        }
        Some(rect)
    }

    /// `true` if `id` is `ancestor` or lies inside its subtree.
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    fn hittable(&self, id: ElementId, require_enabled: bool) -> bool {
        self.nodes.get(id).is_some_and(|n| {
            n.props.visible && (!require_enabled || n.props.enabled) && !n.props.bounds.is_empty()
        })
    }

    /// Topmost window-level child under `point`.
    pub fn hit_test(&self, point: Point, require_enabled: bool) -> Option<ElementId> {
        self.hit_in(None, point, require_enabled)
    }

    fn hit_in(
        &self,
        parent: Option<ElementId>,
        local: Point,
        require_enabled: bool,
    ) -> Option<ElementId> {
        self.hit_test_order(parent).into_iter().find(|id| {
            self.hittable(*id, require_enabled)
                && self.nodes.get(*id).is_some_and(|n| n.props.bounds.contains(local))
        })
    }

    /// Deepest element under `point`: the topmost window-level hit, then
    /// recursively the topmost child under the point.
    pub fn deepest_at(&self, point: Point, require_enabled: bool) -> Option<ElementId> {
        let mut hit = self.hit_in(None, point, require_enabled)?;
        let mut local = point;
        loop {
            let Some(b) = self.props(hit).map(|p| p.bounds) else {
                return Some(hit);
            };
            local = local.offset(-b.x, -b.y);
            match self.hit_in(Some(hit), local, require_enabled) {
                Some(child) => hit = child,
                None => return Some(hit),
            }
        }
    }

    pub fn mark_dirty(&mut self, id: ElementId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next) {
                node.needs_redraw = true;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for node in self.nodes.values_mut() {
            node.needs_redraw = true;
        }
    }

    /// Rescales bounds and padding of every element, drops cached
    /// measurements and notifies elements.
    pub fn rescale(&mut self, new_scale: f32, old_scale: f32) {
        if old_scale <= 0.0 || new_scale == old_scale {
            return;
        }
        let factor = new_scale / old_scale;
        for node in self.nodes.values_mut() {
            node.props.bounds = node.props.bounds.scale(factor);
            node.props.padding = node.props.padding.scale(factor);
            node.anchor_ref = node.anchor_ref.map(|r| r.scale(factor));
            node.element.invalidate_measure();
            node.needs_redraw = true;
        }
        for node in self.nodes.values_mut() {
            node.element.on_dpi_changed(new_scale, old_scale);
        }
    }

    /// Lays out the window's children in `client`, then every subtree in
    /// its parent's padded local rectangle.
    ///
    /// Anchored elements are placed from the bounds and client rect
    /// captured at their first layout (or last explicit placement), so a
    /// collapse to zero size and back restores them exactly.
    pub fn perform_layout(&mut self, client: Rect) {
        let roots = self.roots.clone();
        self.layout_group(&roots, client);
    }

    fn layout_group(&mut self, ids: &[ElementId], client: Rect) {
        let mut remaining = client;
        for &id in ids.iter().rev() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let p = &node.props;
            let next = if p.dock != Dock::None {
                if !p.visible {
                    continue;
                }
                node.anchor_ref = None;
                dock_rect(p.dock, p.bounds.size(), &mut remaining)
            } else {
                match node.anchor_ref {
                    Some(r) => Some(anchor_rect(p.anchor, r.bounds, r.client, client)),
                    None => {
                        node.anchor_ref = Some(AnchorRef {
                            bounds: p.bounds,
                            client,
                        });
                        None
                    }
                }
            };
            if let Some(rect) = next {
                assign_bounds(node, rect);
            }
        }

        for &id in ids {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let inner = Rect::from_size(node.props.bounds.size()).deflate(node.props.padding);
            let children = node.children.clone();
            if !children.is_empty() {
                self.layout_group(&children, inner);
            }
        }
    }
}

fn assign_bounds(node: &mut Node, bounds: Rect) -> bool {
    if node.props.bounds == bounds {
        return false;
    }
    let resized = node.props.bounds.size() != bounds.size();
    node.props.bounds = bounds;
    node.needs_redraw = true;
    if resized {
        node.element.on_size_changed(bounds.size());
    }
    true
}
