use casement_core::{CursorIcon, MouseEvent, Point};

use crate::element::{Element, ElementId, EventCx, Request};
use crate::scene::SceneGraph;

/// Pointer and keyboard targeting state of one window.
///
/// Every id is weak: removal of an element must go through
/// [`InputRouter::clear_removed`].
#[derive(Debug, Default)]
pub struct InputRouter {
    hovered: Option<ElementId>,
    captured: Option<ElementId>,
    focused: Option<ElementId>,
}

impl InputRouter {
    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    pub fn captured(&self) -> Option<ElementId> {
        self.captured
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub(crate) fn set_capture(&mut self, id: ElementId) {
        self.captured = Some(id);
    }

    /// Returns `true` if `id` held the capture.
    pub(crate) fn release_capture(&mut self, id: ElementId) -> bool {
        if self.captured == Some(id) {
            self.captured = None;
            true
        } else {
            false
        }
    }

    /// Forgets every removed id. Returns `true` if the capture was among
    /// them, so the caller can release the native capture.
    pub fn clear_removed(&mut self, removed: &[ElementId]) -> bool {
        let gone = |slot: &mut Option<ElementId>| {
            if slot.is_some_and(|id| removed.contains(&id)) {
                *slot = None;
                true
            } else {
                false
            }
        };
        gone(&mut self.hovered);
        gone(&mut self.focused);
        gone(&mut self.captured)
    }

    /// Receiver of a pointer event at `point`: the capturing element, or
    /// the deepest hit.
    pub fn target(
        &self,
        scene: &SceneGraph,
        point: Point,
        require_enabled: bool,
    ) -> Option<ElementId> {
        match self.captured.filter(|id| scene.contains(*id)) {
            Some(id) => Some(id),
            None => scene.deepest_at(point, require_enabled),
        }
    }

    /// Fires leave/enter when the hovered element changes.
    pub(crate) fn update_hover(
        &mut self,
        scene: &mut SceneGraph,
        point: Option<Point>,
        scale: f32,
    ) -> Vec<Request> {
        if self.captured.is_some() {
            return Vec::new();
        }
        let next = point.and_then(|p| scene.deepest_at(p, false));
        if next == self.hovered {
            return Vec::new();
        }
        let mut requests = Vec::new();
        if let Some(old) = self.hovered.take() {
            requests.extend(dispatch(scene, old, scale, |el, cx| el.on_mouse_leave(cx)));
        }
        self.hovered = next;
        if let Some(new) = next {
            requests.extend(dispatch(scene, new, scale, |el, cx| el.on_mouse_enter(cx)));
        }
        requests
    }

    /// Delivers a window-space event to `id` in its local space.
    pub(crate) fn deliver(
        &self,
        scene: &mut SceneGraph,
        id: ElementId,
        event: &MouseEvent,
        scale: f32,
        hook: impl FnOnce(&mut dyn Element, &MouseEvent, &mut EventCx),
    ) -> Vec<Request> {
        let Some(origin) = scene.window_bounds(id).map(|r| r.origin()) else {
            return Vec::new();
        };
        let local = event.translated(origin);
        dispatch(scene, id, scale, |el, cx| hook(el, &local, cx))
    }

    /// Offers a wheel event to the deepest element first, then bubbles up
    /// until one consumes it.
    pub(crate) fn wheel(
        &self,
        scene: &mut SceneGraph,
        event: &MouseEvent,
        scale: f32,
    ) -> (bool, Vec<Request>) {
        let mut requests = Vec::new();
        let mut current = self.target(scene, event.position, false);
        while let Some(id) = current {
            let mut consumed = false;
            requests.extend(self.deliver(scene, id, event, scale, |el, e, cx| {
                consumed = el.on_mouse_wheel(e, cx);
            }));
            if consumed {
                return (true, requests);
            }
            current = scene.parent(id);
        }
        (false, requests)
    }

    /// Moves keyboard focus, notifying both elements.
    pub(crate) fn set_focus(
        &mut self,
        scene: &mut SceneGraph,
        next: Option<ElementId>,
        scale: f32,
    ) -> Vec<Request> {
        let next = next.filter(|id| scene.contains(*id));
        if next == self.focused {
            return Vec::new();
        }
        let mut requests = Vec::new();
        if let Some(old) = self.focused.take() {
            requests.extend(dispatch(scene, old, scale, |el, cx| el.on_focus_changed(false, cx)));
        }
        self.focused = next;
        if let Some(new) = next {
            requests.extend(dispatch(scene, new, scale, |el, cx| el.on_focus_changed(true, cx)));
        }
        requests
    }

    /// Cursor of the deepest visible element under `point`.
    pub fn cursor_at(&self, scene: &SceneGraph, point: Point) -> CursorIcon {
        let id = match self.captured {
            Some(id) => Some(id),
            None => scene.deepest_at(point, false),
        };
        id.and_then(|id| scene.props(id))
            .filter(|p| p.enabled && p.visible)
            .map_or(CursorIcon::Default, |p| p.cursor)
    }
}

/// Runs `hook` on element `id` with a fresh [`EventCx`] and returns what
/// it requested.
pub(crate) fn dispatch(
    scene: &mut SceneGraph,
    id: ElementId,
    scale: f32,
    hook: impl FnOnce(&mut dyn Element, &mut EventCx),
) -> Vec<Request> {
    let Some(node) = scene.node_mut(id) else {
        return Vec::new();
    };
    let mut cx = EventCx::new(id, node.props.bounds.size(), scale);
    hook(node.element.as_mut(), &mut cx);
    cx.into_requests()
}
