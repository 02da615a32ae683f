use std::any::Any;

use bitflags::bitflags;
use casement_core::{
    AnimationTick, Canvas, CursorIcon, GpuContext, Insets, KeyEvent, MouseEvent, Rect, Size,
    TextMeasurer,
};

slotmap::new_key_type! {
    /// Handle to an element living in a [`SceneGraph`](crate::SceneGraph).
    pub struct ElementId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dock {
    #[default]
    None,
    Top,
    Bottom,
    Left,
    Right,
    Fill,
}

bitflags! {
    /// Parent edges an undocked element follows when the parent resizes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Anchor: u8 {
        const TOP = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::TOP | Anchor::LEFT
    }
}

/// Engine-owned state of an element. `bounds` is relative to the parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementProps {
    pub bounds: Rect,
    pub z_order: i32,
    pub visible: bool,
    pub enabled: bool,
    pub dock: Dock,
    pub anchor: Anchor,
    pub padding: Insets,
    pub cursor: CursorIcon,
}

impl Default for ElementProps {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            z_order: 0,
            visible: true,
            enabled: true,
            dock: Dock::None,
            anchor: Anchor::default(),
            padding: Insets::ZERO,
            cursor: CursorIcon::Default,
        }
    }
}

impl ElementProps {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    pub fn docked(dock: Dock) -> Self {
        Self {
            dock,
            ..Default::default()
        }
    }

    pub fn dock(mut self, dock: Dock) -> Self {
        self.dock = dock;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn cursor(mut self, cursor: CursorIcon) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn z_order(mut self, z: i32) -> Self {
        self.z_order = z;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Context for [`Element::render`].
///
/// The canvas is already offset to the element's origin and clipped to its
/// bounds, so `(0, 0, size)` is the element's own rectangle.
pub struct RenderCx<'a> {
    pub canvas: &'a mut dyn Canvas,
    /// Live GPU device when the frame goes through a GPU backend.
    pub gpu: Option<&'a GpuContext>,
    pub size: Size,
    /// Set when the element was invalidated (or a full redraw is pending)
    /// since its last render.
    pub needs_redraw: bool,
    pub scale: f32,
    pub hovered: bool,
    pub focused: bool,
    pub enabled: bool,
    pub text: &'a dyn TextMeasurer,
}

impl RenderCx<'_> {
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size)
    }
}

/// What an element asked of its window while handling an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    Capture(ElementId),
    ReleaseCapture(ElementId),
    BringToFront(ElementId),
    SendToBack(ElementId),
    Invalidate(ElementId),
    FullRedraw,
    Focus(ElementId),
    SetCursor(CursorIcon),
}

/// Handed to element hooks; collects [`Request`]s the window applies once
/// the hook returns.
#[derive(Debug)]
pub struct EventCx {
    id: ElementId,
    size: Size,
    scale: f32,
    requests: Vec<Request>,
}

impl EventCx {
    pub(crate) fn new(id: ElementId, size: Size, scale: f32) -> Self {
        Self {
            id,
            size,
            scale,
            requests: Vec::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Route every pointer event to this element until released.
    pub fn capture_mouse(&mut self) {
        self.requests.push(Request::Capture(self.id));
    }

    pub fn release_mouse(&mut self) {
        self.requests.push(Request::ReleaseCapture(self.id));
    }

    pub fn bring_to_front(&mut self) {
        self.requests.push(Request::BringToFront(self.id));
    }

    pub fn send_to_back(&mut self) {
        self.requests.push(Request::SendToBack(self.id));
    }

    pub fn invalidate(&mut self) {
        self.requests.push(Request::Invalidate(self.id));
    }

    pub fn request_full_redraw(&mut self) {
        self.requests.push(Request::FullRedraw);
    }

    pub fn focus(&mut self) {
        self.requests.push(Request::Focus(self.id));
    }

    pub fn set_cursor(&mut self, icon: CursorIcon) {
        self.requests.push(Request::SetCursor(icon));
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub(crate) fn into_requests(self) -> Vec<Request> {
        self.requests
    }
}

/// A node of the window's scene graph.
///
/// Widgets implement `render` and whichever hooks they care about. Mouse
/// positions are in the element's local space.
pub trait Element: Any {
    fn render(&mut self, cx: &mut RenderCx<'_>);

    fn on_added(&mut self) {}
    fn on_removed(&mut self) {}
    fn on_dpi_changed(&mut self, _new_scale: f32, _old_scale: f32) {}
    fn on_size_changed(&mut self, _size: Size) {}
    /// Drop cached text and size measurements.
    fn invalidate_measure(&mut self) {}
    /// Advance running animations by one frame.
    fn animate(&mut self) -> AnimationTick {
        AnimationTick::Idle
    }

    fn on_mouse_down(&mut self, _e: &MouseEvent, _cx: &mut EventCx) {}
    fn on_mouse_up(&mut self, _e: &MouseEvent, _cx: &mut EventCx) {}
    fn on_click(&mut self, _e: &MouseEvent, _cx: &mut EventCx) {}
    fn on_double_click(&mut self, _e: &MouseEvent, _cx: &mut EventCx) {}
    fn on_mouse_move(&mut self, _e: &MouseEvent, _cx: &mut EventCx) {}
    fn on_mouse_enter(&mut self, _cx: &mut EventCx) {}
    fn on_mouse_leave(&mut self, _cx: &mut EventCx) {}
    /// Returns `true` when the wheel event was consumed.
    fn on_mouse_wheel(&mut self, _e: &MouseEvent, _cx: &mut EventCx) -> bool {
        false
    }

    fn on_key_down(&mut self, _e: &KeyEvent, _cx: &mut EventCx) {}
    fn on_key_up(&mut self, _e: &KeyEvent, _cx: &mut EventCx) {}
    fn on_char(&mut self, _ch: char, _cx: &mut EventCx) {}
    fn on_focus_changed(&mut self, _focused: bool, _cx: &mut EventCx) {}
}
