use crate::{Point, Rect, RenderBackend};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorIcon {
    #[default]
    Default,
    Pointer,
    Text,
    Move,
    Wait,
    NotAllowed,
    ResizeHorizontal,
    ResizeVertical,
}

/// Services the native window provides to the engine.
///
/// Every call happens on the thread that runs the native loop. Positions
/// are in physical screen pixels.
pub trait WindowHost {
    /// Ask for a paint on the next natural repaint (coalesced natively).
    fn request_repaint(&self);
    /// Post a wake-up so an update runs on the next loop turn.
    fn queue_update(&self);
    fn scale_factor(&self) -> f32;
    fn set_cursor(&self, icon: CursorIcon);
    fn set_capture(&self);
    fn release_capture(&self);
    fn cursor_screen_position(&self) -> Option<Point>;
    /// Usable area of the monitor containing `point`.
    fn work_area_at(&self, point: Point) -> Rect;
    /// Outer window bounds in screen space.
    fn outer_bounds(&self) -> Rect;
    fn set_outer_position(&self, position: Point);
    fn set_outer_bounds(&self, bounds: Rect);
    /// Adjust native styles (clip-children, compositing) for `backend`.
    fn apply_render_styles(&self, backend: RenderBackend);
    fn minimize(&self);
    fn close(&self);
}
