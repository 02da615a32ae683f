use std::cell::Cell;
use std::sync::Arc;

use casement_core::{CursorIcon, Point, Rect, RenderBackend, WindowHost};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoopProxy;
use winit::window::Window;

use crate::common::{cursor_icon, monitor_at};

/// Wake-ups posted to the event loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    /// A window queued a software update for the next loop turn.
    Update(winit::window::WindowId),
}

/// [`WindowHost`] over a winit window.
///
/// winit has no pointer capture, so capture is only tracked; winit keeps
/// delivering moves to the pressed window on the platforms that matter.
/// The work area is the full monitor rect.
pub struct WinitHost {
    window: Arc<Window>,
    proxy: EventLoopProxy<UserEvent>,
    captured: Cell<bool>,
    close_requested: Cell<bool>,
    // client-space pointer, fed by the runner
    pointer: Cell<Option<Point>>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            window,
            proxy,
            captured: Cell::new(false),
            close_requested: Cell::new(false),
            pointer: Cell::new(None),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn is_captured(&self) -> bool {
        self.captured.get()
    }

    pub fn take_close_request(&self) -> bool {
        self.close_requested.replace(false)
    }

    pub fn set_pointer(&self, position: Option<Point>) {
        self.pointer.set(position);
    }

    fn inner_origin(&self) -> Point {
        match self.window.inner_position() {
            Ok(p) => Point::new(p.x as f32, p.y as f32),
            // Wayland does not report window positions
            Err(_) => Point::ZERO,
        }
    }

    fn monitors(&self) -> Vec<Rect> {
        self.window
            .available_monitors()
            .map(|m| {
                let p = m.position();
                let s = m.size();
                Rect::new(p.x as f32, p.y as f32, s.width as f32, s.height as f32)
            })
            .collect()
    }
}

impl WindowHost for WinitHost {
    fn request_repaint(&self) {
        self.window.request_redraw();
    }

    fn queue_update(&self) {
        if self
            .proxy
            .send_event(UserEvent::Update(self.window.id()))
            .is_err()
        {
            log::debug!("event loop closed; update dropped");
        }
    }

    fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn set_cursor(&self, icon: CursorIcon) {
        self.window.set_cursor(cursor_icon(icon));
    }

    fn set_capture(&self) {
        if !self.captured.replace(true) {
            log::trace!("capture set on {:?}", self.window.id());
        }
    }

    fn release_capture(&self) {
        if self.captured.replace(false) {
            log::trace!("capture released on {:?}", self.window.id());
        }
    }

    fn cursor_screen_position(&self) -> Option<Point> {
        let p = self.pointer.get()?;
        let origin = self.inner_origin();
        Some(Point::new(origin.x + p.x, origin.y + p.y))
    }

    fn work_area_at(&self, point: Point) -> Rect {
        monitor_at(&self.monitors(), point)
            .or_else(|| {
                self.window.current_monitor().map(|m| {
                    let p = m.position();
                    let s = m.size();
                    Rect::new(p.x as f32, p.y as f32, s.width as f32, s.height as f32)
                })
            })
            .unwrap_or_else(|| self.outer_bounds())
    }

    fn outer_bounds(&self) -> Rect {
        let origin = match self.window.outer_position() {
            Ok(p) => Point::new(p.x as f32, p.y as f32),
            Err(_) => Point::ZERO,
        };
        let size = self.window.outer_size();
        Rect::new(origin.x, origin.y, size.width as f32, size.height as f32)
    }

    fn set_outer_position(&self, position: Point) {
        self.window.set_outer_position(PhysicalPosition::new(
            position.x.round() as i32,
            position.y.round() as i32,
        ));
    }

    fn set_outer_bounds(&self, bounds: Rect) {
        self.set_outer_position(bounds.origin());
        let requested = PhysicalSize::new(
            bounds.w.round().max(1.0) as u32,
            bounds.h.round().max(1.0) as u32,
        );
        // Some(size) means the resize was applied synchronously
        if let Some(size) = self.window.request_inner_size(requested) {
            log::trace!("resized to {}x{}", size.width, size.height);
        }
    }

    fn apply_render_styles(&self, backend: RenderBackend) {
        // winit surfaces need no per-backend window styles
        log::debug!("{:?} now renders with {backend}", self.window.id());
    }

    fn minimize(&self) {
        self.window.set_minimized(true);
    }

    fn close(&self) {
        self.close_requested.set(true);
    }
}
