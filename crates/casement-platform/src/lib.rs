//! Desktop runner for Casement windows.
//!
//! [`Runner`] opens undecorated winit windows, wraps each in a
//! [`casement_ui::Window`] and feeds it native input. Software frames go
//! out through softbuffer; with the `gpu` feature the window can also
//! render through `casement-render-wgpu`.
//!
//! ```no_run
//! use casement_platform::{Runner, WindowSpec};
//! use casement_ui::{Dock, ElementProps, Panel};
//!
//! fn main() -> anyhow::Result<()> {
//!     Runner::new()
//!         .window(WindowSpec::new("Hello"), |window| {
//!             window.add_element(ElementProps::docked(Dock::Fill), Box::new(Panel::default()));
//!         })
//!         .run()
//! }
//! ```

pub mod common;
pub mod host;
pub mod present;
pub mod registry;
#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;

use casement_core::{KeyEvent, Modifiers, MouseEvent, Point, RenderConfig, WindowHost};
use casement_render_cpu::FontRasterizer;
use casement_ui::{ChromeAction, ChromeOptions, Window};
use web_time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{WindowAttributes, WindowId};

pub use common::{ClickTracker, Synthesized};
pub use host::{UserEvent, WinitHost};
pub use present::SoftbufferTarget;
pub use registry::{WindowEntry, WindowRegistry};

/// What to open: native size plus the window's render and chrome options.
#[derive(Clone, Debug)]
pub struct WindowSpec {
    pub size: (u32, u32),
    pub config: RenderConfig,
    pub chrome: ChromeOptions,
}

impl WindowSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            size: (960, 640),
            config: RenderConfig::from_env(),
            chrome: ChromeOptions {
                title: title.into(),
                ..ChromeOptions::default()
            },
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chrome(mut self, f: impl FnOnce(&mut ChromeOptions)) -> Self {
        f(&mut self.chrome);
        self
    }
}

type BuildFn = Box<dyn FnOnce(&mut Window)>;
type ActionFn = Box<dyn FnMut(&mut Window, &ChromeAction)>;

/// Opens windows and runs the event loop until the last one closes.
pub struct Runner {
    pending: Vec<(WindowSpec, BuildFn)>,
    on_action: Option<ActionFn>,
    registry: WindowRegistry,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            on_action: None,
            registry: WindowRegistry::new(),
        }
    }

    /// Queues a window; `build` fills it once the native window exists.
    pub fn window(mut self, spec: WindowSpec, build: impl FnOnce(&mut Window) + 'static) -> Self {
        self.pending.push((spec, Box::new(build)));
        self
    }

    /// Receives every chrome action after the window handled its own part
    /// (close, minimize, maximize, tab selection and removal).
    pub fn on_action(mut self, f: impl FnMut(&mut Window, &ChromeAction) + 'static) -> Self {
        self.on_action = Some(Box::new(f));
        self
    }

    pub fn registry(&self) -> WindowRegistry {
        self.registry.clone()
    }

    pub fn run(self) -> anyhow::Result<()> {
        // respect a logger the application installed itself
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();

        let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
        let proxy = event_loop.create_proxy();
        let font = FontRasterizer::load_system();
        let mut app = App {
            pending: self.pending,
            on_action: self.on_action,
            registry: self.registry,
            proxy,
            font,
            windows: HashMap::new(),
            started: false,
        };
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

struct OpenWindow {
    host: Rc<WinitHost>,
    window: Window,
    target: SoftbufferTarget,
    pointer: Option<Point>,
    modifiers: Modifiers,
    clicks: ClickTracker,
}

impl OpenWindow {
    fn pointer(&self) -> Point {
        self.pointer.unwrap_or(Point::ZERO)
    }

    fn handle(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.window.resize(size.width, size.height);
                self.host.request_repaint();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.window.set_scale_factor(scale_factor as f32);
            }
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = common::modifiers(m.state());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let p = Point::new(position.x as f32, position.y as f32);
                self.pointer = Some(p);
                self.host.set_pointer(Some(p));
                self.window
                    .mouse_move(MouseEvent::moved(p).with_modifiers(self.modifiers));
            }
            WindowEvent::CursorLeft { .. } => {
                // a title drag keeps going outside the client area
                if !self.host.is_captured() {
                    self.pointer = None;
                    self.host.set_pointer(None);
                    self.window.mouse_leave();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = common::mouse_button(button) else {
                    return;
                };
                let p = self.pointer();
                let event = MouseEvent::button(p, button).with_modifiers(self.modifiers);
                match state {
                    ElementState::Pressed => {
                        let clicks = self.clicks.press(Instant::now(), p, button);
                        self.window.mouse_down(event.with_clicks(clicks));
                    }
                    ElementState::Released => {
                        self.window.mouse_up(event);
                        match self.clicks.release(p, button) {
                            Some(Synthesized::Click) => self.window.click(event),
                            Some(Synthesized::DoubleClick) => {
                                self.window.double_click(event.with_clicks(2))
                            }
                            None => {}
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let e = MouseEvent::wheel(self.pointer(), common::wheel_lines(delta))
                    .with_modifiers(self.modifiers);
                self.window.mouse_wheel(e);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let key = KeyEvent {
                    key: common::key(&event.logical_key),
                    modifiers: self.modifiers,
                    is_repeat: event.repeat,
                };
                match event.state {
                    ElementState::Pressed => {
                        self.window.key_down(&key);
                        if let Some(text) = event.text.as_deref() {
                            for ch in text.chars().filter(|c| !c.is_control()) {
                                self.window.char_input(ch);
                            }
                        }
                    }
                    ElementState::Released => self.window.key_up(&key),
                }
            }
            WindowEvent::Focused(false) => {
                self.clicks.cancel();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn redraw(&mut self) {
        self.window.animate();
        let size = self.host.window().inner_size();
        let result = self.window.paint(
            &mut self.target,
            size.width as i32,
            size.height as i32,
            Instant::now(),
        );
        if let Err(e) = result {
            log::warn!("frame failed: {e}");
        }
        if self.window.pipeline().gpu_context().is_some() {
            self.target.release();
        }
    }
}

struct App {
    pending: Vec<(WindowSpec, BuildFn)>,
    on_action: Option<ActionFn>,
    registry: WindowRegistry,
    proxy: EventLoopProxy<UserEvent>,
    font: Option<FontRasterizer>,
    windows: HashMap<WindowId, OpenWindow>,
    started: bool,
}

impl App {
    fn open(&mut self, el: &ActiveEventLoop, spec: WindowSpec, build: BuildFn) {
        let attrs = WindowAttributes::default()
            .with_title(spec.chrome.title.clone())
            .with_inner_size(PhysicalSize::new(spec.size.0.max(1), spec.size.1.max(1)))
            .with_decorations(false);
        let native = match el.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window {:?}: {e}", spec.chrome.title);
                return;
            }
        };
        let id = native.id();
        let host = Rc::new(WinitHost::new(native.clone(), self.proxy.clone()));
        let title = spec.chrome.title.clone();
        let mut window = Window::new(host.clone() as Rc<dyn WindowHost>, spec.config, spec.chrome);
        window.set_font(self.font.clone());
        #[cfg(feature = "gpu")]
        window.set_gpu_factory(Box::new(
            casement_render_wgpu::WgpuRendererFactory::new(native.clone())
                .with_font(self.font.clone()),
        ));
        let inner = native.inner_size();
        window.resize(inner.width, inner.height);
        build(&mut window);
        window.invalidate();

        self.registry.register(id, title);
        self.windows.insert(
            id,
            OpenWindow {
                host,
                window,
                target: SoftbufferTarget::new(native),
                pointer: None,
                modifiers: Modifiers::default(),
                clicks: ClickTracker::default(),
            },
        );
        log::info!("opened window {id:?}");
    }

    fn close(&mut self, el: &ActiveEventLoop, id: WindowId) {
        if self.windows.remove(&id).is_none() {
            return;
        }
        log::info!("closed window {id:?}");
        if self.registry.unregister(id) {
            log::info!("last window closed; exiting");
            el.exit();
        }
    }

    /// Hands queued chrome actions to the application and honours close
    /// requests raised while handling the event.
    fn after_event(&mut self, el: &ActiveEventLoop, id: WindowId) {
        let Some(open) = self.windows.get_mut(&id) else {
            return;
        };
        let actions = open.window.take_chrome_actions();
        if let Some(on_action) = self.on_action.as_mut() {
            for action in &actions {
                on_action(&mut open.window, action);
            }
        }
        if open.host.take_close_request() {
            self.close(el, id);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;
        for (spec, build) in std::mem::take(&mut self.pending) {
            self.open(el, spec, build);
        }
        if self.windows.is_empty() {
            log::warn!("no window could be opened");
            el.exit();
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    self.close(el, id);
                    return;
                }
                WindowEvent::Focused(true) => {
                    self.registry.set_active(id);
                }
                _ => {}
            }
            if let Some(open) = self.windows.get_mut(&id) {
                open.handle(event);
            }
            self.after_event(el, id);
        }));
        if let Err(panic) = outcome {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            log::error!("panic while handling a window event: {msg}");
        }
    }

    fn user_event(&mut self, el: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Update(id) => {
                if let Some(open) = self.windows.get_mut(&id) {
                    open.window.handle_queued_update();
                }
                self.after_event(el, id);
            }
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        let now = Instant::now();
        let mut next = None;
        for open in self.windows.values_mut() {
            open.window.run_idle_maintenance(now);
            if let Some(deadline) = open.window.idle_deadline() {
                next = Some(match next {
                    Some(n) if n < deadline => n,
                    _ => deadline,
                });
            }
        }
        el.set_control_flow(match next {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }

    fn exiting(&mut self, _el: &ActiveEventLoop) {
        self.windows.clear();
        self.registry.clear();
    }
}
