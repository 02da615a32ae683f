use std::rc::Rc;

use casement_core::{
    AnimationTick, CursorIcon, GpuRendererFactory, KeyEvent, MouseEvent, PaintTarget, Point, Rect,
    RenderBackend, RenderConfig, RenderError, Size, WindowHost,
};
use casement_render_cpu::FontRasterizer;
use web_time::Instant;

use crate::chrome::{ChromeAction, ChromeOptions, Tab, WindowChrome, merge_ticks};
use crate::element::{Element, ElementId, ElementProps, Request};
use crate::pipeline::{Composer, RenderPipeline};
use crate::router::{InputRouter, dispatch};
use crate::scene::SceneGraph;

/// A custom-chrome window: owns the element scene, routes native input to
/// elements and the title bar, and paints frames through its pipeline.
///
/// Sizes and positions are physical pixels of the client area.
pub struct Window {
    host: Rc<dyn WindowHost>,
    scene: SceneGraph,
    router: InputRouter,
    chrome: WindowChrome,
    pipeline: RenderPipeline,
    size: Size,
    scale: f32,
    layout_suspended: u32,
    layout_pending: bool,
    animating: bool,
    cursor: CursorIcon,
    actions: Vec<ChromeAction>,
}

impl Window {
    pub fn new(host: Rc<dyn WindowHost>, config: RenderConfig, options: ChromeOptions) -> Self {
        let scale = host.scale_factor();
        let size = host.outer_bounds().size();
        let mut window = Self {
            host,
            scene: SceneGraph::new(),
            router: InputRouter::default(),
            chrome: WindowChrome::new(options),
            pipeline: RenderPipeline::new(config),
            size,
            scale,
            layout_suspended: 0,
            layout_pending: false,
            animating: false,
            cursor: CursorIcon::Default,
            actions: Vec::new(),
        };
        window.relayout();
        window
    }

    pub fn host(&self) -> &dyn WindowHost {
        self.host.as_ref()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn chrome(&self) -> &WindowChrome {
        &self.chrome
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale
    }

    /// Area below the title bar that elements are laid out in.
    pub fn client_rect(&self) -> Rect {
        Rect::from_size(self.size).deflate(self.chrome.client_insets())
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_font(&mut self, font: Option<FontRasterizer>) {
        self.pipeline.set_font(font);
        self.relayout();
    }

    pub fn set_gpu_factory(&mut self, factory: Box<dyn GpuRendererFactory>) {
        self.pipeline.set_gpu_factory(factory);
    }

    pub fn set_backend(&mut self, backend: RenderBackend) {
        self.pipeline.set_backend(backend, self.host.as_ref());
    }

    pub fn set_show_perf_overlay(&mut self, show: bool) {
        self.pipeline.set_show_perf_overlay(show);
        self.invalidate();
    }

    // Scene

    pub fn add_element(&mut self, props: ElementProps, element: Box<dyn Element>) -> ElementId {
        self.insert(None, props, element)
    }

    pub fn add_child(
        &mut self,
        parent: ElementId,
        props: ElementProps,
        element: Box<dyn Element>,
    ) -> ElementId {
        self.insert(Some(parent), props, element)
    }

    fn insert(
        &mut self,
        parent: Option<ElementId>,
        props: ElementProps,
        element: Box<dyn Element>,
    ) -> ElementId {
        let id = self.scene.insert(parent, props, element);
        self.perform_layout();
        self.invalidate();
        id
    }

    /// Removes an element and its subtree, clearing hover, capture and
    /// focus that pointed into it.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let removed = self.scene.remove(id);
        if removed.is_empty() {
            return false;
        }
        if self.router.clear_removed(&removed) {
            self.host.release_capture();
        }
        self.perform_layout();
        self.invalidate();
        true
    }

    pub fn element<T: Element>(&self, id: ElementId) -> Option<&T> {
        self.scene.element(id)
    }

    /// Mutable access to a widget; marks it for redraw.
    pub fn element_mut<T: Element>(&mut self, id: ElementId) -> Option<&mut T> {
        if self.scene.contains(id) {
            self.invalidate();
        }
        self.scene.element_mut(id)
    }

    /// Edits the engine state of an element, then relayouts. The edited
    /// bounds become the element's new anchor placement.
    pub fn update_props(&mut self, id: ElementId, f: impl FnOnce(&mut ElementProps)) {
        if !self.scene.update_props(id, f) {
            return;
        }
        self.perform_layout();
        self.invalidate();
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        self.scene.set_visible(id, visible);
        self.perform_layout();
        self.invalidate();
    }

    pub fn bring_to_front(&mut self, id: ElementId) {
        if self.scene.bring_to_front(id) && self.layout_suspended == 0 {
            self.invalidate();
        }
    }

    pub fn send_to_back(&mut self, id: ElementId) {
        if self.scene.send_to_back(id) && self.layout_suspended == 0 {
            self.invalidate();
        }
    }

    pub fn set_z_order(&mut self, id: ElementId, z: i32) {
        self.scene.set_z_order(id, z);
        if self.layout_suspended == 0 {
            self.invalidate();
        }
    }

    /// Batches layout and z-order changes until the matching
    /// [`Window::resume_layout`].
    pub fn suspend_layout(&mut self) {
        self.layout_suspended += 1;
    }

    pub fn resume_layout(&mut self, perform: bool) {
        self.layout_suspended = self.layout_suspended.saturating_sub(1);
        if self.layout_suspended == 0 {
            if perform || self.layout_pending {
                self.perform_layout();
            }
            self.invalidate();
        }
    }

    pub fn perform_layout(&mut self) {
        if self.layout_suspended > 0 {
            self.layout_pending = true;
            return;
        }
        self.layout_pending = false;
        let client = self.client_rect();
        self.scene.perform_layout(client);
    }

    fn relayout(&mut self) {
        self.chrome
            .layout(self.size, self.scale, self.pipeline.text_measurer());
        self.perform_layout();
    }

    // Chrome and tabs

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.chrome.options.title = title.into();
        self.invalidate();
    }

    /// Changes chrome options or palette, then recomputes the title bar.
    pub fn update_chrome(&mut self, f: impl FnOnce(&mut WindowChrome)) {
        f(&mut self.chrome);
        self.relayout();
        self.invalidate();
    }

    /// Adds a tab whose `page` element is shown while it is selected.
    pub fn add_tab(&mut self, title: impl Into<String>, page: Option<ElementId>) -> usize {
        let index = self.chrome.tabs.push(title, page);
        self.sync_pages();
        index
    }

    pub fn remove_tab(&mut self, index: usize) -> Option<Tab> {
        let tab = self.chrome.tabs.remove(index)?;
        if let Some(page) = tab.page {
            self.scene.set_visible(page, false);
        }
        self.sync_pages();
        Some(tab)
    }

    pub fn select_tab(&mut self, index: usize) -> bool {
        let origin = self
            .chrome
            .tabs
            .rects()
            .get(index)
            .map_or(Point::ZERO, |r| r.center());
        let Some((index, previous)) = self.chrome.tabs.select(index as isize, origin) else {
            return false;
        };
        self.actions
            .push(ChromeAction::SelectTab { index, previous });
        self.sync_pages();
        true
    }

    fn sync_pages(&mut self) {
        let pages: Vec<_> = self.chrome.tabs.page_visibility().collect();
        for (id, visible) in pages {
            self.scene.set_visible(id, visible);
        }
        self.relayout();
        self.invalidate();
    }

    /// Chrome actions since the last call, oldest first.
    pub fn take_chrome_actions(&mut self) -> Vec<ChromeAction> {
        std::mem::take(&mut self.actions)
    }

    fn run_chrome_actions(&mut self) {
        let actions = self.chrome.take_actions();
        if actions.is_empty() {
            return;
        }
        for action in &actions {
            log::debug!("chrome action {action:?}");
            match action {
                ChromeAction::Close => self.host.close(),
                ChromeAction::Minimize => self.host.minimize(),
                ChromeAction::ToggleMaximize => {
                    self.chrome.show_maximize(self.host.as_ref(), None);
                }
                ChromeAction::SelectTab { .. } => self.sync_pages(),
                ChromeAction::CloseTab(index) => {
                    self.remove_tab(*index);
                }
                _ => {}
            }
        }
        self.actions.extend(actions);
        self.invalidate();
    }

    // Frame

    /// Schedules a repaint.
    pub fn invalidate(&mut self) {
        let animating = self.animating || self.chrome.is_animating();
        self.pipeline.invalidate(self.host.as_ref(), animating);
    }

    /// Marks one element for redraw and schedules a repaint.
    pub fn invalidate_element(&mut self, id: ElementId) {
        self.scene.mark_dirty(id);
        self.invalidate();
    }

    /// Advances chrome and element animations by one frame. Returns `true`
    /// while anything is still animating.
    pub fn animate(&mut self) -> bool {
        let mut tick = self.chrome.animate();
        let ids: Vec<ElementId> = self.scene.ids().collect();
        for id in ids {
            let Some(node) = self.scene.node_mut(id) else {
                continue;
            };
            let t = node.element.animate();
            if t.needs_redraw() {
                node.needs_redraw = true;
            }
            tick = merge_ticks(tick, t);
        }
        self.animating = tick == AnimationTick::Progressed;
        if tick.needs_redraw() {
            self.invalidate();
        }
        self.animating
    }

    /// Runs a software update queued by [`Window::invalidate`].
    pub fn handle_queued_update(&mut self) -> bool {
        self.pipeline.run_queued_update(self.host.as_ref())
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.pipeline.idle_deadline()
    }

    pub fn run_idle_maintenance(&mut self, now: Instant) -> bool {
        self.pipeline.run_idle_maintenance(now)
    }

    /// Forwards a surface resize; the software buffer follows on the next
    /// paint.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = Size::new(width as f32, height as f32);
        self.pipeline.resize(width, height);
        if size == self.size {
            return;
        }
        self.size = size;
        self.relayout();
        self.invalidate();
    }

    /// Rescales every element and chrome metric for a new DPI scale.
    pub fn set_scale_factor(&mut self, scale: f32) {
        if scale <= 0.0 || scale == self.scale {
            return;
        }
        self.pipeline.suppress_updates();
        let old = self.scale;
        self.scale = scale;
        self.scene.rescale(scale, old);
        self.relayout();
        self.pipeline.release_back_buffer();
        self.pipeline.request_full_redraw();
        self.pipeline.resume_updates();
        self.invalidate();
        log::debug!("scale factor {old} -> {scale}");
    }

    /// Renders and presents one frame of `width` x `height` pixels.
    pub fn paint(
        &mut self,
        target: &mut dyn PaintTarget,
        width: i32,
        height: i32,
        now: Instant,
    ) -> Result<(), RenderError> {
        if width > 0 && height > 0 {
            let size = Size::new(width as f32, height as f32);
            if size != self.size {
                self.size = size;
                self.relayout();
            }
        }
        let hovered = self.router.hovered();
        if let Some(overlay) = self.pipeline.overlay_mut() {
            overlay.hovered = hovered.and_then(|id| self.scene.window_bounds(id));
        }
        let mut composer = Composer {
            scene: &mut self.scene,
            chrome: &self.chrome,
            hovered,
            focused: self.router.focused(),
            scale: self.scale,
        };
        let result = self.pipeline.paint(
            width,
            height,
            &mut composer,
            target,
            self.host.as_ref(),
            now,
        );
        if self.animating || self.chrome.is_animating() {
            self.invalidate();
        }
        result
    }

    // Input

    fn apply(&mut self, requests: Vec<Request>) {
        for request in requests {
            match request {
                Request::Capture(id) => {
                    if self.scene.contains(id) {
                        self.router.set_capture(id);
                        self.host.set_capture();
                    }
                }
                Request::ReleaseCapture(id) => {
                    if self.router.release_capture(id) {
                        self.host.release_capture();
                    }
                }
                Request::BringToFront(id) => self.bring_to_front(id),
                Request::SendToBack(id) => self.send_to_back(id),
                Request::Invalidate(id) => self.invalidate_element(id),
                Request::FullRedraw => {
                    self.pipeline.request_full_redraw();
                    self.invalidate();
                }
                Request::Focus(id) => {
                    let more = self.router.set_focus(&mut self.scene, Some(id), self.scale);
                    self.apply(more);
                }
                Request::SetCursor(icon) => self.set_cursor(icon),
            }
        }
    }

    fn set_cursor(&mut self, icon: CursorIcon) {
        if self.cursor != icon {
            self.cursor = icon;
            self.host.set_cursor(icon);
        }
    }

    fn focus(&mut self, id: Option<ElementId>) {
        let requests = self.router.set_focus(&mut self.scene, id, self.scale);
        self.apply(requests);
    }

    fn root_of(&self, mut id: ElementId) -> ElementId {
        while let Some(parent) = self.scene.parent(id) {
            id = parent;
        }
        id
    }

    pub fn mouse_down(&mut self, e: MouseEvent) {
        let p = e.position;
        let Some(id) = self.router.target(&self.scene, p, true) else {
            self.focus(None);
            if self.chrome.mouse_down(p, e.button, self.host.as_ref()) {
                log::trace!("title drag started at {p:?}");
            }
            return;
        };
        let previous_focus = self.router.focused();
        let requests =
            self.router
                .deliver(&mut self.scene, id, &e, self.scale, |el, e, cx| el.on_mouse_down(e, cx));
        self.apply(requests);
        if self.router.focused() == previous_focus
            && !previous_focus.is_some_and(|f| self.scene.is_descendant_of(f, id))
        {
            self.focus(Some(id));
        }
        let top = self.root_of(id);
        self.bring_to_front(top);
    }

    pub fn mouse_up(&mut self, e: MouseEvent) {
        if let Some(captured) = self.router.captured() {
            let requests = self.router.deliver(
                &mut self.scene,
                captured,
                &e,
                self.scale,
                |el, e, cx| el.on_mouse_up(e, cx),
            );
            self.apply(requests);
            if e.is_left() && self.router.release_capture(captured) {
                self.host.release_capture();
            }
        } else if let Some(id) = self.router.target(&self.scene, e.position, true) {
            let requests =
                self.router
                    .deliver(&mut self.scene, id, &e, self.scale, |el, e, cx| el.on_mouse_up(e, cx));
            self.apply(requests);
        }
        if self.chrome.mouse_up(self.host.as_ref()) {
            self.invalidate();
        }
    }

    pub fn mouse_move(&mut self, e: MouseEvent) {
        let p = e.position;
        if let Some(captured) = self.router.captured() {
            let requests = self.router.deliver(
                &mut self.scene,
                captured,
                &e,
                self.scale,
                |el, e, cx| el.on_mouse_move(e, cx),
            );
            self.apply(requests);
            return;
        }
        if self.chrome.drag_move(self.host.as_ref()) {
            return;
        }
        if self.chrome.update_hover(p) {
            self.invalidate();
        }
        let requests = self.router.update_hover(&mut self.scene, Some(p), self.scale);
        self.apply(requests);
        if let Some(id) = self.router.hovered() {
            let requests =
                self.router
                    .deliver(&mut self.scene, id, &e, self.scale, |el, e, cx| el.on_mouse_move(e, cx));
            self.apply(requests);
        }
        let cursor = self.router.cursor_at(&self.scene, p);
        self.set_cursor(cursor);
    }

    pub fn mouse_leave(&mut self) {
        if self.chrome.clear_hover() {
            self.invalidate();
        }
        let requests = self.router.update_hover(&mut self.scene, None, self.scale);
        self.apply(requests);
        self.set_cursor(CursorIcon::Default);
    }

    pub fn click(&mut self, e: MouseEvent) {
        if let Some(id) = self.router.target(&self.scene, e.position, true) {
            let requests =
                self.router
                    .deliver(&mut self.scene, id, &e, self.scale, |el, e, cx| el.on_click(e, cx));
            self.apply(requests);
            return;
        }
        if self.chrome.click(e.position, e.button) {
            self.run_chrome_actions();
        }
    }

    pub fn double_click(&mut self, e: MouseEvent) {
        if let Some(id) = self.router.target(&self.scene, e.position, true) {
            let requests = self.router.deliver(&mut self.scene, id, &e, self.scale, |el, e, cx| {
                el.on_double_click(e, cx)
            });
            self.apply(requests);
            let top = self.root_of(id);
            self.bring_to_front(top);
            return;
        }
        self.focus(None);
        if self.chrome.double_click(e.position) {
            self.run_chrome_actions();
        }
    }

    /// Returns `true` when an element consumed the wheel event.
    pub fn mouse_wheel(&mut self, e: MouseEvent) -> bool {
        let (consumed, requests) = self.router.wheel(&mut self.scene, &e, self.scale);
        self.apply(requests);
        consumed
    }

    pub fn key_down(&mut self, e: &KeyEvent) {
        if let Some(id) = self.router.focused() {
            let requests = dispatch(&mut self.scene, id, self.scale, |el, cx| el.on_key_down(e, cx));
            self.apply(requests);
        }
    }

    pub fn key_up(&mut self, e: &KeyEvent) {
        if let Some(id) = self.router.focused() {
            let requests = dispatch(&mut self.scene, id, self.scale, |el, cx| el.on_key_up(e, cx));
            self.apply(requests);
        }
    }

    pub fn char_input(&mut self, ch: char) {
        if let Some(id) = self.router.focused() {
            let requests = dispatch(&mut self.scene, id, self.scale, |el, cx| el.on_char(ch, cx));
            self.apply(requests);
        }
    }
}
