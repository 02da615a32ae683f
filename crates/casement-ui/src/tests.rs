#![allow(clippy::float_cmp)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use casement_core::*;
use web_time::Instant;

use crate::*;

type Log = Rc<RefCell<Vec<String>>>;

struct FakeHost {
    repaints: Cell<u32>,
    queued: Cell<u32>,
    captures: Cell<u32>,
    releases: Cell<u32>,
    cursor: Cell<Option<Point>>,
    bounds: Cell<Rect>,
    work: Cell<Rect>,
    styles: RefCell<Vec<RenderBackend>>,
    closed: Cell<bool>,
    minimized: Cell<bool>,
}

impl FakeHost {
    fn new() -> Self {
        Self {
            repaints: Cell::new(0),
            queued: Cell::new(0),
            captures: Cell::new(0),
            releases: Cell::new(0),
            cursor: Cell::new(None),
            bounds: Cell::new(Rect::new(100.0, 100.0, 800.0, 600.0)),
            work: Cell::new(Rect::new(0.0, 0.0, 1920.0, 1040.0)),
            styles: RefCell::new(Vec::new()),
            closed: Cell::new(false),
            minimized: Cell::new(false),
        }
    }
}

impl WindowHost for FakeHost {
    fn request_repaint(&self) {
        self.repaints.set(self.repaints.get() + 1);
    }
    fn queue_update(&self) {
        self.queued.set(self.queued.get() + 1);
    }
    fn scale_factor(&self) -> f32 {
        1.0
    }
    fn set_cursor(&self, _icon: CursorIcon) {}
    fn set_capture(&self) {
        self.captures.set(self.captures.get() + 1);
    }
    fn release_capture(&self) {
        self.releases.set(self.releases.get() + 1);
    }
    fn cursor_screen_position(&self) -> Option<Point> {
        self.cursor.get()
    }
    fn work_area_at(&self, _point: Point) -> Rect {
        self.work.get()
    }
    fn outer_bounds(&self) -> Rect {
        self.bounds.get()
    }
    fn set_outer_position(&self, position: Point) {
        let b = self.bounds.get();
        self.bounds.set(Rect::new(position.x, position.y, b.w, b.h));
    }
    fn set_outer_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }
    fn apply_render_styles(&self, backend: RenderBackend) {
        self.styles.borrow_mut().push(backend);
    }
    fn minimize(&self) {
        self.minimized.set(true);
    }
    fn close(&self) {
        self.closed.set(true);
    }
}

#[derive(Default)]
struct Frames(Vec<(u32, u32, usize)>);

impl PaintTarget for Frames {
    fn present(&mut self, frame: SoftwareFrame<'_>) -> Result<(), RenderError> {
        self.0.push((frame.width, frame.height, frame.pixels.len()));
        Ok(())
    }
}

/// Keeps the pixels of the last presented frame.
#[derive(Default)]
struct LastFrame {
    width: u32,
    pixels: Vec<u8>,
}

impl LastFrame {
    fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[((y * self.width + x) * 4 + 3) as usize]
    }
}

impl PaintTarget for LastFrame {
    fn present(&mut self, frame: SoftwareFrame<'_>) -> Result<(), RenderError> {
        self.width = frame.width;
        self.pixels = frame.pixels.to_vec();
        Ok(())
    }
}

struct FakeGpu {
    ctx: GpuContext,
    fail_frames: Rc<Cell<u32>>,
    rendered: Rc<Cell<u32>>,
}

impl GpuRenderer for FakeGpu {
    fn context(&self) -> &GpuContext {
        &self.ctx
    }
    fn resize(&mut self, _width: u32, _height: u32) {}
    fn render(&mut self, _scene: &Scene) -> Result<(), RenderError> {
        if self.fail_frames.get() > 0 {
            self.fail_frames.set(self.fail_frames.get() - 1);
            return Err(RenderError::SurfaceLost);
        }
        self.rendered.set(self.rendered.get() + 1);
        Ok(())
    }
    fn trim(&mut self) {}
}

#[derive(Default)]
struct FakeGpuFactory {
    refuse: bool,
    fail_frames: Rc<Cell<u32>>,
    rendered: Rc<Cell<u32>>,
}

impl GpuRendererFactory for FakeGpuFactory {
    fn create(
        &mut self,
        backend: RenderBackend,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn GpuRenderer>, RenderError> {
        if self.refuse {
            return Err(RenderError::unavailable(backend, "no adapter"));
        }
        Ok(Box::new(FakeGpu {
            ctx: GpuContext {
                backend,
                adapter: "fake".into(),
                max_texture_dimension: 4096,
            },
            fail_frames: self.fail_frames.clone(),
            rendered: self.rendered.clone(),
        }))
    }
}

/// Element that records every hook it sees.
struct Spy {
    name: &'static str,
    log: Log,
    capture: bool,
    eat_wheel: bool,
    last_dirty: Option<bool>,
    dpi: Option<(f32, f32)>,
    measure_resets: u32,
}

impl Spy {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            capture: false,
            eat_wheel: false,
            last_dirty: None,
            dpi: None,
            measure_resets: 0,
        }
    }

    fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    fn eating_wheel(mut self) -> Self {
        self.eat_wheel = true;
        self
    }

    fn push(&self, what: String) {
        self.log.borrow_mut().push(format!("{}:{what}", self.name));
    }
}

impl Element for Spy {
    fn render(&mut self, cx: &mut RenderCx<'_>) {
        self.last_dirty = Some(cx.needs_redraw);
        cx.canvas.fill_rect(cx.bounds(), Color::WHITE, 0.0);
    }
    fn on_removed(&mut self) {
        self.push("removed".into());
    }
    fn on_dpi_changed(&mut self, new_scale: f32, old_scale: f32) {
        self.dpi = Some((new_scale, old_scale));
    }
    fn invalidate_measure(&mut self) {
        self.measure_resets += 1;
    }
    fn on_mouse_down(&mut self, e: &MouseEvent, cx: &mut EventCx) {
        self.push(format!("down {},{}", e.position.x, e.position.y));
        if self.capture {
            cx.capture_mouse();
        }
    }
    fn on_mouse_up(&mut self, e: &MouseEvent, _cx: &mut EventCx) {
        self.push(format!("up {},{}", e.position.x, e.position.y));
    }
    fn on_mouse_move(&mut self, e: &MouseEvent, _cx: &mut EventCx) {
        self.push(format!("move {},{}", e.position.x, e.position.y));
    }
    fn on_mouse_enter(&mut self, _cx: &mut EventCx) {
        self.push("enter".into());
    }
    fn on_mouse_leave(&mut self, _cx: &mut EventCx) {
        self.push("leave".into());
    }
    fn on_mouse_wheel(&mut self, _e: &MouseEvent, _cx: &mut EventCx) -> bool {
        self.push("wheel".into());
        self.eat_wheel
    }
    fn on_key_down(&mut self, e: &KeyEvent, _cx: &mut EventCx) {
        self.push(format!("key {:?}", e.key));
    }
    fn on_char(&mut self, ch: char, _cx: &mut EventCx) {
        self.push(format!("char {ch}"));
    }
    fn on_focus_changed(&mut self, focused: bool, _cx: &mut EventCx) {
        self.push(format!("focus {focused}"));
    }
}

fn window_with(config: RenderConfig) -> (Rc<FakeHost>, Window) {
    let host = Rc::new(FakeHost::new());
    let window = Window::new(host.clone(), config, ChromeOptions::titled("Test"));
    (host, window)
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

fn names(scene: &SceneGraph, ids: &[ElementId]) -> String {
    ids.iter()
        .map(|id| scene.element::<Spy>(*id).map_or("?", |p| p.name))
        .collect::<Vec<_>>()
        .join(" ")
}

fn left(x: f32, y: f32) -> MouseEvent {
    MouseEvent::button(Point::new(x, y), MouseButton::Left)
}

fn moved(x: f32, y: f32) -> MouseEvent {
    MouseEvent::moved(Point::new(x, y))
}

#[test]
fn hit_order_is_reverse_paint_order() {
    let log = Log::default();
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    let mut scene = SceneGraph::new();
    let a = scene.insert(None, ElementProps::new(r), Box::new(Spy::new("a", &log)));
    scene.insert(None, ElementProps::new(r), Box::new(Spy::new("b", &log)));
    scene.insert(None, ElementProps::new(r), Box::new(Spy::new("c", &log)));
    scene.insert(
        None,
        ElementProps::new(r).z_order(-1),
        Box::new(Spy::new("d", &log)),
    );

    insta::assert_snapshot!(names(&scene, &scene.paint_order(None)), @"d a b c");
    insta::assert_snapshot!(names(&scene, &scene.hit_test_order(None)), @"c b a d");

    scene.bring_to_front(a);
    insta::assert_snapshot!(names(&scene, &scene.paint_order(None)), @"d b c a");
    assert_eq!(scene.hit_test(Point::new(5.0, 5.0), true), Some(a));

    scene.send_to_back(a);
    insta::assert_snapshot!(names(&scene, &scene.paint_order(None)), @"a d b c");
}

#[test]
fn fill_siblings_overlap_and_front_wins() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let fill = || ElementProps::docked(Dock::Fill);
    let a = window.add_element(fill(), Box::new(Spy::new("a", &log)));
    let b = window.add_element(fill(), Box::new(Spy::new("b", &log)));
    let c = window.add_element(fill(), Box::new(Spy::new("c", &log)));

    let client = window.client_rect();
    assert_eq!(client, Rect::new(0.0, 32.0, 800.0, 568.0));
    for id in [a, b, c] {
        assert_eq!(window.scene().props(id).unwrap().bounds, client);
    }

    let p = Point::new(400.0, 300.0);
    assert_eq!(window.router().target(window.scene(), p, true), Some(c));
    window.bring_to_front(a);
    assert_eq!(window.router().target(window.scene(), p, true), Some(a));
}

#[test]
fn capture_routes_until_left_release() {
    let log = Log::default();
    let (host, mut window) = window_with(RenderConfig::default());
    window.add_element(
        ElementProps::new(Rect::new(10.0, 50.0, 100.0, 100.0)),
        Box::new(Spy::new("a", &log).capturing()),
    );
    window.add_element(
        ElementProps::new(Rect::new(300.0, 50.0, 100.0, 100.0)),
        Box::new(Spy::new("b", &log)),
    );

    window.mouse_move(moved(20.0, 60.0));
    window.mouse_down(left(20.0, 60.0));
    assert_eq!(host.captures.get(), 1);
    window.mouse_move(moved(350.0, 100.0));
    window.mouse_up(left(350.0, 100.0));
    assert_eq!(host.releases.get(), 1);
    assert_eq!(window.router().captured(), None);
    window.mouse_move(moved(350.0, 100.0));

    assert_eq!(
        take(&log),
        [
            "a:enter",
            "a:move 10,10",
            "a:down 10,10",
            "a:focus true",
            "a:move 340,50",
            "a:up 340,50",
            "a:leave",
            "b:enter",
            "b:move 50,50",
        ]
    );
}

#[test]
fn hover_enter_and_leave_pair_up() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    window.add_element(
        ElementProps::new(Rect::new(10.0, 50.0, 100.0, 100.0)),
        Box::new(Spy::new("a", &log)),
    );
    window.add_element(
        ElementProps::new(Rect::new(300.0, 50.0, 100.0, 100.0)),
        Box::new(Spy::new("b", &log)),
    );

    for (x, y) in [(20.0, 60.0), (30.0, 70.0), (350.0, 100.0), (600.0, 400.0), (20.0, 60.0)] {
        window.mouse_move(moved(x, y));
    }
    window.mouse_leave();
    assert_eq!(window.router().hovered(), None);

    let transitions: Vec<String> = take(&log)
        .into_iter()
        .filter(|e| e.ends_with("enter") || e.ends_with("leave"))
        .collect();
    assert_eq!(
        transitions,
        ["a:enter", "a:leave", "b:enter", "b:leave", "a:enter", "a:leave"]
    );
}

#[test]
fn gpu_init_failure_falls_back_to_software() {
    let (host, mut window) = window_with(RenderConfig::default().with_backend(RenderBackend::GpuNative));
    window.set_gpu_factory(Box::new(FakeGpuFactory {
        refuse: true,
        ..Default::default()
    }));
    let mut frames = Frames::default();

    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert_eq!(window.pipeline().backend(), RenderBackend::Software);
    assert_eq!(window.pipeline().config().backend, RenderBackend::Software);
    assert_eq!(window.pipeline().stats().gpu_fallbacks, 1);
    assert_eq!(frames.0, [(800, 600, 800 * 600 * 4)]);
    assert_eq!(host.styles.borrow().last(), Some(&RenderBackend::Software));

    // no retry on the next frame
    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert_eq!(window.pipeline().stats().gpu_fallbacks, 1);
    assert_eq!(frames.0.len(), 2);
}

#[test]
fn failed_gpu_frame_is_redrawn_in_software() {
    let (_host, mut window) = window_with(RenderConfig::default().with_backend(RenderBackend::GpuGl));
    let factory = FakeGpuFactory::default();
    factory.fail_frames.set(1);
    let rendered = factory.rendered.clone();
    window.set_gpu_factory(Box::new(factory));
    let mut frames = Frames::default();

    window.paint(&mut frames, 640, 480, Instant::now()).unwrap();
    assert_eq!(window.pipeline().backend(), RenderBackend::Software);
    assert_eq!(window.pipeline().gpu_context(), None);
    assert_eq!(frames.0, [(640, 480, 640 * 480 * 4)]);
    assert_eq!(rendered.get(), 0);
}

#[test]
fn gpu_frames_skip_the_paint_target() {
    let (_host, mut window) = window_with(RenderConfig::default().with_backend(RenderBackend::GpuNative));
    let factory = FakeGpuFactory::default();
    let rendered = factory.rendered.clone();
    window.set_gpu_factory(Box::new(factory));
    let mut frames = Frames::default();

    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert_eq!(window.pipeline().backend(), RenderBackend::GpuNative);
    assert_eq!(rendered.get(), 1);
    assert!(frames.0.is_empty());
    assert_eq!(window.pipeline().back_buffer_bytes(), None);
    assert_eq!(
        window.pipeline().gpu_context().map(|c| c.adapter.as_str()),
        Some("fake")
    );
}

#[test]
fn oversized_backbuffer_is_not_retained() {
    let config = RenderConfig {
        max_software_back_buffer_bytes: 1000,
        ..RenderConfig::default()
    };
    let (_host, mut window) = window_with(config);
    let mut frames = Frames::default();

    window.paint(&mut frames, 100, 100, Instant::now()).unwrap();
    window.paint(&mut frames, 100, 100, Instant::now()).unwrap();
    let stats = window.pipeline().stats();
    assert_eq!(window.pipeline().back_buffer_bytes(), None);
    assert_eq!(stats.uncached_frames, 2);
    assert_eq!(stats.back_buffer_allocations, 0);
    assert_eq!(frames.0.len(), 2);
}

#[test]
fn resize_burst_reallocates_once() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let id = window.add_element(
        ElementProps::docked(Dock::Fill),
        Box::new(Spy::new("a", &log)),
    );
    let mut frames = Frames::default();

    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert_eq!(window.pipeline().stats().back_buffer_allocations, 1);
    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert_eq!(window.element::<Spy>(id).unwrap().last_dirty, Some(false));

    for (w, h) in [(600, 450), (500, 350), (400, 300)] {
        window.resize(w, h);
    }
    assert_eq!(window.pipeline().stats().back_buffer_allocations, 1);

    window.paint(&mut frames, 400, 300, Instant::now()).unwrap();
    assert_eq!(window.pipeline().stats().back_buffer_allocations, 2);
    assert_eq!(window.pipeline().back_buffer_bytes(), Some(400 * 300 * 4));
    assert_eq!(window.element::<Spy>(id).unwrap().last_dirty, Some(true));
    assert_eq!(
        window.scene().props(id).unwrap().bounds,
        Rect::new(0.0, 32.0, 400.0, 268.0)
    );
    assert_eq!(frames.0.last(), Some(&(400, 300, 400 * 300 * 4)));
}

#[test]
fn zero_size_paint_releases_buffer() {
    let (_host, mut window) = window_with(RenderConfig::default());
    let mut frames = Frames::default();
    window.paint(&mut frames, 800, 600, Instant::now()).unwrap();
    assert!(window.pipeline().back_buffer_bytes().is_some());

    window.paint(&mut frames, 0, 600, Instant::now()).unwrap();
    assert_eq!(window.pipeline().back_buffer_bytes(), None);
    assert!(window.pipeline().needs_full_redraw());
    assert_eq!(frames.0.len(), 1);
}

#[test]
fn system_boxes_line_up_from_the_right() {
    let mut chrome = WindowChrome::new(ChromeOptions {
        extend_box: true,
        form_menu: true,
        ..ChromeOptions::titled("t")
    });
    chrome.layout(Size::new(800.0, 600.0), 1.0, &ApproxTextMeasurer);
    let zone = |z| chrome.zone_rect(z);
    assert_eq!(zone(HotZone::Close), Some(Rect::new(758.0, 0.0, 42.0, 32.0)));
    assert_eq!(zone(HotZone::Maximize), Some(Rect::new(716.0, 0.0, 42.0, 32.0)));
    assert_eq!(zone(HotZone::Minimize), Some(Rect::new(672.0, 0.0, 42.0, 32.0)));
    assert_eq!(zone(HotZone::Extend), Some(Rect::new(628.0, 0.0, 42.0, 32.0)));
    assert_eq!(zone(HotZone::FormMenu), Some(Rect::new(10.0, 4.0, 24.0, 24.0)));

    chrome.layout(Size::new(1600.0, 1200.0), 2.0, &ApproxTextMeasurer);
    assert_eq!(chrome.title_height(), 64.0);
    assert_eq!(
        chrome.zone_rect(HotZone::Close),
        Some(Rect::new(1516.0, 0.0, 84.0, 64.0))
    );

    let mut bare = WindowChrome::new(ChromeOptions::titled("t").with_minimize_box(false));
    bare.layout(Size::new(800.0, 600.0), 1.0, &ApproxTextMeasurer);
    assert_eq!(bare.zone_rect(HotZone::Maximize), None);
    assert_eq!(bare.zone_rect(HotZone::Minimize), None);
    assert_eq!(
        ChromeOptions::default().with_title_height(20.0).title_height,
        31.0
    );
}

#[test]
fn tab_click_switches_pages_and_slides_indicator() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let a = window.add_element(ElementProps::docked(Dock::Fill), Box::new(Spy::new("a", &log)));
    let b = window.add_element(ElementProps::docked(Dock::Fill), Box::new(Spy::new("b", &log)));
    window.add_tab("One", Some(a));
    window.add_tab("Two", Some(b));

    let visible = |w: &Window, id| w.scene().props(id).unwrap().visible;
    assert!(visible(&window, a));
    assert!(!visible(&window, b));
    let rects = window.chrome().tabs.rects().to_vec();
    assert_eq!(
        rects,
        [
            Rect::new(44.0, 0.0, 250.0, 32.0),
            Rect::new(294.0, 0.0, 250.0, 32.0)
        ]
    );

    window.click(left(400.0, 16.0));
    assert_eq!(
        window.take_chrome_actions(),
        [ChromeAction::SelectTab {
            index: 1,
            previous: Some(0)
        }]
    );
    assert!(!visible(&window, a));
    assert!(visible(&window, b));
    assert_eq!(window.chrome().tabs.indicator(), Some(rects[0]));

    let mut frames = 0;
    while window.animate() {
        frames += 1;
        assert!(frames < 100);
    }
    assert_eq!(window.chrome().tabs.indicator(), Some(rects[1]));
}

#[test]
fn tab_selection_wraps() {
    let mut tabs = TabStrip::default();
    tabs.push("a", None);
    tabs.push("b", None);
    tabs.push("c", None);
    assert_eq!(tabs.selected(), Some(0));
    assert_eq!(tabs.select(-1, Point::ZERO), Some((2, Some(0))));
    assert_eq!(tabs.selected(), Some(2));
    assert_eq!(tabs.select(3, Point::ZERO), Some((0, Some(2))));
    assert_eq!(tabs.selected(), Some(0));
    assert_eq!(tabs.select(0, Point::ZERO), None);

    tabs.remove(0);
    assert_eq!(tabs.selected(), Some(0));
    assert_eq!(tabs.tabs()[0].title, "b");
}

#[test]
fn system_box_clicks_reach_the_host() {
    let (host, mut window) = window_with(RenderConfig::default());
    window.click(left(690.0, 10.0));
    assert!(host.minimized.get());
    window.click(left(780.0, 10.0));
    assert!(host.closed.get());
    assert_eq!(
        window.take_chrome_actions(),
        [ChromeAction::Minimize, ChromeAction::Close]
    );
}

#[test]
fn title_drag_snaps_to_maximized_and_restores() {
    let (host, mut window) = window_with(RenderConfig::default());
    let work = host.work.get();
    host.cursor.set(Some(Point::new(400.0, 110.0)));
    window.mouse_down(left(300.0, 10.0));
    assert!(window.chrome().is_dragging());
    assert_eq!(host.captures.get(), 1);

    host.cursor.set(Some(Point::new(500.0, 300.0)));
    window.mouse_move(moved(300.0, 10.0));
    assert_eq!(host.bounds.get().origin(), Point::new(200.0, 290.0));

    host.cursor.set(Some(Point::new(600.0, 0.0)));
    window.mouse_move(moved(300.0, 10.0));
    window.mouse_up(left(300.0, 10.0));
    assert_eq!(host.releases.get(), 1);
    assert!(window.chrome().is_maximized());
    assert_eq!(host.bounds.get(), work);

    window.double_click(left(300.0, 10.0).with_clicks(2));
    assert!(!window.chrome().is_maximized());
    assert_eq!(host.bounds.get(), Rect::new(100.0, 100.0, 800.0, 600.0));
    assert_eq!(
        window.take_chrome_actions(),
        [ChromeAction::ToggleMaximize]
    );
}

#[test]
fn drag_keeps_title_bar_on_screen() {
    let (host, mut window) = window_with(RenderConfig::default());
    host.cursor.set(Some(Point::new(400.0, 110.0)));
    window.mouse_down(left(300.0, 10.0));
    host.cursor.set(Some(Point::new(400.0, 1500.0)));
    window.mouse_move(moved(300.0, 10.0));
    window.mouse_up(left(300.0, 10.0));

    assert!(!window.chrome().is_maximized());
    assert_eq!(host.bounds.get().origin(), Point::new(100.0, 1008.0));
}

#[test]
fn invalidations_coalesce_into_one_repaint() {
    let (host, mut window) = window_with(RenderConfig::default());
    window.invalidate();
    window.invalidate();
    window.invalidate();
    assert_eq!(host.repaints.get(), 1);
    assert_eq!(host.queued.get(), 0);

    window
        .paint(&mut Frames::default(), 800, 600, Instant::now())
        .unwrap();
    window.invalidate();
    assert_eq!(host.repaints.get(), 2);
}

#[test]
fn perf_overlay_queues_a_single_update() {
    let config = RenderConfig {
        show_perf_overlay: true,
        ..RenderConfig::default()
    };
    let (host, mut window) = window_with(config);
    window.invalidate();
    window.invalidate();
    assert_eq!(host.queued.get(), 1);
    assert_eq!(host.repaints.get(), 0);

    assert!(window.handle_queued_update());
    assert!(!window.handle_queued_update());
    assert_eq!(host.repaints.get(), 1);

    window.invalidate();
    assert_eq!(host.queued.get(), 2);
}

#[test]
fn idle_maintenance_drops_the_backbuffer() {
    let (_host, mut window) = window_with(RenderConfig::default());
    let t0 = Instant::now();
    window.paint(&mut Frames::default(), 800, 600, t0).unwrap();
    assert_eq!(window.idle_deadline(), Some(t0 + Duration::from_millis(1500)));

    assert!(!window.run_idle_maintenance(t0 + Duration::from_secs(1)));
    assert!(window.run_idle_maintenance(t0 + Duration::from_secs(2)));
    assert_eq!(window.pipeline().back_buffer_bytes(), None);
    assert!(window.pipeline().needs_full_redraw());
    assert_eq!(window.pipeline().stats().idle_trims, 1);
    assert!(!window.run_idle_maintenance(t0 + Duration::from_secs(3)));

    let config = RenderConfig {
        enable_idle_maintenance: false,
        ..RenderConfig::default()
    };
    let (_host, mut quiet) = window_with(config);
    quiet.paint(&mut Frames::default(), 800, 600, t0).unwrap();
    assert_eq!(quiet.idle_deadline(), None);
}

#[test]
fn scale_change_rescales_elements_and_chrome() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let id = window.add_element(
        ElementProps::new(Rect::new(10.0, 40.0, 100.0, 50.0)).padding(Insets::all(4.0)),
        Box::new(Spy::new("a", &log)),
    );
    window
        .paint(&mut Frames::default(), 800, 600, Instant::now())
        .unwrap();

    window.set_scale_factor(2.0);
    let props = window.scene().props(id).unwrap();
    assert_eq!(props.bounds, Rect::new(20.0, 80.0, 200.0, 100.0));
    assert_eq!(props.padding, Insets::all(8.0));
    let spy = window.element::<Spy>(id).unwrap();
    assert_eq!(spy.dpi, Some((2.0, 1.0)));
    assert_eq!(spy.measure_resets, 1);
    assert_eq!(window.chrome().title_height(), 64.0);
    assert_eq!(window.pipeline().back_buffer_bytes(), None);
    assert!(window.pipeline().needs_full_redraw());
}

#[test]
fn wheel_bubbles_and_focus_follows_clicks() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let parent = window.add_element(
        ElementProps::new(Rect::new(100.0, 100.0, 300.0, 300.0)),
        Box::new(Spy::new("p", &log).eating_wheel()),
    );
    let child = window.add_child(
        parent,
        ElementProps::new(Rect::new(10.0, 10.0, 50.0, 50.0)),
        Box::new(Spy::new("c", &log)),
    );

    assert!(window.mouse_wheel(MouseEvent::wheel(Point::new(120.0, 120.0), 1.0)));
    assert_eq!(take(&log), ["c:wheel", "p:wheel"]);

    window.mouse_down(left(120.0, 120.0));
    assert_eq!(window.router().focused(), Some(child));
    window.key_down(&KeyEvent {
        key: Key::Enter,
        modifiers: Modifiers::default(),
        is_repeat: false,
    });
    window.char_input('x');
    window.mouse_down(left(700.0, 500.0));
    assert_eq!(window.router().focused(), None);

    assert_eq!(
        take(&log),
        [
            "c:down 10,10",
            "c:focus true",
            "c:key Enter",
            "c:char x",
            "c:focus false"
        ]
    );
}

#[test]
fn removal_clears_hover_capture_and_focus() {
    let log = Log::default();
    let (host, mut window) = window_with(RenderConfig::default());
    let a = window.add_element(
        ElementProps::new(Rect::new(10.0, 50.0, 100.0, 100.0)),
        Box::new(Spy::new("a", &log).capturing()),
    );
    window.add_child(
        a,
        ElementProps::new(Rect::new(60.0, 60.0, 10.0, 10.0)),
        Box::new(Spy::new("c", &log)),
    );
    window.mouse_move(moved(20.0, 60.0));
    window.mouse_down(left(20.0, 60.0));
    assert_eq!(window.router().captured(), Some(a));
    take(&log);

    assert!(window.remove_element(a));
    assert!(!window.remove_element(a));
    let router = window.router();
    assert_eq!(
        (router.hovered(), router.captured(), router.focused()),
        (None, None, None)
    );
    assert_eq!(host.releases.get(), 1);
    assert!(window.scene().is_empty());
    let mut removed = take(&log);
    removed.sort();
    assert_eq!(removed, ["a:removed", "c:removed"]);
}

#[test]
fn mouse_down_raises_the_top_level_ancestor() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let a = window.add_element(
        ElementProps::new(Rect::new(0.0, 40.0, 200.0, 200.0)),
        Box::new(Spy::new("a", &log)),
    );
    let inner = window.add_child(
        a,
        ElementProps::new(Rect::new(0.0, 0.0, 20.0, 20.0)),
        Box::new(Spy::new("inner", &log)),
    );
    window.add_element(
        ElementProps::new(Rect::new(150.0, 40.0, 200.0, 200.0)),
        Box::new(Spy::new("b", &log)),
    );
    insta::assert_snapshot!(names(window.scene(), &window.scene().paint_order(None)), @"a b");

    window.mouse_down(left(10.0, 50.0));
    assert_eq!(window.router().focused(), Some(inner));
    insta::assert_snapshot!(names(window.scene(), &window.scene().paint_order(None)), @"b a");
    assert_eq!(
        window.router().target(window.scene(), Point::new(175.0, 100.0), true),
        Some(a)
    );
}

#[test]
fn suspended_layout_defers_invalidation() {
    let log = Log::default();
    let (host, mut window) = window_with(RenderConfig::default());
    let r = Rect::new(0.0, 40.0, 50.0, 50.0);
    let a = window.add_element(ElementProps::new(r), Box::new(Spy::new("a", &log)));
    let b = window.add_element(ElementProps::new(r), Box::new(Spy::new("b", &log)));
    window
        .paint(&mut Frames::default(), 800, 600, Instant::now())
        .unwrap();
    let before = host.repaints.get();

    window.suspend_layout();
    window.bring_to_front(a);
    window.send_to_back(b);
    assert_eq!(host.repaints.get(), before);
    window.resume_layout(false);
    assert_eq!(host.repaints.get(), before + 1);
    insta::assert_snapshot!(names(window.scene(), &window.scene().paint_order(None)), @"b a");
}

#[test]
fn translucent_palette_still_clears_opaque() {
    let (_host, mut window) = window_with(RenderConfig::default());
    window.update_chrome(|c| c.palette.back = Color::from_rgba(10, 20, 30, 0));
    let mut frame = LastFrame::default();
    window.paint(&mut frame, 50, 50, Instant::now()).unwrap();

    assert_eq!(frame.pixels.len(), 50 * 50 * 4);
    assert_eq!(frame.alpha_at(25, 45), 255);
    assert!(frame.pixels.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn anchors_survive_minimize_and_shrink() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let placed = Rect::new(10.0, 50.0, 100.0, 40.0);
    let ids: Vec<(Anchor, ElementId)> = (0..16u8)
        .map(|bits| {
            let anchor = Anchor::from_bits_truncate(bits);
            let props = ElementProps::new(placed).anchor(anchor);
            (anchor, window.add_element(props, Box::new(Spy::new("a", &log))))
        })
        .collect();

    for (w, h) in [(0, 0), (50, 50)] {
        window.resize(w, h);
        for (anchor, id) in &ids {
            let b = window.scene().props(*id).unwrap().bounds;
            assert!(b.w >= 0.0 && b.h >= 0.0, "{anchor:?} at {w}x{h}: {b:?}");
        }
        window.resize(800, 600);
        for (anchor, id) in &ids {
            let b = window.scene().props(*id).unwrap().bounds;
            assert_eq!(b, placed, "{anchor:?} after {w}x{h}");
        }
    }

    let stretch = ids
        .iter()
        .find(|(a, _)| *a == Anchor::LEFT | Anchor::RIGHT | Anchor::TOP)
        .map(|(_, id)| *id)
        .unwrap();
    window.resize(0, 0);
    assert_eq!(
        window.scene().props(stretch).unwrap().bounds,
        Rect::new(10.0, 50.0, 0.0, 40.0)
    );
    window.resize(900, 600);
    assert_eq!(
        window.scene().props(stretch).unwrap().bounds,
        Rect::new(10.0, 50.0, 200.0, 40.0)
    );
}

#[test]
fn anchors_follow_resize_after_a_scale_change() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let id = window.add_element(
        ElementProps::new(Rect::new(10.0, 50.0, 100.0, 40.0))
            .anchor(Anchor::LEFT | Anchor::RIGHT | Anchor::BOTTOM),
        Box::new(Spy::new("a", &log)),
    );
    window.set_scale_factor(2.0);
    // the host follows a scale change with a matching resize
    window.resize(1600, 1200);
    assert_eq!(
        window.scene().props(id).unwrap().bounds,
        Rect::new(20.0, 100.0, 200.0, 80.0)
    );
    window.resize(1700, 1250);
    assert_eq!(
        window.scene().props(id).unwrap().bounds,
        Rect::new(20.0, 150.0, 300.0, 80.0)
    );
}

#[test]
fn explicit_placement_resets_the_anchor_reference() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let id = window.add_element(
        ElementProps::new(Rect::new(10.0, 50.0, 100.0, 40.0)).anchor(Anchor::TOP | Anchor::RIGHT),
        Box::new(Spy::new("a", &log)),
    );
    window.resize(1000, 600);
    assert_eq!(window.scene().props(id).unwrap().bounds.x, 210.0);

    window.update_props(id, |p| p.bounds.x = 500.0);
    window.resize(800, 600);
    assert_eq!(window.scene().props(id).unwrap().bounds.x, 300.0);
}

#[test]
fn select_tab_reports_the_wrapped_index() {
    let (_host, mut window) = window_with(RenderConfig::default());
    window.add_tab("one", None);
    window.add_tab("two", None);
    assert!(window.select_tab(1));
    window.take_chrome_actions();

    assert!(window.select_tab(5));
    assert_eq!(window.chrome().tabs.selected(), Some(0));
    assert_eq!(
        window.take_chrome_actions(),
        vec![ChromeAction::SelectTab {
            index: 0,
            previous: Some(1)
        }]
    );
    assert!(!window.select_tab(0));
    assert!(window.take_chrome_actions().is_empty());
}

#[test]
fn prop_edits_keep_front_and_back_consistent() {
    let log = Log::default();
    let (_host, mut window) = window_with(RenderConfig::default());
    let r = Rect::new(0.0, 40.0, 50.0, 50.0);
    let a = window.add_element(ElementProps::new(r), Box::new(Spy::new("a", &log)));
    let b = window.add_element(ElementProps::new(r), Box::new(Spy::new("b", &log)));

    window.update_props(a, |p| p.z_order = 10);
    window.bring_to_front(b);
    insta::assert_snapshot!(names(window.scene(), &window.scene().paint_order(None)), @"a b");
    assert!(window.scene().z_order(b) > window.scene().z_order(a));

    window.update_props(b, |p| p.z_order = -10);
    window.send_to_back(a);
    insta::assert_snapshot!(names(window.scene(), &window.scene().paint_order(None)), @"a b");
    assert!(window.scene().z_order(a) < window.scene().z_order(b));
}
