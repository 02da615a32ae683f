//! Frame composition and presentation.
//!
//! A window renders either into a retained software [`BackBuffer`] that is
//! presented through a [`PaintTarget`], or into a recorded [`Scene`] handed
//! to a [`GpuRenderer`]. Exactly one path is active. GPU failures at
//! creation or per frame drop the window to the software path for good.
//!
//! [`Scene`]: casement_core::Scene

use casement_core::{
    ApproxTextMeasurer, Canvas, GpuContext, GpuRenderer, GpuRendererFactory, PaintTarget, Rect,
    RenderBackend, RenderConfig, RenderError, SceneRecorder, Size, TextMeasurer, WindowHost,
};
use casement_devtools::{FrameMetrics, PerfOverlay};
use casement_render_cpu::{BackBuffer, FontRasterizer, estimate_bytes};
use web_time::Instant;

use crate::chrome::WindowChrome;
use crate::element::{ElementId, RenderCx};
use crate::scene::SceneGraph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames: u64,
    pub back_buffer_allocations: u64,
    /// Frames rendered into a throwaway buffer because the retained one
    /// would exceed the byte budget.
    pub uncached_frames: u64,
    pub gpu_fallbacks: u64,
    pub idle_trims: u64,
    pub elements_rendered: usize,
}

/// Everything a frame draws, borrowed from the window for one paint.
pub(crate) struct Composer<'a> {
    pub(crate) scene: &'a mut SceneGraph,
    pub(crate) chrome: &'a WindowChrome,
    pub(crate) hovered: Option<ElementId>,
    pub(crate) focused: Option<ElementId>,
    pub(crate) scale: f32,
}

impl Composer<'_> {
    /// Draws chrome and elements; returns how many elements rendered.
    pub(crate) fn compose(
        &mut self,
        canvas: &mut dyn Canvas,
        gpu: Option<&GpuContext>,
        text: &dyn TextMeasurer,
        scratch: &mut Vec<ElementId>,
        full_redraw: bool,
    ) -> usize {
        self.chrome.paint(canvas);

        scratch.clear();
        scratch.extend_from_slice(self.scene.children(None));
        self.scene.sort_paint_order(scratch);

        if full_redraw {
            for id in scratch.iter() {
                self.scene.mark_dirty(*id);
            }
        }

        let mut rendered = 0;
        for id in scratch.iter() {
            rendered += self.render_node(*id, canvas, gpu, text);
        }
        rendered
    }

    fn render_node(
        &mut self,
        id: ElementId,
        canvas: &mut dyn Canvas,
        gpu: Option<&GpuContext>,
        text: &dyn TextMeasurer,
    ) -> usize {
        let Some(node) = self.scene.node_mut(id) else {
            return 0;
        };
        let bounds = node.props.bounds;
        if !node.props.visible || bounds.is_empty() {
            return 0;
        }

        canvas.push_offset(bounds.x, bounds.y);
        canvas.push_clip(Rect::from_size(bounds.size()));
        {
            let mut cx = RenderCx {
                canvas: &mut *canvas,
                gpu,
                size: bounds.size(),
                needs_redraw: node.needs_redraw,
                scale: self.scale,
                hovered: self.hovered == Some(id),
                focused: self.focused == Some(id),
                enabled: node.props.enabled,
                text,
            };
            node.element.render(&mut cx);
        }
        node.needs_redraw = false;

        let mut children = node.children.clone();
        self.scene.sort_paint_order(&mut children);
        let mut rendered = 1;
        for child in children {
            rendered += self.render_node(child, canvas, gpu, text);
        }

        canvas.pop_clip();
        canvas.pop_offset();
        rendered
    }
}

pub struct RenderPipeline {
    config: RenderConfig,
    backend: RenderBackend,
    back_buffer: Option<BackBuffer>,
    gpu: Option<Box<dyn GpuRenderer>>,
    factory: Option<Box<dyn GpuRendererFactory>>,
    recorder: SceneRecorder,
    scratch: Vec<ElementId>,
    font: Option<FontRasterizer>,
    overlay: Option<PerfOverlay>,
    needs_full_redraw: bool,
    repaint_pending: bool,
    update_queued: bool,
    suppress_updates: u32,
    idle_deadline: Option<Instant>,
    size: (u32, u32),
    stats: PipelineStats,
}

impl RenderPipeline {
    /// Starts on the software path; a GPU backend named in `config` is
    /// created on the first paint once a factory is installed.
    pub fn new(config: RenderConfig) -> Self {
        let overlay = config.show_perf_overlay.then(PerfOverlay::new);
        Self {
            config,
            backend: RenderBackend::Software,
            back_buffer: None,
            gpu: None,
            factory: None,
            recorder: SceneRecorder::default(),
            scratch: Vec::new(),
            font: None,
            overlay,
            needs_full_redraw: true,
            repaint_pending: false,
            update_queued: false,
            suppress_updates: 0,
            idle_deadline: None,
            size: (0, 0),
            stats: PipelineStats::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Backend frames currently go through.
    pub fn backend(&self) -> RenderBackend {
        self.backend
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn needs_full_redraw(&self) -> bool {
        self.needs_full_redraw
    }

    pub fn request_full_redraw(&mut self) {
        self.needs_full_redraw = true;
    }

    /// Bytes held by the retained software buffer.
    pub fn back_buffer_bytes(&self) -> Option<usize> {
        self.back_buffer.as_ref().map(BackBuffer::byte_len)
    }

    pub fn gpu_context(&self) -> Option<&GpuContext> {
        self.gpu.as_ref().map(|g| g.context())
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    pub fn set_font(&mut self, font: Option<FontRasterizer>) {
        self.font = font;
        self.needs_full_redraw = true;
    }

    pub fn text_measurer(&self) -> &dyn TextMeasurer {
        match &self.font {
            Some(font) => font,
            None => &ApproxTextMeasurer,
        }
    }

    pub fn overlay(&self) -> Option<&PerfOverlay> {
        self.overlay.as_ref()
    }

    pub(crate) fn overlay_mut(&mut self) -> Option<&mut PerfOverlay> {
        self.overlay.as_mut()
    }

    pub fn set_show_perf_overlay(&mut self, show: bool) {
        self.config.show_perf_overlay = show;
        match (show, self.overlay.is_some()) {
            (true, false) => self.overlay = Some(PerfOverlay::new()),
            (false, true) => self.overlay = None,
            _ => {}
        }
    }

    pub fn set_gpu_factory(&mut self, factory: Box<dyn GpuRendererFactory>) {
        self.factory = Some(factory);
    }

    /// Tears down the active backend and brings up `backend`. GPU creation
    /// failures leave the window on the software path.
    pub fn set_backend(&mut self, backend: RenderBackend, host: &dyn WindowHost) {
        self.config.backend = backend;
        self.gpu = None;
        self.back_buffer = None;
        self.backend = RenderBackend::Software;
        self.needs_full_redraw = true;
        host.apply_render_styles(backend);
        if backend.is_gpu() {
            self.create_gpu(host);
        }
        host.request_repaint();
    }

    fn create_gpu(&mut self, host: &dyn WindowHost) {
        let requested = self.config.backend;
        let (w, h) = self.size;
        let result = match self.factory.as_mut() {
            Some(factory) => factory.create(requested, w.max(1), h.max(1)),
            None => Err(RenderError::unavailable(requested, "no GPU renderer factory installed")),
        };
        match result {
            Ok(renderer) => {
                log::info!(
                    "render backend {requested} on {}",
                    renderer.context().adapter
                );
                self.gpu = Some(renderer);
                self.backend = requested;
            }
            Err(err) => {
                log::warn!("{err}; using software rendering");
                self.config.backend = RenderBackend::Software;
                self.backend = RenderBackend::Software;
                self.stats.gpu_fallbacks += 1;
                host.apply_render_styles(RenderBackend::Software);
            }
        }
        self.needs_full_redraw = true;
    }

    fn fall_back(&mut self, host: &dyn WindowHost, err: RenderError) {
        log::warn!("{} frame failed: {err}; falling back to software", self.backend);
        self.gpu = None;
        self.config.backend = RenderBackend::Software;
        self.backend = RenderBackend::Software;
        self.needs_full_redraw = true;
        self.stats.gpu_fallbacks += 1;
        host.apply_render_styles(RenderBackend::Software);
    }

    /// Records the new surface size. The software buffer is reallocated by
    /// the next paint, so a burst of resizes costs one allocation.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
    }

    /// Drops the software buffer; the next paint reallocates and redraws
    /// everything.
    pub fn release_back_buffer(&mut self) {
        if self.back_buffer.take().is_some() {
            log::debug!("software backbuffer released");
        }
        self.needs_full_redraw = true;
    }

    /// Asks the host for a repaint. Software windows with something
    /// animating queue one update for the next loop turn instead of
    /// waiting for the native paint.
    pub fn invalidate(&mut self, host: &dyn WindowHost, animating: bool) {
        if self.backend == RenderBackend::Software
            && self.suppress_updates == 0
            && (animating || self.config.show_perf_overlay)
        {
            if !self.update_queued {
                self.update_queued = true;
                host.queue_update();
            }
            return;
        }
        if !self.repaint_pending {
            self.repaint_pending = true;
            host.request_repaint();
        }
    }

    /// Runs a queued update. Returns `false` when none was queued.
    pub fn run_queued_update(&mut self, host: &dyn WindowHost) -> bool {
        if !std::mem::take(&mut self.update_queued) {
            return false;
        }
        self.repaint_pending = true;
        host.request_repaint();
        true
    }

    pub fn is_update_queued(&self) -> bool {
        self.update_queued
    }

    pub(crate) fn suppress_updates(&mut self) {
        self.suppress_updates += 1;
    }

    pub(crate) fn resume_updates(&mut self) {
        self.suppress_updates = self.suppress_updates.saturating_sub(1);
    }

    /// Trims caches once the idle deadline passed. Returns `true` if
    /// maintenance ran.
    pub fn run_idle_maintenance(&mut self, now: Instant) -> bool {
        match self.idle_deadline {
            Some(deadline) if now >= deadline => {}
            _ => return false,
        }
        self.idle_deadline = None;
        match self.gpu.as_mut() {
            Some(gpu) => gpu.trim(),
            None => self.release_back_buffer(),
        }
        self.stats.idle_trims += 1;
        log::debug!("idle maintenance ran ({} backend)", self.backend);
        true
    }

    pub(crate) fn paint(
        &mut self,
        width: i32,
        height: i32,
        composer: &mut Composer<'_>,
        target: &mut dyn PaintTarget,
        host: &dyn WindowHost,
        now: Instant,
    ) -> Result<(), RenderError> {
        self.repaint_pending = false;
        if width <= 0 || height <= 0 {
            self.release_back_buffer();
            return Ok(());
        }
        let (w, h) = (width as u32, height as u32);
        if self.size != (w, h) {
            self.resize(w, h);
        }
        if self.config.backend.is_gpu() && self.gpu.is_none() {
            self.create_gpu(host);
        }

        let started = Instant::now();
        let mut result = None;
        if self.gpu.is_some() {
            match self.render_gpu(w, h, composer) {
                Ok(count) => result = Some(count),
                Err(err) => self.fall_back(host, err),
            }
        }
        let rendered = match result {
            Some(count) => count,
            None => self.render_software(w, h, composer, target, started, now)?,
        };

        self.stats.frames += 1;
        self.stats.elements_rendered = rendered;
        self.needs_full_redraw = false;
        if self.config.enable_idle_maintenance {
            self.idle_deadline = Some(now + self.config.idle_maintenance_delay);
        }
        log::trace!(
            "frame {} via {}: {rendered} elements",
            self.stats.frames,
            self.backend
        );
        Ok(())
    }

    fn render_gpu(
        &mut self,
        w: u32,
        h: u32,
        composer: &mut Composer<'_>,
    ) -> Result<usize, RenderError> {
        let started = Instant::now();
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(RenderError::SurfaceLost);
        };
        let ctx = gpu.context().clone();
        let text: &dyn TextMeasurer = match &self.font {
            Some(font) => font,
            None => &ApproxTextMeasurer,
        };
        self.recorder.begin(Size::new(w as f32, h as f32));
        let rendered = composer.compose(
            &mut self.recorder,
            Some(&ctx),
            text,
            &mut self.scratch,
            self.needs_full_redraw,
        );
        if let Some(overlay) = self.overlay.as_mut() {
            let metrics = FrameMetrics {
                backend: self.backend,
                elements_rendered: rendered,
                render_ms: started.elapsed().as_secs_f32() * 1000.0,
                back_buffer_bytes: 0,
                uncached: false,
            };
            overlay.record_frame(Instant::now(), metrics);
            overlay.paint(&mut self.recorder);
        }
        gpu.render(self.recorder.scene())?;
        Ok(rendered)
    }

    fn render_software(
        &mut self,
        w: u32,
        h: u32,
        composer: &mut Composer<'_>,
        target: &mut dyn PaintTarget,
        started: Instant,
        now: Instant,
    ) -> Result<usize, RenderError> {
        let invalid = RenderError::InvalidSize {
            width: w as i32,
            height: h as i32,
        };
        let bytes = estimate_bytes(w, h);
        let retained = self.config.allows_retained(bytes);

        let mut ephemeral = None;
        if retained {
            if !self.back_buffer.as_ref().is_some_and(|b| b.matches(w, h)) {
                self.back_buffer = None;
                self.back_buffer = Some(BackBuffer::new(w, h).ok_or(invalid)?);
                self.stats.back_buffer_allocations += 1;
                self.needs_full_redraw = true;
                log::debug!("software backbuffer allocated {w}x{h} ({bytes} bytes)");
            }
        } else {
            if self.back_buffer.take().is_some() {
                log::debug!("{w}x{h} exceeds the backbuffer budget; rendering uncached");
            }
            self.stats.uncached_frames += 1;
            self.needs_full_redraw = true;
            ephemeral = Some(BackBuffer::new(w, h).ok_or(invalid)?);
        }

        let full = self.needs_full_redraw;
        let metrics_base = (self.backend, !retained);
        let buffer = match ephemeral.as_mut() {
            Some(buf) => buf,
            None => self.back_buffer.as_mut().ok_or(RenderError::InvalidSize {
                width: w as i32,
                height: h as i32,
            })?,
        };
        let rendered = {
            let text: &dyn TextMeasurer = match &self.font {
                Some(font) => font,
                None => &ApproxTextMeasurer,
            };
            let mut canvas = buffer.canvas(self.font.as_ref());
            let rendered = composer.compose(&mut canvas, None, text, &mut self.scratch, full);
            if let Some(overlay) = self.overlay.as_mut() {
                let metrics = FrameMetrics {
                    backend: metrics_base.0,
                    elements_rendered: rendered,
                    render_ms: started.elapsed().as_secs_f32() * 1000.0,
                    back_buffer_bytes: bytes,
                    uncached: metrics_base.1,
                };
                overlay.record_frame(now, metrics);
                overlay.paint(&mut canvas);
            }
            rendered
        };
        target.present(buffer.frame())?;
        Ok(rendered)
    }
}
