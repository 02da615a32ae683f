use web_time::Instant;

use casement_core::{Canvas, Color, Rect, RenderBackend, TextAlign};

/// Numbers the render pipeline reports for the frame being drawn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMetrics {
    pub backend: RenderBackend,
    pub elements_rendered: usize,
    pub render_ms: f32,
    pub back_buffer_bytes: usize,
    pub uncached: bool,
}

/// Frame-time and FPS readout drawn on top of a window.
pub struct PerfOverlay {
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
    frame_ms_smooth: f32,
    pub metrics: FrameMetrics,
    pub hovered: Option<Rect>,
}

impl Default for PerfOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfOverlay {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
            frame_ms_smooth: 0.0,
            metrics: FrameMetrics::default(),
            hovered: None,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f32 {
        self.fps_smooth
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_ms_smooth
    }

    /// Feeds the presentation time of a frame into the moving averages.
    pub fn record_frame(&mut self, now: Instant, metrics: FrameMetrics) {
        self.frame_count += 1;
        self.metrics = metrics;
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = now.saturating_duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                // simple EMA
                let a = 0.2;
                if self.fps_smooth == 0.0 {
                    self.fps_smooth = fps;
                    self.frame_ms_smooth = dt * 1000.0;
                } else {
                    self.fps_smooth = (1.0 - a) * self.fps_smooth + a * fps;
                    self.frame_ms_smooth = (1.0 - a) * self.frame_ms_smooth + a * dt * 1000.0;
                }
            }
        }
    }

    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let mut lines = vec![
            format!("{}", m.backend),
            format!("fps: {:.1}", self.fps_smooth),
            format!("frame: {:.2} ms", self.frame_ms_smooth),
            format!("render: {:.2} ms", m.render_ms),
            format!("elements: {}", m.elements_rendered),
        ];
        if !m.backend.is_gpu() {
            let kb = m.back_buffer_bytes / 1024;
            lines.push(if m.uncached {
                format!("buffer: {kb} KiB (uncached)")
            } else {
                format!("buffer: {kb} KiB")
            });
        }
        lines.join("  |  ")
    }

    pub fn paint(&self, canvas: &mut dyn Canvas) {
        let text = self.summary();
        let w = (canvas.size().width - 16.0).clamp(0.0, 560.0);
        let panel = Rect::new(8.0, canvas.size().height - 30.0, w, 22.0);
        canvas.fill_rect(panel, Color::from_rgba(0, 0, 0, 170), 4.0);
        canvas.draw_text(
            &text,
            panel.deflate(casement_core::Insets::new(8.0, 0.0, 8.0, 0.0)),
            12.0,
            Color::from_hex("#AAAAAA"),
            TextAlign::Left,
        );

        if let Some(r) = self.hovered {
            canvas.stroke_rect(r, Color::from_hex("#44AAFF"), 2.0, 0.0);
        }
    }
}
