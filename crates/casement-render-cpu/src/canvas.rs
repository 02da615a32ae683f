use casement_core::{Canvas, Color, Point, Rect, Size, TextAlign};
use tiny_skia::{
    FillRule, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke,
    Transform,
};

use crate::text::FontRasterizer;

/// [`Canvas`] over a tiny-skia pixmap.
///
/// Rect clips are kept as absolute rectangles. Plain rectangles are clipped
/// geometrically; everything else goes through a `Mask` built lazily for
/// the innermost clip.
pub struct PixmapCanvas<'a> {
    pixmap: &'a mut Pixmap,
    font: Option<&'a FontRasterizer>,
    clips: Vec<Rect>,
    offsets: Vec<(f32, f32)>,
    origin: (f32, f32),
    mask: Option<Mask>,
    mask_dirty: bool,
}

impl<'a> PixmapCanvas<'a> {
    pub fn new(pixmap: &'a mut Pixmap, font: Option<&'a FontRasterizer>) -> Self {
        Self {
            pixmap,
            font,
            clips: Vec::new(),
            offsets: Vec::new(),
            origin: (0.0, 0.0),
            mask: None,
            mask_dirty: false,
        }
    }

    fn frame_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        )
    }

    fn clip_rect(&self) -> Rect {
        self.clips.last().copied().unwrap_or_else(|| self.frame_rect())
    }

    fn abs(&self, r: Rect) -> Rect {
        r.translate(self.origin.0, self.origin.1)
    }

    fn abs_point(&self, p: Point) -> Point {
        p.offset(self.origin.0, self.origin.1)
    }

    fn refresh_mask(&mut self) {
        if !self.mask_dirty {
            return;
        }
        self.mask_dirty = false;
        self.mask = None;
        let Some(clip) = self.clips.last().copied() else {
            return;
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        if let Some(path) = rect_path(clip) {
            mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
        }
        self.mask = Some(mask);
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        if self.clip_rect().is_empty() {
            return;
        }
        self.refresh_mask();
        let paint = paint(color);
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.mask.as_ref(),
        );
    }

    fn stroke_path(&mut self, path: &Path, color: Color, width: f32) {
        if self.clip_rect().is_empty() {
            return;
        }
        self.refresh_mask();
        let paint = paint(color);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            path,
            &paint,
            &stroke,
            Transform::identity(),
            self.mask.as_ref(),
        );
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0, color.1, color.2, color.3);
    paint.anti_alias = true;
    paint
}

fn to_skia(r: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(r.x, r.y, r.w, r.h)
}

fn rect_path(r: Rect) -> Option<Path> {
    to_skia(r).map(PathBuilder::from_rect)
}

pub(crate) fn rounded_rect_path(r: Rect, radius: f32) -> Option<Path> {
    let rad = radius.min(r.w * 0.5).min(r.h * 0.5);
    if rad <= 0.0 {
        return rect_path(r);
    }
    // cubic approximation of a quarter circle
    let k = 0.552_284_8 * rad;
    let (x0, y0, x1, y1) = (r.x, r.y, r.right(), r.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(x0 + rad, y0);
    pb.line_to(x1 - rad, y0);
    pb.cubic_to(x1 - rad + k, y0, x1, y0 + rad - k, x1, y0 + rad);
    pb.line_to(x1, y1 - rad);
    pb.cubic_to(x1, y1 - rad + k, x1 - rad + k, y1, x1 - rad, y1);
    pb.line_to(x0 + rad, y1);
    pb.cubic_to(x0 + rad - k, y1, x0, y1 - rad + k, x0, y1 - rad);
    pb.line_to(x0, y0 + rad);
    pb.cubic_to(x0, y0 + rad - k, x0 + rad - k, y0, x0 + rad, y0);
    pb.close();
    pb.finish()
}

impl Canvas for PixmapCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.0, color.1, color.2, color.3));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f32) {
        let rect = self.abs(rect);
        if radius <= 0.0 {
            let visible = rect.intersect(&self.clip_rect());
            if let Some(r) = to_skia(visible) {
                self.pixmap
                    .fill_rect(r, &paint(color), Transform::identity(), None);
            }
            return;
        }
        if let Some(path) = rounded_rect_path(rect, radius) {
            self.fill_path(&path, color);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, radius: f32) {
        if width <= 0.0 {
            return;
        }
        // keep the stroke inside the rect
        let half = width * 0.5;
        let inner = Rect::new(
            rect.x + half,
            rect.y + half,
            rect.w - width,
            rect.h - width,
        );
        if inner.w <= 0.0 || inner.h <= 0.0 {
            self.fill_rect(rect, color, radius);
            return;
        }
        let inner = self.abs(inner);
        if let Some(path) = rounded_rect_path(inner, (radius - half).max(0.0)) {
            self.stroke_path(&path, color, width);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let c = self.abs_point(center);
        if let Some(path) = PathBuilder::from_circle(c.x, c.y, radius) {
            self.fill_path(&path, color);
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let (a, b) = (self.abs_point(from), self.abs_point(to));
        let mut pb = PathBuilder::new();
        pb.move_to(a.x, a.y);
        pb.line_to(b.x, b.y);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, color, width);
        }
    }

    fn draw_text(&mut self, text: &str, rect: Rect, size: f32, color: Color, align: TextAlign) {
        let Some(font) = self.font else {
            return;
        };
        if text.is_empty() || color.3 == 0 || self.clip_rect().is_empty() {
            return;
        }
        let layout = font.layout_line(text, size);
        let (coverage, w, h) = font.rasterize_line(&layout);
        let Some(mut run) = Pixmap::new(w, h) else {
            return;
        };
        for (px, &c) in run.pixels_mut().iter_mut().zip(coverage.iter()) {
            if c == 0 {
                continue;
            }
            let a = (c as u32 * color.3 as u32 / 255) as u8;
            let pm = |v: u8| (v as u32 * a as u32 / 255) as u8;
            if let Some(p) = PremultipliedColorU8::from_rgba(pm(color.0), pm(color.1), pm(color.2), a)
            {
                *px = p;
            }
        }
        let (x, y) = layout.origin_in(self.abs(rect), align);
        self.refresh_mask();
        self.pixmap.draw_pixmap(
            x as i32,
            y as i32,
            run.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            self.mask.as_ref(),
        );
    }

    fn push_clip(&mut self, rect: Rect) {
        let next = self.abs(rect).intersect(&self.clip_rect());
        self.clips.push(next);
        self.mask_dirty = true;
    }

    fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            log::warn!("pop_clip with empty clip stack");
        }
        self.mask_dirty = true;
    }

    fn push_offset(&mut self, dx: f32, dy: f32) {
        self.offsets.push(self.origin);
        self.origin = (self.origin.0 + dx, self.origin.1 + dy);
    }

    fn pop_offset(&mut self) {
        if let Some(o) = self.offsets.pop() {
            self.origin = o;
        }
    }
}
