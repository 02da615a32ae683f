//! Turns scene geometry into per-pipeline instance arrays plus an ordered
//! command list. Consecutive nodes of the same kind share one draw; a kind
//! change or a clip change starts a new one, so paint order survives.

use std::ops::Range;

use casement_core::{Color, Point, Rect};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct RectInstance {
    // quad in NDC, padded one pixel for the AA edge
    pub xywh: [f32; 4],
    // shape in framebuffer pixels
    pub rect: [f32; 4],
    pub radius: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct BorderInstance {
    pub xywh: [f32; 4],
    pub rect: [f32; 4],
    pub radius: f32,
    pub stroke: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct LineInstance {
    pub p01: [f32; 4],
    pub p23: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct GlyphInstance {
    pub xywh: [f32; 4],
    // u0, v_bottom, u1, v_top
    pub uv: [f32; 4],
    pub color: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    Rect,
    Border,
    Line,
    Glyph,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Cmd {
    Scissor([u32; 4]),
    Draw { kind: Kind, instances: Range<u32> },
}

/// Pixel rect to an NDC quad `[min_x, min_y, w, h]` (y up).
pub(crate) fn to_ndc(r: Rect, fb_w: f32, fb_h: f32) -> [f32; 4] {
    let x0 = (r.x / fb_w) * 2.0 - 1.0;
    let y0 = 1.0 - (r.y / fb_h) * 2.0;
    let x1 = (r.right() / fb_w) * 2.0 - 1.0;
    let y1 = 1.0 - (r.bottom() / fb_h) * 2.0;
    [x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs()]
}

fn point_ndc(p: Point, fb_w: f32, fb_h: f32) -> [f32; 2] {
    [(p.x / fb_w) * 2.0 - 1.0, 1.0 - (p.y / fb_h) * 2.0]
}

/// Clamps a clip rect to the framebuffer as `[x, y, w, h]`. Empty or
/// off-screen rects collapse to zero area.
pub(crate) fn to_scissor(r: Rect, fb_w: u32, fb_h: u32) -> [u32; 4] {
    if r.is_empty() {
        return [0, 0, 0, 0];
    }
    let x0 = (r.x.floor() as i64).clamp(0, fb_w as i64);
    let y0 = (r.y.floor() as i64).clamp(0, fb_h as i64);
    let x1 = (r.right().ceil() as i64).clamp(0, fb_w as i64);
    let y1 = (r.bottom().ceil() as i64).clamp(0, fb_h as i64);
    if x1 <= x0 || y1 <= y0 {
        return [0, 0, 0, 0];
    }
    [x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32]
}

/// Corners of a `width`-thick segment, in pixels: both ends offset along
/// the normal, ordered for the 0,1,2 / 2,1,3 triangle pair.
pub(crate) fn line_quad(from: Point, to: Point, width: f32) -> Option<[Point; 4]> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON || width <= 0.0 {
        return None;
    }
    let half = width * 0.5;
    let nx = -dy / len * half;
    let ny = dx / len * half;
    Some([
        from.offset(nx, ny),
        to.offset(nx, ny),
        from.offset(-nx, -ny),
        to.offset(-nx, -ny),
    ])
}

#[derive(Debug, Default)]
pub(crate) struct Batcher {
    fb_w: u32,
    fb_h: u32,
    linear: bool,
    pub rects: Vec<RectInstance>,
    pub borders: Vec<BorderInstance>,
    pub lines: Vec<LineInstance>,
    pub glyphs: Vec<GlyphInstance>,
    pub cmds: Vec<Cmd>,
    clips: Vec<Rect>,
}

impl Batcher {
    /// Starts a frame. `linear` converts colors for an sRGB surface.
    pub fn begin(&mut self, fb_w: u32, fb_h: u32, linear: bool) {
        self.fb_w = fb_w;
        self.fb_h = fb_h;
        self.linear = linear;
        self.rects.clear();
        self.borders.clear();
        self.lines.clear();
        self.glyphs.clear();
        self.cmds.clear();
        self.clips.clear();
    }

    pub fn color(&self, c: Color) -> [f32; 4] {
        if self.linear {
            c.to_linear()
        } else {
            [
                c.0 as f32 / 255.0,
                c.1 as f32 / 255.0,
                c.2 as f32 / 255.0,
                c.3 as f32 / 255.0,
            ]
        }
    }

    fn fb(&self) -> (f32, f32) {
        (self.fb_w as f32, self.fb_h as f32)
    }

    fn clipped_out(&self) -> bool {
        self.clips.last().is_some_and(|c| c.is_empty())
    }

    fn record(&mut self, kind: Kind, index: u32) {
        if let Some(Cmd::Draw { kind: k, instances }) = self.cmds.last_mut()
            && *k == kind
            && instances.end == index
        {
            instances.end += 1;
            return;
        }
        self.cmds.push(Cmd::Draw {
            kind,
            instances: index..index + 1,
        });
    }

    fn padded(r: Rect) -> Rect {
        Rect::new(r.x - 1.0, r.y - 1.0, r.w + 2.0, r.h + 2.0)
    }

    pub fn rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if rect.is_empty() || color.3 == 0 || self.clipped_out() {
            return;
        }
        let (w, h) = self.fb();
        let inst = RectInstance {
            xywh: to_ndc(Self::padded(rect), w, h),
            rect: [rect.x, rect.y, rect.w, rect.h],
            radius: radius.max(0.0),
            color: self.color(color),
        };
        let index = self.rects.len() as u32;
        self.rects.push(inst);
        self.record(Kind::Rect, index);
    }

    pub fn circle(&mut self, center: Point, radius: f32, color: Color) {
        let d = radius * 2.0;
        self.rect(
            Rect::new(center.x - radius, center.y - radius, d, d),
            radius,
            color,
        );
    }

    pub fn border(&mut self, rect: Rect, width: f32, radius: f32, color: Color) {
        if rect.is_empty() || width <= 0.0 || color.3 == 0 || self.clipped_out() {
            return;
        }
        let (w, h) = self.fb();
        let inst = BorderInstance {
            xywh: to_ndc(Self::padded(rect), w, h),
            rect: [rect.x, rect.y, rect.w, rect.h],
            radius: radius.max(0.0),
            stroke: width,
            color: self.color(color),
        };
        let index = self.borders.len() as u32;
        self.borders.push(inst);
        self.record(Kind::Border, index);
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        if color.3 == 0 || self.clipped_out() {
            return;
        }
        let Some(q) = line_quad(from, to, width) else {
            return;
        };
        let (w, h) = self.fb();
        let [a, b, c, d] = q.map(|p| point_ndc(p, w, h));
        let inst = LineInstance {
            p01: [a[0], a[1], b[0], b[1]],
            p23: [c[0], c[1], d[0], d[1]],
            color: self.color(color),
        };
        let index = self.lines.len() as u32;
        self.lines.push(inst);
        self.record(Kind::Line, index);
    }

    /// `uv` is `[u0, v0, u1, v1]` with v0 at the glyph's top row.
    pub fn glyph(&mut self, rect: Rect, uv: [f32; 4], color: [f32; 4]) {
        if self.clipped_out() {
            return;
        }
        let (w, h) = self.fb();
        let inst = GlyphInstance {
            xywh: to_ndc(rect, w, h),
            uv: [uv[0], uv[3], uv[2], uv[1]],
            color,
        };
        let index = self.glyphs.len() as u32;
        self.glyphs.push(inst);
        self.record(Kind::Glyph, index);
    }

    fn root(&self) -> Rect {
        let (w, h) = self.fb();
        Rect::new(0.0, 0.0, w, h)
    }

    pub fn push_clip(&mut self, rect: Rect) {
        let top = self.clips.last().copied().unwrap_or_else(|| self.root());
        let next = top.intersect(&rect);
        self.clips.push(next);
        self.cmds
            .push(Cmd::Scissor(to_scissor(next, self.fb_w, self.fb_h)));
    }

    pub fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            log::warn!("PopClip with empty clip stack");
            return;
        }
        let top = self.clips.last().copied().unwrap_or_else(|| self.root());
        self.cmds
            .push(Cmd::Scissor(to_scissor(top, self.fb_w, self.fb_h)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher() -> Batcher {
        let mut b = Batcher::default();
        b.begin(200, 100, false);
        b
    }

    #[test]
    fn ndc_maps_corners() {
        assert_eq!(
            to_ndc(Rect::new(0.0, 0.0, 200.0, 100.0), 200.0, 100.0),
            [-1.0, -1.0, 2.0, 2.0]
        );
        assert_eq!(
            to_ndc(Rect::new(100.0, 0.0, 100.0, 50.0), 200.0, 100.0),
            [0.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn scissor_clamps_to_framebuffer() {
        assert_eq!(
            to_scissor(Rect::new(-10.0, 5.5, 50.0, 200.0), 200, 100),
            [0, 5, 40, 95]
        );
        assert_eq!(to_scissor(Rect::new(300.0, 0.0, 10.0, 10.0), 200, 100), [0, 0, 0, 0]);
        assert_eq!(to_scissor(Rect::ZERO, 200, 100), [0, 0, 0, 0]);
    }

    #[test]
    fn horizontal_line_quad_spans_the_width() {
        let q = line_quad(Point::new(0.0, 10.0), Point::new(20.0, 10.0), 2.0).unwrap();
        assert_eq!(q[0], Point::new(0.0, 11.0));
        assert_eq!(q[1], Point::new(20.0, 11.0));
        assert_eq!(q[2], Point::new(0.0, 9.0));
        assert_eq!(q[3], Point::new(20.0, 9.0));
        assert!(line_quad(Point::ZERO, Point::ZERO, 2.0).is_none());
    }

    #[test]
    fn same_kind_runs_share_a_draw() {
        let mut b = batcher();
        b.rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, Color::BLACK);
        b.circle(Point::new(50.0, 50.0), 4.0, Color::WHITE);
        b.line(Point::ZERO, Point::new(10.0, 0.0), 1.0, Color::BLACK);
        b.rect(Rect::new(20.0, 0.0, 10.0, 10.0), 0.0, Color::BLACK);
        assert_eq!(
            b.cmds,
            vec![
                Cmd::Draw {
                    kind: Kind::Rect,
                    instances: 0..2
                },
                Cmd::Draw {
                    kind: Kind::Line,
                    instances: 0..1
                },
                Cmd::Draw {
                    kind: Kind::Rect,
                    instances: 2..3
                },
            ]
        );
        assert_eq!(b.rects[1].radius, 4.0);
        assert_eq!(b.rects[1].rect, [46.0, 46.0, 8.0, 8.0]);
    }

    #[test]
    fn clips_nest_and_split_runs() {
        let mut b = batcher();
        b.rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, Color::BLACK);
        b.push_clip(Rect::new(10.0, 10.0, 100.0, 50.0));
        b.rect(Rect::new(20.0, 20.0, 10.0, 10.0), 0.0, Color::BLACK);
        b.push_clip(Rect::new(0.0, 0.0, 40.0, 40.0));
        b.pop_clip();
        b.pop_clip();
        b.pop_clip();
        assert_eq!(
            b.cmds,
            vec![
                Cmd::Draw {
                    kind: Kind::Rect,
                    instances: 0..1
                },
                Cmd::Scissor([10, 10, 100, 50]),
                Cmd::Draw {
                    kind: Kind::Rect,
                    instances: 1..2
                },
                Cmd::Scissor([10, 10, 30, 30]),
                Cmd::Scissor([10, 10, 100, 50]),
                Cmd::Scissor([0, 0, 200, 100]),
            ]
        );
    }

    #[test]
    fn empty_clip_drops_draws() {
        let mut b = batcher();
        b.push_clip(Rect::new(500.0, 500.0, 10.0, 10.0));
        b.rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, Color::BLACK);
        b.glyph(Rect::new(0.0, 0.0, 5.0, 5.0), [0.0, 0.0, 1.0, 1.0], [1.0; 4]);
        assert!(b.rects.is_empty());
        assert!(b.glyphs.is_empty());
    }

    #[test]
    fn transparent_and_empty_shapes_are_skipped() {
        let mut b = batcher();
        b.rect(Rect::new(0.0, 0.0, 0.0, 10.0), 0.0, Color::BLACK);
        b.rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, Color::TRANSPARENT);
        b.border(Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 0.0, Color::BLACK);
        assert!(b.cmds.is_empty());
    }

    #[test]
    fn glyph_uv_flips_for_ndc() {
        let mut b = batcher();
        b.glyph(Rect::new(0.0, 0.0, 4.0, 4.0), [0.1, 0.2, 0.3, 0.4], [1.0; 4]);
        assert_eq!(b.glyphs[0].uv, [0.1, 0.4, 0.3, 0.2]);
    }
}
