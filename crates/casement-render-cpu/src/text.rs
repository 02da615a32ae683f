//! Single-line text with `ab_glyph`, using a system sans-serif face found
//! through `fontdb`.

use ab_glyph::{Font, FontArc, FontVec, Glyph, OutlinedGlyph, PxScale, ScaleFont, point};
use casement_core::{Rect, Size, TextAlign, TextMeasurer};
use fontdb::{Database, Family, Query};

/// A loaded face. Cheap to clone.
#[derive(Clone)]
pub struct FontRasterizer {
    font: FontArc,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

/// Glyphs of one line positioned in the line's own space (baseline at
/// `ascent`).
#[derive(Debug, Default)]
pub struct LineLayout {
    pub glyphs: Vec<Glyph>,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl LineLayout {
    pub fn height(&self) -> f32 {
        self.ascent - self.descent
    }

    /// Top-left of the line box placed inside `rect`, vertically centred.
    pub fn origin_in(&self, rect: Rect, align: TextAlign) -> (f32, f32) {
        let x = match align {
            TextAlign::Left => rect.x,
            TextAlign::Center => rect.x + (rect.w - self.width) * 0.5,
            TextAlign::Right => rect.right() - self.width,
        };
        let y = rect.y + (rect.h - self.height()) * 0.5;
        (x.round(), y.round())
    }
}

impl FontRasterizer {
    /// Finds the system sans-serif face; `None` when no font is installed.
    pub fn load_system() -> Option<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        let query = Query {
            families: &[Family::SansSerif],
            ..Query::default()
        };
        let id = match db.query(&query) {
            Some(id) => id,
            None => {
                log::warn!("no sans-serif system font found; text will not render");
                return None;
            }
        };
        let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        Self::from_bytes(data, index)
    }

    pub fn from_bytes(data: Vec<u8>, index: u32) -> Option<Self> {
        match FontVec::try_from_vec_and_index(data, index) {
            Ok(font) => Some(Self {
                font: FontArc::new(font),
            }),
            Err(e) => {
                log::warn!("invalid font data: {e}");
                None
            }
        }
    }

    pub fn layout_line(&self, text: &str, size: f32) -> LineLayout {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let ascent = scaled.ascent();
        let mut out = LineLayout {
            glyphs: Vec::with_capacity(text.len()),
            width: 0.0,
            ascent,
            descent: scaled.descent(),
        };
        let mut caret = 0.0f32;
        let mut prev = None;
        for c in text.chars() {
            if c.is_control() {
                continue;
            }
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            out.glyphs
                .push(id.with_scale_and_position(PxScale::from(size), point(caret, ascent)));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }
        out.width = caret;
        out
    }

    pub fn outline(&self, glyph: Glyph) -> Option<OutlinedGlyph> {
        self.font.outline_glyph(glyph)
    }

    /// Coverage of a laid-out line as an A8 bitmap plus its size.
    pub fn rasterize_line(&self, layout: &LineLayout) -> (Vec<u8>, u32, u32) {
        let w = layout.width.ceil().max(1.0) as u32;
        let h = layout.height().ceil().max(1.0) as u32;
        let mut coverage = vec![0u8; (w * h) as usize];
        for glyph in &layout.glyphs {
            let Some(outlined) = self.outline(glyph.clone()) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
                    return;
                }
                let idx = (y as u32 * w + x as u32) as usize;
                let v = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                coverage[idx] = coverage[idx].saturating_add(v);
            });
        }
        (coverage, w, h)
    }
}

impl TextMeasurer for FontRasterizer {
    fn measure(&self, text: &str, size: f32) -> Size {
        let layout = self.layout_line(text, size);
        Size::new(layout.width, layout.height())
    }
}
