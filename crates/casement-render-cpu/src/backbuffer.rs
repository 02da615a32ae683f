use casement_core::SoftwareFrame;
use tiny_skia::Pixmap;

use crate::canvas::PixmapCanvas;
use crate::text::FontRasterizer;

/// Bytes a `width` x `height` RGBA8 frame occupies.
pub fn estimate_bytes(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Off-screen frame the software path renders into.
#[derive(Debug)]
pub struct BackBuffer {
    pixmap: Pixmap,
}

impl BackBuffer {
    /// `None` for zero sizes or when the allocation would overflow.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width() == width && self.height() == height
    }

    pub fn byte_len(&self) -> usize {
        self.pixmap.data().len()
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn canvas<'a>(&'a mut self, font: Option<&'a FontRasterizer>) -> PixmapCanvas<'a> {
        PixmapCanvas::new(&mut self.pixmap, font)
    }

    pub fn frame(&self) -> SoftwareFrame<'_> {
        SoftwareFrame {
            width: self.width(),
            height: self.height(),
            pixels: self.data(),
        }
    }
}
