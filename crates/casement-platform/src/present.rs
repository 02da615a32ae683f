use std::num::NonZeroU32;
use std::sync::Arc;

use casement_core::{PaintTarget, RenderError, SoftwareFrame};
use winit::window::Window;

type Surface = softbuffer::Surface<Arc<Window>, Arc<Window>>;

/// Packs RGBA8 pixels into softbuffer's `0x00RRGGBB` words.
pub fn pack_xrgb(src: &[u8], dst: &mut [u32]) {
    for (px, out) in src.chunks_exact(4).zip(dst.iter_mut()) {
        *out = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
    }
}

/// Presents software frames through softbuffer. The surface is created on
/// the first software frame so a GPU window never holds one.
pub struct SoftbufferTarget {
    window: Arc<Window>,
    surface: Option<Surface>,
}

impl SoftbufferTarget {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            surface: None,
        }
    }

    fn surface(&mut self) -> Result<&mut Surface, RenderError> {
        if self.surface.is_none() {
            let context = softbuffer::Context::new(self.window.clone())
                .map_err(|e| RenderError::Present(e.to_string()))?;
            let surface = softbuffer::Surface::new(&context, self.window.clone())
                .map_err(|e| RenderError::Present(e.to_string()))?;
            log::debug!("softbuffer surface created for {:?}", self.window.id());
            self.surface = Some(surface);
        }
        self.surface
            .as_mut()
            .ok_or_else(|| RenderError::Present("no softbuffer surface".into()))
    }

    /// Drops the surface, for when a GPU backend takes over the window.
    pub fn release(&mut self) {
        self.surface = None;
    }
}

impl PaintTarget for SoftbufferTarget {
    fn present(&mut self, frame: SoftwareFrame<'_>) -> Result<(), RenderError> {
        let (Some(w), Some(h)) = (NonZeroU32::new(frame.width), NonZeroU32::new(frame.height))
        else {
            return Err(RenderError::InvalidSize {
                width: frame.width as i32,
                height: frame.height as i32,
            });
        };
        let surface = self.surface()?;
        surface
            .resize(w, h)
            .map_err(|e| RenderError::Present(e.to_string()))?;
        let mut buffer = surface
            .buffer_mut()
            .map_err(|e| RenderError::Present(e.to_string()))?;
        pack_xrgb(frame.pixels, &mut buffer);
        buffer
            .present()
            .map_err(|e| RenderError::Present(e.to_string()))
    }
}
