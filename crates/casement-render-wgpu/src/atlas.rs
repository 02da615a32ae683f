//! R8 coverage atlas for glyphs, packed in shelves.

use std::collections::HashMap;

use ab_glyph::{GlyphId, point};
use casement_render_cpu::FontRasterizer;

pub(crate) const INITIAL_ATLAS: u32 = 1024;
pub(crate) const MAX_ATLAS: u32 = 4096;

/// Row-based packer with a one-pixel gutter around every entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ShelfPacker {
    size: u32,
    next_x: u32,
    next_y: u32,
    row_h: u32,
}

impl ShelfPacker {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            next_x: 1,
            next_y: 1,
            row_h: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn alloc(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 > self.size || h + 2 > self.size {
            return None;
        }
        if self.next_x + w + 1 > self.size {
            self.next_x = 1;
            self.next_y += self.row_h;
            self.row_h = 0;
        }
        if self.next_y + h + 1 > self.size {
            return None;
        }
        let at = (self.next_x, self.next_y);
        self.next_x += w + 1;
        self.row_h = self.row_h.max(h + 1);
        Some(at)
    }
}

/// Where a glyph sits in the atlas and how it is offset from its pen
/// position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AtlasGlyph {
    pub uv: [f32; 4],
    pub w: f32,
    pub h: f32,
    pub min_x: f32,
    pub min_y: f32,
}

pub(crate) enum Lookup {
    Ready(Option<AtlasGlyph>),
    Full,
}

pub(crate) struct GlyphAtlas {
    pub tex: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    packer: ShelfPacker,
    max_size: u32,
    // `None` marks glyphs with no outline (spaces)
    map: HashMap<(GlyphId, u32), Option<AtlasGlyph>>,
}

impl GlyphAtlas {
    pub fn new(device: &wgpu::Device, size: u32, max_size: u32) -> Self {
        let size = size.min(max_size);
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph atlas A8"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph atlas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            tex,
            view,
            sampler,
            packer: ShelfPacker::new(size),
            max_size,
            map: HashMap::new(),
        }
    }

    pub fn size(&self) -> u32 {
        self.packer.size()
    }

    pub fn get(&self, id: GlyphId, size: f32) -> Option<AtlasGlyph> {
        self.map.get(&(id, size.to_bits())).copied().flatten()
    }

    /// Rasterizes and uploads `id` at `size` unless cached. `Full` means the
    /// caller must grow or reset the atlas and retry.
    pub fn ensure(
        &mut self,
        queue: &wgpu::Queue,
        font: &FontRasterizer,
        id: GlyphId,
        size: f32,
    ) -> Lookup {
        let key = (id, size.to_bits());
        if let Some(hit) = self.map.get(&key) {
            return Lookup::Ready(*hit);
        }
        let glyph = id.with_scale_and_position(size, point(0.0, 0.0));
        let Some(outlined) = font.outline(glyph) else {
            self.map.insert(key, None);
            return Lookup::Ready(None);
        };
        let bounds = outlined.px_bounds();
        let w = bounds.width().ceil() as u32;
        let h = bounds.height().ceil() as u32;
        if w == 0 || h == 0 {
            self.map.insert(key, None);
            return Lookup::Ready(None);
        }
        let Some((x, y)) = self.packer.alloc(w, h) else {
            return Lookup::Full;
        };

        let mut coverage = vec![0u8; (w * h) as usize];
        outlined.draw(|gx, gy, c| {
            if gx < w && gy < h {
                coverage[(gy * w + gx) as usize] = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfoBase {
                texture: &self.tex,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &coverage,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );

        let s = self.packer.size() as f32;
        let info = AtlasGlyph {
            uv: [
                x as f32 / s,
                y as f32 / s,
                (x + w) as f32 / s,
                (y + h) as f32 / s,
            ],
            w: w as f32,
            h: h as f32,
            min_x: bounds.min.x,
            min_y: bounds.min.y,
        };
        self.map.insert(key, Some(info));
        Lookup::Ready(Some(info))
    }

    /// Doubles the texture when allowed, otherwise starts over at the same
    /// size. Either way every cached glyph is dropped.
    pub fn grow_or_reset(&mut self, device: &wgpu::Device) {
        let next = (self.size() * 2).min(self.max_size);
        if next > self.size() {
            log::debug!("glyph atlas grows to {next}px");
        } else {
            log::debug!("glyph atlas full at {next}px; resetting");
        }
        *self = Self::new(device, next, self.max_size);
    }
}
