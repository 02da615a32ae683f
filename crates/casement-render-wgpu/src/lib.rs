//! wgpu renderer for recorded Casement scenes.
//!
//! One [`WgpuRenderer`] owns a window surface. It draws a [`Scene`] with
//! four instanced pipelines (rects, borders, lines, glyphs) and keeps glyph
//! coverage in an R8 atlas. [`WgpuRendererFactory`] is what a window hands
//! to its render pipeline; any failure there sends the window to software.

mod atlas;
mod batch;

use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use casement_core::{
    GpuContext, GpuRenderer, GpuRendererFactory, RenderBackend, RenderError, Scene, SceneNode,
};
use casement_render_cpu::{FontRasterizer, LineLayout};

use atlas::{GlyphAtlas, INITIAL_ATLAS, Lookup, MAX_ATLAS};
use batch::{Batcher, BorderInstance, Cmd, GlyphInstance, Kind, LineInstance, RectInstance};

const INITIAL_UPLOAD: u64 = 64 << 10;

/// Grow-only vertex buffer refilled once per frame.
struct UploadBuffer {
    label: &'static str,
    buf: wgpu::Buffer,
    cap: u64,
}

impl UploadBuffer {
    fn new(device: &wgpu::Device, label: &'static str, cap: u64) -> Self {
        let buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { label, buf, cap }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let len = bytes.len() as u64;
        if len > self.cap {
            let cap = len.next_power_of_two();
            log::debug!("{} grows to {cap} bytes", self.label);
            *self = Self::new(device, self.label, cap);
        }
        queue.write_buffer(&self.buf, 0, bytes);
    }

    fn shrink(&mut self, device: &wgpu::Device) {
        if self.cap > INITIAL_UPLOAD {
            *self = Self::new(device, self.label, INITIAL_UPLOAD);
        }
    }
}

fn instanced_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    layout: &wgpu::PipelineLayout,
    stride: usize,
    attributes: &[wgpu::VertexAttribute],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: stride as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn attr(location: u32, offset: u64, format: wgpu::VertexFormat) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        shader_location: location,
        offset,
        format,
    }
}

pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    context: GpuContext,

    rect_pipeline: wgpu::RenderPipeline,
    border_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    text_bind_layout: wgpu::BindGroupLayout,

    atlas: GlyphAtlas,
    atlas_bind: wgpu::BindGroup,

    rects: UploadBuffer,
    borders: UploadBuffer,
    lines: UploadBuffer,
    glyphs: UploadBuffer,

    batch: Batcher,
    font: Option<FontRasterizer>,
    layouts: Vec<LineLayout>,
}

impl WgpuRenderer {
    pub fn new(
        window: Arc<winit::window::Window>,
        backend: RenderBackend,
        width: u32,
        height: u32,
        font: Option<FontRasterizer>,
    ) -> anyhow::Result<Self> {
        let mut desc = wgpu::InstanceDescriptor::from_env_or_default();
        desc.backends = match backend {
            RenderBackend::GpuGl => wgpu::Backends::GL,
            _ => wgpu::Backends::PRIMARY,
        };
        let instance = wgpu::Instance::new(&desc);
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| anyhow::anyhow!("no {} adapter: {e}", backend.label()))?;
        let info = adapter.get_info();
        log::info!("{} adapter: {} ({:?})", backend.label(), info.name, info.backend);

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: Some("casement device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            }))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let present_mode = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::PresentMode::Mailbox || *m == wgpu::PresentMode::Immediate)
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let plain_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });
        let text_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text bind layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let text_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text pipeline layout"),
            bind_group_layouts: &[&text_bind_layout],
            immediate_size: 0,
        });

        use wgpu::VertexFormat::{Float32, Float32x4};
        let rect_pipeline = instanced_pipeline(
            &device,
            "rect.wgsl",
            include_str!("shaders/rect.wgsl"),
            &plain_layout,
            std::mem::size_of::<RectInstance>(),
            &[
                attr(0, 0, Float32x4),
                attr(1, 16, Float32x4),
                attr(2, 32, Float32),
                attr(3, 36, Float32x4),
            ],
            format,
        );
        let border_pipeline = instanced_pipeline(
            &device,
            "border.wgsl",
            include_str!("shaders/border.wgsl"),
            &plain_layout,
            std::mem::size_of::<BorderInstance>(),
            &[
                attr(0, 0, Float32x4),
                attr(1, 16, Float32x4),
                attr(2, 32, Float32),
                attr(3, 36, Float32),
                attr(4, 40, Float32x4),
            ],
            format,
        );
        let line_pipeline = instanced_pipeline(
            &device,
            "line.wgsl",
            include_str!("shaders/line.wgsl"),
            &plain_layout,
            std::mem::size_of::<LineInstance>(),
            &[
                attr(0, 0, Float32x4),
                attr(1, 16, Float32x4),
                attr(2, 32, Float32x4),
            ],
            format,
        );
        let text_pipeline = instanced_pipeline(
            &device,
            "text.wgsl",
            include_str!("shaders/text.wgsl"),
            &text_layout,
            std::mem::size_of::<GlyphInstance>(),
            &[
                attr(0, 0, Float32x4),
                attr(1, 16, Float32x4),
                attr(2, 32, Float32x4),
            ],
            format,
        );

        let max_texture_dimension = device.limits().max_texture_dimension_2d;
        let atlas = GlyphAtlas::new(
            &device,
            INITIAL_ATLAS,
            MAX_ATLAS.min(max_texture_dimension),
        );
        let atlas_bind = Self::bind_atlas(&device, &text_bind_layout, &atlas);

        let context = GpuContext {
            backend,
            adapter: info.name,
            max_texture_dimension,
        };

        Ok(Self {
            rects: UploadBuffer::new(&device, "rect instances", INITIAL_UPLOAD),
            borders: UploadBuffer::new(&device, "border instances", INITIAL_UPLOAD),
            lines: UploadBuffer::new(&device, "line instances", INITIAL_UPLOAD),
            glyphs: UploadBuffer::new(&device, "glyph instances", INITIAL_UPLOAD),
            surface,
            device,
            queue,
            config,
            context,
            rect_pipeline,
            border_pipeline,
            line_pipeline,
            text_pipeline,
            text_bind_layout,
            atlas,
            atlas_bind,
            batch: Batcher::default(),
            font,
            layouts: Vec::new(),
        })
    }

    fn bind_atlas(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        atlas: &GlyphAtlas,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas bind"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&atlas.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                },
            ],
        })
    }

    fn linear_output(&self) -> bool {
        self.config.format.is_srgb()
    }

    /// Makes sure every glyph of the scene is in the atlas before any
    /// instance is built, since growing the atlas invalidates earlier UVs.
    fn prepare_text(&mut self, scene: &Scene) {
        self.layouts.clear();
        let Some(font) = self.font.as_ref() else {
            return;
        };
        for node in &scene.nodes {
            if let SceneNode::Text { text, size, .. } = node {
                self.layouts.push(font.layout_line(text, *size));
            }
        }
        let sizes: Vec<f32> = scene
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Text { size, .. } => Some(*size),
                _ => None,
            })
            .collect();

        // second attempt runs on a grown or freshly reset atlas
        for attempt in 0..2 {
            let mut full = false;
            'fill: for (layout, size) in self.layouts.iter().zip(&sizes) {
                for g in &layout.glyphs {
                    if let Lookup::Full = self.atlas.ensure(&self.queue, font, g.id, *size) {
                        full = true;
                        break 'fill;
                    }
                }
            }
            if !full {
                break;
            }
            self.atlas.grow_or_reset(&self.device);
            self.atlas_bind = Self::bind_atlas(&self.device, &self.text_bind_layout, &self.atlas);
            if attempt == 1 {
                log::warn!("glyph atlas cannot hold one frame of text; some glyphs are missing");
            }
        }
    }

    fn build(&mut self, scene: &Scene) {
        let linear = self.linear_output();
        self.batch
            .begin(self.config.width, self.config.height, linear);
        let mut layouts = self.layouts.iter();
        for node in &scene.nodes {
            match node {
                SceneNode::Rect {
                    rect,
                    color,
                    radius,
                } => self.batch.rect(*rect, *radius, *color),
                SceneNode::Border {
                    rect,
                    color,
                    width,
                    radius,
                } => self.batch.border(*rect, *width, *radius, *color),
                SceneNode::Circle {
                    center,
                    radius,
                    color,
                } => self.batch.circle(*center, *radius, *color),
                SceneNode::Line {
                    from,
                    to,
                    color,
                    width,
                } => self.batch.line(*from, *to, *width, *color),
                SceneNode::Text {
                    rect,
                    color,
                    size,
                    align,
                    ..
                } => {
                    let Some(layout) = layouts.next() else {
                        continue;
                    };
                    let tint = self.batch.color(*color);
                    let (ox, oy) = layout.origin_in(*rect, *align);
                    for g in &layout.glyphs {
                        let Some(info) = self.atlas.get(g.id, *size) else {
                            continue;
                        };
                        let x = (ox + g.position.x + info.min_x).round();
                        let y = (oy + g.position.y + info.min_y).round();
                        self.batch.glyph(
                            casement_core::Rect::new(x, y, info.w, info.h),
                            info.uv,
                            tint,
                        );
                    }
                }
                SceneNode::PushClip { rect } => self.batch.push_clip(*rect),
                SceneNode::PopClip => self.batch.pop_clip(),
            }
        }
    }

    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        let mut reconfigured = false;
        loop {
            match self.surface.get_current_texture() {
                Ok(frame) => return Ok(Some(frame)),
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated)
                    if !reconfigured =>
                {
                    log::warn!("surface lost or outdated; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                    reconfigured = true;
                }
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                    return Err(RenderError::SurfaceLost);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!("surface timeout; dropping frame");
                    return Ok(None);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
                Err(wgpu::SurfaceError::Other) => {
                    return Err(RenderError::Backend("surface acquisition failed".into()));
                }
            }
        }
    }
}

impl GpuRenderer for WgpuRenderer {
    fn context(&self) -> &GpuContext {
        &self.context
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.config.width == width && self.config.height == height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare_text(scene);
        self.build(scene);
        self.rects
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.batch.rects));
        self.borders
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.batch.borders));
        self.lines
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.batch.lines));
        self.glyphs
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&self.batch.glyphs));

        let clear = self.batch.color(scene.clear_color);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_scissor_rect(0, 0, self.config.width, self.config.height);

            let mut skip = false;
            for cmd in &self.batch.cmds {
                match cmd {
                    Cmd::Scissor([x, y, w, h]) => {
                        skip = *w == 0 || *h == 0;
                        if !skip {
                            rpass.set_scissor_rect(*x, *y, *w, *h);
                        }
                    }
                    Cmd::Draw { .. } if skip => {}
                    Cmd::Draw { kind, instances } => {
                        let (pipeline, buf) = match kind {
                            Kind::Rect => (&self.rect_pipeline, &self.rects),
                            Kind::Border => (&self.border_pipeline, &self.borders),
                            Kind::Line => (&self.line_pipeline, &self.lines),
                            Kind::Glyph => (&self.text_pipeline, &self.glyphs),
                        };
                        rpass.set_pipeline(pipeline);
                        if *kind == Kind::Glyph {
                            rpass.set_bind_group(0, &self.atlas_bind, &[]);
                        }
                        rpass.set_vertex_buffer(0, buf.buf.slice(..));
                        rpass.draw(0..6, instances.clone());
                    }
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        catch_unwind(AssertUnwindSafe(|| frame.present()))
            .map_err(|_| RenderError::Present("present panicked".into()))
    }

    fn trim(&mut self) {
        log::debug!("trimming {} renderer caches", self.context.backend);
        self.atlas = GlyphAtlas::new(
            &self.device,
            INITIAL_ATLAS,
            MAX_ATLAS.min(self.context.max_texture_dimension),
        );
        self.atlas_bind = Self::bind_atlas(&self.device, &self.text_bind_layout, &self.atlas);
        self.rects.shrink(&self.device);
        self.borders.shrink(&self.device);
        self.lines.shrink(&self.device);
        self.glyphs.shrink(&self.device);
        self.batch = Batcher::default();
        self.layouts = Vec::new();
    }
}

/// Builds [`WgpuRenderer`]s for one winit window.
pub struct WgpuRendererFactory {
    window: Arc<winit::window::Window>,
    font: Option<FontRasterizer>,
}

impl WgpuRendererFactory {
    pub fn new(window: Arc<winit::window::Window>) -> Self {
        Self { window, font: None }
    }

    pub fn with_font(mut self, font: Option<FontRasterizer>) -> Self {
        self.font = font;
        self
    }
}

impl GpuRendererFactory for WgpuRendererFactory {
    fn create(
        &mut self,
        backend: RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn GpuRenderer>, RenderError> {
        if !backend.is_gpu() {
            return Err(RenderError::unavailable(backend, "not a GPU backend"));
        }
        let window = self.window.clone();
        let font = self.font.clone();
        // drivers have been seen to panic during setup
        match catch_unwind(AssertUnwindSafe(|| {
            WgpuRenderer::new(window, backend, width, height, font)
        })) {
            Ok(Ok(renderer)) => Ok(Box::new(renderer)),
            Ok(Err(e)) => Err(RenderError::unavailable(backend, format!("{e:#}"))),
            Err(_) => Err(RenderError::unavailable(
                backend,
                "panicked during initialization",
            )),
        }
    }
}
