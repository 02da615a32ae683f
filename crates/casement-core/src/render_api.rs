use std::fmt;
use std::str::FromStr;

use crate::{Color, Point, Rect, RenderError, Size};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderBackend {
    /// CPU rasterizer presenting a retained backbuffer.
    #[default]
    Software,
    /// wgpu on the platform's primary API (Vulkan / Metal / DX12).
    GpuNative,
    /// wgpu on its GL backend.
    GpuGl,
}

impl RenderBackend {
    pub fn is_gpu(self) -> bool {
        !matches!(self, RenderBackend::Software)
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderBackend::Software => "Software",
            RenderBackend::GpuNative => "GPU",
            RenderBackend::GpuGl => "GL",
        }
    }
}

impl fmt::Display for RenderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RenderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "software" | "cpu" | "sw" => Ok(RenderBackend::Software),
            "gpu" | "native" | "vulkan" | "metal" | "dx12" => Ok(RenderBackend::GpuNative),
            "gl" | "opengl" | "gles" => Ok(RenderBackend::GpuGl),
            other => Err(format!("unknown render backend `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Drawing surface handed to elements during a frame.
///
/// Coordinates are relative to the innermost `push_offset`; clips are
/// intersected with the enclosing clip.
pub trait Canvas {
    fn size(&self) -> Size;
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f32);
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, radius: f32);
    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);
    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32);
    fn draw_text(&mut self, text: &str, rect: Rect, size: f32, color: Color, align: TextAlign);
    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);
    fn push_offset(&mut self, dx: f32, dy: f32);
    fn pop_offset(&mut self);
}

/// Measures single-line text at a pixel size.
pub trait TextMeasurer {
    fn measure(&self, text: &str, size: f32) -> Size;
}

/// Fixed-advance estimate, used when no font could be loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTextMeasurer;

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, text: &str, size: f32) -> Size {
        Size::new(text.chars().count() as f32 * size * 0.55, size * 1.25)
    }
}

/// Renderable scene
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

/// Display-list command. Geometry is in absolute frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        color: Color,
        radius: f32,
    },
    Border {
        rect: Rect,
        color: Color,
        width: f32,
        radius: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },
    Text {
        rect: Rect,
        text: String,
        color: Color,
        size: f32,
        align: TextAlign,
    },
    PushClip {
        rect: Rect,
    },
    PopClip,
}

/// Canvas that records into a [`Scene`] for the GPU renderers.
#[derive(Debug, Default)]
pub struct SceneRecorder {
    size: Size,
    scene: Scene,
    offsets: Vec<(f32, f32)>,
    origin: (f32, f32),
}

impl SceneRecorder {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Starts a new frame, keeping the node allocation.
    pub fn begin(&mut self, size: Size) {
        self.size = size;
        self.scene.nodes.clear();
        self.offsets.clear();
        self.origin = (0.0, 0.0);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    fn abs(&self, r: Rect) -> Rect {
        r.translate(self.origin.0, self.origin.1)
    }

    fn abs_point(&self, p: Point) -> Point {
        p.offset(self.origin.0, self.origin.1)
    }
}

impl Canvas for SceneRecorder {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.scene.nodes.clear();
        self.scene.clear_color = color;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, radius: f32) {
        let rect = self.abs(rect);
        self.scene.nodes.push(SceneNode::Rect {
            rect,
            color,
            radius,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, radius: f32) {
        let rect = self.abs(rect);
        self.scene.nodes.push(SceneNode::Border {
            rect,
            color,
            width,
            radius,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let center = self.abs_point(center);
        self.scene.nodes.push(SceneNode::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let (from, to) = (self.abs_point(from), self.abs_point(to));
        self.scene.nodes.push(SceneNode::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn draw_text(&mut self, text: &str, rect: Rect, size: f32, color: Color, align: TextAlign) {
        if text.is_empty() {
            return;
        }
        let rect = self.abs(rect);
        self.scene.nodes.push(SceneNode::Text {
            rect,
            text: text.to_string(),
            color,
            size,
            align,
        });
    }

    fn push_clip(&mut self, rect: Rect) {
        let rect = self.abs(rect);
        self.scene.nodes.push(SceneNode::PushClip { rect });
    }

    fn pop_clip(&mut self) {
        self.scene.nodes.push(SceneNode::PopClip);
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

/// Description of the live GPU device, passed explicitly to elements
/// during a GPU frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpuContext {
    pub backend: RenderBackend,
    pub adapter: String,
    pub max_texture_dimension: u32,
}

/// A GPU presentation backend bound to one window surface.
pub trait GpuRenderer {
    fn context(&self) -> &GpuContext;
    fn resize(&mut self, width: u32, height: u32);
    /// Draws and presents one frame.
    fn render(&mut self, scene: &Scene) -> Result<(), RenderError>;
    /// Releases cached GPU resources after an idle period.
    fn trim(&mut self);
}

/// Creates GPU renderers for a window. Failing here sends the window to
/// the software path.
pub trait GpuRendererFactory {
    fn create(
        &mut self,
        backend: RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn GpuRenderer>, RenderError>;
}

/// Opaque RGBA8 pixels of a finished software frame.
#[derive(Clone, Copy, Debug)]
pub struct SoftwareFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// Native destination for software frames.
pub trait PaintTarget {
    fn present(&mut self, frame: SoftwareFrame<'_>) -> Result<(), RenderError>;
}
