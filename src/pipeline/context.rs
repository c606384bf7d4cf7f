use crate::core::geometry::Topology;
use crate::pipeline::constants::{FrameConstants, MaterialTextures, ObjectConstants};
use thiserror::Error;

/// Opaque device buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Opaque shader-resource (texture) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque shader object handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Any device object the scene may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceHandle {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Shader(ShaderHandle),
}

/// Failure reported by the rendering context.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{operation} '{label}' failed: {message}")]
pub struct ContextError {
    pub operation: &'static str,
    pub label: String,
    pub message: String,
}

/// Named shader source and entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub file: &'static str,
    pub entry_point: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// Whether stored texel values are linear or display (sRGB) encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueSpace {
    #[default]
    Linear,
    Srgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

/// Texture sampling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerDesc {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmaps: bool,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
}

/// Everything the context needs to create a 2D RGBA8 texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub value_space: ValueSpace,
    pub sampler: SamplerDesc,
    /// Tightly packed RGBA8 rows.
    pub pixels: &'a [u8],
}

/// Multisampling configuration of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multisampling {
    pub sample_count: u32,
    pub quality: u32,
}

impl Default for Multisampling {
    fn default() -> Self {
        Self {
            sample_count: 1,
            quality: 0,
        }
    }
}

/// One indexed draw over previously created buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawIndexed {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub vertex_stride: u32,
    pub topology: Topology,
}

/// Rendering-context collaborator.
///
/// The scene never talks to a graphics device directly; everything it needs
/// from one goes through this interface. All calls happen on the frame thread.
pub trait RenderContext {
    fn create_vertex_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ContextError>;

    fn create_pixel_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ContextError>;

    /// Creates an immutable device buffer initialised from `data`.
    fn create_buffer(
        &mut self,
        usage: BufferUsage,
        label: &str,
        data: &[u8],
    ) -> Result<BufferHandle, ContextError>;

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, ContextError>;

    /// Releases a resource created by this context. Releasing twice is a caller bug.
    fn release(&mut self, resource: ResourceHandle);

    /// Render target size in pixels (width, height).
    fn window_size(&self) -> (u32, u32);

    /// Elapsed animation time in seconds.
    fn animation_time(&self) -> f64;

    fn multisampling(&self) -> Multisampling {
        Multisampling::default()
    }

    fn set_frame_constants(&mut self, constants: &FrameConstants);

    fn set_object_constants(&mut self, constants: &ObjectConstants, textures: &MaterialTextures);

    fn bind_shaders(&mut self, vertex: ShaderHandle, pixel: ShaderHandle);

    fn draw_indexed(&mut self, draw: &DrawIndexed);
}
