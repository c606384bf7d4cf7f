use crate::pipeline::constants::{FrameConstants, MaterialTextures, ObjectConstants};
use crate::pipeline::context::{
    BufferHandle, BufferUsage, ContextError, DrawIndexed, Multisampling, RenderContext,
    ResourceHandle, ShaderHandle, ShaderSource, TextureDesc, TextureHandle,
};
use log::{debug, warn};
use std::collections::HashMap;

/// What a live resource is, for leak reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRecord {
    VertexShader(String),
    PixelShader(String),
    Buffer { usage: BufferUsage, bytes: usize },
    Texture { width: u32, height: u32 },
}

/// One draw as seen by the context, with the state bound at the time.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub draw: DrawIndexed,
    pub shaders: Option<(ShaderHandle, ShaderHandle)>,
    pub object: ObjectConstants,
    pub textures: MaterialTextures,
}

/// Rendering context without a device.
///
/// Hands out sequential handles, tracks which are alive and records every
/// frame-level call so a frame can be inspected after the fact.
pub struct HeadlessContext {
    width: u32,
    height: u32,
    time: f64,
    multisampling: Multisampling,
    next_id: u64,
    creations: usize,
    fail_at: Option<usize>,
    live: HashMap<ResourceHandle, ResourceRecord>,
    released: usize,

    bound_shaders: Option<(ShaderHandle, ShaderHandle)>,
    pending_object: Option<(ObjectConstants, MaterialTextures)>,
    pub frame_constants: Option<FrameConstants>,
    pub draws: Vec<DrawRecord>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            time: 0.0,
            multisampling: Multisampling::default(),
            next_id: 1,
            creations: 0,
            fail_at: None,
            live: HashMap::new(),
            released: 0,
            bound_shaders: None,
            pending_object: None,
            frame_constants: None,
            draws: Vec::new(),
        }
    }

    pub fn with_multisampling(mut self, sample_count: u32) -> Self {
        self.multisampling = Multisampling {
            sample_count: sample_count.max(1),
            quality: 0,
        };
        self
    }

    /// Makes the `n`-th creation call from now (0-based) fail.
    pub fn fail_creation_at(&mut self, n: usize) {
        self.fail_at = Some(self.creations + n);
    }

    pub fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Drops everything recorded for the previous frame.
    pub fn begin_frame(&mut self) {
        self.frame_constants = None;
        self.pending_object = None;
        self.bound_shaders = None;
        self.draws.clear();
    }

    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    pub fn live_records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.live.values()
    }

    pub fn released_resources(&self) -> usize {
        self.released
    }

    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.live.contains_key(&handle)
    }

    fn allocate(
        &mut self,
        operation: &'static str,
        label: &str,
    ) -> Result<u64, ContextError> {
        let attempt = self.creations;
        self.creations += 1;
        if self.fail_at == Some(attempt) {
            self.fail_at = None;
            return Err(ContextError {
                operation,
                label: label.to_string(),
                message: "injected failure".to_string(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}

impl RenderContext for HeadlessContext {
    fn create_vertex_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ContextError> {
        let handle = ShaderHandle(self.allocate("create_vertex_shader", source.file)?);
        self.live.insert(
            ResourceHandle::Shader(handle),
            ResourceRecord::VertexShader(format!("{}:{}", source.file, source.entry_point)),
        );
        Ok(handle)
    }

    fn create_pixel_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ContextError> {
        let handle = ShaderHandle(self.allocate("create_pixel_shader", source.file)?);
        self.live.insert(
            ResourceHandle::Shader(handle),
            ResourceRecord::PixelShader(format!("{}:{}", source.file, source.entry_point)),
        );
        Ok(handle)
    }

    fn create_buffer(
        &mut self,
        usage: BufferUsage,
        label: &str,
        data: &[u8],
    ) -> Result<BufferHandle, ContextError> {
        if data.is_empty() {
            return Err(ContextError {
                operation: "create_buffer",
                label: label.to_string(),
                message: "zero-sized buffer".to_string(),
            });
        }
        let handle = BufferHandle(self.allocate("create_buffer", label)?);
        self.live.insert(
            ResourceHandle::Buffer(handle),
            ResourceRecord::Buffer {
                usage,
                bytes: data.len(),
            },
        );
        Ok(handle)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, ContextError> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.pixels.len() != expected {
            return Err(ContextError {
                operation: "create_texture",
                label: desc.label.to_string(),
                message: format!("expected {} bytes, got {}", expected, desc.pixels.len()),
            });
        }
        let handle = TextureHandle(self.allocate("create_texture", desc.label)?);
        self.live.insert(
            ResourceHandle::Texture(handle),
            ResourceRecord::Texture {
                width: desc.width,
                height: desc.height,
            },
        );
        Ok(handle)
    }

    fn release(&mut self, resource: ResourceHandle) {
        if self.live.remove(&resource).is_some() {
            self.released += 1;
        } else {
            warn!("Release of unknown resource {:?}", resource);
        }
    }

    fn window_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn animation_time(&self) -> f64 {
        self.time
    }

    fn multisampling(&self) -> Multisampling {
        self.multisampling
    }

    fn set_frame_constants(&mut self, constants: &FrameConstants) {
        self.frame_constants = Some(*constants);
    }

    fn set_object_constants(&mut self, constants: &ObjectConstants, textures: &MaterialTextures) {
        self.pending_object = Some((*constants, *textures));
    }

    fn bind_shaders(&mut self, vertex: ShaderHandle, pixel: ShaderHandle) {
        self.bound_shaders = Some((vertex, pixel));
    }

    fn draw_indexed(&mut self, draw: &DrawIndexed) {
        let (object, textures) = self
            .pending_object
            .unwrap_or_else(|| (ObjectConstants::default(), MaterialTextures::neutral()));
        debug!(
            "draw: {} indices, {:?}, {} textures bound",
            draw.index_count,
            draw.topology,
            textures.bound_count()
        );
        self.draws.push(DrawRecord {
            draw: *draw,
            shaders: self.bound_shaders,
            object,
            textures,
        });
    }
}
