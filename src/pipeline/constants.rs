//! Parameter blocks forwarded to the rendering context.
//!
//! Layouts are `#[repr(C)]` and padding free so a backend can upload them
//! verbatim with `bytemuck::bytes_of`.

use crate::pipeline::context::{TextureHandle, ValueSpace};

/// Constant-buffer capacity for directional lights.
pub const DIRECT_LIGHTS_MAX: usize = 4;
/// Constant-buffer capacity for point lights.
pub const POINT_LIGHTS_MAX: usize = 8;

/// Shading path selector stored in [`ObjectConstants::flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ShadingTag {
    Neutral = 0,
    MetalRoughness = 1,
    SpecularGlossiness = 2,
    /// Constant emissive output, no lighting.
    Constant = 3,
}

/// Per-frame block: camera and all light parameters.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameConstants {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub eye_position: [f32; 4],
    pub ambient_luminance: [f32; 4],
    pub direct_light_directions: [[f32; 4]; DIRECT_LIGHTS_MAX],
    pub direct_light_luminances: [[f32; 4]; DIRECT_LIGHTS_MAX],
    pub point_light_positions: [[f32; 4]; POINT_LIGHTS_MAX],
    pub point_light_intensities: [[f32; 4]; POINT_LIGHTS_MAX],
    /// x = direct light count, y = point light count, z = MSAA sample count.
    pub counts: [u32; 4],
}

/// Per-object block: transforms and material factors.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    /// Inverse-transpose of the world matrix (upper 3x3 in a 4x4 frame).
    pub normal_matrix: [[f32; 4]; 4],
    /// Base color (metal-roughness) or diffuse (specular-glossiness) factor.
    pub base_factor: [f32; 4],
    /// Specular color in xyz, glossiness in w (specular-glossiness only).
    pub specular_factor: [f32; 4],
    pub emissive_factor: [f32; 4],
    /// x = metallic, y = roughness, z = normal scale, w = occlusion strength.
    pub pbr_params: [f32; 4],
    /// x = [`ShadingTag`], y = 1 when the primitive carries tangents.
    pub flags: [u32; 4],
}

impl Default for FrameConstants {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// Binding for one texture usage: a device texture or the neutral color
/// the shader substitutes when none is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSlot {
    pub handle: Option<TextureHandle>,
    pub neutral: [f32; 4],
    pub value_space: ValueSpace,
}

impl TextureSlot {
    pub fn unbound(neutral: [f32; 4]) -> Self {
        Self {
            handle: None,
            neutral,
            value_space: ValueSpace::Linear,
        }
    }
}

/// Texture slots in shader register order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialTextures {
    /// Base color or diffuse.
    pub base: TextureSlot,
    /// Metallic-roughness or specular-glossiness.
    pub surface: TextureSlot,
    pub normal: TextureSlot,
    pub occlusion: TextureSlot,
    pub emissive: TextureSlot,
}

impl MaterialTextures {
    /// All slots unbound with white fallback, normal slot pointing straight up.
    pub fn neutral() -> Self {
        let white = TextureSlot::unbound([1.0; 4]);
        Self {
            base: white,
            surface: white,
            normal: TextureSlot::unbound([0.5, 0.5, 1.0, 1.0]),
            occlusion: white,
            emissive: white,
        }
    }

    pub fn bound_count(&self) -> usize {
        [
            &self.base,
            &self.surface,
            &self.normal,
            &self.occlusion,
            &self.emissive,
        ]
        .iter()
        .filter(|s| s.handle.is_some())
        .count()
    }
}
