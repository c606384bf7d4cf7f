use crate::core::error::SceneResult;
use crate::pipeline::constants::TextureSlot;
use crate::pipeline::context::{
    RenderContext, ResourceHandle, SamplerDesc, TextureDesc, TextureHandle, ValueSpace,
};
use image::RgbaImage;
use nalgebra::Vector4;

/// What a texture is sampled for. Decides value space, neutral color and
/// which scalar modifier (if any) travels with the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    BaseColor,
    MetallicRoughness,
    Diffuse,
    SpecularGlossiness,
    Normal,
    Occlusion,
    Emissive,
}

impl TextureUsage {
    /// Color textures are display encoded, data textures are linear.
    pub fn value_space(self) -> ValueSpace {
        match self {
            TextureUsage::BaseColor | TextureUsage::Diffuse | TextureUsage::Emissive => {
                ValueSpace::Srgb
            }
            TextureUsage::MetallicRoughness
            | TextureUsage::SpecularGlossiness
            | TextureUsage::Normal
            | TextureUsage::Occlusion => ValueSpace::Linear,
        }
    }

    /// Color the shader uses when no image is bound.
    pub fn neutral(self) -> Vector4<f32> {
        match self {
            TextureUsage::Normal => Vector4::new(0.5, 0.5, 1.0, 1.0),
            _ => Vector4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Scalar carried by normal and occlusion bindings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureModifier {
    NormalScale(f32),
    OcclusionStrength(f32),
}

/// A texture binding: optional image data, its device copy, and the neutral
/// fallback used while nothing is bound.
#[derive(Debug, Clone)]
pub struct SceneTexture {
    name: String,
    usage: TextureUsage,
    value_space: ValueSpace,
    neutral: Vector4<f32>,
    modifier: Option<TextureModifier>,
    pub sampler: SamplerDesc,
    image: Option<RgbaImage>,
    handle: Option<TextureHandle>,
}

impl SceneTexture {
    pub fn new(name: impl Into<String>, usage: TextureUsage) -> Self {
        let modifier = match usage {
            TextureUsage::Normal => Some(TextureModifier::NormalScale(1.0)),
            TextureUsage::Occlusion => Some(TextureModifier::OcclusionStrength(1.0)),
            _ => None,
        };
        Self {
            name: name.into(),
            usage,
            value_space: usage.value_space(),
            neutral: usage.neutral(),
            modifier,
            sampler: SamplerDesc::default(),
            image: None,
            handle: None,
        }
    }

    pub fn normal_map(name: impl Into<String>, scale: f32) -> Self {
        let mut texture = Self::new(name, TextureUsage::Normal);
        texture.modifier = Some(TextureModifier::NormalScale(scale));
        texture
    }

    pub fn occlusion_map(name: impl Into<String>, strength: f32) -> Self {
        let mut texture = Self::new(name, TextureUsage::Occlusion);
        texture.modifier = Some(TextureModifier::OcclusionStrength(strength));
        texture
    }

    /// Binds CPU-side image data. Any device copy becomes stale and must be
    /// recreated with [`SceneTexture::create_device_texture`].
    pub fn set_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
    }

    /// Replaces the scalar modifier (normal scale or occlusion strength).
    pub fn set_modifier(&mut self, modifier: TextureModifier) {
        self.modifier = Some(modifier);
    }

    pub fn with_image(mut self, image: RgbaImage) -> Self {
        self.set_image(image);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn value_space(&self) -> ValueSpace {
        self.value_space
    }

    pub fn neutral(&self) -> Vector4<f32> {
        self.neutral
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// True once an image has been bound.
    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn device_handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    /// Normal map scale, 1.0 for every other usage.
    pub fn normal_scale(&self) -> f32 {
        match self.modifier {
            Some(TextureModifier::NormalScale(s)) => s,
            _ => 1.0,
        }
    }

    /// Occlusion strength, 1.0 for every other usage.
    pub fn occlusion_strength(&self) -> f32 {
        match self.modifier {
            Some(TextureModifier::OcclusionStrength(s)) => s,
            _ => 1.0,
        }
    }

    /// (Re)creates the device texture. The previous one is released first
    /// whether or not creation succeeds. Unloaded textures stay unbound.
    pub fn create_device_texture(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        self.release_device_texture(ctx);
        let Some(image) = &self.image else {
            return Ok(());
        };
        let desc = TextureDesc {
            label: &self.name,
            width: image.width(),
            height: image.height(),
            value_space: self.value_space,
            sampler: self.sampler,
            pixels: image.as_raw(),
        };
        self.handle = Some(ctx.create_texture(&desc)?);
        Ok(())
    }

    pub fn release_device_texture(&mut self, ctx: &mut dyn RenderContext) {
        if let Some(handle) = self.handle.take() {
            ctx.release(ResourceHandle::Texture(handle));
        }
    }

    pub fn slot(&self) -> TextureSlot {
        TextureSlot {
            handle: self.handle,
            neutral: self.neutral.into(),
            value_space: self.value_space,
        }
    }
}
