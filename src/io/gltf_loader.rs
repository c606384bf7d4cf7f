//! glTF document access.
//!
//! Parsing and buffer/image decoding are done by the `gltf` crate; this module
//! only opens documents and resolves texture -> image -> sampler indirections.

use crate::core::error::{SceneError, SceneResult};
use crate::pipeline::context::{Filter, SamplerDesc, WrapMode};
use crate::scene::texture::{SceneTexture, TextureUsage};
use gltf::image::Format;
use gltf::texture::{MagFilter, MinFilter, WrappingMode};
use image::{DynamicImage, ImageBuffer, RgbaImage};
use log::info;
use std::path::{Path, PathBuf};

/// A parsed glTF document with its binary buffers and decoded images.
pub struct GltfModel {
    pub path: PathBuf,
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
    pub images: Vec<gltf::image::Data>,
}

impl GltfModel {
    /// Opens a `.gltf` or `.glb` file, resolving external buffers and images
    /// relative to it.
    pub fn open<P: AsRef<Path>>(path: P) -> SceneResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SceneError::GltfLoad {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }

        info!("Loading glTF file: {:?}", path);
        let (document, buffers, images) = gltf::import(path).map_err(|e| SceneError::GltfLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_parts(path.to_path_buf(), document, buffers, images))
    }

    /// Parses an in-memory document. Buffers must be embedded (GLB or data URIs).
    pub fn from_slice(bytes: &[u8]) -> SceneResult<Self> {
        let path = PathBuf::from("<memory>");
        let (document, buffers, images) =
            gltf::import_slice(bytes).map_err(|e| SceneError::GltfLoad {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::from_parts(path, document, buffers, images))
    }

    fn from_parts(
        path: PathBuf,
        document: gltf::Document,
        buffers: Vec<gltf::buffer::Data>,
        images: Vec<gltf::image::Data>,
    ) -> Self {
        info!(
            "glTF {:?}: {} nodes, {} meshes, {} materials, {} images",
            path,
            document.nodes().len(),
            document.meshes().len(),
            document.materials().len(),
            images.len()
        );
        Self {
            path,
            document,
            buffers,
            images,
        }
    }

    /// Root nodes of the default scene, or of the first scene when none is marked default.
    pub fn scene_roots(&self) -> SceneResult<Vec<gltf::Node<'_>>> {
        let scene = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())
            .ok_or_else(|| SceneError::Import(format!("{:?} contains no scenes", self.path)))?;
        Ok(scene.nodes().collect())
    }

    /// Raw bytes of a buffer, for accessor readers.
    pub fn buffer(&self, buffer: gltf::Buffer<'_>) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(|data| data.0.as_slice())
    }

    /// Resolves a texture reference into a bound [`SceneTexture`].
    pub fn texture(
        &self,
        texture: &gltf::Texture<'_>,
        tex_coord: u32,
        usage: TextureUsage,
    ) -> SceneResult<SceneTexture> {
        let image_index = texture.source().index();
        let label = texture
            .name()
            .or_else(|| texture.source().name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("image_{}", image_index));
        if tex_coord != 0 {
            return Err(SceneError::Import(format!(
                "texture '{}' uses texture coordinate set {}, only set 0 is imported",
                label, tex_coord
            )));
        }

        let mut scene_texture = SceneTexture::new(label, usage);
        scene_texture.sampler = sampler_desc(&texture.sampler());
        scene_texture.set_image(self.image_rgba(image_index)?);
        Ok(scene_texture)
    }

    /// Converts an embedded image to tightly packed RGBA8.
    pub fn image_rgba(&self, index: usize) -> SceneResult<RgbaImage> {
        let data = self
            .images
            .get(index)
            .ok_or_else(|| SceneError::Import(format!("image {} does not exist", index)))?;
        let (w, h) = (data.width, data.height);
        let pixels = data.pixels.clone();

        let dynamic = match data.format {
            Format::R8 => image::GrayImage::from_raw(w, h, pixels).map(DynamicImage::ImageLuma8),
            Format::R8G8 => {
                image::GrayAlphaImage::from_raw(w, h, pixels).map(DynamicImage::ImageLumaA8)
            }
            Format::R8G8B8 => image::RgbImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8),
            Format::R8G8B8A8 => RgbaImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgba8),
            Format::R16 => ImageBuffer::from_raw(w, h, to_u16(&pixels)).map(DynamicImage::ImageLuma16),
            Format::R16G16 => {
                ImageBuffer::from_raw(w, h, to_u16(&pixels)).map(DynamicImage::ImageLumaA16)
            }
            Format::R16G16B16 => {
                ImageBuffer::from_raw(w, h, to_u16(&pixels)).map(DynamicImage::ImageRgb16)
            }
            Format::R16G16B16A16 => {
                ImageBuffer::from_raw(w, h, to_u16(&pixels)).map(DynamicImage::ImageRgba16)
            }
            _ => None,
        };

        dynamic
            .map(|img| img.to_rgba8())
            .ok_or_else(|| SceneError::UnsupportedImageFormat {
                image: index,
                format: format!("{:?}", data.format),
            })
    }
}

fn to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

fn sampler_desc(sampler: &gltf::texture::Sampler<'_>) -> SamplerDesc {
    let wrap = |mode: WrappingMode| match mode {
        WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
        WrappingMode::Repeat => WrapMode::Repeat,
    };
    let mag_filter = match sampler.mag_filter() {
        Some(MagFilter::Nearest) => Filter::Nearest,
        _ => Filter::Linear,
    };
    let (min_filter, mipmaps) = match sampler.min_filter() {
        Some(MinFilter::Nearest) => (Filter::Nearest, false),
        Some(MinFilter::Linear) => (Filter::Linear, false),
        Some(MinFilter::NearestMipmapNearest) | Some(MinFilter::NearestMipmapLinear) => {
            (Filter::Nearest, true)
        }
        Some(MinFilter::LinearMipmapNearest)
        | Some(MinFilter::LinearMipmapLinear)
        | None => (Filter::Linear, true),
    };
    SamplerDesc {
        mag_filter,
        min_filter,
        mipmaps,
        wrap_u: wrap(sampler.wrap_s()),
        wrap_v: wrap(sampler.wrap_t()),
    }
}
