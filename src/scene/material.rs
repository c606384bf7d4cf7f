use crate::core::error::SceneResult;
use crate::core::math::transform::{normal_matrix, to_columns};
use crate::io::gltf_loader::GltfModel;
use crate::pipeline::constants::{MaterialTextures, ObjectConstants, ShadingTag};
use crate::pipeline::context::RenderContext;
use crate::scene::texture::{SceneTexture, TextureModifier, TextureUsage};
use log::debug;
use nalgebra::{Matrix4, Vector4};

/// Parameters for the metallic-roughness workflow.
#[derive(Debug, Clone)]
pub struct MetalRoughness {
    pub base_color: SceneTexture,
    pub base_color_factor: Vector4<f32>,
    /// Packed texture: G = roughness, B = metallic.
    pub metallic_roughness: SceneTexture,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

impl Default for MetalRoughness {
    fn default() -> Self {
        Self {
            base_color: SceneTexture::new("base_color", TextureUsage::BaseColor),
            base_color_factor: Vector4::new(1.0, 1.0, 1.0, 1.0),
            metallic_roughness: SceneTexture::new(
                "metallic_roughness",
                TextureUsage::MetallicRoughness,
            ),
            metallic_factor: 1.0,
            roughness_factor: 1.0,
        }
    }
}

/// Parameters for the specular-glossiness workflow.
#[derive(Debug, Clone)]
pub struct SpecularGlossiness {
    pub diffuse: SceneTexture,
    pub diffuse_factor: Vector4<f32>,
    /// Packed texture: RGB = specular, A = glossiness.
    pub specular: SceneTexture,
    /// Specular color in xyz, glossiness in w.
    pub specular_factor: Vector4<f32>,
}

impl Default for SpecularGlossiness {
    fn default() -> Self {
        Self {
            diffuse: SceneTexture::new("diffuse", TextureUsage::Diffuse),
            diffuse_factor: Vector4::new(1.0, 1.0, 1.0, 1.0),
            specular: SceneTexture::new("specular", TextureUsage::SpecularGlossiness),
            specular_factor: Vector4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Which physically based parameterization a material uses.
#[derive(Debug, Clone, Default)]
pub enum Workflow {
    #[default]
    None,
    MetalRoughness(MetalRoughness),
    SpecularGlossiness(SpecularGlossiness),
}

/// Surface description shared by every primitive that references it.
#[derive(Debug, Clone)]
pub struct SceneMaterial {
    pub name: String,
    pub workflow: Workflow,
    pub normal: SceneTexture,
    pub occlusion: SceneTexture,
    pub emissive: SceneTexture,
    pub emissive_factor: Vector4<f32>,
}

impl Default for SceneMaterial {
    fn default() -> Self {
        Self::new("default")
    }
}

impl SceneMaterial {
    /// Material without a workflow; renders with neutral parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflow: Workflow::None,
            normal: SceneTexture::normal_map("normal", 1.0),
            occlusion: SceneTexture::occlusion_map("occlusion", 1.0),
            emissive: SceneTexture::new("emissive", TextureUsage::Emissive),
            emissive_factor: Vector4::zeros(),
        }
    }

    pub fn metal_roughness(
        name: impl Into<String>,
        base_color_factor: Vector4<f32>,
        metallic: f32,
        roughness: f32,
    ) -> Self {
        let mut material = Self::new(name);
        material.workflow = Workflow::MetalRoughness(MetalRoughness {
            base_color_factor,
            metallic_factor: metallic,
            roughness_factor: roughness,
            ..Default::default()
        });
        material
    }

    pub fn specular_glossiness(
        name: impl Into<String>,
        diffuse_factor: Vector4<f32>,
        specular: [f32; 3],
        glossiness: f32,
    ) -> Self {
        let mut material = Self::new(name);
        material.workflow = Workflow::SpecularGlossiness(SpecularGlossiness {
            diffuse_factor,
            specular_factor: Vector4::new(specular[0], specular[1], specular[2], glossiness),
            ..Default::default()
        });
        material
    }

    pub fn with_normal_texture(mut self, texture: SceneTexture) -> Self {
        self.normal = texture;
        self
    }

    pub fn metal_roughness_params(&self) -> Option<&MetalRoughness> {
        match &self.workflow {
            Workflow::MetalRoughness(mr) => Some(mr),
            _ => None,
        }
    }

    pub fn specular_glossiness_params(&self) -> Option<&SpecularGlossiness> {
        match &self.workflow {
            Workflow::SpecularGlossiness(sg) => Some(sg),
            _ => None,
        }
    }

    /// True when an actual normal map image is bound.
    pub fn has_normal_map(&self) -> bool {
        self.normal.is_loaded()
    }

    fn textures_mut(&mut self) -> Vec<&mut SceneTexture> {
        let mut textures = vec![&mut self.normal, &mut self.occlusion, &mut self.emissive];
        match &mut self.workflow {
            Workflow::None => {}
            Workflow::MetalRoughness(mr) => {
                textures.push(&mut mr.base_color);
                textures.push(&mut mr.metallic_roughness);
            }
            Workflow::SpecularGlossiness(sg) => {
                textures.push(&mut sg.diffuse);
                textures.push(&mut sg.specular);
            }
        }
        textures
    }

    pub fn create_device_resources(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        for texture in self.textures_mut() {
            texture.create_device_texture(ctx)?;
        }
        Ok(())
    }

    pub fn release_device_resources(&mut self, ctx: &mut dyn RenderContext) {
        for texture in self.textures_mut() {
            texture.release_device_texture(ctx);
        }
    }

    /// Per-object block for a primitive drawn with this material.
    pub fn object_constants(&self, world: &Matrix4<f32>, has_tangents: bool) -> ObjectConstants {
        let (tag, base_factor, specular_factor, metallic, roughness): (
            ShadingTag,
            [f32; 4],
            [f32; 4],
            f32,
            f32,
        ) = match &self.workflow {
            Workflow::None => (ShadingTag::Neutral, [1.0; 4], [0.0; 4], 0.0, 1.0),
            Workflow::MetalRoughness(mr) => (
                ShadingTag::MetalRoughness,
                mr.base_color_factor.into(),
                [0.0; 4],
                mr.metallic_factor,
                mr.roughness_factor,
            ),
            Workflow::SpecularGlossiness(sg) => (
                ShadingTag::SpecularGlossiness,
                sg.diffuse_factor.into(),
                sg.specular_factor.into(),
                0.0,
                1.0 - sg.specular_factor.w,
            ),
        };

        ObjectConstants {
            world: to_columns(world),
            normal_matrix: to_columns(&normal_matrix(world).to_homogeneous()),
            base_factor,
            specular_factor,
            emissive_factor: self.emissive_factor.into(),
            pbr_params: [
                metallic,
                roughness,
                self.normal.normal_scale(),
                self.occlusion.occlusion_strength(),
            ],
            flags: [tag as u32, has_tangents as u32, 0, 0],
        }
    }

    pub fn texture_slots(&self) -> MaterialTextures {
        let mut slots = MaterialTextures::neutral();
        match &self.workflow {
            Workflow::None => {}
            Workflow::MetalRoughness(mr) => {
                slots.base = mr.base_color.slot();
                slots.surface = mr.metallic_roughness.slot();
            }
            Workflow::SpecularGlossiness(sg) => {
                slots.base = sg.diffuse.slot();
                slots.surface = sg.specular.slot();
            }
        }
        slots.normal = self.normal.slot();
        slots.occlusion = self.occlusion.slot();
        slots.emissive = self.emissive.slot();
        slots
    }

    /// Maps one glTF material.
    ///
    /// Metallic-roughness wins when the material populates it (any texture or
    /// a non-default factor); otherwise the specular-glossiness extension is
    /// used when present; otherwise metallic-roughness with default factors.
    pub fn load_from_gltf(model: &GltfModel, material: &gltf::Material<'_>) -> SceneResult<Self> {
        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(usize::MAX)));
        let mut scene_material = SceneMaterial::new(name.clone());

        let pbr = material.pbr_metallic_roughness();
        let mr_populated = pbr.base_color_texture().is_some()
            || pbr.metallic_roughness_texture().is_some()
            || pbr.base_color_factor() != [1.0; 4]
            || pbr.metallic_factor() != 1.0
            || pbr.roughness_factor() != 1.0;

        scene_material.workflow = match material.pbr_specular_glossiness() {
            Some(sg) if !mr_populated => {
                let mut params = SpecularGlossiness {
                    diffuse_factor: Vector4::from(sg.diffuse_factor()),
                    specular_factor: {
                        let s = sg.specular_factor();
                        Vector4::new(s[0], s[1], s[2], sg.glossiness_factor())
                    },
                    ..Default::default()
                };
                if let Some(info) = sg.diffuse_texture() {
                    params.diffuse =
                        model.texture(&info.texture(), info.tex_coord(), TextureUsage::Diffuse)?;
                }
                if let Some(info) = sg.specular_glossiness_texture() {
                    params.specular = model.texture(
                        &info.texture(),
                        info.tex_coord(),
                        TextureUsage::SpecularGlossiness,
                    )?;
                }
                Workflow::SpecularGlossiness(params)
            }
            _ => {
                if !mr_populated {
                    debug!("Material '{}' has no workflow data, using defaults", name);
                }
                let mut params = MetalRoughness {
                    base_color_factor: Vector4::from(pbr.base_color_factor()),
                    metallic_factor: pbr.metallic_factor(),
                    roughness_factor: pbr.roughness_factor(),
                    ..Default::default()
                };
                if let Some(info) = pbr.base_color_texture() {
                    params.base_color =
                        model.texture(&info.texture(), info.tex_coord(), TextureUsage::BaseColor)?;
                }
                if let Some(info) = pbr.metallic_roughness_texture() {
                    params.metallic_roughness = model.texture(
                        &info.texture(),
                        info.tex_coord(),
                        TextureUsage::MetallicRoughness,
                    )?;
                }
                Workflow::MetalRoughness(params)
            }
        };

        if let Some(normal) = material.normal_texture() {
            let mut texture =
                model.texture(&normal.texture(), normal.tex_coord(), TextureUsage::Normal)?;
            texture.set_modifier(TextureModifier::NormalScale(normal.scale()));
            scene_material.normal = texture;
        }
        if let Some(occlusion) = material.occlusion_texture() {
            let mut texture = model.texture(
                &occlusion.texture(),
                occlusion.tex_coord(),
                TextureUsage::Occlusion,
            )?;
            texture.set_modifier(TextureModifier::OcclusionStrength(occlusion.strength()));
            scene_material.occlusion = texture;
        }
        if let Some(info) = material.emissive_texture() {
            scene_material.emissive =
                model.texture(&info.texture(), info.tex_coord(), TextureUsage::Emissive)?;
        }
        let e = material.emissive_factor();
        scene_material.emissive_factor = Vector4::new(e[0], e[1], e[2], 1.0);

        Ok(scene_material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn workflow_accessors_match_constructor() {
        let mr = SceneMaterial::metal_roughness("m", Vector4::new(1.0, 0.0, 0.0, 1.0), 0.5, 0.25);
        assert!(mr.metal_roughness_params().is_some());
        assert!(mr.specular_glossiness_params().is_none());

        let sg = SceneMaterial::specular_glossiness("s", Vector4::repeat(1.0), [0.04; 3], 0.8);
        assert!(sg.metal_roughness_params().is_none());
        assert_eq!(sg.specular_glossiness_params().unwrap().specular_factor.w, 0.8);
    }

    #[test]
    fn object_constants_carry_factors() {
        let material = SceneMaterial::metal_roughness("m", Vector4::new(0.2, 0.4, 0.6, 1.0), 0.3, 0.7)
            .with_normal_texture(SceneTexture::normal_map("n", 0.5));
        let constants = material.object_constants(&Matrix4::identity(), true);
        assert_eq!(constants.base_factor, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(constants.pbr_params, [0.3, 0.7, 0.5, 1.0]);
        assert_eq!(constants.flags[0], ShadingTag::MetalRoughness as u32);
        assert_eq!(constants.flags[1], 1);
    }

    #[test]
    fn normal_map_counts_only_when_image_bound() {
        let material = SceneMaterial::new("m").with_normal_texture(SceneTexture::normal_map("n", 1.0));
        assert!(!material.has_normal_map());
        let material = material.with_normal_texture(
            SceneTexture::normal_map("n", 1.0).with_image(RgbaImage::new(1, 1)),
        );
        assert!(material.has_normal_map());
    }
}
