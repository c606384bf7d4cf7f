//! Scene lifecycle: load, animate, render, destroy.

use crate::core::error::{LightKind, SceneError, SceneResult};
use crate::core::math::transform::{TransformFactory, normal_matrix, to_columns};
use crate::io::gltf_loader::GltfModel;
use crate::pipeline::constants::{
    DIRECT_LIGHTS_MAX, FrameConstants, MaterialTextures, ObjectConstants, POINT_LIGHTS_MAX,
    ShadingTag,
};
use crate::pipeline::context::{RenderContext, ResourceHandle, ShaderHandle, ShaderSource};
use crate::scene::camera::Camera;
use crate::scene::catalog::{self, LightPreset, RootTransform, SceneDescriptor, SceneSource};
use crate::scene::light::{AmbientLight, DirectLight, PointLight};
use crate::scene::material::SceneMaterial;
use crate::scene::node::SceneNode;
use crate::scene::primitive::ScenePrimitive;
use crate::scene::tangents::TangentSpaceSolver;
use log::{debug, error, info, warn};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use std::path::PathBuf;

pub const ILLUMINATED_VS: ShaderSource = ShaderSource {
    file: "shaders/scene_illuminated.hlsl",
    entry_point: "VsMain",
};
pub const ILLUMINATED_PS: ShaderSource = ShaderSource {
    file: "shaders/scene_illuminated.hlsl",
    entry_point: "PsMain",
};
pub const CONSTANT_VS: ShaderSource = ShaderSource {
    file: "shaders/scene_constant.hlsl",
    entry_point: "VsMain",
};
pub const CONSTANT_PS: ShaderSource = ShaderSource {
    file: "shaders/scene_constant.hlsl",
    entry_point: "PsMain",
};

/// Uniform scale of the spheres drawn at point light positions.
const LIGHT_PROXY_SCALE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Unloaded,
    Loaded,
}

/// Light count limits checked after load. Never above the parameter block capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLimits {
    pub direct_lights_max: usize,
    pub point_lights_max: usize,
}

impl Default for SceneLimits {
    fn default() -> Self {
        Self {
            direct_lights_max: DIRECT_LIGHTS_MAX,
            point_lights_max: POINT_LIGHTS_MAX,
        }
    }
}

impl SceneLimits {
    pub fn clamped(self) -> Self {
        Self {
            direct_lights_max: self.direct_lights_max.min(DIRECT_LIGHTS_MAX),
            point_lights_max: self.point_lights_max.min(POINT_LIGHTS_MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub nodes: usize,
    pub primitives: usize,
    pub vertices: usize,
    pub materials: usize,
    pub direct_lights: usize,
    pub point_lights: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShaderPair {
    vertex: ShaderHandle,
    pixel: ShaderHandle,
}

impl ShaderPair {
    fn create(
        ctx: &mut dyn RenderContext,
        vertex: &ShaderSource,
        pixel: &ShaderSource,
    ) -> SceneResult<Self> {
        let vertex = ctx.create_vertex_shader(vertex)?;
        match ctx.create_pixel_shader(pixel) {
            Ok(pixel) => Ok(Self { vertex, pixel }),
            Err(e) => {
                ctx.release(ResourceHandle::Shader(vertex));
                Err(e.into())
            }
        }
    }

    fn release(self, ctx: &mut dyn RenderContext) {
        ctx.release(ResourceHandle::Shader(self.vertex));
        ctx.release(ResourceHandle::Shader(self.pixel));
    }
}

/// Top-level scene: node graph, materials, lights and camera.
pub struct Scene {
    id: String,
    asset_root: PathBuf,
    limits: SceneLimits,
    state: SceneState,
    solver: TangentSpaceSolver,

    root_nodes: Vec<SceneNode>,
    materials: Vec<SceneMaterial>,
    default_material: SceneMaterial,

    ambient_light: AmbientLight,
    direct_lights: Vec<DirectLight>,
    point_lights: Vec<PointLight>,
    camera: Camera,

    light_proxy: Option<ScenePrimitive>,
    illuminated_shaders: Option<ShaderPair>,
    constant_shaders: Option<ShaderPair>,
}

impl Scene {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            asset_root: PathBuf::from("assets"),
            limits: SceneLimits::default(),
            state: SceneState::Unloaded,
            solver: TangentSpaceSolver::default(),
            root_nodes: Vec::new(),
            materials: Vec::new(),
            default_material: SceneMaterial::default(),
            ambient_light: AmbientLight::default(),
            direct_lights: Vec::new(),
            point_lights: Vec::new(),
            camera: Camera::default(),
            light_proxy: None,
            illuminated_shaders: None,
            constant_shaders: None,
        }
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_limits(mut self, limits: SceneLimits) -> Self {
        self.limits = limits.clamped();
        self
    }

    pub fn with_tangent_solver(mut self, solver: TangentSpaceSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == SceneState::Loaded
    }

    // --- Lifecycle ---

    /// Loads the catalog scene named by the identifier and allocates its
    /// device resources.
    ///
    /// On failure the scene stays unloaded and may hold part of its resources;
    /// call [`Scene::destroy`] before dropping it. A later `init` releases
    /// such leftovers itself. World matrices and light positions are valid
    /// for the context's current animation time once this returns.
    pub fn init(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        self.prepare_init(ctx);
        self.load()?;
        self.finish_init(ctx)
    }

    /// Same as [`Scene::init`], with content produced by `build` instead of
    /// the catalog. `build` adds materials, nodes and lights itself.
    pub fn init_with<F>(&mut self, ctx: &mut dyn RenderContext, build: F) -> SceneResult<()>
    where
        F: FnOnce(&mut Scene) -> SceneResult<()>,
    {
        self.prepare_init(ctx);
        build(self)?;
        self.finish_load()?;
        self.finish_init(ctx)
    }

    fn prepare_init(&mut self, ctx: &mut dyn RenderContext) {
        if self.is_loaded() {
            warn!("Scene '{}' initialized twice, destroying previous content", self.id);
        } else if self.holds_content() {
            warn!("Scene '{}' holds leftovers of a failed init, destroying them", self.id);
        }
        self.destroy(ctx);
    }

    /// True when anything is left from a load, loaded or not.
    fn holds_content(&self) -> bool {
        !self.root_nodes.is_empty()
            || !self.materials.is_empty()
            || !self.direct_lights.is_empty()
            || !self.point_lights.is_empty()
            || self.light_proxy.is_some()
            || self.illuminated_shaders.is_some()
            || self.constant_shaders.is_some()
    }

    fn finish_init(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        self.create_device_resources(ctx)?;
        self.advance_to(ctx.animation_time());
        self.state = SceneState::Loaded;
        let stats = self.stats();
        info!(
            "Scene '{}' ready: {} nodes, {} primitives, {} vertices, {} materials",
            self.id, stats.nodes, stats.primitives, stats.vertices, stats.materials
        );
        Ok(())
    }

    /// Releases every device resource and clears the graph. Safe to call in
    /// any state, including after a failed [`Scene::init`].
    pub fn destroy(&mut self, ctx: &mut dyn RenderContext) {
        if let Some(shaders) = self.illuminated_shaders.take() {
            shaders.release(ctx);
        }
        if let Some(shaders) = self.constant_shaders.take() {
            shaders.release(ctx);
        }
        for node in &mut self.root_nodes {
            node.destroy_device_buffers(ctx);
        }
        for material in &mut self.materials {
            material.release_device_resources(ctx);
        }
        self.default_material.release_device_resources(ctx);
        if let Some(proxy) = &mut self.light_proxy {
            proxy.destroy_device_buffers(ctx);
        }

        self.root_nodes.clear();
        self.materials.clear();
        self.direct_lights.clear();
        self.point_lights.clear();
        self.light_proxy = None;
        self.ambient_light = AmbientLight::default();
        if self.state == SceneState::Loaded {
            info!("Scene '{}' destroyed", self.id);
        }
        self.state = SceneState::Unloaded;
    }

    fn create_device_resources(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        self.illuminated_shaders = Some(ShaderPair::create(ctx, &ILLUMINATED_VS, &ILLUMINATED_PS)?);
        self.constant_shaders = Some(ShaderPair::create(ctx, &CONSTANT_VS, &CONSTANT_PS)?);

        self.default_material.create_device_resources(ctx)?;
        for material in &mut self.materials {
            material.create_device_resources(ctx)?;
        }
        for node in &mut self.root_nodes {
            node.create_device_buffers(ctx)?;
        }
        if let Some(proxy) = &mut self.light_proxy {
            proxy.create_device_buffers(ctx)?;
        }
        Ok(())
    }

    // --- Loading ---

    fn load(&mut self) -> SceneResult<()> {
        let descriptor: &'static SceneDescriptor =
            catalog::find(&self.id).ok_or_else(|| SceneError::UnknownScene(self.id.clone()))?;
        info!("Loading scene '{}': {}", descriptor.id, descriptor.description);

        match descriptor.source {
            SceneSource::Hardwired(build) => build(self)?,
            SceneSource::Gltf(path) => {
                let model = GltfModel::open(self.asset_root.join(path))?;
                let offset = self.load_materials_from_gltf(&model)?;
                self.load_scene_from_gltf(&model, offset)?;
            }
        }

        for node in &mut self.root_nodes {
            apply_root_transforms(node, descriptor.root_transforms);
        }
        self.apply_light_preset(&descriptor.lights);
        let preset = descriptor.camera;
        self.camera = Camera::new(
            Point3::from(preset.eye),
            Point3::from(preset.look_at),
            Vector3::y(),
            preset.fov_y_deg.to_radians(),
        );

        self.finish_load()
    }

    fn finish_load(&mut self) -> SceneResult<()> {
        self.light_proxy = Some(ScenePrimitive::create_sphere(8, 16)?);
        self.calculate_missing_tangents()?;
        self.post_load_sanity_test()
    }

    fn apply_light_preset(&mut self, preset: &LightPreset) {
        self.ambient_light = AmbientLight {
            luminance: Vector4::from(preset.ambient),
        };
        for light in preset.direct {
            self.add_direct_light(DirectLight::new(
                Vector3::from(light.direction),
                Vector4::from(light.luminance),
            ));
        }
        for light in preset.point {
            let (min, max) = light.inclination_deg;
            self.add_point_light(PointLight::new(
                Vector4::from(light.intensity),
                light.orbit_radius,
                min.to_radians(),
                max.to_radians(),
            ));
        }
    }

    /// Appends every glTF material. Returns the table index of the first one,
    /// which primitives of the same model use as their material offset.
    pub fn load_materials_from_gltf(&mut self, model: &GltfModel) -> SceneResult<usize> {
        let offset = self.materials.len();
        for material in model.document.materials() {
            self.materials.push(SceneMaterial::load_from_gltf(model, &material)?);
        }
        info!(
            "Loaded {} materials from {:?}",
            self.materials.len() - offset,
            model.path
        );
        Ok(offset)
    }

    /// Imports the model's scene roots (and their subtrees) as root nodes.
    pub fn load_scene_from_gltf(
        &mut self,
        model: &GltfModel,
        material_offset: usize,
    ) -> SceneResult<()> {
        for node in model.scene_roots()? {
            let root = SceneNode::load_from_gltf(model, &node, material_offset, true)?;
            self.root_nodes.push(root);
        }
        Ok(())
    }

    /// Runs the tangent solver on every primitive whose material needs
    /// tangents it does not have.
    pub fn calculate_missing_tangents(&mut self) -> SceneResult<()> {
        let materials = &self.materials;
        let default_material = &self.default_material;
        let solver = &self.solver;
        for node in &mut self.root_nodes {
            calculate_node_tangents(node, materials, default_material, solver)?;
        }
        Ok(())
    }

    /// Checks light counts against the limits and that every normal-mapped
    /// primitive has tangents.
    pub fn post_load_sanity_test(&self) -> SceneResult<()> {
        if self.point_lights.len() > self.limits.point_lights_max {
            error!(
                "Scene '{}': {} point lights, maximum is {}",
                self.id,
                self.point_lights.len(),
                self.limits.point_lights_max
            );
            return Err(SceneError::TooManyLights {
                kind: LightKind::Point,
                count: self.point_lights.len(),
                max: self.limits.point_lights_max,
            });
        }
        if self.direct_lights.len() > self.limits.direct_lights_max {
            error!(
                "Scene '{}': {} direct lights, maximum is {}",
                self.id,
                self.direct_lights.len(),
                self.limits.direct_lights_max
            );
            return Err(SceneError::TooManyLights {
                kind: LightKind::Direct,
                count: self.direct_lights.len(),
                max: self.limits.direct_lights_max,
            });
        }
        for node in &self.root_nodes {
            self.check_node_tangents(node)?;
        }
        Ok(())
    }

    fn check_node_tangents(&self, node: &SceneNode) -> SceneResult<()> {
        for (index, primitive) in node.primitives().iter().enumerate() {
            let material = self.resolve_material(primitive.material_index());
            if material.has_normal_map() && !primitive.tangent_present() {
                error!(
                    "Scene '{}': primitive {} of node '{}' has normal map '{}' but no tangents",
                    self.id,
                    index,
                    node.name(),
                    material.name
                );
                return Err(SceneError::MissingTangents {
                    node: node.name().to_string(),
                    primitive: index,
                    material: material.name.clone(),
                });
            }
        }
        for child in node.children() {
            self.check_node_tangents(child)?;
        }
        Ok(())
    }

    // --- Content ---

    /// Appends a material and returns its index for [`ScenePrimitive::with_material`].
    pub fn add_material(&mut self, material: SceneMaterial) -> i32 {
        self.materials.push(material);
        (self.materials.len() - 1) as i32
    }

    pub fn add_root_node(&mut self, node: SceneNode) -> &mut SceneNode {
        self.root_nodes.push(node);
        let last = self.root_nodes.len() - 1;
        &mut self.root_nodes[last]
    }

    pub fn add_direct_light(&mut self, light: DirectLight) {
        self.direct_lights.push(light);
    }

    pub fn add_point_light(&mut self, light: PointLight) {
        self.point_lights.push(light);
    }

    pub fn set_ambient_light(&mut self, light: AmbientLight) {
        self.ambient_light = light;
    }

    pub fn root_nodes(&self) -> &[SceneNode] {
        &self.root_nodes
    }

    pub fn materials(&self) -> &[SceneMaterial] {
        &self.materials
    }

    pub fn direct_lights(&self) -> &[DirectLight] {
        &self.direct_lights
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn get_ambient_color(&self) -> Vector4<f32> {
        self.ambient_light.luminance
    }

    /// Material for a primitive's index; negative or out of range selects the default.
    pub fn resolve_material(&self, index: i32) -> &SceneMaterial {
        resolve(&self.materials, &self.default_material, index)
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            nodes: self.root_nodes.iter().map(SceneNode::node_count).sum(),
            primitives: self.root_nodes.iter().map(SceneNode::primitive_count).sum(),
            vertices: self.root_nodes.iter().map(SceneNode::vertex_count).sum(),
            materials: self.materials.len(),
            direct_lights: self.direct_lights.len(),
            point_lights: self.point_lights.len(),
        }
    }

    // --- Frame ---

    /// Advances node animation and light orbits to the context's animation time.
    pub fn animate_frame(&mut self, ctx: &dyn RenderContext) -> SceneResult<()> {
        if !self.is_loaded() {
            return Err(SceneError::NotLoaded(self.id.clone()));
        }
        self.advance_to(ctx.animation_time());
        Ok(())
    }

    fn advance_to(&mut self, time: f64) {
        let identity = Matrix4::identity();
        for node in &mut self.root_nodes {
            node.animate(time, &identity);
        }
        for light in &mut self.direct_lights {
            light.update();
        }
        let count = self.point_lights.len();
        for (i, light) in self.point_lights.iter_mut().enumerate() {
            light.update(time, i, count);
        }
    }

    /// Draws every primitive with the illuminated shaders, then one constant
    /// shaded sphere per point light.
    pub fn render_frame(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        if !self.is_loaded() {
            return Err(SceneError::NotLoaded(self.id.clone()));
        }
        let (width, height) = ctx.window_size();
        self.camera.set_viewport(width, height);
        let frame = self.frame_constants(ctx.multisampling().sample_count);
        ctx.set_frame_constants(&frame);

        if let Some(shaders) = self.illuminated_shaders {
            ctx.bind_shaders(shaders.vertex, shaders.pixel);
        }
        for node in &self.root_nodes {
            self.render_node(ctx, node);
        }

        if let (Some(shaders), Some(proxy)) = (self.constant_shaders, &self.light_proxy) {
            ctx.bind_shaders(shaders.vertex, shaders.pixel);
            let textures = MaterialTextures::neutral();
            for light in &self.point_lights {
                let world = TransformFactory::translation(&light.transformed_position().coords)
                    * TransformFactory::scaling(LIGHT_PROXY_SCALE);
                ctx.set_object_constants(&light_proxy_constants(&world, light), &textures);
                proxy.draw_geometry(ctx);
            }
        }
        Ok(())
    }

    fn render_node(&self, ctx: &mut dyn RenderContext, node: &SceneNode) {
        for primitive in node.primitives() {
            let material = self.resolve_material(primitive.material_index());
            let constants = material.object_constants(node.world_matrix(), primitive.tangent_present());
            ctx.set_object_constants(&constants, &material.texture_slots());
            primitive.draw_geometry(ctx);
        }
        for child in node.children() {
            self.render_node(ctx, child);
        }
    }

    fn frame_constants(&self, sample_count: u32) -> FrameConstants {
        let mut constants = FrameConstants {
            view: to_columns(&self.camera.view_matrix()),
            projection: to_columns(&self.camera.projection_matrix()),
            eye_position: self.camera.eye.to_homogeneous().into(),
            ambient_luminance: self.ambient_light.luminance.into(),
            ..Default::default()
        };

        let direct = self.direct_lights.iter().take(DIRECT_LIGHTS_MAX);
        for (i, light) in direct.enumerate() {
            constants.direct_light_directions[i] = light.transformed_direction().push(0.0).into();
            constants.direct_light_luminances[i] = light.luminance.into();
        }
        let point = self.point_lights.iter().take(POINT_LIGHTS_MAX);
        for (i, light) in point.enumerate() {
            constants.point_light_positions[i] = light.transformed_position().to_homogeneous().into();
            constants.point_light_intensities[i] = light.intensity.into();
        }
        constants.counts = [
            self.direct_lights.len().min(DIRECT_LIGHTS_MAX) as u32,
            self.point_lights.len().min(POINT_LIGHTS_MAX) as u32,
            sample_count,
            0,
        ];
        constants
    }
}

fn resolve<'a>(
    materials: &'a [SceneMaterial],
    default_material: &'a SceneMaterial,
    index: i32,
) -> &'a SceneMaterial {
    usize::try_from(index)
        .ok()
        .and_then(|i| materials.get(i))
        .unwrap_or(default_material)
}

fn apply_root_transforms(node: &mut SceneNode, transforms: &[RootTransform]) {
    for transform in transforms {
        match *transform {
            RootTransform::Scale(factor) => node.add_scale(factor),
            RootTransform::Rotation(xyzw) => node.add_rotation_quaternion(xyzw),
            RootTransform::Translation(t) => node.add_translation(&Vector3::from(t)),
        }
    }
}

fn calculate_node_tangents(
    node: &mut SceneNode,
    materials: &[SceneMaterial],
    default_material: &SceneMaterial,
    solver: &TangentSpaceSolver,
) -> SceneResult<()> {
    let node_name = node.name().to_string();
    for primitive in node.primitives_mut() {
        let material = resolve(materials, default_material, primitive.material_index());
        if !material.has_normal_map() || primitive.tangent_present() {
            continue;
        }
        let stats = primitive.calculate_tangents_if_needed(solver)?;
        debug!(
            "Node '{}' primitive '{}': tangents for {} faces, {} degenerate, {} split vertices",
            node_name,
            primitive.name(),
            stats.faces,
            stats.degenerate_faces,
            stats.split_vertices
        );
    }
    for child in node.children_mut() {
        calculate_node_tangents(child, materials, default_material, solver)?;
    }
    Ok(())
}

/// Constant shading block for a light proxy: emissive is the light color
/// scaled so its brightest channel is 1.
fn light_proxy_constants(world: &Matrix4<f32>, light: &PointLight) -> ObjectConstants {
    let rgb = light.intensity.xyz();
    let peak = rgb.max();
    let emissive = if peak > 0.0 { rgb / peak } else { rgb };
    ObjectConstants {
        world: to_columns(world),
        normal_matrix: to_columns(&normal_matrix(world).to_homogeneous()),
        emissive_factor: [emissive.x, emissive.y, emissive.z, 1.0],
        flags: [ShadingTag::Constant as u32, 0, 0, 0],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::headless::HeadlessContext;
    use crate::scene::texture::SceneTexture;
    use image::RgbaImage;

    fn normal_mapped_material() -> SceneMaterial {
        SceneMaterial::metal_roughness("bumpy", Vector4::repeat(1.0), 0.0, 0.5)
            .with_normal_texture(SceneTexture::normal_map("n", 1.0).with_image(RgbaImage::new(2, 2)))
    }

    #[test]
    fn out_of_range_material_falls_back_to_default() {
        let mut scene = Scene::new("test");
        let index = scene.add_material(SceneMaterial::new("only"));
        assert_eq!(scene.resolve_material(index).name, "only");
        assert_eq!(scene.resolve_material(-1).name, "default");
        assert_eq!(scene.resolve_material(7).name, "default");
    }

    #[test]
    fn sanity_test_requires_tangents_under_normal_maps() {
        let mut scene = Scene::new("test");
        let material = scene.add_material(normal_mapped_material());
        let mut node = SceneNode::new("root", true);
        node.add_primitive(ScenePrimitive::create_quad(1.0).with_material(material));
        scene.add_root_node(node);

        let err = scene.post_load_sanity_test().unwrap_err();
        assert!(matches!(err, SceneError::MissingTangents { primitive: 0, .. }));

        scene.calculate_missing_tangents().unwrap();
        scene.post_load_sanity_test().unwrap();
    }

    #[test]
    fn light_limits_are_enforced() {
        let mut scene = Scene::new("test").with_limits(SceneLimits {
            direct_lights_max: 1,
            point_lights_max: 100,
        });
        assert_eq!(scene.limits.point_lights_max, POINT_LIGHTS_MAX);
        scene.add_direct_light(DirectLight::new(-Vector3::y(), Vector4::repeat(1.0)));
        scene.post_load_sanity_test().unwrap();
        scene.add_direct_light(DirectLight::new(Vector3::x(), Vector4::repeat(1.0)));
        let err = scene.post_load_sanity_test().unwrap_err();
        assert!(matches!(
            err,
            SceneError::TooManyLights {
                kind: LightKind::Direct,
                count: 2,
                max: 1
            }
        ));
    }

    #[test]
    fn frame_calls_require_loaded_scene() {
        let mut ctx = HeadlessContext::new(64, 64);
        let mut scene = Scene::new("debug-primitives");
        assert!(matches!(
            scene.animate_frame(&ctx),
            Err(SceneError::NotLoaded(_))
        ));
        assert!(matches!(
            scene.render_frame(&mut ctx),
            Err(SceneError::NotLoaded(_))
        ));
        assert!(ctx.draws.is_empty());
    }

    #[test]
    fn unknown_scene_is_rejected() {
        let mut ctx = HeadlessContext::new(64, 64);
        let mut scene = Scene::new("no-such-scene");
        assert!(matches!(
            scene.init(&mut ctx),
            Err(SceneError::UnknownScene(_))
        ));
        assert_eq!(scene.state(), SceneState::Unloaded);
    }

    #[test]
    fn light_proxy_emissive_is_normalized() {
        let light = PointLight::new(Vector4::new(4.0, 2.0, 1.0, 1.0), 1.0, 0.0, 0.0);
        let constants = light_proxy_constants(&Matrix4::identity(), &light);
        assert_eq!(constants.emissive_factor, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(constants.flags[0], ShadingTag::Constant as u32);
    }
}
