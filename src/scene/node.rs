//! Transform hierarchy.
//!
//! Column-vector convention throughout: `world = parent_world * local`, and
//! every `add_*` call left-multiplies, so transforms apply in call order.

use crate::core::error::{SceneError, SceneResult};
use crate::core::math::transform::TransformFactory;
use crate::io::gltf_loader::GltfModel;
use crate::pipeline::context::RenderContext;
use crate::scene::primitive::ScenePrimitive;
use gltf::scene::Transform;
use log::debug;
use nalgebra::{Matrix4, Vector3};
use std::f64::consts::TAU;

/// Deepest node hierarchy accepted from an asset.
pub const MAX_NODE_DEPTH: usize = 64;

/// Continuous spin used by the hardwired debug scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAnimation {
    pub axis: Vector3<f32>,
    /// Seconds per full turn.
    pub period_secs: f64,
}

impl NodeAnimation {
    /// Spin at `time`, applied in object space before the local transform.
    pub fn matrix(&self, time: f64) -> Matrix4<f32> {
        if self.period_secs <= 0.0 {
            return Matrix4::identity();
        }
        let angle = TAU * (time / self.period_secs).rem_euclid(1.0);
        TransformFactory::rotation_axis(&self.axis, angle as f32)
    }
}

#[derive(Debug)]
pub struct SceneNode {
    name: String,
    is_root: bool,
    local: Matrix4<f32>,
    world: Matrix4<f32>,
    primitives: Vec<ScenePrimitive>,
    children: Vec<SceneNode>,
    animation: Option<NodeAnimation>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, is_root: bool) -> Self {
        Self {
            name: name.into(),
            is_root,
            local: Matrix4::identity(),
            world: Matrix4::identity(),
            primitives: Vec::new(),
            children: Vec::new(),
            animation: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    // --- Local transform composition ---

    pub fn add_scale(&mut self, factor: f32) {
        self.add_matrix(&TransformFactory::scaling(factor));
    }

    pub fn add_scale_nonuniform(&mut self, scale: &Vector3<f32>) {
        self.add_matrix(&TransformFactory::scaling_nonuniform(scale));
    }

    /// Quaternion in `[x, y, z, w]` order.
    pub fn add_rotation_quaternion(&mut self, xyzw: [f32; 4]) {
        self.add_matrix(&TransformFactory::rotation_quaternion(xyzw));
    }

    pub fn add_translation(&mut self, translation: &Vector3<f32>) {
        self.add_matrix(&TransformFactory::translation(translation));
    }

    /// Applies `matrix` after everything accumulated so far.
    pub fn add_matrix(&mut self, matrix: &Matrix4<f32>) {
        self.local = matrix * self.local;
    }

    pub fn local_matrix(&self) -> &Matrix4<f32> {
        &self.local
    }

    /// World matrix from the last [`SceneNode::animate`] call.
    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world
    }

    pub fn set_animation(&mut self, animation: NodeAnimation) {
        self.animation = Some(animation);
    }

    // --- Content ---

    /// Appends an empty primitive and hands it out for filling in.
    pub fn create_empty_primitive(&mut self) -> &mut ScenePrimitive {
        self.add_primitive(ScenePrimitive::default())
    }

    pub fn add_primitive(&mut self, primitive: ScenePrimitive) -> &mut ScenePrimitive {
        self.primitives.push(primitive);
        let last = self.primitives.len() - 1;
        &mut self.primitives[last]
    }

    pub fn add_child(&mut self, child: SceneNode) -> &mut SceneNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn primitives(&self) -> &[ScenePrimitive] {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut [ScenePrimitive] {
        &mut self.primitives
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [SceneNode] {
        &mut self.children
    }

    /// Recomputes world matrices for this subtree, depth first.
    pub fn animate(&mut self, time: f64, parent_world: &Matrix4<f32>) {
        let mut local = self.local;
        if let Some(animation) = &self.animation {
            local *= animation.matrix(time);
        }
        self.world = parent_world * local;

        let world = self.world;
        for child in &mut self.children {
            child.animate(time, &world);
        }
    }

    // --- glTF import ---

    /// Imports a glTF node and its whole subtree.
    pub fn load_from_gltf(
        model: &GltfModel,
        node: &gltf::Node<'_>,
        material_offset: usize,
        is_root: bool,
    ) -> SceneResult<Self> {
        Self::load_from_gltf_at_depth(model, node, material_offset, is_root, 0)
    }

    fn load_from_gltf_at_depth(
        model: &GltfModel,
        node: &gltf::Node<'_>,
        material_offset: usize,
        is_root: bool,
        depth: usize,
    ) -> SceneResult<Self> {
        if depth >= MAX_NODE_DEPTH {
            return Err(SceneError::Import(format!(
                "node hierarchy deeper than {} levels at node {}",
                MAX_NODE_DEPTH,
                node.index()
            )));
        }

        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index()));
        let mut scene_node = SceneNode::new(name, is_root);

        match node.transform() {
            Transform::Matrix { matrix } => scene_node.add_matrix(&Matrix4::from(matrix)),
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => {
                scene_node.add_scale_nonuniform(&Vector3::from(scale));
                scene_node.add_rotation_quaternion(rotation);
                scene_node.add_translation(&Vector3::from(translation));
            }
        }

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                scene_node.add_primitive(ScenePrimitive::load_from_gltf(
                    model,
                    &mesh,
                    &primitive,
                    material_offset,
                )?);
            }
        }

        for child in node.children() {
            scene_node.add_child(Self::load_from_gltf_at_depth(
                model,
                &child,
                material_offset,
                false,
                depth + 1,
            )?);
        }

        debug!(
            "Node '{}': {} primitives, {} children",
            scene_node.name,
            scene_node.primitives.len(),
            scene_node.children.len()
        );
        Ok(scene_node)
    }

    // --- Device resources ---

    pub fn create_device_buffers(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        for primitive in &mut self.primitives {
            primitive.create_device_buffers(ctx)?;
        }
        for child in &mut self.children {
            child.create_device_buffers(ctx)?;
        }
        Ok(())
    }

    pub fn destroy_device_buffers(&mut self, ctx: &mut dyn RenderContext) {
        for primitive in &mut self.primitives {
            primitive.destroy_device_buffers(ctx);
        }
        for child in &mut self.children {
            child.destroy_device_buffers(ctx);
        }
    }

    // --- Statistics ---

    /// Nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
            + self
                .children
                .iter()
                .map(SceneNode::primitive_count)
                .sum::<usize>()
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives
            .iter()
            .map(|p| p.vertices().len())
            .sum::<usize>()
            + self
                .children
                .iter()
                .map(SceneNode::vertex_count)
                .sum::<usize>()
    }
}
