use crate::core::error::{SceneError, SceneResult, VertexChannel};
use crate::core::geometry::{
    Face, GpuVertex, MAX_VERTEX_COUNT, RESTART_INDEX, Topology, Vertex, decompose_faces,
};
use crate::io::gltf_loader::GltfModel;
use crate::pipeline::context::{BufferHandle, BufferUsage, DrawIndexed, RenderContext, ResourceHandle};
use crate::scene::tangents::{TangentSpaceSolver, TangentStats};
use gltf::mesh::Mode;
use log::debug;
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use std::f32::consts::{PI, TAU};

/// Which vertex streams hold real data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexChannels {
    pub position: bool,
    pub normal: bool,
    pub texcoord: bool,
}

impl VertexChannels {
    pub fn all() -> Self {
        Self {
            position: true,
            normal: true,
            texcoord: true,
        }
    }
}

/// One drawable piece of geometry with a single material.
#[derive(Debug)]
pub struct ScenePrimitive {
    pub(crate) name: String,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) indices: Vec<u32>,
    pub(crate) topology: Topology,
    pub(crate) tangent_present: bool,
    pub(crate) channels: VertexChannels,
    /// Derived from `indices`, rebuilt by [`ScenePrimitive::update_faces`].
    pub(crate) faces: Vec<Face>,
    material_index: i32,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
}

impl Default for ScenePrimitive {
    fn default() -> Self {
        Self::new("primitive")
    }
}

impl ScenePrimitive {
    /// Empty triangle list without any channel data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            indices: Vec::new(),
            topology: Topology::TriangleList,
            tangent_present: false,
            channels: VertexChannels::default(),
            faces: Vec::new(),
            material_index: -1,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    /// Triangle list over fully populated vertices (tangents not included).
    pub fn from_triangles(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let mut primitive = Self::new("triangles");
        primitive.set_geometry(vertices, indices, Topology::TriangleList);
        primitive
    }

    /// Replaces vertex and index data. Tangents are considered absent afterwards.
    pub fn set_geometry(&mut self, vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) {
        self.vertices = vertices;
        self.indices = indices;
        self.topology = topology;
        self.channels = VertexChannels::all();
        self.tangent_present = false;
        self.update_faces();
    }

    /// Square in the XY plane facing +Z, spanning `[-size, size]`.
    pub fn create_quad(size: f32) -> Self {
        let n = Vector3::new(0.0, 0.0, 1.0);
        let vertices = vec![
            Vertex::new(Point3::new(-size, -size, 0.0), n, Vector2::new(0.0, 1.0)),
            Vertex::new(Point3::new(size, -size, 0.0), n, Vector2::new(1.0, 1.0)),
            Vertex::new(Point3::new(size, size, 0.0), n, Vector2::new(1.0, 0.0)),
            Vertex::new(Point3::new(-size, size, 0.0), n, Vector2::new(0.0, 0.0)),
        ];
        let mut primitive = Self::from_triangles(vertices, vec![0, 1, 2, 0, 2, 3]);
        primitive.name = "quad".to_string();
        primitive
    }

    /// Axis aligned cube with half extent `size`; 4 vertices per face so
    /// every face has its own normal and full `[0, 1]` UV range.
    pub fn create_cube(size: f32) -> Self {
        // (normal, right, up) with right x up == normal
        #[rustfmt::skip]
        let sides: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([ 1.0,  0.0,  0.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
            ([-1.0,  0.0,  0.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
            ([ 0.0, -1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
            ([ 0.0,  0.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  0.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
        ];
        // (right, up, u, v)
        let corners: [(f32, f32, f32, f32); 4] = [
            (-1.0, -1.0, 0.0, 1.0),
            (1.0, -1.0, 1.0, 1.0),
            (1.0, 1.0, 1.0, 0.0),
            (-1.0, 1.0, 0.0, 0.0),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in sides {
            let n = Vector3::from(normal);
            let r = Vector3::from(right);
            let t = Vector3::from(up);
            let base = vertices.len() as u32;
            for (a, b, u, v) in corners {
                let p = (n + r * a + t * b) * size;
                vertices.push(Vertex::new(Point3::from(p), n, Vector2::new(u, v)));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let mut primitive = Self::from_triangles(vertices, indices);
        primitive.name = "cube".to_string();
        primitive
    }

    /// Regular octahedron with vertices at distance `size` on the axes, flat shaded.
    pub fn create_octahedron(size: f32) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(24);
        for sx in [1.0f32, -1.0] {
            for sy in [1.0f32, -1.0] {
                for sz in [1.0f32, -1.0] {
                    let mut a = Point3::new(sx * size, 0.0, 0.0);
                    let b = Point3::new(0.0, sy * size, 0.0);
                    let mut c = Point3::new(0.0, 0.0, sz * size);
                    let outward = Vector3::new(sx, sy, sz);
                    // Keep counter-clockwise winding seen from outside
                    if (b - a).cross(&(c - a)).dot(&outward) < 0.0 {
                        std::mem::swap(&mut a, &mut c);
                    }
                    let n = outward.normalize();
                    let base = vertices.len() as u32;
                    vertices.push(Vertex::new(a, n, Vector2::new(0.0, 1.0)));
                    vertices.push(Vertex::new(b, n, Vector2::new(0.5, 0.0)));
                    vertices.push(Vertex::new(c, n, Vector2::new(1.0, 1.0)));
                    indices.extend_from_slice(&[base, base + 1, base + 2]);
                }
            }
        }

        let mut primitive = Self::from_triangles(vertices, indices);
        primitive.name = "octahedron".to_string();
        primitive
    }

    /// Unit UV sphere made of `strips` longitudinal triangle strips, each cut
    /// into `vert_segments` latitude segments.
    ///
    /// Vertex `(s, j)` sits at longitude `s / strips` and latitude
    /// `j / vert_segments` (pole to pole). Column `s = strips` duplicates
    /// `s = 0` with `u = 1`, so the texture wraps without a seam. Strips are
    /// separated by [`RESTART_INDEX`].
    ///
    /// Vertex count is `(strips + 1) * (vert_segments + 1)`, index count is
    /// `strips * 2 * vert_segments + strips - 1`.
    pub fn create_sphere(vert_segments: u32, strips: u32) -> SceneResult<Self> {
        if vert_segments < 2 || strips < 3 {
            return Err(SceneError::InvalidSphere {
                vert_segments,
                strips,
            });
        }
        let rows = vert_segments as usize + 1;
        let columns = strips as usize + 1;
        let vertex_count = rows.checked_mul(columns).unwrap_or(usize::MAX);
        if vertex_count >= MAX_VERTEX_COUNT {
            return Err(SceneError::TooManyVertices {
                count: vertex_count,
                max: MAX_VERTEX_COUNT - 1,
            });
        }

        let mut vertices = Vec::with_capacity(vertex_count);
        for s in 0..columns {
            let u = s as f32 / strips as f32;
            let phi = TAU * u;
            for j in 0..rows {
                let v = j as f32 / vert_segments as f32;
                let theta = PI * v;
                let n = Vector3::new(theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
                vertices.push(Vertex::new(Point3::from(n), n, Vector2::new(u, v)));
            }
        }

        let at = |s: usize, j: usize| (s * rows + j) as u32;
        let segments = vert_segments as usize;
        let mut indices = Vec::with_capacity(strips as usize * (2 * segments + 1));
        for s in 0..strips as usize {
            if s > 0 {
                indices.push(RESTART_INDEX);
            }
            indices.push(at(s, 0));
            for j in 1..segments {
                indices.push(at(s, j));
                indices.push(at(s + 1, j));
            }
            indices.push(at(s, segments));
        }

        let mut primitive = Self::new("sphere");
        primitive.set_geometry(vertices, indices, Topology::TriangleStrip);
        Ok(primitive)
    }

    /// Imports one glTF mesh primitive.
    ///
    /// Triangle lists and strips are accepted. Missing indices are generated,
    /// missing normals are averaged from the faces, and tangents are marked
    /// present only when the asset ships them.
    pub fn load_from_gltf(
        model: &GltfModel,
        mesh: &gltf::Mesh<'_>,
        primitive: &gltf::Primitive<'_>,
        material_offset: usize,
    ) -> SceneResult<Self> {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let topology = match primitive.mode() {
            Mode::Triangles => Topology::TriangleList,
            Mode::TriangleStrip => Topology::TriangleStrip,
            other => {
                return Err(SceneError::UnsupportedTopology {
                    mesh: mesh_name,
                    primitive: primitive.index(),
                    mode: format!("{:?}", other),
                });
            }
        };

        let reader = primitive.reader(|buffer| model.buffer(buffer));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(SceneError::MissingVertexChannel(VertexChannel::Position))?
            .collect();
        let count = positions.len();
        if count >= MAX_VERTEX_COUNT {
            return Err(SceneError::TooManyVertices {
                count,
                max: MAX_VERTEX_COUNT - 1,
            });
        }

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|it| it.collect());
        let texcoords: Option<Vec<[f32; 2]>> =
            reader.read_tex_coords(0).map(|it| it.into_f32().collect());
        let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|it| it.collect());
        check_count(VertexChannel::Normal, count, normals.as_ref().map(Vec::len))?;
        check_count(VertexChannel::TexCoord, count, texcoords.as_ref().map(Vec::len))?;
        check_count(VertexChannel::Tangent, count, tangents.as_ref().map(Vec::len))?;

        let vertices = (0..count)
            .map(|i| Vertex {
                position: Point3::from(positions[i]),
                normal: normals.as_ref().map_or_else(Vector3::zeros, |n| Vector3::from(n[i])),
                tangent: tangents.as_ref().map_or_else(Vector4::zeros, |t| Vector4::from(t[i])),
                texcoord: texcoords.as_ref().map_or_else(Vector2::zeros, |t| Vector2::from(t[i])),
            })
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(SceneError::InvalidIndexData(format!(
                "{} primitive {}: index {} out of range for {} vertices",
                mesh_name,
                primitive.index(),
                bad,
                count
            )));
        }

        let mut scene_primitive = Self::new(format!("{}#{}", mesh_name, primitive.index()));
        scene_primitive.vertices = vertices;
        scene_primitive.indices = indices;
        scene_primitive.topology = topology;
        scene_primitive.channels = VertexChannels {
            position: true,
            normal: normals.is_some(),
            texcoord: texcoords.is_some(),
        };
        scene_primitive.tangent_present = tangents.is_some();
        scene_primitive.material_index = primitive
            .material()
            .index()
            .map_or(-1, |i| (i + material_offset) as i32);
        scene_primitive.update_faces();
        if !scene_primitive.channels.normal {
            scene_primitive.generate_normals();
        }

        debug!(
            "{}: {} vertices, {} indices, {:?}, tangents {}",
            scene_primitive.name,
            count,
            scene_primitive.indices.len(),
            topology,
            if scene_primitive.tangent_present { "imported" } else { "absent" }
        );
        Ok(scene_primitive)
    }

    /// Smooth normals from area weighted face normals.
    fn generate_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        for face in &self.faces {
            let [a, b, c] = face.map(|i| self.vertices[i as usize].position);
            let n = (b - a).cross(&(c - a));
            for &i in face {
                sums[i as usize] += n;
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::y);
        }
        self.channels.normal = true;
        debug!("{}: normals generated from faces", self.name);
    }

    /// Rebuilds the cached face list from the index data.
    pub fn update_faces(&mut self) {
        self.faces = decompose_faces(&self.indices, self.topology);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn channels(&self) -> VertexChannels {
        self.channels
    }

    pub fn tangent_present(&self) -> bool {
        self.tangent_present
    }

    /// Index into the scene material table; negative selects the default material.
    pub fn material_index(&self) -> i32 {
        self.material_index
    }

    pub fn set_material_index(&mut self, index: i32) {
        self.material_index = index;
    }

    pub fn with_material(mut self, index: i32) -> Self {
        self.material_index = index;
        self
    }

    pub fn calculate_tangents_if_needed(
        &mut self,
        solver: &TangentSpaceSolver,
    ) -> SceneResult<TangentStats> {
        if self.tangent_present {
            return Ok(TangentStats::default());
        }
        solver.calculate(self)
    }

    /// Uploads vertex and index data. Buffers from a previous call are
    /// released first, whether or not the new upload succeeds.
    pub fn create_device_buffers(&mut self, ctx: &mut dyn RenderContext) -> SceneResult<()> {
        self.destroy_device_buffers(ctx);

        let gpu_vertices: Vec<GpuVertex> = self.vertices.iter().map(Vertex::to_gpu).collect();
        self.vertex_buffer = Some(ctx.create_buffer(
            BufferUsage::Vertex,
            &self.name,
            bytemuck::cast_slice(&gpu_vertices),
        )?);
        self.index_buffer = Some(ctx.create_buffer(
            BufferUsage::Index,
            &self.name,
            bytemuck::cast_slice(&self.indices),
        )?);
        Ok(())
    }

    pub fn destroy_device_buffers(&mut self, ctx: &mut dyn RenderContext) {
        for handle in [self.vertex_buffer.take(), self.index_buffer.take()]
            .into_iter()
            .flatten()
        {
            ctx.release(ResourceHandle::Buffer(handle));
        }
    }

    pub fn has_device_buffers(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Issues the indexed draw. Does nothing until device buffers exist.
    pub fn draw_geometry(&self, ctx: &mut dyn RenderContext) {
        let (Some(vertex_buffer), Some(index_buffer)) = (self.vertex_buffer, self.index_buffer)
        else {
            debug!("{}: no device buffers, draw skipped", self.name);
            return;
        };
        ctx.draw_indexed(&DrawIndexed {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
            vertex_stride: std::mem::size_of::<GpuVertex>() as u32,
            topology: self.topology,
        });
    }
}

fn check_count(channel: VertexChannel, expected: usize, found: Option<usize>) -> SceneResult<()> {
    match found {
        Some(found) if found != expected => Err(SceneError::AttributeCountMismatch {
            channel,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::headless::HeadlessContext;

    #[test]
    fn sphere_counts_follow_closed_form() {
        for (segments, strips) in [(2u32, 3u32), (3, 4), (8, 16), (17, 5)] {
            let sphere = ScenePrimitive::create_sphere(segments, strips).unwrap();
            let (v, s) = (segments as usize, strips as usize);
            assert_eq!(sphere.vertices().len(), (s + 1) * (v + 1));
            assert_eq!(sphere.indices().len(), s * 2 * v + s - 1);
            assert_eq!(sphere.topology(), Topology::TriangleStrip);
            assert!(!sphere.tangent_present());
            let count = sphere.vertices().len() as u32;
            assert!(
                sphere
                    .indices()
                    .iter()
                    .all(|&i| i == RESTART_INDEX || i < count)
            );
            assert_eq!(
                sphere.indices().iter().filter(|&&i| i == RESTART_INDEX).count(),
                s - 1
            );
        }
    }

    #[test]
    fn sphere_rejects_low_tessellation() {
        for (segments, strips) in [(1, 3), (2, 2), (0, 0)] {
            let err = ScenePrimitive::create_sphere(segments, strips).unwrap_err();
            assert!(matches!(err, SceneError::InvalidSphere { .. }));
            assert!(err.is_validation());
        }
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let sphere = ScenePrimitive::create_sphere(6, 8).unwrap();
        for v in sphere.vertices() {
            assert!((v.position.coords.norm() - 1.0).abs() < 1e-5);
            assert!((v.normal - v.position.coords).norm() < 1e-6);
        }
        // 2 * (segments - 1) triangles per strip
        assert_eq!(sphere.faces().len(), 8 * 2 * 5);
    }

    #[test]
    fn generated_faces_wind_outwards() {
        for shape in [
            ScenePrimitive::create_cube(1.0),
            ScenePrimitive::create_octahedron(2.0),
            ScenePrimitive::create_sphere(4, 6).unwrap(),
        ] {
            for face in shape.faces() {
                let [a, b, c] = face.map(|i| shape.vertices()[i as usize].position);
                let n = (b - a).cross(&(c - a));
                let centroid = (a.coords + b.coords + c.coords) / 3.0;
                assert!(n.dot(&centroid) > 0.0, "{} face {:?}", shape.name(), face);
            }
        }
    }

    #[test]
    fn cube_has_24_vertices() {
        let cube = ScenePrimitive::create_cube(1.0);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.indices().len(), 36);
        assert!(
            cube.vertices()
                .iter()
                .any(|v| v.position == Point3::new(-1.0, -1.0, -1.0))
        );
    }

    #[test]
    fn device_buffers_are_replaced_not_leaked() {
        let mut ctx = HeadlessContext::new(4, 4);
        let mut quad = ScenePrimitive::create_quad(1.0);
        quad.create_device_buffers(&mut ctx).unwrap();
        quad.create_device_buffers(&mut ctx).unwrap();
        assert_eq!(ctx.live_resources(), 2);

        // Index buffer creation fails: the vertex buffer stays tracked
        ctx.fail_creation_at(1);
        assert!(quad.create_device_buffers(&mut ctx).is_err());
        assert_eq!(ctx.live_resources(), 1);
        quad.destroy_device_buffers(&mut ctx);
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn draw_uses_primitive_topology() {
        let mut ctx = HeadlessContext::new(4, 4);
        let mut sphere = ScenePrimitive::create_sphere(3, 4).unwrap();
        sphere.draw_geometry(&mut ctx);
        assert!(ctx.draws.is_empty());

        sphere.create_device_buffers(&mut ctx).unwrap();
        sphere.draw_geometry(&mut ctx);
        assert_eq!(ctx.draws.len(), 1);
        assert_eq!(ctx.draws[0].draw.topology, Topology::TriangleStrip);
        assert_eq!(ctx.draws[0].draw.index_count as usize, sphere.indices().len());
        assert_eq!(ctx.draws[0].draw.vertex_stride, 48);
        sphere.destroy_device_buffers(&mut ctx);
    }

    #[test]
    fn tangents_skip_when_present() {
        let solver = TangentSpaceSolver::default();
        let mut quad = ScenePrimitive::create_quad(1.0);
        let first = quad.calculate_tangents_if_needed(&solver).unwrap();
        assert_eq!(first.faces, 2);
        let second = quad.calculate_tangents_if_needed(&solver).unwrap();
        assert_eq!(second, TangentStats::default());
    }
}
