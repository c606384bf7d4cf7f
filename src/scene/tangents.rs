//! Per-vertex tangent space generation.
//!
//! Each triangle contributes a tangent/bitangent pair solved from its object
//! space and UV space edges. Contributions are weighted by the corner angle of
//! the triangle at the receiving vertex, so a vertex result does not depend on
//! how finely the surrounding surface happens to be triangulated.
//!
//! Corners sharing a vertex are grouped into clusters of consistent tangent
//! space: same handedness and tangent directions (projected onto the normal
//! plane) within the split angle. The first cluster keeps the original vertex,
//! every further cluster gets its own copy. Accumulated tangents are then
//! Gram-Schmidt orthogonalized against the normal and the handedness sign is
//! taken from the accumulated bitangent.

use crate::core::error::{SceneError, SceneResult, VertexChannel};
use crate::core::geometry::{
    Face, MAX_VERTEX_COUNT, RESTART_INDEX, Topology, Vertex, decompose_faces,
};
use crate::scene::primitive::ScenePrimitive;
use log::debug;
use nalgebra::{Vector2, Vector3, Vector4};

/// Determinant magnitude below which a triangle's UV mapping is degenerate.
const UV_DETERMINANT_EPSILON: f32 = 1e-12;
const LENGTH_EPSILON: f32 = 1e-12;

/// Outcome of a tangent computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TangentStats {
    pub faces: usize,
    /// Faces whose UV (or position) mapping gave no usable tangent.
    pub degenerate_faces: usize,
    /// Vertex copies appended to keep seams consistent.
    pub split_vertices: usize,
}

/// Computes tangents with handedness for a primitive, splitting seam vertices.
#[derive(Debug, Clone, Copy)]
pub struct TangentSpaceSolver {
    split_cos: f32,
}

impl Default for TangentSpaceSolver {
    fn default() -> Self {
        Self::with_split_angle(60f32.to_radians())
    }
}

/// Tangent/bitangent contribution of one face corner.
#[derive(Debug, Clone, Copy)]
struct Corner {
    tangent: Vector3<f32>,
    bitangent: Vector3<f32>,
    usable: bool,
}

#[derive(Debug, Clone)]
struct Cluster {
    tangent_sum: Vector3<f32>,
    bitangent_sum: Vector3<f32>,
    direction: Vector3<f32>,
    sign: f32,
    corners: Vec<usize>,
}

impl TangentSpaceSolver {
    /// Corners whose projected tangents differ by more than `angle_rad` are split.
    pub fn with_split_angle(angle_rad: f32) -> Self {
        Self {
            split_cos: angle_rad.cos(),
        }
    }

    /// Computes tangents in place. No-op when the primitive already has them.
    ///
    /// On error the primitive is left untouched.
    pub fn calculate(&self, primitive: &mut ScenePrimitive) -> SceneResult<TangentStats> {
        if primitive.tangent_present {
            return Ok(TangentStats::default());
        }

        check_channels(primitive)?;
        check_indices(primitive)?;

        let faces = decompose_faces(&primitive.indices, primitive.topology);
        if faces.is_empty() {
            return Err(SceneError::InvalidIndexData(
                "index list contains no non-degenerate faces".to_string(),
            ));
        }

        let vertices = &primitive.vertices;
        let mut stats = TangentStats {
            faces: faces.len(),
            ..Default::default()
        };

        // 1. Per-corner contributions, flattened as face * 3 + k
        let mut corners = Vec::with_capacity(faces.len() * 3);
        for face in &faces {
            let v = face.map(|i| &vertices[i as usize]);
            match face_basis(v[0], v[1], v[2]) {
                Some((t, b)) => {
                    for k in 0..3 {
                        let w = corner_angle(v[k], v[(k + 1) % 3], v[(k + 2) % 3]);
                        corners.push(Corner {
                            tangent: t * w,
                            bitangent: b * w,
                            usable: w > 0.0,
                        });
                    }
                }
                None => {
                    stats.degenerate_faces += 1;
                    corners.extend([Corner::unusable(); 3]);
                }
            }
        }

        // 2. Corners incident to each vertex
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
        for (f, face) in faces.iter().enumerate() {
            for (k, &i) in face.iter().enumerate() {
                incident[i as usize].push(f * 3 + k);
            }
        }

        // 3. Cluster, resolve and split
        let mut out_vertices: Vec<Vertex> = vertices.clone();
        let mut corner_target: Vec<u32> = vec![0; corners.len()];
        for (vi, corner_ids) in incident.iter().enumerate() {
            let normal = unit_normal(&vertices[vi].normal);
            let clusters = self.cluster(&normal, corner_ids, &corners);

            if clusters.is_empty() {
                out_vertices[vi].tangent = fallback_tangent(&normal);
                for &c in corner_ids {
                    corner_target[c] = vi as u32;
                }
                continue;
            }

            for (n, cluster) in clusters.iter().enumerate() {
                let tangent = resolve(&normal, cluster);
                let target = if n == 0 {
                    out_vertices[vi].tangent = tangent;
                    vi
                } else {
                    let mut copy = vertices[vi];
                    copy.tangent = tangent;
                    out_vertices.push(copy);
                    stats.split_vertices += 1;
                    out_vertices.len() - 1
                };
                for &c in &cluster.corners {
                    corner_target[c] = target as u32;
                }
            }
        }

        if out_vertices.len() >= MAX_VERTEX_COUNT {
            return Err(SceneError::TooManyVertices {
                count: out_vertices.len(),
                max: MAX_VERTEX_COUNT - 1,
            });
        }

        // 4. Commit
        if stats.split_vertices > 0 {
            let remapped: Vec<Face> = (0..faces.len())
                .map(|f| {
                    [
                        corner_target[f * 3],
                        corner_target[f * 3 + 1],
                        corner_target[f * 3 + 2],
                    ]
                })
                .collect();
            primitive.indices = remapped.iter().flatten().copied().collect();
            primitive.topology = Topology::TriangleList;
            primitive.faces = remapped;
        } else {
            primitive.faces = faces;
        }
        primitive.vertices = out_vertices;
        primitive.tangent_present = true;

        if stats.degenerate_faces > 0 {
            debug!(
                "{}: {} of {} faces have degenerate UV mapping, using fallback tangents",
                primitive.name, stats.degenerate_faces, stats.faces
            );
        }
        debug!(
            "{}: tangents computed for {} vertices ({} split)",
            primitive.name,
            primitive.vertices.len(),
            stats.split_vertices
        );

        Ok(stats)
    }

    fn cluster(
        &self,
        normal: &Vector3<f32>,
        corner_ids: &[usize],
        corners: &[Corner],
    ) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut stray = Vec::new();

        for &c in corner_ids {
            let corner = &corners[c];
            let projected = project(normal, &corner.tangent);
            let direction = match projected.try_normalize(LENGTH_EPSILON) {
                Some(d) if corner.usable => d,
                _ => {
                    stray.push(c);
                    continue;
                }
            };
            let sign = handedness(normal, &direction, &corner.bitangent);

            let found = clusters
                .iter_mut()
                .find(|k| k.sign == sign && k.direction.dot(&direction) >= self.split_cos);
            match found {
                Some(k) => {
                    k.tangent_sum += corner.tangent;
                    k.bitangent_sum += corner.bitangent;
                    k.direction = project(normal, &k.tangent_sum)
                        .try_normalize(LENGTH_EPSILON)
                        .unwrap_or(k.direction);
                    k.corners.push(c);
                }
                None => clusters.push(Cluster {
                    tangent_sum: corner.tangent,
                    bitangent_sum: corner.bitangent,
                    direction,
                    sign,
                    corners: vec![c],
                }),
            }
        }

        // Degenerate corners follow whatever the vertex resolves to first.
        if !stray.is_empty() {
            match clusters.first_mut() {
                Some(first) => first.corners.extend(stray),
                None => clusters.push(Cluster {
                    tangent_sum: Vector3::zeros(),
                    bitangent_sum: Vector3::zeros(),
                    direction: Vector3::zeros(),
                    sign: 1.0,
                    corners: stray,
                }),
            }
        }

        clusters
    }
}

impl Corner {
    fn unusable() -> Self {
        Self {
            tangent: Vector3::zeros(),
            bitangent: Vector3::zeros(),
            usable: false,
        }
    }
}

fn check_channels(primitive: &ScenePrimitive) -> SceneResult<()> {
    if primitive.vertices.is_empty() || !primitive.channels.position {
        return Err(SceneError::MissingVertexChannel(VertexChannel::Position));
    }
    if !primitive.channels.normal {
        return Err(SceneError::MissingVertexChannel(VertexChannel::Normal));
    }
    if !primitive.channels.texcoord {
        return Err(SceneError::MissingVertexChannel(VertexChannel::TexCoord));
    }
    Ok(())
}

fn check_indices(primitive: &ScenePrimitive) -> SceneResult<()> {
    let indices = &primitive.indices;
    if indices.len() < 3 {
        return Err(SceneError::InvalidIndexData(format!(
            "{} indices cannot form a face",
            indices.len()
        )));
    }
    if primitive.topology == Topology::TriangleList && indices.len() % 3 != 0 {
        return Err(SceneError::InvalidIndexData(format!(
            "triangle list has {} indices, not a multiple of 3",
            indices.len()
        )));
    }
    let count = primitive.vertices.len();
    let restart_allowed = primitive.topology == Topology::TriangleStrip;
    if let Some(bad) = indices
        .iter()
        .find(|&&i| !(restart_allowed && i == RESTART_INDEX) && i as usize >= count)
    {
        return Err(SceneError::InvalidIndexData(format!(
            "index {} out of range for {} vertices",
            bad, count
        )));
    }
    Ok(())
}

/// Solves the UV-gradient system of one triangle.
///
/// Returns normalized tangent and bitangent, or `None` if the UV mapping (or the
/// triangle itself) is degenerate.
fn face_basis(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let e1 = v1.position - v0.position;
    let e2 = v2.position - v0.position;
    let d1: Vector2<f32> = v1.texcoord - v0.texcoord;
    let d2: Vector2<f32> = v2.texcoord - v0.texcoord;

    let det = d1.x * d2.y - d2.x * d1.y;
    if !det.is_finite() || det.abs() < UV_DETERMINANT_EPSILON {
        return None;
    }
    let r = 1.0 / det;
    let tangent = (e1 * d2.y - e2 * d1.y) * r;
    let bitangent = (e2 * d1.x - e1 * d2.x) * r;

    let tangent = tangent.try_normalize(LENGTH_EPSILON)?;
    let bitangent = bitangent.try_normalize(LENGTH_EPSILON)?;
    if !tangent.iter().chain(bitangent.iter()).all(|c| c.is_finite()) {
        return None;
    }
    Some((tangent, bitangent))
}

/// Interior angle of the triangle at `at`.
fn corner_angle(at: &Vertex, next: &Vertex, prev: &Vertex) -> f32 {
    let a = next.position - at.position;
    let b = prev.position - at.position;
    let angle = a.cross(&b).norm().atan2(a.dot(&b));
    if angle.is_finite() { angle } else { 0.0 }
}

fn unit_normal(normal: &Vector3<f32>) -> Vector3<f32> {
    normal
        .try_normalize(LENGTH_EPSILON)
        .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0))
}

/// `t - n (n . t)`
fn project(normal: &Vector3<f32>, t: &Vector3<f32>) -> Vector3<f32> {
    t - normal * normal.dot(t)
}

/// +1 when `n x t` lies in the same hemisphere as `b`, -1 otherwise.
fn handedness(normal: &Vector3<f32>, tangent: &Vector3<f32>, bitangent: &Vector3<f32>) -> f32 {
    if normal.cross(tangent).dot(bitangent) < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn resolve(normal: &Vector3<f32>, cluster: &Cluster) -> Vector4<f32> {
    match project(normal, &cluster.tangent_sum).try_normalize(LENGTH_EPSILON) {
        Some(t) => {
            let sign = handedness(normal, &t, &cluster.bitangent_sum);
            Vector4::new(t.x, t.y, t.z, sign)
        }
        None => fallback_tangent(normal),
    }
}

/// Unit vector perpendicular to the normal, built from the least aligned axis.
fn fallback_tangent(normal: &Vector3<f32>) -> Vector4<f32> {
    let axis = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let t = project(normal, &axis).normalize();
    Vector4::new(t.x, t.y, t.z, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn assert_orthonormal(primitive: &ScenePrimitive) {
        for (i, v) in primitive.vertices.iter().enumerate() {
            let t = v.tangent.xyz();
            let n = v.normal.normalize();
            assert!((t.norm() - 1.0).abs() < 1e-4, "vertex {} tangent length {}", i, t.norm());
            assert!(t.dot(&n).abs() < 1e-4, "vertex {} tangent not orthogonal", i);
            assert!(v.tangent.w == 1.0 || v.tangent.w == -1.0);
        }
    }

    fn vertex(p: [f32; 3], uv: [f32; 2]) -> Vertex {
        Vertex::new(
            Point3::new(p[0], p[1], p[2]),
            Vector3::new(0.0, 0.0, 1.0),
            Vector2::new(uv[0], uv[1]),
        )
    }

    #[test]
    fn quad_gets_u_aligned_tangent() {
        let mut quad = ScenePrimitive::create_quad(1.0);
        let stats = TangentSpaceSolver::default().calculate(&mut quad).unwrap();
        assert_eq!(stats.split_vertices, 0);
        assert_eq!(stats.degenerate_faces, 0);
        assert!(quad.tangent_present());
        for v in quad.vertices() {
            assert!((v.tangent.xyz() - Vector3::x()).norm() < 1e-5);
        }
        assert_orthonormal(&quad);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut sphere = ScenePrimitive::create_sphere(6, 8).unwrap();
        let solver = TangentSpaceSolver::default();
        solver.calculate(&mut sphere).unwrap();
        let vertices = sphere.vertices().to_vec();
        let indices = sphere.indices().to_vec();
        let stats = solver.calculate(&mut sphere).unwrap();
        assert_eq!(stats, TangentStats::default());
        assert_eq!(sphere.vertices(), vertices.as_slice());
        assert_eq!(sphere.indices(), indices.as_slice());
    }

    #[test]
    fn generated_shapes_are_orthonormal() {
        let solver = TangentSpaceSolver::default();
        let mut shapes = vec![
            ScenePrimitive::create_cube(1.0),
            ScenePrimitive::create_octahedron(1.0),
            ScenePrimitive::create_sphere(8, 12).unwrap(),
        ];
        for shape in &mut shapes {
            solver.calculate(shape).unwrap();
            assert_orthonormal(shape);
        }
    }

    #[test]
    fn mirrored_uv_seam_splits_shared_vertices() {
        // Two triangles sharing the edge 1-2; the right one has U mirrored.
        let mut prim = ScenePrimitive::from_triangles(
            vec![
                vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex([1.0, 1.0, 0.0], [1.0, 1.0]),
                vertex([2.0, 0.0, 0.0], [0.0, 0.0]),
            ],
            vec![0, 1, 2, 1, 3, 2],
        );
        let stats = TangentSpaceSolver::default().calculate(&mut prim).unwrap();
        assert_eq!(stats.split_vertices, 2);
        assert_eq!(prim.vertices().len(), 6);

        let right: Vec<u32> = prim.indices()[3..].to_vec();
        assert!(right.iter().all(|&i| prim.vertices()[i as usize].tangent.x < 0.0));
        let left: Vec<u32> = prim.indices()[..3].to_vec();
        assert!(left.iter().all(|&i| prim.vertices()[i as usize].tangent.x > 0.0));
        assert_orthonormal(&prim);
    }

    #[test]
    fn split_strip_becomes_triangle_list() {
        let mut prim = ScenePrimitive::new("strip");
        prim.set_geometry(
            vec![
                vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex([1.0, 1.0, 0.0], [1.0, 1.0]),
                vertex([2.0, 0.0, 0.0], [0.0, 0.0]),
            ],
            vec![0, 1, 2, 3, RESTART_INDEX, 0, 1, 2],
            Topology::TriangleStrip,
        );
        let corners = |p: &ScenePrimitive| -> Vec<[(Point3<f32>, Vector2<f32>); 3]> {
            p.faces()
                .iter()
                .map(|f| {
                    f.map(|i| {
                        let v = &p.vertices()[i as usize];
                        (v.position, v.texcoord)
                    })
                })
                .collect()
        };
        let before = corners(&prim);
        assert_eq!(before.len(), 3);

        let stats = TangentSpaceSolver::default().calculate(&mut prim).unwrap();
        assert!(stats.split_vertices > 0);
        assert_eq!(prim.topology(), Topology::TriangleList);
        assert!(!prim.indices().contains(&RESTART_INDEX));
        assert_eq!(
            prim.faces(),
            decompose_faces(prim.indices(), Topology::TriangleList).as_slice()
        );
        assert_eq!(corners(&prim), before);
        assert_orthonormal(&prim);
    }

    #[test]
    fn unsplit_strip_keeps_its_topology() {
        let mut prim = ScenePrimitive::new("strip");
        prim.set_geometry(
            vec![
                vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
                vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
                vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
                vertex([1.0, 1.0, 0.0], [1.0, 1.0]),
            ],
            vec![0, 1, 2, 3],
            Topology::TriangleStrip,
        );
        let stats = TangentSpaceSolver::default().calculate(&mut prim).unwrap();
        assert_eq!(stats.split_vertices, 0);
        assert_eq!(prim.topology(), Topology::TriangleStrip);
        assert_eq!(prim.indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn degenerate_uvs_fall_back_deterministically() {
        let mut prim = ScenePrimitive::from_triangles(
            vec![
                vertex([0.0, 0.0, 0.0], [0.5, 0.5]),
                vertex([1.0, 0.0, 0.0], [0.5, 0.5]),
                vertex([0.0, 1.0, 0.0], [0.5, 0.5]),
            ],
            vec![0, 1, 2],
        );
        let stats = TangentSpaceSolver::default().calculate(&mut prim).unwrap();
        assert_eq!(stats.degenerate_faces, 1);
        for v in prim.vertices() {
            assert_eq!(v.tangent, Vector4::new(1.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn handedness_flips_with_mirrored_v() {
        let mut prim = ScenePrimitive::from_triangles(
            vec![
                vertex([0.0, 0.0, 0.0], [0.0, 1.0]),
                vertex([1.0, 0.0, 0.0], [1.0, 1.0]),
                vertex([0.0, 1.0, 0.0], [0.0, 0.0]),
            ],
            vec![0, 1, 2],
        );
        TangentSpaceSolver::default().calculate(&mut prim).unwrap();
        assert!(prim.vertices().iter().all(|v| v.tangent.w == -1.0));
    }

    #[test]
    fn missing_texcoords_are_rejected_without_changes() {
        let mut prim = ScenePrimitive::create_quad(1.0);
        prim.channels.texcoord = false;
        let before = prim.vertices().to_vec();
        let err = TangentSpaceSolver::default().calculate(&mut prim).unwrap_err();
        assert!(matches!(
            err,
            SceneError::MissingVertexChannel(VertexChannel::TexCoord)
        ));
        assert_eq!(prim.vertices(), before.as_slice());
        assert!(!prim.tangent_present());
    }

    #[test]
    fn too_few_indices_are_rejected() {
        let mut prim = ScenePrimitive::from_triangles(
            vec![vertex([0.0; 3], [0.0; 2]), vertex([1.0, 0.0, 0.0], [1.0, 0.0])],
            vec![0, 1],
        );
        let err = TangentSpaceSolver::default().calculate(&mut prim).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut prim = ScenePrimitive::from_triangles(
            vec![vertex([0.0; 3], [0.0; 2]), vertex([1.0, 0.0, 0.0], [1.0, 0.0])],
            vec![0, 1, 7],
        );
        assert!(TangentSpaceSolver::default().calculate(&mut prim).is_err());
    }
}
