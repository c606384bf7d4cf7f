use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// Represents a single vertex in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Tangent (xyz) plus handedness sign (w = +1 or -1) for normal mapping.
    /// Zero until computed or imported.
    pub tangent: Vector4<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            tangent: Vector4::zeros(),
            texcoord,
        }
    }

    /// Converts to the tightly packed layout handed to the device.
    pub fn to_gpu(&self) -> GpuVertex {
        GpuVertex {
            position: [self.position.x, self.position.y, self.position.z],
            normal: [self.normal.x, self.normal.y, self.normal.z],
            tangent: [self.tangent.x, self.tangent.y, self.tangent.z, self.tangent.w],
            texcoord: [self.texcoord.x, self.texcoord.y],
        }
    }
}

/// Vertex buffer element: position, normal, tangent, texcoord (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub texcoord: [f32; 2],
}

/// One triangle as three indices into a vertex buffer.
pub type Face = [u32; 3];

/// Index topology of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    /// Triangle strip where [`RESTART_INDEX`] terminates the current strip.
    TriangleStrip,
}

/// Strip restart sentinel. No real vertex may use this index.
pub const RESTART_INDEX: u32 = u32::MAX;

/// Largest vertex count addressable without colliding with [`RESTART_INDEX`].
pub const MAX_VERTEX_COUNT: usize = RESTART_INDEX as usize;

/// Splits an index list into triangles.
///
/// Strips restart on [`RESTART_INDEX`], flip winding on every odd triangle and
/// drop triangles that repeat an index (the zero-area joints used to stitch strips).
pub fn decompose_faces(indices: &[u32], topology: Topology) -> Vec<Face> {
    match topology {
        Topology::TriangleList => indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        Topology::TriangleStrip => {
            let mut faces = Vec::with_capacity(indices.len());
            for run in indices.split(|&i| i == RESTART_INDEX) {
                for (k, w) in run.windows(3).enumerate() {
                    if w[0] == w[1] || w[1] == w[2] || w[0] == w[2] {
                        continue;
                    }
                    if k % 2 == 0 {
                        faces.push([w[0], w[1], w[2]]);
                    } else {
                        faces.push([w[1], w[0], w[2]]);
                    }
                }
            }
            faces
        }
    }
}
