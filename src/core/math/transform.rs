use nalgebra::{Matrix3, Matrix4, Point3, Unit, UnitQuaternion, Vector3};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for the transformation matrices used by the scene graph.
///
/// Column-vector convention: a point is transformed as `M * p`, so
/// `B * A` applies `A` first. Right-handed, camera looking down -Z,
/// clip-space depth mapped to [0, 1].
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Rotation of `angle_rad` around an arbitrary axis. A zero axis yields identity.
    pub fn rotation_axis(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        match Unit::try_new(*axis, 1e-12) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle_rad).to_homogeneous(),
            None => Matrix4::identity(),
        }
    }

    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation around the Y-axis.
    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation around the Z-axis.
    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation described by a quaternion stored as `[x, y, z, w]` (glTF order).
    /// The quaternion is normalized first.
    pub fn rotation_quaternion(xyzw: [f32; 4]) -> Matrix4<f32> {
        let q = nalgebra::Quaternion::new(xyzw[3], xyzw[0], xyzw[1], xyzw[2]);
        UnitQuaternion::from_quaternion(q).to_homogeneous()
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scaling(factor: f32) -> Matrix4<f32> {
        Self::scaling_nonuniform(&Vector3::new(factor, factor, factor))
    }

    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Look-at view matrix (world -> view space).
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let back = (eye - target).normalize();
        let right = up.cross(&back).normalize();
        let true_up = back.cross(&right);

        let rotation = Matrix4::new(
            right.x,   right.y,   right.z,   0.0,
            true_up.x, true_up.y, true_up.z, 0.0,
            back.x,    back.y,    back.z,    0.0,
            0.0,       0.0,       0.0,       1.0,
        );

        rotation * Self::translation(&-eye.coords)
    }

    /// Perspective projection with depth in [0, 1].
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad / 2.0).tan();
        let range = far / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,   0.0,
            0.0,              f,   0.0,   0.0,
            0.0,              0.0, range, near * range,
            0.0,              0.0, -1.0,  0.0,
        )
    }
}

/// Inverse-transpose of the upper 3x3 block, used to carry normals.
/// Falls back to the plain block when the matrix is singular.
pub fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let upper = world.fixed_view::<3, 3>(0, 0).into_owned();
    upper.try_inverse().unwrap_or(upper).transpose()
}

/// Column-major 4x4 array, the layout parameter blocks are uploaded in.
pub fn to_columns(m: &Matrix4<f32>) -> [[f32; 4]; 4] {
    (*m).into()
}
