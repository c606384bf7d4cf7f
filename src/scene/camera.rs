use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Perspective camera. Holds the View and Projection matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    // --- View ---
    pub eye: Point3<f32>,
    pub look_at: Point3<f32>,
    pub up: Vector3<f32>,

    // --- Projection ---
    pub fov_y_rad: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,

    // --- Cached Matrices ---
    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 4.0, 10.0),
            Point3::origin(),
            Vector3::y(),
            std::f32::consts::FRAC_PI_4,
        )
    }
}

impl Camera {
    pub fn new(eye: Point3<f32>, look_at: Point3<f32>, up: Vector3<f32>, fov_y_rad: f32) -> Self {
        let mut cam = Self {
            eye,
            look_at,
            up,
            fov_y_rad,
            aspect_ratio: 1.0,
            near: 0.01,
            far: 100.0,
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
        };
        cam.update_matrices();
        cam
    }

    /// Matches the projection to a render target size. Zero-sized targets are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
        self.update_matrices();
    }

    /// Recalculates View and Projection matrices from the current parameters.
    pub fn update_matrices(&mut self) {
        self.view_matrix = TransformFactory::view(&self.eye, &self.look_at, &self.up);
        self.projection_matrix =
            TransformFactory::perspective(self.aspect_ratio, self.fov_y_rad, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_target_lands_on_view_axis() {
        let cam = Camera::new(
            Point3::new(3.0, 2.0, 5.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::y(),
            1.0,
        );
        let p = cam.view_matrix().transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z < 0.0);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = Camera::default();
        cam.set_viewport(1600, 800);
        assert_eq!(cam.aspect_ratio, 2.0);
        cam.set_viewport(0, 800);
        assert_eq!(cam.aspect_ratio, 2.0);
    }
}
