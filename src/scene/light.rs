use crate::core::math::transform::TransformFactory;
use nalgebra::{Point3, Vector3, Vector4};
use std::f32::consts::TAU;

/// Seconds for one full orbit of the animated point lights.
pub const ORBIT_PERIOD_SECS: f64 = 15.0;

/// Uniform light reaching every surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub luminance: Vector4<f32>,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            luminance: Vector4::new(0.05, 0.05, 0.05, 1.0),
        }
    }
}

/// A light source that is infinitely far away. Rays are parallel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLight {
    /// Direction the light travels.
    pub direction: Vector3<f32>,
    pub luminance: Vector4<f32>,
    transformed_direction: Vector3<f32>,
}

impl DirectLight {
    pub fn new(direction: Vector3<f32>, luminance: Vector4<f32>) -> Self {
        let mut light = Self {
            direction,
            luminance,
            transformed_direction: Vector3::zeros(),
        };
        light.update();
        light
    }

    /// Re-derives the normalized direction. A zero direction points straight down.
    pub fn update(&mut self) {
        self.transformed_direction = self
            .direction
            .try_normalize(1e-12)
            .unwrap_or_else(|| -Vector3::y());
    }

    pub fn transformed_direction(&self) -> Vector3<f32> {
        self.transformed_direction
    }
}

/// A point light travelling on a tilted circular orbit around the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Luminous intensity (RGBA).
    pub intensity: Vector4<f32>,
    pub orbit_radius: f32,
    /// Orbit tilt range in radians; lights spread across it by their phase.
    pub orbit_inclination_min: f32,
    pub orbit_inclination_max: f32,
    transformed_position: Point3<f32>,
}

impl PointLight {
    pub fn new(
        intensity: Vector4<f32>,
        orbit_radius: f32,
        orbit_inclination_min: f32,
        orbit_inclination_max: f32,
    ) -> Self {
        Self {
            intensity,
            orbit_radius,
            orbit_inclination_min,
            orbit_inclination_max,
            transformed_position: Point3::new(orbit_radius, 0.0, 0.0),
        }
    }

    /// Position of light `index` out of `count` at `time` seconds.
    ///
    /// Each light is phase shifted by `index / count` of a turn and tilted by
    /// the inclination range interpolated with the same fraction. The base
    /// point `(radius, 0, 0)` is rotated around Y by the orbit angle, then
    /// around Z by the inclination.
    pub fn orbit_position(&self, time: f64, index: usize, count: usize) -> Point3<f32> {
        let phase = if count == 0 {
            0.0
        } else {
            index as f32 / count as f32
        };
        let cycle = (time / ORBIT_PERIOD_SECS).rem_euclid(1.0) as f32;
        let angle = TAU * (cycle + phase);
        let inclination = self.orbit_inclination_min
            + (self.orbit_inclination_max - self.orbit_inclination_min) * phase;

        let orbit = TransformFactory::rotation_z(inclination) * TransformFactory::rotation_y(angle);
        orbit.transform_point(&Point3::new(self.orbit_radius, 0.0, 0.0))
    }

    pub fn update(&mut self, time: f64, index: usize, count: usize) {
        self.transformed_position = self.orbit_position(time, index, count);
    }

    pub fn transformed_position(&self) -> Point3<f32> {
        self.transformed_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_is_periodic() {
        let light = PointLight::new(Vector4::repeat(1.0), 4.0, -0.3, 0.6);
        for step in 0..40 {
            let t = step as f64 * 0.83;
            for i in 0..3 {
                let a = light.orbit_position(t, i, 3);
                let b = light.orbit_position(t + ORBIT_PERIOD_SECS, i, 3);
                assert!((a - b).norm() < 1e-4, "t={} i={}", t, i);
            }
        }
    }

    #[test]
    fn orbit_keeps_radius() {
        let light = PointLight::new(Vector4::repeat(1.0), 2.5, 0.0, 1.0);
        for i in 0..4 {
            let p = light.orbit_position(3.7, i, 4);
            assert!((p.coords.norm() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn lights_are_phase_shifted() {
        let light = PointLight::new(Vector4::repeat(1.0), 1.0, 0.0, 0.0);
        let a = light.orbit_position(0.0, 0, 2);
        let b = light.orbit_position(0.0, 1, 2);
        assert!((a - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-5);
        assert!((b - Point3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn direct_light_direction_is_normalized() {
        let light = DirectLight::new(Vector3::new(0.0, -3.0, 4.0), Vector4::repeat(1.0));
        assert!((light.transformed_direction().norm() - 1.0).abs() < 1e-6);
    }
}
