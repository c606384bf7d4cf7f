//! Named scenes the application can load.
//!
//! Each entry is data: where the content comes from, which transforms are
//! applied to every root node afterwards, and the lights and camera to use.
//! The load algorithm itself lives in [`Scene`].

use crate::core::error::SceneResult;
use crate::scene::graph::Scene;
use crate::scene::material::SceneMaterial;
use crate::scene::node::{NodeAnimation, SceneNode};
use crate::scene::primitive::ScenePrimitive;
use crate::scene::texture::SceneTexture;
use image::{Rgba, RgbaImage};
use nalgebra::{Vector3, Vector4};
use std::f32::consts::{FRAC_1_SQRT_2, TAU};

/// Where the scene content comes from.
#[derive(Debug, Clone, Copy)]
pub enum SceneSource {
    /// Built in code.
    Hardwired(fn(&mut Scene) -> SceneResult<()>),
    /// glTF asset, relative to the configured asset root.
    Gltf(&'static str),
}

/// Post-load transform applied to every root node, in list order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RootTransform {
    Scale(f32),
    /// `[x, y, z, w]`
    Rotation([f32; 4]),
    Translation([f32; 3]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLightPreset {
    pub direction: [f32; 3],
    pub luminance: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightPreset {
    pub intensity: [f32; 4],
    pub orbit_radius: f32,
    /// Orbit inclination range in degrees.
    pub inclination_deg: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPreset {
    pub ambient: [f32; 4],
    pub direct: &'static [DirectLightPreset],
    pub point: &'static [PointLightPreset],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPreset {
    pub eye: [f32; 3],
    pub look_at: [f32; 3],
    pub fov_y_deg: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SceneDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub source: SceneSource,
    pub root_transforms: &'static [RootTransform],
    pub lights: LightPreset,
    pub camera: CameraPreset,
}

const THREE_ORBITING_LIGHTS: [PointLightPreset; 3] = [
    PointLightPreset {
        intensity: [4.0, 1.5, 1.5, 1.0],
        orbit_radius: 4.0,
        inclination_deg: (-20.0, 20.0),
    },
    PointLightPreset {
        intensity: [1.5, 4.0, 1.5, 1.0],
        orbit_radius: 4.5,
        inclination_deg: (-20.0, 20.0),
    },
    PointLightPreset {
        intensity: [1.5, 1.5, 4.0, 1.0],
        orbit_radius: 5.0,
        inclination_deg: (-20.0, 20.0),
    },
];

const SUN: [DirectLightPreset; 1] = [DirectLightPreset {
    direction: [-0.5, -1.0, -0.3],
    luminance: [2.5, 2.4, 2.2, 1.0],
}];

const DEFAULT_CAMERA: CameraPreset = CameraPreset {
    eye: [0.0, 3.0, 10.0],
    look_at: [0.0, 0.0, 0.0],
    fov_y_deg: 45.0,
};

pub static CATALOG: &[SceneDescriptor] = &[
    SceneDescriptor {
        id: "debug-primitives",
        description: "Spinning procedural shapes over a floor, three orbiting point lights",
        source: SceneSource::Hardwired(build_debug_primitives),
        root_transforms: &[],
        lights: LightPreset {
            ambient: [0.04, 0.04, 0.05, 1.0],
            direct: &SUN,
            point: &THREE_ORBITING_LIGHTS,
        },
        camera: DEFAULT_CAMERA,
    },
    SceneDescriptor {
        id: "normal-mapped-sphere",
        description: "UV sphere with a generated bump normal map",
        source: SceneSource::Hardwired(build_normal_mapped_sphere),
        root_transforms: &[],
        lights: LightPreset {
            ambient: [0.02, 0.02, 0.02, 1.0],
            direct: &[],
            point: &THREE_ORBITING_LIGHTS,
        },
        camera: CameraPreset {
            eye: [0.0, 0.0, 7.0],
            look_at: [0.0, 0.0, 0.0],
            fov_y_deg: 40.0,
        },
    },
    SceneDescriptor {
        id: "damaged-helmet",
        description: "glTF sample model DamagedHelmet",
        source: SceneSource::Gltf("DamagedHelmet/glTF/DamagedHelmet.gltf"),
        root_transforms: &[RootTransform::Scale(2.0)],
        lights: LightPreset {
            ambient: [0.05, 0.05, 0.05, 1.0],
            direct: &SUN,
            point: &THREE_ORBITING_LIGHTS,
        },
        camera: DEFAULT_CAMERA,
    },
    SceneDescriptor {
        id: "water-bottle",
        description: "glTF sample model WaterBottle",
        source: SceneSource::Gltf("WaterBottle/glTF/WaterBottle.gltf"),
        root_transforms: &[
            RootTransform::Scale(16.0),
            RootTransform::Rotation([FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2]),
        ],
        lights: LightPreset {
            ambient: [0.05, 0.05, 0.05, 1.0],
            direct: &SUN,
            point: &THREE_ORBITING_LIGHTS,
        },
        camera: DEFAULT_CAMERA,
    },
    SceneDescriptor {
        id: "sponza",
        description: "glTF sample model Sponza",
        source: SceneSource::Gltf("Sponza/glTF/Sponza.gltf"),
        root_transforms: &[
            RootTransform::Scale(0.5),
            RootTransform::Translation([0.0, -2.0, 0.0]),
        ],
        lights: LightPreset {
            ambient: [0.1, 0.1, 0.1, 1.0],
            direct: &SUN,
            point: &[
                PointLightPreset {
                    intensity: [6.0, 5.0, 4.0, 1.0],
                    orbit_radius: 3.0,
                    inclination_deg: (0.0, 0.0),
                },
                PointLightPreset {
                    intensity: [4.0, 5.0, 6.0, 1.0],
                    orbit_radius: 3.0,
                    inclination_deg: (0.0, 0.0),
                },
            ],
        },
        camera: CameraPreset {
            eye: [-6.0, 1.0, 0.0],
            look_at: [4.0, 1.5, 0.0],
            fov_y_deg: 60.0,
        },
    },
];

/// Looks up a scene by identifier.
pub fn find(id: &str) -> Option<&'static SceneDescriptor> {
    CATALOG.iter().find(|d| d.id == id)
}

/// The scene loaded when nothing is configured.
pub fn default_descriptor() -> &'static SceneDescriptor {
    &CATALOG[0]
}

fn build_debug_primitives(scene: &mut Scene) -> SceneResult<()> {
    let red = scene.add_material(SceneMaterial::metal_roughness(
        "red_plastic",
        Vector4::new(0.8, 0.1, 0.1, 1.0),
        0.0,
        0.4,
    ));
    let gold = scene.add_material(SceneMaterial::specular_glossiness(
        "gold",
        Vector4::new(0.0, 0.0, 0.0, 1.0),
        [1.0, 0.77, 0.33],
        0.8,
    ));
    let floor_material = scene.add_material(SceneMaterial::metal_roughness(
        "floor",
        Vector4::new(0.5, 0.5, 0.5, 1.0),
        0.0,
        0.9,
    ));

    let mut cube = SceneNode::new("cube", true);
    cube.add_primitive(ScenePrimitive::create_cube(0.8).with_material(red));
    cube.set_animation(NodeAnimation {
        axis: Vector3::new(1.0, 1.0, 0.0),
        period_secs: 8.0,
    });
    cube.add_translation(&Vector3::new(-2.5, 0.0, 0.0));
    scene.add_root_node(cube);

    let mut octahedron = SceneNode::new("octahedron", true);
    octahedron.add_primitive(ScenePrimitive::create_octahedron(1.0).with_material(gold));
    octahedron.set_animation(NodeAnimation {
        axis: Vector3::y(),
        period_secs: 6.0,
    });
    octahedron.add_translation(&Vector3::new(2.5, 0.0, 0.0));
    scene.add_root_node(octahedron);

    // Sphere carrying a small moon; the moon inherits the sphere's spin
    let mut planet = SceneNode::new("planet", true);
    planet.add_primitive(ScenePrimitive::create_sphere(16, 32)?.with_material(gold));
    planet.set_animation(NodeAnimation {
        axis: Vector3::y(),
        period_secs: 10.0,
    });
    planet.add_scale(0.7);
    let mut moon = SceneNode::new("moon", false);
    moon.add_primitive(ScenePrimitive::create_octahedron(0.25).with_material(red));
    moon.add_translation(&Vector3::new(1.6, 0.0, 0.0));
    planet.add_child(moon);
    scene.add_root_node(planet);

    let mut floor = SceneNode::new("floor", true);
    floor.add_primitive(ScenePrimitive::create_quad(6.0).with_material(floor_material));
    floor.add_rotation_quaternion([-FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2]);
    floor.add_translation(&Vector3::new(0.0, -1.5, 0.0));
    scene.add_root_node(floor);

    Ok(())
}

fn build_normal_mapped_sphere(scene: &mut Scene) -> SceneResult<()> {
    let normal_map = SceneTexture::normal_map("bumps", 1.0).with_image(bump_normal_map(256, 12));
    let material = scene.add_material(
        SceneMaterial::metal_roughness("bumpy", Vector4::new(0.9, 0.9, 0.9, 1.0), 0.1, 0.35)
            .with_normal_texture(normal_map),
    );

    let mut sphere = SceneNode::new("sphere", true);
    sphere.add_primitive(ScenePrimitive::create_sphere(48, 96)?.with_material(material));
    sphere.set_animation(NodeAnimation {
        axis: Vector3::y(),
        period_secs: 30.0,
    });
    sphere.add_scale(2.0);
    scene.add_root_node(sphere);
    Ok(())
}

/// Tangent-space normal map of a regular bump grid, `bumps` periods per side.
pub fn bump_normal_map(size: u32, bumps: u32) -> RgbaImage {
    let frequency = TAU * bumps as f32 / size.max(1) as f32;
    let strength = 0.6;
    RgbaImage::from_fn(size, size, |x, y| {
        let (sx, cx) = (x as f32 * frequency).sin_cos();
        let (sy, cy) = (y as f32 * frequency).sin_cos();
        // Height h = sin(x) sin(y); normal = normalize(-dh/dx, -dh/dy, 1)
        let n = Vector3::new(-cx * sy * strength, -sx * cy * strength, 1.0).normalize();
        let encode = |c: f32| ((c * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([encode(n.x), encode(n.y), encode(n.z), 255])
    })
}
