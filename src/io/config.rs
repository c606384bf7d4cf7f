use crate::pipeline::constants::{DIRECT_LIGHTS_MAX, POINT_LIGHTS_MAX};
use crate::scene::SceneLimits;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    /// Catalog identifier of the scene to load.
    #[serde(default = "default_scene_id")]
    pub id: String,
    /// Directory glTF asset paths are resolved against.
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            id: default_scene_id(),
            asset_root: default_asset_root(),
        }
    }
}

fn default_scene_id() -> String {
    "debug-primitives".to_string()
}
fn default_asset_root() -> PathBuf {
    PathBuf::from("assets")
}

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_direct_lights_max")]
    pub direct_lights_max: usize,
    #[serde(default = "default_point_lights_max")]
    pub point_lights_max: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            direct_lights_max: default_direct_lights_max(),
            point_lights_max: default_point_lights_max(),
        }
    }
}

impl LimitsConfig {
    /// Limits as the scene uses them, capped at the parameter block capacity.
    pub fn to_scene_limits(&self) -> SceneLimits {
        SceneLimits {
            direct_lights_max: self.direct_lights_max,
            point_lights_max: self.point_lights_max,
        }
        .clamped()
    }
}

fn default_direct_lights_max() -> usize {
    DIRECT_LIGHTS_MAX
}
fn default_point_lights_max() -> usize {
    POINT_LIGHTS_MAX
}

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    // --- Frame loop ---
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Seconds of animation time per frame.
    #[serde(default = "default_frame_time")]
    pub frame_time: f64,

    // --- Render target ---
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_msaa_samples")]
    pub msaa_samples: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            frame_time: default_frame_time(),
            width: default_width(),
            height: default_height(),
            msaa_samples: default_msaa_samples(),
        }
    }
}

fn default_frames() -> u32 {
    120
}
fn default_frame_time() -> f64 {
    1.0 / 60.0
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_msaa_samples() -> u32 {
    4
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        if config.run.frame_time < 0.0 || !config.run.frame_time.is_finite() {
            return Err(format!(
                "run.frame_time must be a non-negative number, got {}",
                config.run.frame_time
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.scene.id, "debug-primitives");
        assert_eq!(config.scene.asset_root, PathBuf::from("assets"));
        assert_eq!(config.limits.point_lights_max, POINT_LIGHTS_MAX);
        assert_eq!(config.run.frames, 120);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [scene]
            id = "sponza"
            asset_root = "/data/gltf"

            [limits]
            point_lights_max = 32

            [run]
            frames = 3
            width = 640
            "#,
        )
        .unwrap();
        assert_eq!(config.scene.id, "sponza");
        assert_eq!(config.scene.asset_root, PathBuf::from("/data/gltf"));
        assert_eq!(config.run.frames, 3);
        assert_eq!(config.run.width, 640);
        assert_eq!(config.run.height, 720);
        assert_eq!(
            config.limits.to_scene_limits().point_lights_max,
            POINT_LIGHTS_MAX
        );
    }

    #[test]
    fn negative_frame_time_is_rejected() {
        assert!(Config::parse("[run]\nframe_time = -1.0\n").is_err());
        assert!(Config::parse("[run]\nframes = \"many\"\n").is_err());
    }
}
