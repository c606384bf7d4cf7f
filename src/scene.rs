pub mod camera;
pub mod catalog;
pub mod graph;
pub mod light;
pub mod material;
pub mod node;
pub mod primitive;
pub mod tangents;
pub mod texture;

pub use graph::{Scene, SceneLimits, SceneState, SceneStats};
