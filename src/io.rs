pub mod config;
pub mod gltf_loader;
