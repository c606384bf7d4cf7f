//! Scene graph, glTF import and tangent space generation for a real-time
//! PBR renderer. Device work goes through [`pipeline::context::RenderContext`].

pub mod core;
pub mod io;
pub mod pipeline;
pub mod scene;
