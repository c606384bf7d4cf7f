//! Error types for scene loading, import and device resource creation.

use crate::pipeline::context::ContextError;
use std::path::PathBuf;
use thiserror::Error;

/// Which light collection a limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Direct,
    Point,
}

impl std::fmt::Display for LightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightKind::Direct => write!(f, "direct"),
            LightKind::Point => write!(f, "point"),
        }
    }
}

/// Vertex attribute stream of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexChannel {
    Position,
    Normal,
    Tangent,
    TexCoord,
}

impl std::fmt::Display for VertexChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VertexChannel::Position => "position",
            VertexChannel::Normal => "normal",
            VertexChannel::Tangent => "tangent",
            VertexChannel::TexCoord => "texture coordinate",
        };
        f.write_str(name)
    }
}

/// Error type for everything that can abort a scene load.
///
/// Degenerate UV triangles are not represented here: the tangent solver
/// recovers from them in place.
#[derive(Error, Debug)]
pub enum SceneError {
    // --- Validation ---
    /// UV sphere requested below the minimum tessellation.
    #[error("sphere needs at least 2 vertical segments and 3 strips, got {vert_segments} and {strips}")]
    InvalidSphere { vert_segments: u32, strips: u32 },

    /// Primitive would need more vertices than the index type can address.
    #[error("primitive needs {count} vertices, the limit is {max}")]
    TooManyVertices { count: usize, max: usize },

    /// Light collection exceeds its configured maximum.
    #[error("scene has {count} {kind} lights, the maximum is {max}")]
    TooManyLights {
        kind: LightKind,
        count: usize,
        max: usize,
    },

    /// Normal-mapped material on a primitive without tangents.
    #[error(
        "primitive {primitive} of node '{node}' uses normal-mapped material '{material}' but has no tangents"
    )]
    MissingTangents {
        node: String,
        primitive: usize,
        material: String,
    },

    /// An attribute stream the operation depends on was never populated.
    #[error("primitive has no {0} data")]
    MissingVertexChannel(VertexChannel),

    /// Index list that cannot describe faces over the vertex buffer.
    #[error("invalid index data: {0}")]
    InvalidIndexData(String),

    // --- Import ---
    /// The asset file could not be read or parsed.
    #[error("failed to load glTF file '{path}': {message}")]
    GltfLoad { path: PathBuf, message: String },

    /// Structurally unsupported asset content.
    #[error("import failed: {0}")]
    Import(String),

    /// Mesh primitive mode other than triangles or triangle strip.
    #[error("mesh '{mesh}' primitive {primitive} uses unsupported mode {mode}")]
    UnsupportedTopology {
        mesh: String,
        primitive: usize,
        mode: String,
    },

    /// Attribute accessor length differs from the position accessor.
    #[error("{channel} accessor has {found} elements, position accessor has {expected}")]
    AttributeCountMismatch {
        channel: VertexChannel,
        expected: usize,
        found: usize,
    },

    /// Embedded image in a pixel layout that has no RGBA8 conversion.
    #[error("image {image} uses unsupported pixel format {format}")]
    UnsupportedImageFormat { image: usize, format: String },

    // --- Device ---
    /// The rendering context refused to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreation(#[from] ContextError),

    // --- Lifecycle ---
    /// Frame operation requested while the scene is not loaded.
    #[error("scene '{0}' is not loaded")]
    NotLoaded(String),

    /// Scene identifier not present in the catalog.
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}

impl SceneError {
    /// True for errors caused by bad construction parameters or content authoring.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SceneError::InvalidSphere { .. }
                | SceneError::TooManyVertices { .. }
                | SceneError::TooManyLights { .. }
                | SceneError::MissingTangents { .. }
                | SceneError::MissingVertexChannel(_)
                | SceneError::InvalidIndexData(_)
        )
    }

    /// True for malformed or unsupported external asset data.
    pub fn is_import(&self) -> bool {
        matches!(
            self,
            SceneError::GltfLoad { .. }
                | SceneError::Import(_)
                | SceneError::UnsupportedTopology { .. }
                | SceneError::AttributeCountMismatch { .. }
                | SceneError::UnsupportedImageFormat { .. }
        )
    }
}

/// Result type alias for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
