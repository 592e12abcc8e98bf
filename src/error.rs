//! Error types for geometry construction and frame rendering.
//!
//! Library seams return these typed errors. Application code (see
//! [`crate::flow::run`]) folds them into `anyhow::Error`.

use thiserror::Error;

use crate::data_structures::scene_graph::NodeId;

/// Shape violations detected while building a [`Geometry`](crate::data_structures::geometry::Geometry).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("position buffer holds {0} floats, which is not a multiple of 3")]
    PositionsNotVec3(usize),
    #[error("index buffer holds {0} indices, which is not a whole number of triangles")]
    IndicesNotTriangles(usize),
    #[error("{attribute} buffer holds {actual} floats but {expected} are required for {vertices} vertices")]
    AttributeLength {
        attribute: &'static str,
        vertices: usize,
        expected: usize,
        actual: usize,
    },
    #[error("index {index} at position {at} is out of range for {vertices} vertices")]
    IndexOutOfRange { at: usize, index: u16, vertices: usize },
    #[error("bundled geometry needs {0} vertices, more than a u16 index buffer can address")]
    TooManyVertices(usize),
}

/// Reasons a frame could not be recorded or submitted.
///
/// Every variant aborts the current frame. The frame loop decides whether to
/// retry on the next tick.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("the scene has no active camera")]
    MissingCamera,
    #[error("instanced node {node} declares {declared} instances but carries {actual} transforms")]
    InstanceCountMismatch {
        node: NodeId,
        declared: u32,
        actual: usize,
    },
    #[error("node {node} uses a {shading} material, the renderer only draws phong materials")]
    UnsupportedMaterial { node: NodeId, shading: &'static str },
    #[error("node {node} has a degenerate transform (non-finite {matrix} matrix)")]
    DegenerateTransform { node: NodeId, matrix: &'static str },
    #[error("the active camera has a degenerate view or projection matrix")]
    DegenerateCamera,
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation { resource: String, reason: String },
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
