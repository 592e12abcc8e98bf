//! Engine data structures: transforms, geometry, materials, lights and the
//! scene graph.
//!
//! - `transform` holds position/rotation/scale with eagerly derived matrices
//! - `geometry` holds immutable vertex and index data and built-in shapes
//! - `material` holds shading parameters and their uniform layout
//! - `light` holds point lights and their uniform layout
//! - `scene_graph` holds the node variants and the scene that owns them
//! - `texture` wraps the render target and depth textures

pub mod geometry;
pub mod light;
pub mod material;
pub mod scene_graph;
pub mod texture;
pub mod transform;
