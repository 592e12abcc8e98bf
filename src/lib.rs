//! phong-ngin
//!
//! A small scene graph with a Phong renderer on top of wgpu. Applications
//! build [`Geometry`](data_structures::geometry::Geometry),
//! [`Material`](data_structures::material::Material) and
//! [`PointLight`](data_structures::light::PointLight) values, wrap them in
//! scene nodes, add the nodes to a [`Scene`](data_structures::scene_graph::Scene)
//! and call [`Renderer::render`](render::Renderer::render) once per frame.
//!
//! High-level modules
//! - `camera`: perspective projection for camera nodes
//! - `context`: the wgpu device, queue and render target
//! - `data_structures`: transforms, geometry, materials, lights, scene graph
//! - `device`: the `GraphicsDevice` seam between renderer and GPU
//! - `error`: typed geometry and render errors
//! - `flow`: winit event loop driving a scene and the renderer
//! - `pipelines`: shaders and the Phong pipeline definition
//! - `render`: per-frame uniform upload and draw recording
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod device;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::WindowEvent;
pub use wgpu::*;
