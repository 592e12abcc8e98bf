//! The capability the renderer needs from a GPU.
//!
//! [`GraphicsDevice`] is small: create buffers, write buffers,
//! build a pipeline and submit a recorded [`CommandList`]. The wgpu
//! implementation lives in [`crate::context`]; tests drive the renderer with
//! a recording implementation instead.
//!
//! A [`CommandList`] plays the role of a command encoder. The renderer opens
//! passes on it with [`CommandList::begin_pass`], records draws, and hands the
//! finished list to [`GraphicsDevice::submit`].

use crate::{data_structures::scene_graph::NodeId, error::RenderError, pipelines::Shader};

pub trait GraphicsDevice {
    /// Handle to a GPU buffer. Cloning must be cheap (a reference count or an id).
    type Buffer: Clone;
    type Pipeline;

    /// Creates a buffer initialised with `contents` (mapped at creation and
    /// written immediately).
    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<Self::Buffer, RenderError>;

    /// Creates an uninitialised buffer of `size` bytes.
    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<Self::Buffer, RenderError>;

    fn write_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor<'_>,
    ) -> Result<Self::Pipeline, RenderError>;

    /// Executes every pass of `commands` with `pipeline` and queues the result.
    fn submit(
        &mut self,
        pipeline: &Self::Pipeline,
        commands: CommandList<Self::Buffer>,
    ) -> Result<(), RenderError>;
}

/// One per-vertex attribute stream. Each stream lives in its own buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexStream {
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

impl VertexStream {
    pub fn stride(&self) -> wgpu::BufferAddress {
        self.format.size()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Uniform,
    ReadOnlyStorage,
}

/// A buffer slot in the pipeline's single bind group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSlot {
    pub binding: u32,
    pub visibility: wgpu::ShaderStages,
    pub kind: BindingKind,
}

/// Everything needed to build the fixed render pipeline.
#[derive(Clone, Debug)]
pub struct PipelineDescriptor<'a> {
    pub label: &'a str,
    pub shader: &'a Shader,
    pub vertex_streams: &'a [VertexStream],
    pub uniform_slots: &'a [UniformSlot],
    pub depth_compare: wgpu::CompareFunction,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
}

/// Clear values of a depth-tested colour pass. Results are always stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassDescriptor {
    pub clear_color: wgpu::Color,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl Default for PassDescriptor {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

/// The four buffers bound for one draw, in binding order.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformBindings<B> {
    pub view: B,
    pub transforms: B,
    pub light: B,
    pub material: B,
}

impl<B> UniformBindings<B> {
    pub fn in_binding_order(&self) -> [&B; 4] {
        [&self.view, &self.transforms, &self.light, &self.material]
    }
}

/// One indexed, possibly instanced, draw with everything it binds.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand<B> {
    pub node: NodeId,
    pub uniforms: UniformBindings<B>,
    /// Position, normal and texture coordinate streams.
    pub vertex_buffers: [B; 3],
    pub index_buffer: B,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
    pub instance_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedPass<B> {
    pub descriptor: PassDescriptor,
    pub draws: Vec<DrawCommand<B>>,
}

/// Device-agnostic command recording for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandList<B> {
    label: String,
    passes: Vec<RecordedPass<B>>,
}

impl<B> CommandList<B> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            passes: Vec::new(),
        }
    }

    /// Opens a pass. It ends when the returned recorder is dropped.
    pub fn begin_pass(&mut self, descriptor: PassDescriptor) -> PassRecorder<'_, B> {
        self.passes.push(RecordedPass {
            descriptor,
            draws: Vec::new(),
        });
        let pass = self
            .passes
            .last_mut()
            .expect("a pass was pushed right above");
        PassRecorder { pass }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn passes(&self) -> &[RecordedPass<B>] {
        &self.passes
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand<B>> {
        self.passes.iter().flat_map(|pass| pass.draws.iter())
    }
}

pub struct PassRecorder<'a, B> {
    pass: &'a mut RecordedPass<B>,
}

impl<B> PassRecorder<'_, B> {
    pub fn draw_indexed(&mut self, draw: DrawCommand<B>) {
        self.pass.draws.push(draw);
    }
}
