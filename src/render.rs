//! Frame rendering.
//!
//! [`Renderer`] turns a [`Scene`] into one recorded pass per frame: for every
//! drawable node it prepares four uniform buffers (view, per-instance
//! transforms, light, material) plus the geometry buffers, and records one
//! indexed, possibly instanced, draw.
//!
//! # Upload policies
//!
//! - [`UploadPolicy::PerFrame`] allocates every buffer fresh for every draw
//!   and writes all of them. Nothing survives the frame.
//! - [`UploadPolicy::Retained`] keeps buffers per (node, role) and skips
//!   writes whose inputs are clean: the view buffer follows the camera dirty
//!   flag, transforms follow camera or node, the light buffer follows the first
//!   light node (and is rewritten when a different node becomes the first
//!   light) and the material follows the node.
//!
//! Both policies clear the dirty flags of the scene after a successful submit.
//! A retained renderer assumes it always renders the same scene; call
//! [`Renderer::clear_retained`] before switching scenes.

use std::{collections::HashMap, sync::Arc};

use cgmath::Matrix4;

use crate::{
    data_structures::{
        geometry::Geometry,
        light::{LightUniform, PointLight},
        scene_graph::{Drawable, Node, NodeId, Scene},
        transform::{Transform, is_finite, normal_matrix},
    },
    device::{CommandList, DrawCommand, GraphicsDevice, PassDescriptor, UniformBindings},
    error::RenderError,
    pipelines::{Shader, phong},
};

/// Bytes of the view uniform: one projection matrix.
pub const VIEW_UNIFORM_SIZE: u64 = std::mem::size_of::<ViewUniform>() as u64;
/// Bytes per instance in the transform buffer: model-view plus normal matrix.
pub const TRANSFORM_UNIFORM_SIZE: u64 = std::mem::size_of::<TransformUniform>() as u64;
pub const LIGHT_UNIFORM_SIZE: u64 = std::mem::size_of::<LightUniform>() as u64;
pub const MATERIAL_UNIFORM_SIZE: u64 =
    std::mem::size_of::<crate::data_structures::material::MaterialUniform>() as u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    #[default]
    PerFrame,
    Retained,
}

#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub clear_color: wgpu::Color,
    pub upload_policy: UploadPolicy,
    /// Shader the pipeline is built from on the first frame.
    pub shader: Shader,
    pub pipeline_label: String,
    pub frame_label: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            upload_policy: UploadPolicy::default(),
            shader: Shader::phong(),
            pipeline_label: "Phong Pipeline".to_string(),
            frame_label: "Render Encoder".to_string(),
        }
    }
}

/// What one call to [`Renderer::render`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub instances: u64,
    pub buffers_created: usize,
    pub bytes_written: u64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    projection: [[f32; 4]; 4],
}

impl ViewUniform {
    pub fn new(projection: &Matrix4<f32>) -> Self {
        Self {
            projection: (*projection).into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    model_view: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
}

impl TransformUniform {
    /// `model_view = view × world`, `normal = transpose(inverse(model_view))`.
    pub fn new(view: &Matrix4<f32>, world: &Matrix4<f32>) -> Self {
        let model_view = *view * *world;
        Self {
            model_view: model_view.into(),
            normal: normal_matrix(&model_view).into(),
        }
    }

    pub fn model_view(&self) -> Matrix4<f32> {
        self.model_view.into()
    }

    pub fn normal(&self) -> Matrix4<f32> {
        self.normal.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferRole {
    View,
    Transforms,
    Light,
    Material,
}

impl BufferRole {
    fn label(self) -> &'static str {
        match self {
            BufferRole::View => "View Buffer",
            BufferRole::Transforms => "Transform Buffer",
            BufferRole::Light => "Light Buffer",
            BufferRole::Material => "Material Buffer",
        }
    }

    fn usage(self) -> wgpu::BufferUsages {
        match self {
            BufferRole::Transforms => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            _ => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }
    }
}

struct RetainedUniform<B> {
    buffer: B,
    size: u64,
}

struct RetainedGeometry<B> {
    geometry: Arc<Geometry>,
    vertex_buffers: [B; 3],
    index_buffer: B,
}

/// Per-frame inputs shared by every draw.
struct FrameInputs {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    light: LightUniform,
    light_node: Option<NodeId>,
    camera_dirty: bool,
    light_dirty: bool,
}

pub struct Renderer<D: GraphicsDevice> {
    device: D,
    config: RendererConfig,
    pipeline: Option<D::Pipeline>,
    uniforms: HashMap<(NodeId, BufferRole), RetainedUniform<D::Buffer>>,
    geometries: HashMap<NodeId, RetainedGeometry<D::Buffer>>,
    /// Light node the retained light buffers were last written from.
    light_node: Option<NodeId>,
    warned_missing_light: bool,
}

impl<D: GraphicsDevice> Renderer<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, RendererConfig::default())
    }

    pub fn with_config(device: D, config: RendererConfig) -> Self {
        Self {
            device,
            config,
            pipeline: None,
            uniforms: HashMap::new(),
            geometries: HashMap::new(),
            light_node: None,
            warned_missing_light: false,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.config.clear_color = color;
    }

    /// Whether the pipeline has been built by a first frame.
    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Drops every buffer kept by [`UploadPolicy::Retained`].
    pub fn clear_retained(&mut self) {
        self.uniforms.clear();
        self.geometries.clear();
        self.light_node = None;
    }

    /// Records and submits one frame of `scene`.
    ///
    /// Builds the pipeline on the first call. Any error aborts the whole frame
    /// and leaves the scene's dirty flags set.
    pub fn render(&mut self, scene: &mut Scene) -> Result<FrameStats, RenderError> {
        let pipeline = match self.pipeline.take() {
            Some(pipeline) => pipeline,
            None => self.build_pipeline()?,
        };
        let frame = self.record_and_submit(&pipeline, scene);
        self.pipeline = Some(pipeline);

        let (stats, light_node) = frame?;
        self.light_node = light_node;
        scene.clear_dirty();
        Ok(stats)
    }

    fn build_pipeline(&mut self) -> Result<D::Pipeline, RenderError> {
        let descriptor = phong::descriptor(&self.config.pipeline_label, &self.config.shader);
        let pipeline = self.device.create_pipeline(&descriptor)?;
        log::info!(
            "built '{}' from shader '{}'",
            self.config.pipeline_label,
            self.config.shader.label()
        );
        Ok(pipeline)
    }

    fn record_and_submit(
        &mut self,
        pipeline: &D::Pipeline,
        scene: &Scene,
    ) -> Result<(FrameStats, Option<NodeId>), RenderError> {
        let camera = scene.camera().ok_or(RenderError::MissingCamera)?;
        let view = *camera.view_matrix();
        let projection = *camera.projection_matrix();
        if !is_finite(&view) || !is_finite(&projection) {
            return Err(RenderError::DegenerateCamera);
        }
        let (light_node, light, light_dirty) = self.frame_light(scene);
        let frame = FrameInputs {
            view,
            projection,
            light: light.to_raw(),
            light_node,
            camera_dirty: camera.is_dirty(),
            // a different light node means every retained light buffer is stale
            light_dirty: light_dirty || light_node != self.light_node,
        };

        let mut stats = FrameStats::default();
        let mut commands = CommandList::new(self.config.frame_label.clone());
        {
            let mut pass = commands.begin_pass(PassDescriptor {
                clear_color: self.config.clear_color,
                ..Default::default()
            });
            for (id, drawable) in scene.drawables() {
                let draw = self.record_draw(id, drawable, &frame, &mut stats)?;
                pass.draw_indexed(draw);
            }
        }
        self.device.submit(pipeline, commands)?;

        log::debug!(
            "submitted {} draws ({} instances, {} new buffers, {} bytes written)",
            stats.draws,
            stats.instances,
            stats.buffers_created,
            stats.bytes_written
        );
        Ok((stats, frame.light_node))
    }

    /// The first light node, or a light that is switched off.
    fn frame_light(&mut self, scene: &Scene) -> (Option<NodeId>, PointLight, bool) {
        match scene.lights().next() {
            Some((id, node)) => (Some(id), node.light().clone(), node.is_dirty()),
            None => {
                if !self.warned_missing_light {
                    log::warn!("the scene has no light node, drawing unlit");
                    self.warned_missing_light = true;
                }
                (None, PointLight::off(), false)
            }
        }
    }

    fn record_draw(
        &mut self,
        id: NodeId,
        drawable: Drawable<'_>,
        frame: &FrameInputs,
        stats: &mut FrameStats,
    ) -> Result<DrawCommand<D::Buffer>, RenderError> {
        let material = drawable.material();
        let phong_material = material
            .as_phong()
            .ok_or(RenderError::UnsupportedMaterial {
                node: id,
                shading: material.shading().name(),
            })?;
        if let Drawable::InstancedMesh(node) = drawable {
            node.validate(id)?;
        }
        let instance_count = drawable.instance_count();
        let node_dirty = drawable.is_dirty();
        let instances = drawable.instance_transforms();

        let view = self.uniform_buffer(
            id,
            BufferRole::View,
            VIEW_UNIFORM_SIZE,
            frame.camera_dirty,
            stats,
            || Ok(bytemuck::bytes_of(&ViewUniform::new(&frame.projection)).to_vec()),
        )?;
        let transforms = self.uniform_buffer(
            id,
            BufferRole::Transforms,
            TRANSFORM_UNIFORM_SIZE * instance_count as u64,
            frame.camera_dirty || node_dirty,
            stats,
            || {
                let uniforms = instances
                    .iter()
                    .map(|transform| instance_uniform(id, &frame.view, transform))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(bytemuck::cast_slice(&uniforms).to_vec())
            },
        )?;
        let light = self.uniform_buffer(
            id,
            BufferRole::Light,
            LIGHT_UNIFORM_SIZE,
            frame.light_dirty,
            stats,
            || Ok(bytemuck::bytes_of(&frame.light).to_vec()),
        )?;
        let material = self.uniform_buffer(
            id,
            BufferRole::Material,
            MATERIAL_UNIFORM_SIZE,
            node_dirty,
            stats,
            || Ok(bytemuck::bytes_of(&phong_material.to_raw()).to_vec()),
        )?;

        let geometry = drawable.geometry();
        let (vertex_buffers, index_buffer) = self.geometry_buffers(id, geometry, stats)?;

        stats.draws += 1;
        stats.instances += instance_count as u64;
        Ok(DrawCommand {
            node: id,
            uniforms: UniformBindings {
                view,
                transforms,
                light,
                material,
            },
            vertex_buffers,
            index_buffer,
            index_format: wgpu::IndexFormat::Uint16,
            index_count: geometry.index_count() as u32,
            instance_count,
        })
    }

    /// Returns the buffer for `role` of node `id`, writing `contents` when
    /// the buffer is new or `stale`.
    fn uniform_buffer(
        &mut self,
        id: NodeId,
        role: BufferRole,
        size: u64,
        stale: bool,
        stats: &mut FrameStats,
        contents: impl FnOnce() -> Result<Vec<u8>, RenderError>,
    ) -> Result<D::Buffer, RenderError> {
        let (buffer, fresh) = match self.config.upload_policy {
            UploadPolicy::PerFrame => (self.device.create_buffer(role.label(), size, role.usage())?, true),
            UploadPolicy::Retained => {
                let kept = self
                    .uniforms
                    .get(&(id, role))
                    .filter(|kept| kept.size == size)
                    .map(|kept| kept.buffer.clone());
                match kept {
                    Some(buffer) => (buffer, false),
                    None => {
                        let buffer = self.device.create_buffer(role.label(), size, role.usage())?;
                        self.uniforms.insert(
                            (id, role),
                            RetainedUniform {
                                buffer: buffer.clone(),
                                size,
                            },
                        );
                        (buffer, true)
                    }
                }
            }
        };
        if fresh {
            stats.buffers_created += 1;
        }

        if fresh || stale {
            let data = contents()?;
            self.device.write_buffer(&buffer, 0, &data);
            stats.bytes_written += data.len() as u64;
        }
        Ok(buffer)
    }

    fn geometry_buffers(
        &mut self,
        id: NodeId,
        geometry: &Arc<Geometry>,
        stats: &mut FrameStats,
    ) -> Result<([D::Buffer; 3], D::Buffer), RenderError> {
        let retained = self.config.upload_policy == UploadPolicy::Retained;
        if retained {
            if let Some(kept) = self.geometries.get(&id) {
                if Arc::ptr_eq(&kept.geometry, geometry) {
                    return Ok((kept.vertex_buffers.clone(), kept.index_buffer.clone()));
                }
            }
        }

        let vertex_buffers = [
            self.vertex_buffer("Position Buffer", geometry.positions(), stats)?,
            self.vertex_buffer("Normal Buffer", &geometry.normals_or_zeroed(), stats)?,
            self.vertex_buffer("Tex Coord Buffer", &geometry.tex_coords_or_zeroed(), stats)?,
        ];
        let indices: &[u8] = bytemuck::cast_slice(geometry.indices());
        let index_buffer =
            self.device
                .create_buffer_init("Index Buffer", indices, wgpu::BufferUsages::INDEX)?;
        stats.buffers_created += 1;
        stats.bytes_written += indices.len() as u64;

        if retained {
            self.geometries.insert(
                id,
                RetainedGeometry {
                    geometry: geometry.clone(),
                    vertex_buffers: vertex_buffers.clone(),
                    index_buffer: index_buffer.clone(),
                },
            );
        }
        Ok((vertex_buffers, index_buffer))
    }

    fn vertex_buffer(
        &mut self,
        label: &str,
        data: &[f32],
        stats: &mut FrameStats,
    ) -> Result<D::Buffer, RenderError> {
        let contents: &[u8] = bytemuck::cast_slice(data);
        let buffer = self
            .device
            .create_buffer_init(label, contents, wgpu::BufferUsages::VERTEX)?;
        stats.buffers_created += 1;
        stats.bytes_written += contents.len() as u64;
        Ok(buffer)
    }
}

fn instance_uniform(
    id: NodeId,
    view: &Matrix4<f32>,
    transform: &Transform,
) -> Result<TransformUniform, RenderError> {
    let world = transform.world_matrix();
    if !is_finite(world) {
        return Err(RenderError::DegenerateTransform {
            node: id,
            matrix: "world",
        });
    }
    let uniform = TransformUniform::new(view, world);
    if !is_finite(&uniform.normal()) {
        return Err(RenderError::DegenerateTransform {
            node: id,
            matrix: "normal",
        });
    }
    Ok(uniform)
}
