#![allow(dead_code)]

use std::sync::Arc;

use cgmath::{Deg, Matrix4, Vector3};
use phong_ngin::{
    data_structures::{
        geometry::Geometry,
        light::PointLight,
        material::{Material, PhongMaterial},
        scene_graph::{CameraNode, LightNode, MeshNode, Scene},
    },
    device::{CommandList, GraphicsDevice, PipelineDescriptor},
    error::RenderError,
};

/// Buffers are plain indices into [`RecordingDevice::buffers`].
pub type BufferId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedBuffer {
    pub label: String,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
    pub contents: Vec<u8>,
    pub writes: usize,
}

impl RecordedBuffer {
    pub fn floats(&self) -> Vec<f32> {
        self.contents
            .chunks_exact(4)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect()
    }
}

/// A [`GraphicsDevice`] that only remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub buffers: Vec<RecordedBuffer>,
    pub pipelines: Vec<String>,
    pub submissions: Vec<CommandList<BufferId>>,
    pub fail_pipeline: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_pipeline: true,
            ..Self::default()
        }
    }

    pub fn buffer(&self, id: BufferId) -> &RecordedBuffer {
        &self.buffers[id]
    }

    pub fn last_submission(&self) -> &CommandList<BufferId> {
        self.submissions.last().expect("nothing was submitted")
    }

    pub fn total_writes(&self) -> usize {
        self.buffers.iter().map(|b| b.writes).sum()
    }
}

impl GraphicsDevice for RecordingDevice {
    type Buffer = BufferId;
    type Pipeline = String;

    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId, RenderError> {
        self.buffers.push(RecordedBuffer {
            label: label.to_string(),
            size: contents.len() as u64,
            usage,
            contents: contents.to_vec(),
            writes: 0,
        });
        Ok(self.buffers.len() - 1)
    }

    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<BufferId, RenderError> {
        self.buffers.push(RecordedBuffer {
            label: label.to_string(),
            size,
            usage,
            contents: vec![0; size as usize],
            writes: 0,
        });
        Ok(self.buffers.len() - 1)
    }

    fn write_buffer(&mut self, buffer: &BufferId, offset: u64, data: &[u8]) {
        let buffer = &mut self.buffers[*buffer];
        let offset = offset as usize;
        buffer.contents[offset..offset + data.len()].copy_from_slice(data);
        buffer.writes += 1;
    }

    fn create_pipeline(&mut self, descriptor: &PipelineDescriptor<'_>) -> Result<String, RenderError> {
        if self.fail_pipeline {
            return Err(RenderError::ResourceCreation {
                resource: descriptor.label.to_string(),
                reason: "out of memory".to_string(),
            });
        }
        self.pipelines.push(descriptor.label.to_string());
        Ok(descriptor.label.to_string())
    }

    fn submit(&mut self, _: &String, commands: CommandList<BufferId>) -> Result<(), RenderError> {
        self.submissions.push(commands);
        Ok(())
    }
}

pub fn camera() -> CameraNode {
    CameraNode::new(
        Vector3::new(0.0, 2.0, 5.0),
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
        16.0 / 9.0,
        Deg(45.0),
        0.1,
        100.0,
    )
}

pub fn phong() -> Arc<Material> {
    Arc::new(PhongMaterial::new([0.5, 0.5, 0.9], [0.4, 0.5, 0.2], 8.0).into())
}

pub fn cube() -> Arc<Geometry> {
    Arc::new(Geometry::cube(1.0))
}

pub fn light() -> LightNode {
    LightNode::new(PointLight::new([0.0, 0.0, 5.0], [1.0, 1.0, 1.0], 1.0))
}

/// A camera, one light and one cube.
pub fn lit_cube_scene() -> Scene {
    let mut scene = Scene::with_camera(camera());
    scene.add_node(light());
    scene.add_node(MeshNode::new(cube(), phong()));
    scene
}

pub fn assert_matrix_eq(actual: &Matrix4<f32>, expected: &Matrix4<f32>, epsilon: f32) {
    let actual: &[[f32; 4]; 4] = actual.as_ref();
    let expected: &[[f32; 4]; 4] = expected.as_ref();
    for (a, e) in actual.iter().flatten().zip(expected.iter().flatten()) {
        approx::assert_abs_diff_eq!(*a, *e, epsilon = epsilon);
    }
}

pub fn matrix_from_floats(floats: &[f32]) -> Matrix4<f32> {
    let mut cols = [[0.0; 4]; 4];
    for (i, v) in floats.iter().take(16).enumerate() {
        cols[i / 4][i % 4] = *v;
    }
    cols.into()
}
