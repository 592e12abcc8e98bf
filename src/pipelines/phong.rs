//! The lit pipeline: three vertex streams, one bind group with four buffers
//! and depth-tested, back-face-culled triangle lists.

use crate::{
    data_structures::texture::Texture,
    device::{BindingKind, PipelineDescriptor, UniformSlot, VertexStream},
    pipelines::{FRAGMENT_ENTRY, Shader, VERTEX_ENTRY},
};

pub const POSITION: VertexStream = VertexStream {
    location: 0,
    format: wgpu::VertexFormat::Float32x3,
};
pub const NORMAL: VertexStream = VertexStream {
    location: 1,
    format: wgpu::VertexFormat::Float32x3,
};
pub const TEX_COORDS: VertexStream = VertexStream {
    location: 2,
    format: wgpu::VertexFormat::Float32x2,
};

pub const VERTEX_STREAMS: [VertexStream; 3] = [POSITION, NORMAL, TEX_COORDS];

/// View, per-instance transforms, light and material, in binding order.
pub const UNIFORM_SLOTS: [UniformSlot; 4] = [
    UniformSlot {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX,
        kind: BindingKind::Uniform,
    },
    // read-only storage: one 128 byte block per instance
    UniformSlot {
        binding: 1,
        visibility: wgpu::ShaderStages::VERTEX,
        kind: BindingKind::ReadOnlyStorage,
    },
    UniformSlot {
        binding: 2,
        visibility: wgpu::ShaderStages::FRAGMENT,
        kind: BindingKind::Uniform,
    },
    UniformSlot {
        binding: 3,
        visibility: wgpu::ShaderStages::FRAGMENT,
        kind: BindingKind::Uniform,
    },
];

pub fn descriptor<'a>(label: &'a str, shader: &'a Shader) -> PipelineDescriptor<'a> {
    PipelineDescriptor {
        label,
        shader,
        vertex_streams: &VERTEX_STREAMS,
        uniform_slots: &UNIFORM_SLOTS,
        depth_compare: wgpu::CompareFunction::Less,
        cull_mode: Some(wgpu::Face::Back),
        front_face: wgpu::FrontFace::Ccw,
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device, slots: &[UniformSlot]) -> wgpu::BindGroupLayout {
    let entries: Vec<_> = slots
        .iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: slot.visibility,
            ty: wgpu::BindingType::Buffer {
                ty: match slot.kind {
                    BindingKind::Uniform => wgpu::BufferBindingType::Uniform,
                    BindingKind::ReadOnlyStorage => {
                        wgpu::BufferBindingType::Storage { read_only: true }
                    }
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform_bind_group_layout"),
        entries: &entries,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    slots: &[UniformSlot],
    buffers: [&wgpu::Buffer; 4],
) -> wgpu::BindGroup {
    let entries: Vec<_> = slots
        .iter()
        .zip(buffers)
        .map(|(slot, buffer)| wgpu::BindGroupEntry {
            binding: slot.binding,
            resource: buffer.as_entire_binding(),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_bind_group"),
        layout,
        entries: &entries,
    })
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
    descriptor: &PipelineDescriptor<'_>,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Render Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(descriptor.shader.label()),
        source: wgpu::ShaderSource::Wgsl(descriptor.shader.source().into()),
    });

    let attributes: Vec<[wgpu::VertexAttribute; 1]> = descriptor
        .vertex_streams
        .iter()
        .map(|stream| {
            [wgpu::VertexAttribute {
                offset: 0,
                shader_location: stream.location,
                format: stream.format,
            }]
        })
        .collect();
    let vertex_layouts: Vec<_> = descriptor
        .vertex_streams
        .iter()
        .zip(&attributes)
        .map(|(stream, attributes)| wgpu::VertexBufferLayout {
            array_stride: stream.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(descriptor.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: descriptor.front_face,
            cull_mode: descriptor.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: descriptor.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
