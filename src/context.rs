//! The wgpu side of the engine.
//!
//! [`Context`] owns the device, the queue, the render target and its depth
//! buffer, and implements [`GraphicsDevice`] so a
//! [`Renderer`](crate::render::Renderer) can drive it. A context either
//! presents to a window surface ([`Context::new`]) or renders into an
//! off-screen texture that can be read back ([`Context::headless`]).

use std::{iter, sync::Arc, time::Duration};

use anyhow::anyhow;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    data_structures::texture::Texture,
    device::{CommandList, DrawCommand, GraphicsDevice, PipelineDescriptor, UniformSlot},
    error::RenderError,
    pipelines::phong,
};

/// Where finished frames go.
#[derive(Debug)]
pub enum RenderTarget {
    Surface {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
    },
    Texture(Texture),
}

/// A pipeline together with the layout of its single bind group.
#[derive(Debug)]
pub struct WgpuPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_slots: Vec<UniformSlot>,
}

#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) target: RenderTarget,
    pub(crate) depth_texture: Texture,
}

impl Context {
    /// Sets up a device that presents to `window`.
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = mk_instance();
        let surface = instance.create_surface(window.clone())?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colours, an sRGB surface does the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("the surface supports no texture formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            device,
            queue,
            config,
            target: RenderTarget::Surface { window, surface },
            depth_texture,
        })
    }

    /// Sets up a device that renders into a `width` × `height` RGBA texture.
    pub async fn headless(width: u32, height: u32) -> anyhow::Result<Self> {
        log::info!("WGPU setup (headless)");
        let instance = mk_instance();
        let (_, device, queue) = request_device(&instance, None).await?;

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let target = Texture::create_color_target(
            &device,
            [config.width, config.height],
            "offscreen_target",
            format,
        );
        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            device,
            queue,
            config,
            target: RenderTarget::Texture(target),
            depth_texture,
        })
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        match &self.target {
            RenderTarget::Surface { window, .. } => Some(window),
            RenderTarget::Texture(_) => None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the target and the depth buffer. Zero sizes (minimised
    /// windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        match &mut self.target {
            RenderTarget::Surface { surface, .. } => surface.configure(&self.device, &self.config),
            RenderTarget::Texture(texture) => {
                *texture = Texture::create_color_target(
                    &self.device,
                    [width, height],
                    "offscreen_target",
                    self.config.format,
                )
            }
        }
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    /// Copies the off-screen target back to the CPU as tightly packed RGBA
    /// rows.
    pub fn read_pixels(&self) -> anyhow::Result<Vec<u8>> {
        let RenderTarget::Texture(target) = &self.target else {
            anyhow::bail!("only headless contexts can be read back");
        };
        let (width, height) = self.size();
        let unpadded_row = 4 * width;
        let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // the receiver only goes away if reading was abandoned
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })?;
        futures::executor::block_on(rx.receive())
            .ok_or_else(|| anyhow!("the readback buffer was never mapped"))??;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded_row as usize)
                .flat_map(|row| &row[..unpadded_row as usize])
                .copied()
                .collect()
        };
        output_buffer.unmap();
        Ok(pixels)
    }

    fn check_buffer_size(
        &self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<(), RenderError> {
        let limits = self.device.limits();
        let max = if usage.contains(wgpu::BufferUsages::STORAGE) {
            limits.max_buffer_size.min(limits.max_storage_buffer_binding_size as u64)
        } else {
            limits.max_buffer_size
        };
        if size > max {
            return Err(RenderError::ResourceCreation {
                resource: label.to_string(),
                reason: format!("{size} bytes exceed the device limit of {max}"),
            });
        }
        Ok(())
    }

    /// One bind group per draw, or `None` when the draw has nothing to rasterise.
    fn bind_group(
        &self,
        pipeline: &WgpuPipeline,
        draw: &DrawCommand<wgpu::Buffer>,
    ) -> Option<wgpu::BindGroup> {
        let empty_buffer = draw
            .vertex_buffers
            .iter()
            .chain([&draw.index_buffer, &draw.uniforms.transforms])
            .any(|buffer| buffer.size() == 0);
        if draw.instance_count == 0 || draw.index_count == 0 || empty_buffer {
            log::warn!(
                "node {} has nothing to draw ({} instances, {} indices)",
                draw.node,
                draw.instance_count,
                draw.index_count
            );
            return None;
        }
        Some(phong::mk_bind_group(
            &self.device,
            &pipeline.bind_group_layout,
            &pipeline.uniform_slots,
            draw.uniforms.in_binding_order(),
        ))
    }
}

impl GraphicsDevice for Context {
    type Buffer = wgpu::Buffer;
    type Pipeline = WgpuPipeline;

    fn create_buffer_init(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, RenderError> {
        self.check_buffer_size(label, contents.len() as u64, usage)?;
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            }))
    }

    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, RenderError> {
        self.check_buffer_size(label, size, usage)?;
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        }))
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor<'_>,
    ) -> Result<WgpuPipeline, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group_layout = phong::mk_bind_group_layout(&self.device, descriptor.uniform_slots);
        let pipeline = phong::mk_render_pipeline(
            &self.device,
            self.config.format,
            &bind_group_layout,
            descriptor,
        );
        if let Some(error) = futures::executor::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ResourceCreation {
                resource: descriptor.label.to_string(),
                reason: error.to_string(),
            });
        }

        Ok(WgpuPipeline {
            pipeline,
            bind_group_layout,
            uniform_slots: descriptor.uniform_slots.to_vec(),
        })
    }

    fn submit(
        &mut self,
        pipeline: &WgpuPipeline,
        commands: CommandList<wgpu::Buffer>,
    ) -> Result<(), RenderError> {
        let (frame, view) = match &self.target {
            RenderTarget::Surface { surface, .. } => {
                let frame = surface.get_current_texture()?;
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(frame), view)
            }
            RenderTarget::Texture(texture) => (None, texture.view.clone()),
        };

        let bind_groups: Vec<_> = commands
            .draws()
            .map(|draw| self.bind_group(pipeline, draw))
            .collect();
        let mut bind_groups = bind_groups.iter();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(commands.label()),
            });
        for pass in commands.passes() {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.descriptor.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.descriptor.clear_depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.descriptor.clear_stencil),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&pipeline.pipeline);
            for draw in &pass.draws {
                let Some(bind_group) = bind_groups.next().and_then(Option::as_ref) else {
                    continue;
                };
                render_pass.set_bind_group(0, bind_group, &[]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                render_pass.set_index_buffer(draw.index_buffer.slice(..), draw.index_format);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..draw.instance_count);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        Ok(())
    }
}

fn mk_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
) -> anyhow::Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await?;
    log::info!("device and queue on {}", adapter.get_info().name);
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            ..Default::default()
        })
        .await?;
    Ok((adapter, device, queue))
}
