//! Render target textures.

/// A GPU texture together with its default view.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Depth with an 8 bit stencil plane; passes clear both.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Create a depth-stencil texture matching a `size` = [width, height] colour target.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        Self::create_attachment(device, size, label, Self::DEPTH_FORMAT, wgpu::TextureUsages::empty())
    }

    /// Create an offscreen colour target that can be copied back to the CPU.
    pub fn create_color_target(
        device: &wgpu::Device,
        size: [u32; 2],
        label: &str,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::create_attachment(device, size, label, format, wgpu::TextureUsages::COPY_SRC)
    }

    fn create_attachment(
        device: &wgpu::Device,
        size: [u32; 2],
        label: &str,
        format: wgpu::TextureFormat,
        extra_usage: wgpu::TextureUsages,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | extra_usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}
