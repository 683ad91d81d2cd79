use crate::targets::{AllocationError, TargetAllocator, TargetDesc, TargetFormat};

pub fn texture_format(format: TargetFormat) -> wgpu::TextureFormat {
    match format {
        TargetFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TargetFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TargetFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

/// Texture storage of one render target.
#[derive(Debug)]
pub struct GpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

/// Creates render target textures on a device.
pub struct GpuTargetAllocator {
    device: wgpu::Device,
    max_dimension: u32,
}

impl GpuTargetAllocator {
    pub fn new(device: wgpu::Device) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self {
            device,
            max_dimension,
        }
    }
}

impl TargetAllocator for GpuTargetAllocator {
    type Storage = GpuTarget;

    fn create(
        &mut self,
        desc: &TargetDesc,
        width: u32,
        height: u32,
    ) -> Result<GpuTarget, AllocationError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(AllocationError::ExceedsLimit {
                width,
                height,
                max: self.max_dimension,
            });
        }

        let format = texture_format(desc.format);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.kind.label()),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            // Mip chains are never generated; every target is sampled at level 0.
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuTarget {
            texture,
            view,
            format,
        })
    }
}
