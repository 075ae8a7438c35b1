use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::backend::{TextureBackend, TextureId};
use crate::error::ShapeError;
use crate::raster::{TextureFormat, TextureImage};

fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: TextureFormat,
    size: u32,
    generation: u64,
}

/// Shape textures living on a wgpu device.
///
/// All textures are sampled through one clamp-to-edge, nearest sampler: the
/// texture layout assumes exact texel alignment with the geometry.
pub struct WgpuTextureBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    textures: RefCell<HashMap<TextureId, GpuTexture>>,
    next_id: Cell<u32>,
    next_generation: Cell<u64>,
}

impl WgpuTextureBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("contour shape sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            device: device.clone(),
            queue: queue.clone(),
            sampler,
            textures: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            next_generation: Cell::new(1),
        }
    }

    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// View of `id` for binding, if the texture is still alive.
    pub fn view(&self, id: TextureId) -> Option<wgpu::TextureView> {
        self.textures.borrow().get(&id).map(|t| t.view.clone())
    }

    /// Allocation generation of `id`; it changes whenever the texture is
    /// reallocated, so anything built from an older view is stale.
    pub fn generation(&self, id: TextureId) -> Option<u64> {
        self.textures.borrow().get(&id).map(|t| t.generation)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.borrow().len()
    }

    fn allocate(&self, format: TextureFormat, size: u32) -> Result<GpuTexture, ShapeError> {
        let max = self.max_texture_size();
        if size == 0 || size > max {
            return Err(ShapeError::TextureCreationFailed { size, max });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("contour shape texture"),
            size: wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);
        Ok(GpuTexture { texture, view, format, size, generation })
    }
}

impl TextureBackend for WgpuTextureBackend {
    fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_texture(&self, format: TextureFormat, size: u32) -> Result<TextureId, ShapeError> {
        let tex = self.allocate(format, size)?;
        let id = TextureId::new(self.next_id.get());
        self.next_id.set(id.raw() + 1);
        self.textures.borrow_mut().insert(id, tex);
        Ok(id)
    }

    fn resize_texture(
        &self,
        id: TextureId,
        format: TextureFormat,
        size: u32,
    ) -> Result<(), ShapeError> {
        let tex = self.allocate(format, size)?;
        let old = self.textures.borrow_mut().insert(id, tex);
        match old {
            Some(old) => old.texture.destroy(),
            None => panic!("resize of unknown texture {id:?}"),
        }
        Ok(())
    }

    fn upload(&self, id: TextureId, image: &TextureImage) -> Result<(), ShapeError> {
        let textures = self.textures.borrow();
        let Some(tex) = textures.get(&id) else {
            panic!("upload to unknown texture {id:?}");
        };
        assert!(
            tex.format == image.format() && tex.size == image.size(),
            "upload of {:?} {} into {:?} {} texture {id:?}",
            image.format(),
            image.size(),
            tex.format,
            tex.size
        );

        let size = image.size();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.row_bytes() as u32),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
        );
        Ok(())
    }

    fn delete_textures(&self, ids: &[TextureId]) {
        let mut textures = self.textures.borrow_mut();
        for id in ids {
            if let Some(tex) = textures.remove(id) {
                tex.texture.destroy();
            }
        }
    }
}
