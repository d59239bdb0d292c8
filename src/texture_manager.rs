use crate::id::TextureId;
use crate::texture::DecodedImage;
use ahash::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TextureManagerError {
    #[error("texture {0} is not loaded")]
    TextureNotFound(TextureId),
    #[error("texture {id} expects {expected} bytes, got {actual}")]
    SizeMismatch {
        id: TextureId,
        expected: usize,
        actual: usize,
    },
}

struct StoredTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    dimensions: (u32, u32),
}

/// GPU copies of decoded images plus the bind groups that sample them.
///
/// Untextured draws still need something bound at the texture slot; they get a 1x1 white
/// texture so the shader can multiply unconditionally.
pub struct TextureManager {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    textures: HashMap<TextureId, StoredTexture>,
    default_bind_group: wgpu::BindGroup,
}

impl TextureManager {
    pub(crate) fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        bind_group_layout: wgpu::BindGroupLayout,
    ) -> Self {
        let sampler = Self::create_sampler(&device);
        let white = Self::create_texture(&device, (1, 1), "default_white_texture");
        Self::write_texture(&queue, &white, (1, 1), &[255, 255, 255, 255]);
        let default_bind_group =
            Self::create_bind_group(&device, &bind_group_layout, &sampler, &white);

        Self {
            device,
            queue,
            sampler,
            bind_group_layout,
            textures: HashMap::default(),
            default_bind_group,
        }
    }

    fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("card_texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        })
    }

    fn create_texture(device: &wgpu::Device, dimensions: (u32, u32), label: &str) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: dimensions.0,
                height: dimensions.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_texture(
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        dimensions: (u32, u32),
        data: &[u8],
    ) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            wgpu::Extent3d {
                width: dimensions.0,
                height: dimensions.1,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        texture: &wgpu::Texture,
    ) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("card_texture_bind_group"),
        })
    }

    /// Uploads `image` under `id`, replacing any texture already stored there.
    pub fn allocate_texture_with_data(
        &mut self,
        id: TextureId,
        image: &DecodedImage,
    ) -> Result<(), TextureManagerError> {
        let dimensions = (image.width, image.height);
        let expected = dimensions.0 as usize * dimensions.1 as usize * 4;
        if image.pixels.len() != expected {
            return Err(TextureManagerError::SizeMismatch {
                id,
                expected,
                actual: image.pixels.len(),
            });
        }

        let texture = match self.textures.get(&id) {
            Some(stored) if stored.dimensions == dimensions => {
                Self::write_texture(&self.queue, &stored.texture, dimensions, &image.pixels);
                return Ok(());
            }
            _ => Self::create_texture(&self.device, dimensions, "card_image_texture"),
        };
        Self::write_texture(&self.queue, &texture, dimensions, &image.pixels);
        let bind_group =
            Self::create_bind_group(&self.device, &self.bind_group_layout, &self.sampler, &texture);
        tracing::debug!(%id, width = dimensions.0, height = dimensions.1, "texture uploaded");

        self.textures.insert(
            id,
            StoredTexture {
                texture,
                bind_group,
                dimensions,
            },
        );
        Ok(())
    }

    pub fn is_texture_loaded(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn texture_dimensions(&self, id: TextureId) -> Result<(u32, u32), TextureManagerError> {
        self.textures
            .get(&id)
            .map(|stored| stored.dimensions)
            .ok_or(TextureManagerError::TextureNotFound(id))
    }

    /// Drops every texture except `keep`.
    pub fn retain_only(&mut self, keep: Option<TextureId>) {
        self.textures.retain(|id, _| Some(*id) == keep);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// The bind group for `id`, or the white fallback when nothing is loaded under it.
    pub(crate) fn bind_group(&self, id: Option<TextureId>) -> &wgpu::BindGroup {
        id.and_then(|id| self.textures.get(&id))
            .map(|stored| &stored.bind_group)
            .unwrap_or(&self.default_bind_group)
    }
}
