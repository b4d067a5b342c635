//! GPU textures for image and video asset slots
//!
//! Each bound slot gets its own texture and bind group. A slot is re-uploaded
//! whenever its generation in the [`AssetStore`] moves on, which is every new
//! video frame and every late image bind.

use std::collections::{HashMap, HashSet};

use crate::assets::{AssetId, AssetStore, ImageData};

/// What to do with a cached texture for the slot's current contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upload {
    Keep,
    Write,
    Recreate,
    /// Larger than the device allows; the slot samples the fallback
    TooLarge,
}

/// `cached` is the existing texture's (width, height, generation)
fn plan_upload(cached: Option<(u32, u32, u64)>, generation: u64, image: &ImageData, max_dimension: u32) -> Upload {
    if image.width > max_dimension || image.height > max_dimension {
        return Upload::TooLarge;
    }
    match cached {
        None => Upload::Recreate,
        Some((width, height, _)) if width != image.width || height != image.height => Upload::Recreate,
        Some((_, _, uploaded)) if uploaded != generation => Upload::Write,
        Some(_) => Upload::Keep,
    }
}

/// A texture with the bind group that samples it
pub struct AssetTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    generation: u64,
}

impl AssetTexture {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Asset Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Photos and decoded frames are sRGB encoded
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Asset Texture Bind Group"),
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
        });

        Self {
            texture,
            bind_group,
            width: width.max(1),
            height: height.max(1),
            generation: 0,
        }
    }

    /// Upload tightly packed RGBA8 data covering the whole texture
    fn upload(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Textures for every bound image slot, plus a white fallback
pub struct TextureCache {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blank: AssetTexture,
    textures: HashMap<AssetId, AssetTexture>,
    max_dimension: u32,
    /// Oversized slots already reported
    oversized: HashSet<AssetId>,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Asset Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Asset Texture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let blank = AssetTexture::new(device, &layout, &sampler, 1, 1);
        blank.upload(queue, &[255, 255, 255, 255]);

        Self {
            layout,
            sampler,
            blank,
            textures: HashMap::new(),
            max_dimension: device.limits().max_texture_dimension_2d,
            oversized: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Bring GPU textures in line with the store's image slots
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, assets: &AssetStore) {
        for id in assets.ids() {
            let Some(image) = assets.image(id).filter(|image| image.is_valid()) else {
                self.textures.remove(&id);
                continue;
            };
            let generation = assets.generation(id);

            let cached = self
                .textures
                .get(&id)
                .map(|texture| (texture.width, texture.height, texture.generation));
            match plan_upload(cached, generation, image, self.max_dimension) {
                Upload::Keep => continue,
                Upload::TooLarge => {
                    if self.oversized.insert(id) {
                        tracing::warn!(
                            asset = id.0,
                            "Image is {}x{}, larger than the GPU limit of {}; showing it blank",
                            image.width,
                            image.height,
                            self.max_dimension
                        );
                    }
                    self.textures.remove(&id);
                    continue;
                }
                Upload::Recreate => {
                    tracing::debug!(asset = id.0, "Creating {}x{} texture", image.width, image.height);
                    let texture = AssetTexture::new(device, &self.layout, &self.sampler, image.width, image.height);
                    self.textures.insert(id, texture);
                }
                Upload::Write => {}
            }

            if let Some(texture) = self.textures.get_mut(&id) {
                texture.upload(queue, &image.pixels);
                texture.generation = generation;
            }
        }
    }

    /// Bind group for a material's texture; unbound and unloaded slots sample white
    pub fn bind_group(&self, texture: Option<AssetId>) -> &wgpu::BindGroup {
        texture
            .and_then(|id| self.textures.get(&id))
            .map_or(&self.blank.bind_group, |texture| &texture.bind_group)
    }

    /// Forget every slot; asset ids restart when a page is rebuilt
    pub fn clear(&mut self) {
        self.textures.clear();
        self.oversized.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
