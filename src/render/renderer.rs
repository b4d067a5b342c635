//! Scene renderer
//!
//! Draws the attached surfaces of a [`Scene`] into the window surface.
//! Opaque surfaces go first in insertion order, then transparent ones from
//! farthest to nearest. Per-surface data lives in one uniform buffer indexed
//! with dynamic offsets.

use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use super::texture::TextureCache;
use crate::assets::{AssetId, AssetStore};
use crate::scene::{Material, MeshData, PerspectiveCamera, Scene, SceneVertex, Shape, Side, Surface, SurfaceId};
use crate::shaders::SCENE_SHADER;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera and lighting, shared by every draw
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    /// xyz towards the light, w intensity
    light_dir: [f32; 4],
    /// x ambient intensity
    ambient: [f32; 4],
}

/// Transform and material of one surface
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SurfaceUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    /// rgb tint, a opacity
    color: [f32; 4],
    /// exposure, alpha cutoff, lit, unused
    params: [f32; 4],
}

impl SurfaceUniforms {
    fn new(surface: &Surface) -> Self {
        let model = surface.transform.matrix();
        let material = &surface.material;
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: [material.color[0], material.color[1], material.color[2], material.opacity],
            params: [
                material.exposure,
                material.alpha_cutoff,
                if material.lit { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// Cache key for generated and loaded meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MeshKey {
    Plane { width: u32, height: u32 },
    Sphere { radius: u32, width_segments: u32, height_segments: u32, inverted: bool },
    Model(AssetId),
}

impl MeshKey {
    fn for_shape(shape: &Shape) -> Self {
        match *shape {
            Shape::Plane { width, height } => MeshKey::Plane {
                width: width.to_bits(),
                height: height.to_bits(),
            },
            Shape::Sphere {
                radius,
                width_segments,
                height_segments,
                inverted,
            } => MeshKey::Sphere {
                radius: radius.to_bits(),
                width_segments,
                height_segments,
                inverted,
            },
            Shape::Model(asset) => MeshKey::Model(asset),
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Pipeline variant a material needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    side: Side,
    transparent: bool,
}

impl PipelineKey {
    const ALL: [PipelineKey; 4] = [
        PipelineKey { side: Side::Front, transparent: false },
        PipelineKey { side: Side::Front, transparent: true },
        PipelineKey { side: Side::Double, transparent: false },
        PipelineKey { side: Side::Double, transparent: true },
    ];

    fn for_material(material: &Material) -> Self {
        Self {
            side: material.side,
            transparent: material.transparent,
        }
    }
}

/// Attached surfaces in draw order: opaque by insertion, then transparent
/// back to front as seen from `eye`
pub fn draw_order(scene: &Scene, eye: Vec3) -> Vec<SurfaceId> {
    let mut opaque = Vec::new();
    let mut transparent = Vec::new();
    for (id, surface) in scene.attached() {
        if surface.material.transparent {
            transparent.push((id, surface.transform.position.distance_squared(eye)));
        } else {
            opaque.push(id);
        }
    }
    // Stable, so equally distant surfaces keep insertion order
    transparent.sort_by(|a, b| b.1.total_cmp(&a.1));
    opaque.extend(transparent.into_iter().map(|(id, _)| id));
    opaque
}

/// Round `size` up to a multiple of `alignment`
fn aligned(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Draws a [`Scene`] to the window
pub struct SceneRenderer {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    surface_layout: wgpu::BindGroupLayout,
    surface_buffer: wgpu::Buffer,
    surface_bind_group: wgpu::BindGroup,
    /// Byte distance between consecutive surfaces in `surface_buffer`
    surface_stride: u64,
    /// Surfaces `surface_buffer` has room for
    surface_capacity: usize,

    textures: TextureCache,
    meshes: HashMap<MeshKey, GpuMesh>,

    depth_view: Option<wgpu::TextureView>,
    depth_size: (u32, u32),
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let surface_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Surface Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<SurfaceUniforms>() as u64),
                },
                count: None,
            }],
        });

        let textures = TextureCache::new(device, queue);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, textures.layout(), &surface_layout],
            push_constant_ranges: &[],
        });

        let pipelines = PipelineKey::ALL
            .into_iter()
            .map(|key| (key, Self::create_pipeline(device, &pipeline_layout, &shader, color_format, key)))
            .collect();

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Frame Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let surface_stride = aligned(
            std::mem::size_of::<SurfaceUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let surface_capacity = 16;
        let (surface_buffer, surface_bind_group) =
            Self::create_surface_buffer(device, &surface_layout, surface_stride, surface_capacity);

        Self {
            pipelines,
            frame_buffer,
            frame_bind_group,
            surface_layout,
            surface_buffer,
            surface_bind_group,
            surface_stride,
            surface_capacity,
            textures,
            meshes: HashMap::new(),
            depth_view: None,
            depth_size: (0, 0),
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
        key: PipelineKey,
    ) -> wgpu::RenderPipeline {
        let blend = if key.transparent {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };
        let cull_mode = match key.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Double => None,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[SceneVertex::buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            // LessEqual so coplanar surfaces added later draw over earlier ones
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_surface_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Surface Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Surface Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<SurfaceUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Drop every asset-backed texture and mesh. Call after the page is
    /// rebuilt, since a new page reuses asset ids.
    pub fn reset_assets(&mut self) {
        self.textures.clear();
        self.meshes.retain(|key, _| !matches!(key, MeshKey::Model(_)));
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.depth_view.is_some() && self.depth_size == size {
            return;
        }
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        self.depth_view = Some(depth_texture.create_view(&Default::default()));
        self.depth_size = size;
    }

    /// Make sure the surface's mesh is on the GPU. Models that have not
    /// loaded yet return `None` and are skipped this frame.
    fn ensure_mesh(&mut self, device: &wgpu::Device, shape: &Shape, assets: &AssetStore) -> Option<MeshKey> {
        let key = MeshKey::for_shape(shape);
        if self.meshes.contains_key(&key) {
            return Some(key);
        }
        let mesh = match shape {
            Shape::Model(asset) => assets.mesh(*asset)?.clone(),
            other => MeshData::for_shape(other)?,
        };
        if mesh.indices.is_empty() {
            return None;
        }
        self.meshes.insert(key, GpuMesh::new(device, &mesh));
        Some(key)
    }

    fn grow_surface_buffer(&mut self, device: &wgpu::Device, needed: usize) {
        if needed <= self.surface_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_surface_buffer(device, &self.surface_layout, self.surface_stride, capacity);
        self.surface_buffer = buffer;
        self.surface_bind_group = bind_group;
        self.surface_capacity = capacity;
        tracing::debug!(capacity, "Grew surface uniform buffer");
    }

    /// Draw one frame and present it
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &Scene,
        camera: &PerspectiveCamera,
        assets: &AssetStore,
    ) -> Result<(), wgpu::SurfaceError> {
        let device = &gpu.device;
        let queue = &gpu.queue;
        let (width, height) = gpu.size();

        self.textures.sync(device, queue, assets);
        self.ensure_depth(device, width, height);

        let mut draws = Vec::new();
        for id in draw_order(scene, camera.eye) {
            let Some(surface) = scene.get(id) else {
                continue;
            };
            if let Some(mesh) = self.ensure_mesh(device, &surface.shape, assets) {
                draws.push((surface, mesh));
            }
        }

        let (light_dir, light_intensity) = scene
            .lighting
            .directional
            .map_or((Vec3::Y, 0.0), |(direction, intensity)| {
                (direction.try_normalize().unwrap_or(Vec3::Y), intensity)
            });
        let frame = FrameUniforms {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).into(),
            light_dir: light_dir.extend(light_intensity).into(),
            ambient: [scene.lighting.ambient, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        self.grow_surface_buffer(device, draws.len());
        let stride = self.surface_stride as usize;
        let mut staging = vec![0u8; stride * draws.len()];
        for (index, (surface, _)) in draws.iter().enumerate() {
            let uniforms = SurfaceUniforms::new(surface);
            let start = index * stride;
            staging[start..start + std::mem::size_of::<SurfaceUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !staging.is_empty() {
            queue.write_buffer(&self.surface_buffer, 0, &staging);
        }

        let output = gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });

        {
            let [r, g, b, a] = scene.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: self.depth_view.as_ref().map(|depth_view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Discard,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (index, (surface, mesh_key)) in draws.iter().enumerate() {
                let (Some(pipeline), Some(mesh)) = (
                    self.pipelines.get(&PipelineKey::for_material(&surface.material)),
                    self.meshes.get(mesh_key),
                ) else {
                    continue;
                };
                let offset = (index as u64 * self.surface_stride) as u32;

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, self.textures.bind_group(surface.material.texture), &[]);
                render_pass.set_bind_group(2, &self.surface_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Transform};
    use glam::Mat4;

    fn plane_at(name: &str, z: f32, material: Material) -> Surface {
        Surface::new(name, Shape::Plane { width: 10.0, height: 10.0 }, material)
            .with_transform(Transform::at(Vec3::new(0.0, 0.0, z)))
    }

    #[test]
    fn test_opaque_first_then_transparent_back_to_front() {
        let mut scene = Scene::new();
        let near = scene.add(plane_at("near", 50.0, Material::default().with_transparency()));
        let opaque = scene.add(plane_at("opaque", 0.0, Material::default()));
        let far = scene.add(plane_at("far", -50.0, Material::default().with_transparency()));
        let hidden = scene.add_detached(plane_at("hidden", 10.0, Material::default()));

        let order = draw_order(&scene, Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(order, vec![opaque, far, near]);
        assert!(!order.contains(&hidden));
    }

    #[test]
    fn test_equal_depth_transparent_keeps_insertion_order() {
        let mut scene = Scene::new();
        let first = scene.add(plane_at("first", -75.0, Material::default().with_transparency()));
        let second = scene.add(plane_at("second", -75.0, Material::default().with_transparency()));
        assert_eq!(draw_order(&scene, Vec3::new(0.0, 0.0, 400.0)), vec![first, second]);
    }

    #[test]
    fn test_uniform_stride_alignment() {
        assert_eq!(aligned(160, 256), 256);
        assert_eq!(aligned(256, 256), 256);
        assert_eq!(aligned(300, 256), 512);
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 160);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn test_mesh_key_distinguishes_inverted_spheres() {
        let outward = Shape::Sphere {
            radius: 150.0,
            width_segments: 60,
            height_segments: 40,
            inverted: false,
        };
        let inward = Shape::Sphere {
            radius: 150.0,
            width_segments: 60,
            height_segments: 40,
            inverted: true,
        };
        assert_ne!(MeshKey::for_shape(&outward), MeshKey::for_shape(&inward));
        assert_eq!(MeshKey::for_shape(&inward), MeshKey::for_shape(&inward));
    }

    #[test]
    fn test_surface_uniforms_pack_material() {
        let mut material = Material::default().with_transparency();
        material.opacity = 0.5;
        material.exposure = 1.2;
        material.alpha_cutoff = 0.1;
        material.lit = true;
        let uniforms = SurfaceUniforms::new(&plane_at("p", 0.0, material));
        assert_eq!(uniforms.color, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(uniforms.params, [1.2, 0.1, 1.0, 0.0]);
        assert_eq!(uniforms.model, Mat4::IDENTITY.to_cols_array_2d());
    }
}
