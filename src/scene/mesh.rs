//! Mesh generation for scene surfaces
//!
//! Generates vertex and index data for planes and spheres. UVs follow the
//! bottom-up convention (v = 1 is the top of the image); the shader flips v.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};

use super::surface::Shape;

/// Vertex for scene meshes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct SceneVertex {
    /// Position in local space
    pub position: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Normal vector (for lighting)
    pub normal: [f32; 3],
}

impl SceneVertex {
    /// Size of vertex in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 20,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Generated mesh data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<SceneVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Mesh for a built-in shape; model shapes come from their asset instead
    pub fn for_shape(shape: &Shape) -> Option<Self> {
        match *shape {
            Shape::Plane { width, height } => Some(Self::plane(width, height)),
            Shape::Sphere {
                radius,
                width_segments,
                height_segments,
                inverted,
            } => {
                let mesh = Self::sphere(radius, width_segments, height_segments);
                Some(if inverted { mesh.mirrored_x() } else { mesh })
            }
            Shape::Model(_) => None,
        }
    }

    /// Rectangle in the XY plane facing +Z, centred on the origin
    pub fn plane(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            SceneVertex { position: [-hw, hh, 0.0], uv: [0.0, 1.0], normal },
            SceneVertex { position: [hw, hh, 0.0], uv: [1.0, 1.0], normal },
            SceneVertex { position: [-hw, -hh, 0.0], uv: [0.0, 0.0], normal },
            SceneVertex { position: [hw, -hh, 0.0], uv: [1.0, 0.0], normal },
        ];
        // CCW when viewed from +Z
        let indices = vec![0, 2, 1, 2, 3, 1];
        Self { vertices, indices }
    }

    /// UV sphere with outward-facing triangles
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.clamp(3, 256);
        let height_segments = height_segments.clamp(2, 256);
        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut indices = Vec::new();

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let x = -radius * (u * TAU).cos() * (v * PI).sin();
                let y = radius * (v * PI).cos();
                let z = radius * (u * TAU).sin() * (v * PI).sin();
                let len = (x * x + y * y + z * z).sqrt().max(f32::EPSILON);

                vertices.push(SceneVertex {
                    position: [x, y, z],
                    uv: [u, 1.0 - v],
                    normal: [x / len, y / len, z / len],
                });
            }
        }

        let row = width_segments + 1;
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // The pole rows collapse to single triangles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Mirror across X. The mirror reverses apparent winding, so the inside
    /// of a closed mesh becomes the front face.
    pub fn mirrored_x(mut self) -> Self {
        for vertex in &mut self.vertices {
            vertex.position[0] = -vertex.position[0];
            vertex.normal[0] = -vertex.normal[0];
        }
        self
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_mesh() {
        let mesh = MeshData::plane(100.0, 50.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertices[0].position, [-50.0, 25.0, 0.0]);
    }

    #[test]
    fn test_sphere_mesh() {
        let mesh = MeshData::sphere(5.0, 8, 4);
        // (height_segments + 1) * (width_segments + 1) vertices
        assert_eq!(mesh.vertex_count(), 45);
        // Pole rows contribute one triangle per segment, the rest two
        assert_eq!(mesh.index_count(), (8 + 8 + 2 * 8 * 2) * 3);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            assert!(((x * x + y * y + z * z).sqrt() - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_inverted_sphere_mirrors_x() {
        let shape = Shape::Sphere {
            radius: 150.0,
            width_segments: 16,
            height_segments: 8,
            inverted: true,
        };
        let inverted = MeshData::for_shape(&shape).unwrap();
        let plain = MeshData::sphere(150.0, 16, 8);
        assert_eq!(inverted.indices, plain.indices);
        for (a, b) in inverted.vertices.iter().zip(&plain.vertices) {
            assert_eq!(a.position[0], -b.position[0]);
            assert_eq!(a.position[1], b.position[1]);
        }
    }

    #[test]
    fn test_model_shape_has_no_builtin_mesh() {
        assert!(MeshData::for_shape(&Shape::Model(crate::assets::AssetId(0))).is_none());
    }
}
