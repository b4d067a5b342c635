//! Renderable surfaces: shape, transform and material

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::assets::AssetId;

/// Handle to a surface stored in a [`super::Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Geometry of a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rectangle in the local XY plane, facing +Z
    Plane { width: f32, height: f32 },
    /// UV sphere; `inverted` mirrors it so the inside faces are the visible ones
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        inverted: bool,
    },
    /// Mesh taken from a loaded model asset
    Model(AssetId),
}

/// Which faces are visible (and hit-testable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Position, Euler rotation (XYZ order, radians) and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Bound texture; `None` (or an asset that has not loaded) renders blank white
    pub texture: Option<AssetId>,
    /// Linear RGB tint
    pub color: [f32; 3],
    pub opacity: f32,
    /// Drawn in the blended pass, back to front
    pub transparent: bool,
    pub side: Side,
    /// Multiplier applied to the sampled colour
    pub exposure: f32,
    /// Fragments with alpha below this value are discarded
    pub alpha_cutoff: f32,
    /// Responds to scene lighting
    pub lit: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            texture: None,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            exposure: 1.0,
            alpha_cutoff: 0.0,
            lit: false,
        }
    }
}

impl Material {
    /// Unlit material showing a texture
    pub fn textured(texture: AssetId) -> Self {
        Self {
            texture: Some(texture),
            ..Self::default()
        }
    }

    pub fn with_transparency(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// A renderable object in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Name used in logs
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub material: Material,
}

impl Surface {
    pub fn new(name: impl Into<String>, shape: Shape, material: Material) -> Self {
        Self {
            name: name.into(),
            shape,
            transform: Transform::default(),
            material,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_transform_applies_translation_and_scale() {
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
            scale: Vec3::new(2.0, 2.0, 1.0),
        };
        let p = transform.matrix().transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((p - Vec3::new(12.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_half_turn_about_x_flips_facing() {
        let transform = Transform {
            rotation: Vec3::new(-std::f32::consts::PI, 0.0, 0.0),
            ..Transform::default()
        };
        let normal = transform.matrix().transform_vector3(Vec3::Z);
        assert!((normal.z + 1.0).abs() < 1e-5);
    }
}
