//! Ray hit-testing against scene surfaces
//!
//! Pointer positions arrive in device pixels, are mapped to normalized device
//! coordinates (y up) and unprojected through the camera.

use glam::{Vec2, Vec3};

use super::camera::PerspectiveCamera;
use super::graph::Scene;
use super::surface::{Shape, Side, Surface, SurfaceId};

/// Rays nearly parallel to a plane never hit it
const PARALLEL_EPSILON: f32 = 1e-8;

/// Convert a pixel position to normalized viewport coordinates in `[-1, 1]`.
///
/// Returns `None` for an empty viewport.
pub fn ndc_from_pixels(position: Vec2, width: f32, height: f32) -> Option<Vec2> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        position.x / width * 2.0 - 1.0,
        -(position.y / height * 2.0 - 1.0),
    ))
}

/// Half-line with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray from the camera through a point in normalized device coordinates
    pub fn from_camera(camera: &PerspectiveCamera, ndc: Vec2) -> Option<Self> {
        let inverse = camera.view_projection_matrix().inverse();
        if !inverse.is_finite() {
            return None;
        }
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - camera.eye).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        Some(Self {
            origin: camera.eye,
            direction,
        })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// A surface intersected by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub surface: SurfaceId,
    /// Distance along the ray in world units
    pub distance: f32,
    pub point: Vec3,
}

/// Distance along `ray` to `surface`, if it is hit.
///
/// Model surfaces are not pickable.
pub fn intersect(ray: &Ray, surface: &Surface) -> Option<f32> {
    let model = surface.transform.matrix();
    if model.determinant().abs() <= f32::EPSILON {
        return None;
    }
    let inverse = model.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);

    match surface.shape {
        Shape::Plane { width, height } => {
            if direction.z.abs() < PARALLEL_EPSILON {
                return None;
            }
            let t = -origin.z / direction.z;
            if t < 0.0 {
                return None;
            }
            let local = origin + direction * t;
            if local.x.abs() > width * 0.5 || local.y.abs() > height * 0.5 {
                return None;
            }
            if surface.material.side == Side::Front {
                let normal = inverse.transpose().transform_vector3(Vec3::Z);
                if ray.direction.dot(normal) >= 0.0 {
                    return None;
                }
            }
            Some(t)
        }
        Shape::Sphere { radius, .. } => {
            // |origin + t * direction|^2 = radius^2
            let a = direction.length_squared();
            let b = 2.0 * origin.dot(direction);
            let c = origin.length_squared() - radius * radius;
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 || a <= 0.0 {
                return None;
            }
            let root = discriminant.sqrt();
            let near = (-b - root) / (2.0 * a);
            let far = (-b + root) / (2.0 * a);
            if near >= 0.0 {
                Some(near)
            } else if far >= 0.0 {
                Some(far)
            } else {
                None
            }
        }
        Shape::Model(_) => None,
    }
}

/// Hit-test `candidates`, nearest first.
///
/// Candidates that are unknown or detached are skipped.
pub fn pick(scene: &Scene, ray: &Ray, candidates: &[SurfaceId]) -> Vec<Hit> {
    let mut hits: Vec<Hit> = candidates
        .iter()
        .filter(|id| scene.is_attached(**id))
        .filter_map(|id| {
            let surface = scene.get(*id)?;
            let distance = intersect(ray, surface)?;
            Some(Hit {
                surface: *id,
                distance,
                point: ray.at(distance),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// The nearest hit among `candidates`
pub fn pick_nearest(scene: &Scene, ray: &Ray, candidates: &[SurfaceId]) -> Option<Hit> {
    pick(scene, ray, candidates).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Transform};

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0).looking_at(Vec3::new(0.0, 0.0, 350.0), Vec3::ZERO)
    }

    fn plane(name: &str, width: f32, height: f32, position: Vec3, side: Side) -> Surface {
        Surface::new(name, Shape::Plane { width, height }, Material::default().with_side(side))
            .with_transform(Transform::at(position))
    }

    #[test]
    fn test_ndc_conversion() {
        let ndc = ndc_from_pixels(Vec2::new(0.0, 0.0), 800.0, 600.0).unwrap();
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let ndc = ndc_from_pixels(Vec2::new(800.0, 600.0), 800.0, 600.0).unwrap();
        assert_eq!(ndc, Vec2::new(1.0, -1.0));
        let ndc = ndc_from_pixels(Vec2::new(400.0, 300.0), 800.0, 600.0).unwrap();
        assert_eq!(ndc, Vec2::ZERO);
    }

    #[test]
    fn test_ndc_empty_viewport() {
        assert!(ndc_from_pixels(Vec2::new(1.0, 1.0), 0.0, 600.0).is_none());
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let ray = Ray::from_camera(&camera(), Vec2::ZERO).unwrap();
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 350.0));
    }

    #[test]
    fn test_nearer_plane_wins() {
        let mut scene = Scene::new();
        let far = scene.add(plane("far", 100.0, 100.0, Vec3::new(0.0, 0.0, -50.0), Side::Front));
        let near = scene.add(plane("near", 100.0, 100.0, Vec3::new(0.0, 0.0, 20.0), Side::Front));
        let ray = Ray::from_camera(&camera(), Vec2::ZERO).unwrap();

        let hits = pick(&scene, &ray, &[far, near]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].surface, near);
        assert!((hits[0].distance - 330.0).abs() < 1e-2);
        assert_eq!(pick_nearest(&scene, &ray, &[far, near]).unwrap().surface, near);
    }

    #[test]
    fn test_miss_outside_rectangle() {
        let mut scene = Scene::new();
        let id = scene.add(plane("offset", 10.0, 10.0, Vec3::new(300.0, 200.0, 0.0), Side::Front));
        let ray = Ray::from_camera(&camera(), Vec2::ZERO).unwrap();
        assert!(pick(&scene, &ray, &[id]).is_empty());
    }

    #[test]
    fn test_front_side_is_not_hit_from_behind() {
        let mut scene = Scene::new();
        let mut back_facing = plane("back", 100.0, 100.0, Vec3::ZERO, Side::Front);
        back_facing.transform.rotation.x = -std::f32::consts::PI;
        let front_only = scene.add(back_facing.clone());
        back_facing.material.side = Side::Double;
        let double = scene.add(back_facing);

        let ray = Ray::from_camera(&camera(), Vec2::ZERO).unwrap();
        let hits = pick(&scene, &ray, &[front_only, double]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surface, double);
    }

    #[test]
    fn test_detached_and_unknown_surfaces_are_skipped() {
        let mut scene = Scene::new();
        let id = scene.add(plane("photo", 100.0, 100.0, Vec3::ZERO, Side::Front));
        scene.detach(id);
        let ray = Ray::from_camera(&camera(), Vec2::ZERO).unwrap();
        assert!(pick(&scene, &ray, &[id, SurfaceId(99)]).is_empty());
    }

    #[test]
    fn test_scaled_plane_grows_hit_area() {
        let mut scene = Scene::new();
        let mut surface = plane("fish", 100.0, 50.0, Vec3::ZERO, Side::Front);
        let ray = Ray {
            origin: Vec3::new(52.0, 0.0, 100.0),
            direction: Vec3::NEG_Z,
        };
        assert!(intersect(&ray, &surface).is_none());
        surface.transform.scale = Vec3::new(1.1, 1.1, 1.0);
        let id = scene.add(surface);
        assert!(pick_nearest(&scene, &ray, &[id]).is_some());
    }

    #[test]
    fn test_sphere_hit_from_outside_and_inside() {
        let sphere = Surface::new(
            "globe",
            Shape::Sphere {
                radius: 150.0,
                width_segments: 8,
                height_segments: 8,
                inverted: true,
            },
            Material::default(),
        );
        let outside = Ray {
            origin: Vec3::new(0.0, 0.0, 300.0),
            direction: Vec3::NEG_Z,
        };
        assert!((intersect(&outside, &sphere).unwrap() - 150.0).abs() < 1e-3);
        let inside = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        assert!((intersect(&inside, &sphere).unwrap() - 150.0).abs() < 1e-3);
    }
}
