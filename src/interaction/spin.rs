//! Unconditional per-frame rotation of a set of surfaces

use glam::Vec3;

use crate::scene::{Scene, SurfaceId};

/// Adds a fixed Euler delta to every member on each frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spinner {
    delta: Vec3,
    members: Vec<SurfaceId>,
}

impl Spinner {
    /// `delta` is radians per frame around X, Y and Z
    pub fn new(delta: Vec3) -> Self {
        Self {
            delta,
            members: Vec::new(),
        }
    }

    pub fn add(&mut self, surface: SurfaceId) {
        if !self.members.contains(&surface) {
            self.members.push(surface);
        }
    }

    pub fn members(&self) -> &[SurfaceId] {
        &self.members
    }

    /// Rotate every member that still exists in the scene
    pub fn apply(&self, scene: &mut Scene) {
        for id in &self.members {
            if let Some(surface) = scene.get_mut(*id) {
                surface.transform.rotation += self.delta;
            }
        }
    }
}
