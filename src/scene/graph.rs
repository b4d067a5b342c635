//! Scene container
//!
//! Surfaces stay in the scene for the page's lifetime; detaching hides them
//! from both drawing and hit-testing without invalidating their ids.

use glam::Vec3;

use super::surface::{Surface, SurfaceId};

/// Scene-wide lighting. Only `lit` materials respond to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    /// Direction the light comes from (towards the light), with its intensity
    pub directional: Option<(Vec3, f32)>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 1.0,
            directional: None,
        }
    }
}

struct SurfaceEntry {
    surface: Surface,
    attached: bool,
}

/// Ordered set of surfaces plus lighting
pub struct Scene {
    entries: Vec<SurfaceEntry>,
    pub lighting: Lighting,
    /// Clear colour, RGBA
    pub background: [f64; 4],
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            lighting: Lighting::default(),
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Add a surface and attach it
    pub fn add(&mut self, surface: Surface) -> SurfaceId {
        self.insert(surface, true)
    }

    /// Add a surface without attaching it yet
    pub fn add_detached(&mut self, surface: Surface) -> SurfaceId {
        self.insert(surface, false)
    }

    fn insert(&mut self, surface: Surface, attached: bool) -> SurfaceId {
        let id = SurfaceId(self.entries.len() as u32);
        tracing::debug!(surface = %surface.name, id = id.0, attached, "Surface added");
        self.entries.push(SurfaceEntry { surface, attached });
        id
    }

    pub fn attach(&mut self, id: SurfaceId) {
        if let Some(entry) = self.entries.get_mut(id.0 as usize) {
            entry.attached = true;
        }
    }

    pub fn detach(&mut self, id: SurfaceId) {
        if let Some(entry) = self.entries.get_mut(id.0 as usize) {
            entry.attached = false;
        }
    }

    pub fn is_attached(&self, id: SurfaceId) -> bool {
        self.entries
            .get(id.0 as usize)
            .is_some_and(|entry| entry.attached)
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.entries.get(id.0 as usize).map(|entry| &entry.surface)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.entries.get_mut(id.0 as usize).map(|entry| &mut entry.surface)
    }

    /// Attached surfaces in insertion order
    pub fn attached(&self) -> impl Iterator<Item = (SurfaceId, &Surface)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.attached)
            .map(|(index, entry)| (SurfaceId(index as u32), &entry.surface))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Shape};

    fn plane(name: &str) -> Surface {
        Surface::new(name, Shape::Plane { width: 1.0, height: 1.0 }, Material::default())
    }

    #[test]
    fn test_attach_detach() {
        let mut scene = Scene::new();
        let a = scene.add(plane("a"));
        let b = scene.add_detached(plane("b"));
        assert!(scene.is_attached(a));
        assert!(!scene.is_attached(b));

        scene.attach(b);
        scene.detach(a);
        let names: Vec<&str> = scene.attached().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut scene = Scene::new();
        scene.attach(SurfaceId(42));
        assert!(!scene.is_attached(SurfaceId(42)));
        assert!(scene.get(SurfaceId(42)).is_none());
    }
}
