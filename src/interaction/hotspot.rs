//! Clickable surfaces with optional hover emphasis
//!
//! Each hotspot binds a surface to an action. Pointer moves update hover
//! state for hotspots that carry emphasis; pointer presses fire the action of
//! the nearest hotspot along the ray.

use glam::Vec3;

use super::hover::{CursorStyle, HoverFlag, HoverTransition};
use crate::scene::{pick_nearest, Ray, Scene, SurfaceId};

/// Hover feedback: scale the surface in X and Y while hovered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emphasis {
    pub scale: f32,
}

#[derive(Debug, Clone)]
struct Hotspot<A> {
    surface: SurfaceId,
    action: A,
    emphasis: Option<Emphasis>,
    flag: HoverFlag,
    /// Scale to restore when the pointer leaves
    base_scale: Option<Vec3>,
}

/// Set of interactive surfaces
#[derive(Debug, Clone)]
pub struct HotspotSet<A> {
    hotspots: Vec<Hotspot<A>>,
    cursor: CursorStyle,
}

impl<A> Default for HotspotSet<A> {
    fn default() -> Self {
        Self {
            hotspots: Vec::new(),
            cursor: CursorStyle::Default,
        }
    }
}

impl<A: Clone> HotspotSet<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface; several hotspots may share an action
    pub fn register(&mut self, surface: SurfaceId, action: A, emphasis: Option<Emphasis>) {
        self.hotspots.push(Hotspot {
            surface,
            action,
            emphasis,
            flag: HoverFlag::new(),
            base_scale: None,
        });
    }

    fn surfaces(&self) -> Vec<SurfaceId> {
        self.hotspots.iter().map(|h| h.surface).collect()
    }

    /// Update hover state for a pointer move.
    ///
    /// `ray` is `None` when no ray can be cast (e.g. empty viewport), which
    /// counts as hovering nothing. Returns the new cursor only when it changes.
    pub fn pointer_moved(&mut self, scene: &mut Scene, ray: Option<&Ray>) -> Option<CursorStyle> {
        let nearest = ray.and_then(|ray| pick_nearest(scene, ray, &self.surfaces()));
        let hovered_surface = nearest.map(|hit| hit.surface);

        for hotspot in &mut self.hotspots {
            let Some(emphasis) = hotspot.emphasis else {
                continue;
            };
            let hit = hovered_surface == Some(hotspot.surface);
            let Some(transition) = hotspot.flag.update(hit) else {
                continue;
            };
            let Some(surface) = scene.get_mut(hotspot.surface) else {
                continue;
            };
            match transition {
                HoverTransition::Entered => {
                    let base = surface.transform.scale;
                    hotspot.base_scale = Some(base);
                    surface.transform.scale = Vec3::new(base.x * emphasis.scale, base.y * emphasis.scale, base.z);
                }
                HoverTransition::Left => {
                    if let Some(base) = hotspot.base_scale.take() {
                        surface.transform.scale = base;
                    }
                }
            }
        }

        let cursor = if self.hotspots.iter().any(|h| h.flag.is_hovering()) {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        };
        if cursor != self.cursor {
            self.cursor = cursor;
            Some(cursor)
        } else {
            None
        }
    }

    /// Action of the nearest hotspot under the pointer, if any
    pub fn pointer_pressed(&self, scene: &Scene, ray: Option<&Ray>) -> Option<A> {
        let hit = pick_nearest(scene, ray?, &self.surfaces())?;
        self.hotspots
            .iter()
            .find(|h| h.surface == hit.surface)
            .map(|h| h.action.clone())
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }
}
