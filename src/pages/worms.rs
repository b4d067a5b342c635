//! Worms viewer
//!
//! A looping video fills the view. Any click flashes the next photo on top
//! of it for a fixed time; clicks during a flash are ignored.

use std::time::Duration;

use glam::Vec3;

use super::{Effect, Page, PageContext, PageKind};
use crate::assets::AssetId;
use crate::interaction::TimedOverlay;
use crate::runtime::TimerKind;
use crate::scene::{Material, Shape, Surface, SurfaceId, Transform};
use crate::settings::{PlaneSettings, WormsSettings};

pub struct WormsPage {
    photo_surface: SurfaceId,
    photos: Vec<AssetId>,
    /// `None` when no photos are configured
    overlay: Option<TimedOverlay>,
}

/// Plane squashed in Y by the viewport's height/width ratio
fn screen_plane(name: &str, settings: &PlaneSettings, y_scale: f32, material: Material) -> Surface {
    let mut transform = Transform::at(settings.position.into());
    transform.scale = Vec3::new(1.0, y_scale, 1.0);
    Surface::new(
        name,
        Shape::Plane {
            width: settings.width,
            height: settings.height,
        },
        material,
    )
    .with_transform(transform)
}

impl WormsPage {
    pub fn build(settings: &WormsSettings, ctx: &mut PageContext<'_>) -> Self {
        ctx.place_camera(&settings.camera);

        // Fixed at build time; resizing only changes the camera
        let y_scale = if ctx.viewport.is_empty() {
            1.0
        } else {
            ctx.viewport.height as f32 / ctx.viewport.width as f32
        };

        let video = ctx.video(&settings.video);
        ctx.scene
            .add(screen_plane("video", &settings.video_plane, y_scale, Material::textured(video)));

        let overlay_texture = ctx.image(&settings.overlay.texture);
        ctx.scene.add(screen_plane(
            "overlay",
            &settings.overlay,
            y_scale,
            Material::textured(overlay_texture).with_transparency(),
        ));

        let photos: Vec<AssetId> = settings.photos.iter().map(|path| ctx.image(path)).collect();
        let material = photos
            .first()
            .map_or_else(Material::default, |&photo| Material::textured(photo))
            .with_transparency();
        let photo_surface = ctx
            .scene
            .add_detached(screen_plane("photo", &settings.photo_plane, y_scale, material));

        let overlay = TimedOverlay::new(photos.len(), Duration::from_millis(settings.photo_duration_ms));
        if overlay.is_none() {
            tracing::warn!("Worms page has no photos, clicks do nothing");
        }

        Self {
            photo_surface,
            photos,
            overlay,
        }
    }

    pub fn is_showing_photo(&self) -> bool {
        self.overlay.is_some_and(|overlay| overlay.is_showing())
    }
}

impl Page for WormsPage {
    fn kind(&self) -> PageKind {
        PageKind::Worms
    }

    /// Any click counts; there is no hit-test on this page
    fn on_pointer_down(&mut self, ctx: &mut PageContext<'_>, _position: glam::Vec2) -> Option<Effect> {
        let overlay = self.overlay.as_mut()?;
        let index = overlay.trigger()?;

        if let Some(surface) = ctx.scene.get_mut(self.photo_surface) {
            surface.material.texture = Some(self.photos[index]);
        }
        ctx.scene.attach(self.photo_surface);
        ctx.timers.set_timeout(TimerKind::OverlayExpire, ctx.now, overlay.duration());
        tracing::debug!(index, "Showing photo");
        None
    }

    fn on_timer(&mut self, ctx: &mut PageContext<'_>, timer: TimerKind) {
        if timer != TimerKind::OverlayExpire {
            return;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.finish();
        }
        ctx.scene.detach(self.photo_surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::Harness;
    use glam::Vec2;

    fn build() -> (Harness, WormsPage) {
        let mut harness = Harness::new(1280, 720);
        let page = WormsPage::build(&WormsSettings::default(), &mut harness.ctx());
        (harness, page)
    }

    fn click(harness: &mut Harness, page: &mut WormsPage) {
        page.on_pointer_down(&mut harness.ctx(), Vec2::new(10.0, 10.0));
    }

    fn advance(harness: &mut Harness, page: &mut WormsPage, millis: u64) {
        harness.now += Duration::from_millis(millis);
        for timer in harness.timers.due(harness.now) {
            page.on_timer(&mut harness.ctx(), timer);
        }
    }

    fn shown_photo(harness: &Harness, page: &WormsPage) -> u32 {
        harness.scene.get(page.photo_surface).unwrap().material.texture.unwrap().0
    }

    #[test]
    fn test_build_scales_planes_to_viewport() {
        let (harness, page) = build();
        assert_eq!(harness.camera.eye, Vec3::new(0.0, 0.0, 400.0));
        assert!(!harness.scene.is_attached(page.photo_surface));
        for (_, surface) in harness.scene.attached() {
            assert!((surface.transform.scale.y - 720.0 / 1280.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_click_burst_shows_one_photo() {
        let (mut harness, mut page) = build();
        for _ in 0..5 {
            click(&mut harness, &mut page);
            advance(&mut harness, &mut page, 100);
        }
        assert!(page.is_showing_photo());
        assert!(harness.scene.is_attached(page.photo_surface));
        assert_eq!(harness.timers.len(), 1);

        advance(&mut harness, &mut page, 1400);
        assert!(!page.is_showing_photo());
        assert!(!harness.scene.is_attached(page.photo_surface));
    }

    #[test]
    fn test_photo_sequence_wraps() {
        let (mut harness, mut page) = build();
        let first_photo = shown_photo(&harness, &page);
        let mut offsets = Vec::new();
        for _ in 0..8 {
            click(&mut harness, &mut page);
            offsets.push(shown_photo(&harness, &page) - first_photo);
            advance(&mut harness, &mut page, 1800);
        }
        assert_eq!(offsets, vec![1, 2, 3, 4, 5, 6, 0, 1]);
    }

    #[test]
    fn test_no_photos_ignores_clicks() {
        let mut harness = Harness::new(1280, 720);
        let settings = WormsSettings {
            photos: Vec::new(),
            ..WormsSettings::default()
        };
        let mut page = WormsPage::build(&settings, &mut harness.ctx());
        click(&mut harness, &mut page);
        assert!(!page.is_showing_photo());
        assert!(harness.timers.is_empty());
    }
}
