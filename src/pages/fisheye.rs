//! Fisheye photo viewer
//!
//! An inverted sphere around the camera shows one photo at a time, switching
//! on a fixed interval while the sphere slowly turns.

use std::time::Duration;

use glam::Vec3;

use super::{Page, PageContext, PageKind};
use crate::assets::AssetId;
use crate::interaction::{SlideshowCycler, Spinner};
use crate::runtime::TimerKind;
use crate::scene::{Material, Shape, Surface, SurfaceId};
use crate::settings::FisheyeSettings;

pub struct FisheyePage {
    sphere: SurfaceId,
    photos: Vec<AssetId>,
    /// `None` when no photos are configured
    slideshow: Option<SlideshowCycler>,
    spinner: Spinner,
}

impl FisheyePage {
    pub fn build(settings: &FisheyeSettings, ctx: &mut PageContext<'_>) -> Self {
        ctx.place_camera(&settings.camera);

        let photos: Vec<AssetId> = settings.photos.iter().map(|path| ctx.image(path)).collect();
        let slideshow = SlideshowCycler::new(photos.len());

        let material = photos.first().map_or_else(Material::default, |&photo| Material::textured(photo));
        let sphere = ctx.scene.add(Surface::new(
            "fisheye",
            Shape::Sphere {
                radius: settings.sphere.radius,
                width_segments: settings.sphere.width_segments,
                height_segments: settings.sphere.height_segments,
                inverted: true,
            },
            material,
        ));

        let mut spinner = Spinner::new(Vec3::new(0.0, settings.spin_per_frame, 0.0));
        spinner.add(sphere);

        if slideshow.is_some() {
            ctx.timers.set_interval(
                TimerKind::SlideshowAdvance,
                ctx.now,
                Duration::from_millis(settings.slideshow_interval_ms),
            );
        } else {
            tracing::warn!("Fisheye page has no photos, slideshow disabled");
        }

        Self {
            sphere,
            photos,
            slideshow,
            spinner,
        }
    }

    /// Index of the photo currently bound to the sphere
    pub fn current_index(&self) -> Option<usize> {
        self.slideshow.map(|cycler| cycler.index())
    }
}

impl Page for FisheyePage {
    fn kind(&self) -> PageKind {
        PageKind::Fisheye
    }

    fn on_timer(&mut self, ctx: &mut PageContext<'_>, timer: TimerKind) {
        if timer != TimerKind::SlideshowAdvance {
            return;
        }
        let Some(cycler) = self.slideshow.as_mut() else {
            return;
        };
        let index = cycler.advance();
        if let Some(surface) = ctx.scene.get_mut(self.sphere) {
            surface.material.texture = Some(self.photos[index]);
        }
        tracing::debug!(index, "Slideshow advanced");
    }

    fn on_frame(&mut self, ctx: &mut PageContext<'_>) {
        self.spinner.apply(ctx.scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::Harness;

    fn settings_with_photos(count: usize) -> FisheyeSettings {
        FisheyeSettings {
            photos: (0..count).map(|i| format!("photos/{}.png", i + 1)).collect(),
            ..FisheyeSettings::default()
        }
    }

    #[test]
    fn test_build_places_camera_and_sphere() {
        let mut harness = Harness::new(1280, 720);
        let page = FisheyePage::build(&FisheyeSettings::default(), &mut harness.ctx());

        assert_eq!(harness.camera.eye, Vec3::new(0.0, 0.0, 300.0));
        assert_eq!(harness.camera.fov_degrees, 75.0);
        assert_eq!(harness.assets.len(), 39);
        assert_eq!(page.current_index(), Some(0));

        let sphere = harness.scene.get(page.sphere).unwrap();
        assert!(matches!(sphere.shape, Shape::Sphere { radius, inverted: true, .. } if radius == 150.0));
        assert_eq!(sphere.material.texture, Some(AssetId(0)));
        assert!(harness.timers.is_scheduled(TimerKind::SlideshowAdvance));
    }

    #[test]
    fn test_slideshow_cycles_through_photos() {
        let mut harness = Harness::new(1280, 720);
        let mut page = FisheyePage::build(&settings_with_photos(7), &mut harness.ctx());

        let mut seen = Vec::new();
        for _ in 0..8 {
            page.on_timer(&mut harness.ctx(), TimerKind::SlideshowAdvance);
            seen.push(harness.scene.get(page.sphere).unwrap().material.texture.unwrap().0);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 0, 1]);
    }

    #[test]
    fn test_interval_drives_slideshow() {
        let mut harness = Harness::new(1280, 720);
        let mut page = FisheyePage::build(&settings_with_photos(3), &mut harness.ctx());

        harness.now += Duration::from_millis(21_500);
        let due = harness.timers.due(harness.now);
        assert_eq!(due, vec![TimerKind::SlideshowAdvance]);
        for timer in due {
            page.on_timer(&mut harness.ctx(), timer);
        }
        assert_eq!(page.current_index(), Some(1));
    }

    #[test]
    fn test_sphere_spins_every_frame() {
        let mut harness = Harness::new(1280, 720);
        let mut page = FisheyePage::build(&FisheyeSettings::default(), &mut harness.ctx());
        for _ in 0..10 {
            page.on_frame(&mut harness.ctx());
        }
        let rotation = harness.scene.get(page.sphere).unwrap().transform.rotation;
        assert!((rotation.y - 0.02).abs() < 1e-6);
        assert_eq!(rotation.x, 0.0);
    }

    #[test]
    fn test_no_photos_disables_slideshow() {
        let mut harness = Harness::new(1280, 720);
        let mut page = FisheyePage::build(&settings_with_photos(0), &mut harness.ctx());
        assert_eq!(page.current_index(), None);
        assert!(!harness.timers.is_scheduled(TimerKind::SlideshowAdvance));
        page.on_timer(&mut harness.ctx(), TimerKind::SlideshowAdvance);
        assert_eq!(harness.scene.get(page.sphere).unwrap().material.texture, None);
    }
}
