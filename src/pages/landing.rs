//! Landing page
//!
//! Spinning models inside a panorama, a hoverable fish button leading to the
//! fisheye page, a looping video teaser with a blinking "click" overlay
//! leading to the worms page, and a blinking external link button.

use std::f32::consts::PI;

use glam::Vec3;

use super::{Effect, NavigationTarget, Page, PageContext, PageKind};
use crate::assets::AssetId;
use crate::interaction::{Emphasis, HotspotSet, OpacityOscillator, Spinner};
use crate::scene::{Lighting, Material, OrbitControls, Shape, Side, Surface, SurfaceId, Transform};
use crate::settings::{LandingSettings, PlaneSettings};

/// A surface whose opacity follows an oscillator
struct Blinker {
    surface: SurfaceId,
    oscillator: OpacityOscillator,
}

impl Blinker {
    fn tick(&mut self, ctx: &mut PageContext<'_>) {
        let opacity = self.oscillator.tick();
        if let Some(surface) = ctx.scene.get_mut(self.surface) {
            surface.material.opacity = opacity;
        }
    }
}

pub struct LandingPage {
    controls: OrbitControls,
    hotspots: HotspotSet<NavigationTarget>,
    /// Model slots and the detached surfaces waiting for them
    models: Vec<(AssetId, SurfaceId)>,
    spinner: Spinner,
    blinkers: Vec<Blinker>,
}

fn plane(name: &str, settings: &PlaneSettings, material: Material) -> Surface {
    Surface::new(
        name,
        Shape::Plane {
            width: settings.width,
            height: settings.height,
        },
        material,
    )
    .with_transform(Transform::at(settings.position.into()))
}

fn page_target(kind: PageKind) -> NavigationTarget {
    NavigationTarget::from_href(kind.href()).unwrap_or(NavigationTarget::Page(kind))
}

impl LandingPage {
    pub fn build(settings: &LandingSettings, ctx: &mut PageContext<'_>) -> Self {
        ctx.place_camera(&settings.camera);
        let controls = OrbitControls::new(&*ctx.camera, settings.orbit_damping, settings.orbit_rotate_speed);

        ctx.scene.lighting = Lighting {
            ambient: settings.ambient_intensity,
            directional: Some((settings.directional_position.into(), settings.directional_intensity)),
        };

        let background = ctx.image(&settings.background);
        ctx.scene.add(Surface::new(
            "background",
            Shape::Sphere {
                radius: settings.background_sphere.radius,
                width_segments: settings.background_sphere.width_segments,
                height_segments: settings.background_sphere.height_segments,
                inverted: true,
            },
            Material::textured(background),
        ));

        // Models join the scene once their geometry arrives
        let mut models = Vec::with_capacity(settings.models.len());
        for (i, model) in settings.models.iter().enumerate() {
            let asset = ctx.model(&model.path);
            let material = Material {
                lit: true,
                ..Material::default()
            };
            let surface = ctx.scene.add_detached(
                Surface::new(format!("model{}", i + 1), Shape::Model(asset), material)
                    .with_transform(Transform::at(model.position.into())),
            );
            models.push((asset, surface));
        }

        let mut hotspots = HotspotSet::new();

        let fish_texture = ctx.image(&settings.fish_button.texture);
        let fish_material = Material {
            exposure: settings.fish_exposure,
            alpha_cutoff: settings.fish_alpha_cutoff,
            ..Material::textured(fish_texture).with_transparency()
        };
        let fish = ctx.scene.add(plane("fish", &settings.fish_button, fish_material));
        hotspots.register(
            fish,
            page_target(PageKind::Fisheye),
            Some(Emphasis {
                scale: settings.hover_scale,
            }),
        );

        let video = ctx.video(&settings.video);
        let mut video_surface = plane("video", &settings.video_plane, Material::textured(video).with_side(Side::Double));
        video_surface.transform.rotation.x = -PI;
        let video_plane = ctx.scene.add(video_surface);
        hotspots.register(video_plane, page_target(PageKind::Worms), None);

        let click_oscillator = settings.click_oscillator.build();
        let click_texture = ctx.image(&settings.click_overlay.texture);
        let click_material = Material {
            opacity: click_oscillator.opacity(),
            ..Material::textured(click_texture).with_transparency().with_side(Side::Double)
        };
        let click_overlay = ctx.scene.add(plane("click-overlay", &settings.click_overlay, click_material));
        hotspots.register(click_overlay, page_target(PageKind::Worms), None);

        let link_oscillator = settings.link_oscillator.build();
        let link_texture = ctx.image(&settings.link_button.texture);
        let link_material = Material {
            opacity: link_oscillator.opacity(),
            ..Material::textured(link_texture).with_transparency().with_side(Side::Double)
        };
        let link_button = ctx.scene.add(plane("link", &settings.link_button, link_material));
        match NavigationTarget::from_href(&settings.link_url) {
            Some(target) => hotspots.register(link_button, target, None),
            None => tracing::warn!("Link button target {:?} is not navigable", settings.link_url),
        }

        Self {
            controls,
            hotspots,
            models,
            spinner: Spinner::new(settings.model_spin.into()),
            blinkers: vec![
                Blinker {
                    surface: click_overlay,
                    oscillator: click_oscillator,
                },
                Blinker {
                    surface: link_button,
                    oscillator: link_oscillator,
                },
            ],
        }
    }

    /// Surfaces of the models that have loaded so far
    pub fn loaded_models(&self) -> &[SurfaceId] {
        self.spinner.members()
    }
}

impl Page for LandingPage {
    fn kind(&self) -> PageKind {
        PageKind::Landing
    }

    fn on_pointer_move(&mut self, ctx: &mut PageContext<'_>, position: glam::Vec2) -> Option<Effect> {
        if self.controls.is_dragging() {
            self.controls.drag_to(position, ctx.viewport.height as f32);
        }
        let ray = ctx.ray_at(position);
        self.hotspots
            .pointer_moved(ctx.scene, ray.as_ref())
            .map(Effect::SetCursor)
    }

    fn on_pointer_down(&mut self, ctx: &mut PageContext<'_>, position: glam::Vec2) -> Option<Effect> {
        self.controls.begin_drag(position);
        let ray = ctx.ray_at(position);
        let target = self.hotspots.pointer_pressed(ctx.scene, ray.as_ref())?;
        tracing::info!(?target, "Landing page link clicked");
        Some(Effect::Navigate(target))
    }

    fn on_pointer_up(&mut self, _ctx: &mut PageContext<'_>, _position: glam::Vec2) {
        self.controls.end_drag();
    }

    fn on_pointer_leave(&mut self, _ctx: &mut PageContext<'_>) {
        self.controls.end_drag();
    }

    fn on_frame(&mut self, ctx: &mut PageContext<'_>) {
        self.spinner.apply(ctx.scene);
        self.controls.update(ctx.camera);
        for blinker in &mut self.blinkers {
            blinker.tick(ctx);
        }
    }

    fn on_asset_ready(&mut self, ctx: &mut PageContext<'_>, asset: AssetId) {
        for (slot, surface) in &self.models {
            if *slot == asset {
                ctx.scene.attach(*surface);
                self.spinner.add(*surface);
                tracing::debug!(asset = asset.0, "Model added to scene");
            }
        }
    }
}
