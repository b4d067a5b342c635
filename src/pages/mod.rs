//! The three interactive pages and the contract the host drives them through
//!
//! A page builds its surfaces into the shared [`Scene`] once, then reacts to
//! pointer, timer, frame, asset and resize events. Handlers mutate page state
//! and the scene directly and report host-side effects (cursor changes,
//! navigation) as return values.

mod fisheye;
mod landing;
mod worms;

pub use fisheye::FisheyePage;
pub use landing::LandingPage;
pub use worms::WormsPage;

use std::path::Path;
use std::time::Instant;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::assets::{self, AssetId, AssetKind, AssetStore};
use crate::interaction::CursorStyle;
use crate::runtime::{TimerKind, TimerQueue};
use crate::scene::{ndc_from_pixels, PerspectiveCamera, Ray, Scene};
use crate::settings::{CameraSettings, PagesSettings};

/// Which page is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Fisheye,
    #[default]
    Landing,
    Worms,
}

impl PageKind {
    /// Document name the page was published under
    pub fn href(&self) -> &'static str {
        match self {
            PageKind::Fisheye => "fisheye.html",
            PageKind::Landing => "index.html",
            PageKind::Worms => "worms.html",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PageKind::Fisheye => "Fisheye",
            PageKind::Landing => "Landing",
            PageKind::Worms => "Worms",
        }
    }
}

/// Where a click leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Switch to another page in-process
    Page(PageKind),
    /// Hand the URL to the system browser
    External(String),
}

impl NavigationTarget {
    /// Map a link target to a page or external URL
    pub fn from_href(href: &str) -> Option<Self> {
        let href = href.trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(NavigationTarget::External(href.to_string()));
        }
        let name = href.trim_start_matches("./").trim_start_matches('/');
        [PageKind::Fisheye, PageKind::Landing, PageKind::Worms]
            .into_iter()
            .find(|kind| kind.href() == name)
            .map(NavigationTarget::Page)
    }
}

/// Host-side effect requested by a page handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetCursor(CursorStyle),
    Navigate(NavigationTarget),
}

/// Drawable size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, 1.0 for an empty viewport
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Everything a page handler may touch
pub struct PageContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub timers: &'a mut TimerQueue,
    pub assets: &'a mut AssetStore,
    pub asset_root: &'a Path,
    pub viewport: Viewport,
    pub now: Instant,
}

impl PageContext<'_> {
    /// Register an image slot; loading starts after the handler returns
    pub fn image(&mut self, path: &str) -> AssetId {
        self.assets.register(assets::resolve(self.asset_root, path), AssetKind::Image)
    }

    /// Register a looping video slot
    pub fn video(&mut self, path: &str) -> AssetId {
        self.assets.register(assets::resolve(self.asset_root, path), AssetKind::Video)
    }

    /// Register an OBJ model slot
    pub fn model(&mut self, path: &str) -> AssetId {
        self.assets.register(assets::resolve(self.asset_root, path), AssetKind::Model)
    }

    /// Ray from the camera through a pixel, `None` for an empty viewport
    pub fn ray_at(&self, position: Vec2) -> Option<Ray> {
        let ndc = ndc_from_pixels(position, self.viewport.width as f32, self.viewport.height as f32)?;
        Ray::from_camera(&*self.camera, ndc)
    }

    /// Replace the camera with one placed per `settings`, looking at the origin
    pub fn place_camera(&mut self, settings: &CameraSettings) {
        *self.camera = PerspectiveCamera::new(settings.fov_degrees, self.viewport.aspect(), settings.near, settings.far)
            .looking_at(settings.position.into(), Vec3::ZERO);
    }
}

/// Event handlers of a running page
pub trait Page {
    fn kind(&self) -> PageKind;

    fn on_pointer_move(&mut self, _ctx: &mut PageContext<'_>, _position: Vec2) -> Option<Effect> {
        None
    }

    fn on_pointer_down(&mut self, _ctx: &mut PageContext<'_>, _position: Vec2) -> Option<Effect> {
        None
    }

    fn on_pointer_up(&mut self, _ctx: &mut PageContext<'_>, _position: Vec2) {}

    /// The pointer left the window; a release outside it is never reported
    fn on_pointer_leave(&mut self, _ctx: &mut PageContext<'_>) {}

    fn on_timer(&mut self, _ctx: &mut PageContext<'_>, _timer: TimerKind) {}

    /// Called once per rendered frame, after timers
    fn on_frame(&mut self, _ctx: &mut PageContext<'_>) {}

    /// Called when an asset slot is bound for the first time
    fn on_asset_ready(&mut self, _ctx: &mut PageContext<'_>, _asset: AssetId) {}

    /// The viewport in `ctx` already has the new size
    fn on_resize(&mut self, ctx: &mut PageContext<'_>) {
        ctx.camera.set_aspect(ctx.viewport.aspect());
    }
}

/// Build a page into an empty scene
pub fn build_page(kind: PageKind, settings: &PagesSettings, ctx: &mut PageContext<'_>) -> Box<dyn Page> {
    tracing::info!("Building {} page", kind.display_name());
    match kind {
        PageKind::Fisheye => Box::new(FisheyePage::build(&settings.fisheye, ctx)),
        PageKind::Landing => Box::new(LandingPage::build(&settings.landing, ctx)),
        PageKind::Worms => Box::new(WormsPage::build(&settings.worms, ctx)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_href_mapping() {
        assert_eq!(
            NavigationTarget::from_href("fisheye.html"),
            Some(NavigationTarget::Page(PageKind::Fisheye))
        );
        assert_eq!(
            NavigationTarget::from_href("./index.html"),
            Some(NavigationTarget::Page(PageKind::Landing))
        );
        assert_eq!(
            NavigationTarget::from_href("worms.html"),
            Some(NavigationTarget::Page(PageKind::Worms))
        );
        assert_eq!(
            NavigationTarget::from_href("https://www.google.com/search?q=x"),
            Some(NavigationTarget::External("https://www.google.com/search?q=x".to_string()))
        );
        assert_eq!(NavigationTarget::from_href("about.html"), None);
    }

    #[test]
    fn test_viewport_aspect() {
        assert_eq!(Viewport::new(1920, 1080).aspect(), 1920.0 / 1080.0);
        assert_eq!(Viewport::new(0, 1080).aspect(), 1.0);
        assert!(Viewport::default().is_empty());
    }

    #[test]
    fn test_every_page_builds() {
        let settings = PagesSettings::default();
        for kind in [PageKind::Fisheye, PageKind::Landing, PageKind::Worms] {
            let mut harness = test_support::Harness::new(1280, 720);
            let page = build_page(kind, &settings, &mut harness.ctx());
            assert_eq!(page.kind(), kind);
            assert!(!harness.scene.is_empty());
            assert!(!harness.assets.is_empty());
        }
    }
}
