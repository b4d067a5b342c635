//! Single-threaded driver for the running page
//!
//! Owns the page together with its scene, camera, timers and asset slots.
//! One call to [`PageRuntime::tick`] runs a whole frame's worth of state
//! changes without yielding, so timer handlers and the frame update always
//! see a consistent snapshot.

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec2;

use super::TimerQueue;
use crate::assets::{AssetData, AssetError, AssetId, AssetKind, AssetLoader, AssetState, AssetStore};
use crate::pages::{build_page, Effect, Page, PageContext, PageKind, Viewport};
use crate::scene::{PerspectiveCamera, Scene};
use crate::settings::PagesSettings;
use crate::video::{DecodedFrame, VideoPlayer};

pub struct PageRuntime {
    settings: PagesSettings,
    asset_root: PathBuf,
    kind: PageKind,
    page: Box<dyn Page>,
    scene: Scene,
    camera: PerspectiveCamera,
    timers: TimerQueue,
    assets: AssetStore,
    /// `None` runs headless: slots stay pending until completed by hand
    loader: Option<AssetLoader>,
    videos: Vec<(AssetId, VideoPlayer)>,
    /// Slots below this index have been handed to a loader
    dispatched: usize,
    viewport: Viewport,
}

impl PageRuntime {
    /// Build `kind` and start loading its assets
    pub fn new(settings: PagesSettings, kind: PageKind, viewport: Viewport, now: Instant) -> Result<Self, AssetError> {
        let loader = AssetLoader::new()?;
        let mut runtime = Self::assemble(settings, kind, viewport, now, Some(loader));
        runtime.dispatch_loads();
        Ok(runtime)
    }

    /// Build `kind` without loading anything
    pub fn headless(settings: PagesSettings, kind: PageKind, viewport: Viewport, now: Instant) -> Self {
        Self::assemble(settings, kind, viewport, now, None)
    }

    fn assemble(
        settings: PagesSettings,
        kind: PageKind,
        viewport: Viewport,
        now: Instant,
        loader: Option<AssetLoader>,
    ) -> Self {
        let asset_root = settings.asset_root();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::new(75.0, viewport.aspect(), 0.1, 1000.0);
        let mut timers = TimerQueue::new();
        let mut assets = AssetStore::new();

        let page = build_page(
            kind,
            &settings,
            &mut PageContext {
                scene: &mut scene,
                camera: &mut camera,
                timers: &mut timers,
                assets: &mut assets,
                asset_root: &asset_root,
                viewport,
                now,
            },
        );

        Self {
            settings,
            asset_root,
            kind,
            page,
            scene,
            camera,
            timers,
            assets,
            loader,
            videos: Vec::new(),
            dispatched: 0,
            viewport,
        }
    }

    /// Tear down the current page and build `kind` in its place.
    ///
    /// Scene, timers, asset slots and video players are all rebuilt; loads
    /// still in flight for the old page are discarded with its loader.
    pub fn switch_to(&mut self, kind: PageKind, now: Instant) -> Result<(), AssetError> {
        tracing::info!(from = ?self.kind, to = ?kind, "Switching page");

        // Nothing is torn down until the new loader exists
        let loader = match self.loader {
            Some(_) => Some(AssetLoader::new()?),
            None => None,
        };
        self.loader = loader;
        self.videos.clear();
        self.scene = Scene::new();
        self.timers.clear();
        self.assets = AssetStore::new();
        self.dispatched = 0;

        let mut ctx = PageContext {
            scene: &mut self.scene,
            camera: &mut self.camera,
            timers: &mut self.timers,
            assets: &mut self.assets,
            asset_root: &self.asset_root,
            viewport: self.viewport,
            now,
        };
        self.page = build_page(kind, &self.settings, &mut ctx);
        self.kind = kind;

        self.dispatch_loads();
        Ok(())
    }

    /// Split into the page and the context its handlers receive
    fn split(&mut self, now: Instant) -> (&mut Box<dyn Page>, PageContext<'_>) {
        (
            &mut self.page,
            PageContext {
                scene: &mut self.scene,
                camera: &mut self.camera,
                timers: &mut self.timers,
                assets: &mut self.assets,
                asset_root: &self.asset_root,
                viewport: self.viewport,
                now,
            },
        )
    }

    /// Hand newly registered slots to the loader or a video player
    fn dispatch_loads(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };

        let pending: Vec<AssetId> = self.assets.ids().skip(self.dispatched).collect();
        self.dispatched = self.assets.len();

        for id in pending {
            let (Some(path), Some(kind)) = (self.assets.path(id), self.assets.kind(id)) else {
                continue;
            };
            let path = path.to_path_buf();
            match kind {
                AssetKind::Image | AssetKind::Model => {
                    if let Err(e) = loader.request(id, path, kind) {
                        self.assets.complete(id, Err(e));
                    }
                }
                AssetKind::Video => match VideoPlayer::open(&path) {
                    Ok(player) => {
                        let info = player.info();
                        tracing::info!(
                            asset = id.0,
                            path = %path.display(),
                            "Video playback started: {}x{} @ {:.2} fps, {:.1}s",
                            info.width,
                            info.height,
                            info.frame_rate,
                            info.duration
                        );
                        self.videos.push((id, player));
                    }
                    Err(source) => self.assets.complete(id, Err(AssetError::Video { path, source })),
                },
            }
        }
    }

    /// Bind a finished load and tell the page if the slot just became ready
    pub fn complete_asset(&mut self, id: AssetId, result: Result<AssetData, AssetError>, now: Instant) {
        let first_bind = self.assets.generation(id) == 0 && result.is_ok();
        self.assets.complete(id, result);
        if first_bind {
            let (page, mut ctx) = self.split(now);
            page.on_asset_ready(&mut ctx, id);
        }
    }

    /// Show a new video frame; the first frame of a slot counts as its load
    fn bind_video_frame(&mut self, id: AssetId, frame: DecodedFrame, now: Instant) {
        let first_frame = self.assets.generation(id) == 0;
        self.assets.update_image(id, frame.into_image());
        if first_frame {
            let (page, mut ctx) = self.split(now);
            page.on_asset_ready(&mut ctx, id);
        }
    }

    /// Run one frame: bind loads, pick up video frames, fire due timers,
    /// then the page's per-frame update
    pub fn tick(&mut self, now: Instant) {
        let completions = self.loader.as_mut().map(AssetLoader::poll).unwrap_or_default();
        for completion in completions {
            self.complete_asset(completion.id, completion.result, now);
        }

        let frames: Vec<(AssetId, DecodedFrame)> = self
            .videos
            .iter()
            .filter_map(|(id, player)| player.take_frame().map(|frame| (*id, frame)))
            .collect();
        for (id, frame) in frames {
            self.bind_video_frame(id, frame, now);
        }

        let (page, mut ctx) = self.split(now);
        for timer in ctx.timers.due(now) {
            page.on_timer(&mut ctx, timer);
        }
        page.on_frame(&mut ctx);
    }

    pub fn pointer_moved(&mut self, position: Vec2, now: Instant) -> Option<Effect> {
        let (page, mut ctx) = self.split(now);
        page.on_pointer_move(&mut ctx, position)
    }

    pub fn pointer_pressed(&mut self, position: Vec2, now: Instant) -> Option<Effect> {
        let (page, mut ctx) = self.split(now);
        page.on_pointer_down(&mut ctx, position)
    }

    pub fn pointer_released(&mut self, position: Vec2, now: Instant) {
        let (page, mut ctx) = self.split(now);
        page.on_pointer_up(&mut ctx, position);
    }

    pub fn pointer_left(&mut self, now: Instant) {
        let (page, mut ctx) = self.split(now);
        page.on_pointer_leave(&mut ctx);
    }

    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        self.viewport = viewport;
        let (page, mut ctx) = self.split(now);
        page.on_resize(&mut ctx);
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn settings(&self) -> &PagesSettings {
        &self.settings
    }

    /// Slots still waiting for data
    pub fn pending_assets(&self) -> usize {
        self.assets
            .ids()
            .filter(|id| matches!(self.assets.state(*id), Some(AssetState::Pending)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;
    use crate::pages::NavigationTarget;
    use crate::scene::{MeshData, Shape};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Stands in for a page and records which slots it was told about
    struct ReadyLog {
        kind: PageKind,
        ready: Rc<RefCell<Vec<AssetId>>>,
    }

    impl Page for ReadyLog {
        fn kind(&self) -> PageKind {
            self.kind
        }

        fn on_asset_ready(&mut self, _ctx: &mut PageContext<'_>, asset: AssetId) {
            self.ready.borrow_mut().push(asset);
        }
    }

    fn record_ready(runtime: &mut PageRuntime) -> Rc<RefCell<Vec<AssetId>>> {
        let ready = Rc::new(RefCell::new(Vec::new()));
        runtime.page = Box::new(ReadyLog {
            kind: runtime.kind,
            ready: Rc::clone(&ready),
        });
        ready
    }

    fn frame(value: u8, index: u64) -> DecodedFrame {
        DecodedFrame::new(vec![value; 2 * 2 * 4], 2, 2, index as f64 / 30.0, index)
    }

    fn runtime(kind: PageKind) -> (PageRuntime, Instant) {
        let now = Instant::now();
        let runtime = PageRuntime::headless(PagesSettings::default(), kind, Viewport::new(1280, 720), now);
        (runtime, now)
    }

    fn pixel(value: u8) -> AssetData {
        AssetData::Image(ImageData {
            width: 1,
            height: 1,
            pixels: vec![value; 4],
        })
    }

    fn model_surfaces(runtime: &PageRuntime) -> Vec<(crate::scene::SurfaceId, AssetId)> {
        runtime
            .scene()
            .attached()
            .filter_map(|(id, surface)| match surface.shape {
                Shape::Model(asset) => Some((id, asset)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_models_appear_in_completion_order() {
        let (mut runtime, now) = runtime(PageKind::Landing);
        let model_slots: Vec<AssetId> = runtime
            .assets()
            .ids()
            .filter(|id| runtime.assets().kind(*id) == Some(AssetKind::Model))
            .collect();
        assert_eq!(model_slots.len(), 3);
        assert!(model_surfaces(&runtime).is_empty());

        runtime.complete_asset(model_slots[2], Ok(AssetData::Mesh(MeshData::plane(1.0, 1.0))), now);
        assert_eq!(model_surfaces(&runtime).len(), 1);
        assert_eq!(model_surfaces(&runtime)[0].1, model_slots[2]);

        // A failed model never shows up
        runtime.complete_asset(model_slots[0], Err(AssetError::EmptyModel("model1.obj".into())), now);
        assert_eq!(model_surfaces(&runtime).len(), 1);

        runtime.complete_asset(model_slots[1], Ok(AssetData::Mesh(MeshData::plane(1.0, 1.0))), now);
        assert_eq!(model_surfaces(&runtime).len(), 2);
        assert_eq!(runtime.pending_assets(), runtime.assets().len() - 3);
    }

    #[test]
    fn test_slideshow_binds_whatever_has_loaded() {
        let (mut runtime, start) = runtime(PageKind::Fisheye);
        // Second photo arrives first; the first never does
        runtime.complete_asset(AssetId(1), Ok(pixel(2)), start);

        let sphere_texture = |runtime: &PageRuntime| {
            runtime
                .scene()
                .attached()
                .next()
                .and_then(|(_, surface)| surface.material.texture)
                .unwrap()
        };
        assert_eq!(sphere_texture(&runtime), AssetId(0));
        assert!(runtime.assets().image(AssetId(0)).is_none());

        runtime.tick(start + Duration::from_millis(21_500));
        assert_eq!(sphere_texture(&runtime), AssetId(1));
        assert!(runtime.assets().image(AssetId(1)).is_some());
    }

    #[test]
    fn test_tick_runs_timers_then_frame() {
        let (mut runtime, start) = runtime(PageKind::Fisheye);
        runtime.tick(start + Duration::from_millis(16));
        runtime.tick(start + Duration::from_millis(21_600));

        let (_, sphere) = runtime.scene().attached().next().unwrap();
        assert_eq!(sphere.material.texture, Some(AssetId(1)));
        assert!((sphere.transform.rotation.y - 0.004).abs() < 1e-6);
    }

    #[test]
    fn test_worms_overlay_debounces_through_runtime() {
        let (mut runtime, start) = runtime(PageKind::Worms);
        let attached = |runtime: &PageRuntime| runtime.scene().attached().count();
        assert_eq!(attached(&runtime), 2);

        for i in 0..4 {
            let now = start + Duration::from_millis(i * 200);
            assert_eq!(runtime.pointer_pressed(Vec2::new(5.0, 5.0), now), None);
            runtime.tick(now);
        }
        assert_eq!(attached(&runtime), 3);

        runtime.tick(start + Duration::from_millis(1800));
        assert_eq!(attached(&runtime), 2);
    }

    #[test]
    fn test_navigation_and_page_switch() {
        let (mut runtime, now) = runtime(PageKind::Landing);
        let clip = runtime
            .camera()
            .view_projection_matrix()
            .project_point3(glam::Vec3::new(300.0, 200.0, -44.0));
        let on_fish = Vec2::new((clip.x + 1.0) * 640.0, (1.0 - clip.y) * 360.0);

        let effect = runtime.pointer_pressed(on_fish, now);
        assert_eq!(effect, Some(Effect::Navigate(NavigationTarget::Page(PageKind::Fisheye))));
        runtime.pointer_released(on_fish, now);

        runtime.switch_to(PageKind::Fisheye, now).unwrap();
        assert_eq!(runtime.kind(), PageKind::Fisheye);
        assert_eq!(runtime.scene().len(), 1);
        assert_eq!(runtime.assets().len(), 39);
        assert_eq!(runtime.camera().eye, glam::Vec3::new(0.0, 0.0, 300.0));
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let (mut runtime, now) = runtime(PageKind::Worms);
        runtime.resize(Viewport::new(800, 800), now);
        assert_eq!(runtime.camera().aspect, 1.0);
        // Empty viewports leave the aspect alone and make pointer events no-ops
        runtime.resize(Viewport::new(0, 0), now);
        assert_eq!(runtime.camera().aspect, 1.0);
        assert_eq!(runtime.pointer_moved(Vec2::new(1.0, 1.0), now), None);
    }

    #[test]
    fn test_video_frames_bind_and_bump_generation() {
        let (mut runtime, now) = runtime(PageKind::Landing);
        let ready = record_ready(&mut runtime);
        let video = runtime.assets.register("videos/raincoatf.mp4", AssetKind::Video);

        runtime.bind_video_frame(video, frame(10, 0), now);
        assert_eq!(runtime.assets().generation(video), 1);
        assert_eq!(runtime.assets().image(video).map(|image| image.pixels[0]), Some(10));
        assert_eq!(*ready.borrow(), vec![video]);

        // Later frames replace the image without announcing the slot again
        runtime.bind_video_frame(video, frame(20, 1), now);
        runtime.bind_video_frame(video, frame(30, 2), now);
        assert_eq!(runtime.assets().generation(video), 3);
        assert_eq!(runtime.assets().image(video).map(|image| image.pixels[0]), Some(30));
        assert_eq!(*ready.borrow(), vec![video]);
    }

    #[test]
    fn test_dispatch_loads_images_and_fails_missing_video() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("fish001.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 128, 255, 255]))
            .save(&photo)
            .unwrap();

        let (mut runtime, now) = runtime(PageKind::Landing);
        let ready = record_ready(&mut runtime);
        runtime.loader = Some(AssetLoader::new().unwrap());
        // The page's own slots point at files that don't exist here
        runtime.dispatched = runtime.assets.len();

        let image_slot = runtime.assets.register(&photo, AssetKind::Image);
        let video_slot = runtime.assets.register(dir.path().join("missing.mp4"), AssetKind::Video);
        runtime.dispatch_loads();

        // Opening the video fails right away and leaves the slot blank
        assert!(runtime.assets().is_failed(video_slot));
        assert!(runtime.videos.is_empty());

        let deadline = Instant::now() + Duration::from_secs(10);
        while runtime.assets().generation(image_slot) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            runtime.tick(now);
        }
        let image = runtime.assets().image(image_slot).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(*ready.borrow(), vec![image_slot]);

        // Already dispatched slots are not requested again
        runtime.dispatch_loads();
        assert_eq!(runtime.loader.as_ref().map(AssetLoader::pending_count), Some(0));
    }

    #[test]
    fn test_pointer_leave_reaches_page() {
        let (mut runtime, now) = runtime(PageKind::Landing);
        let clip = runtime
            .camera()
            .view_projection_matrix()
            .project_point3(glam::Vec3::ZERO);
        let center = Vec2::new((clip.x + 1.0) * 640.0, (1.0 - clip.y) * 360.0);
        runtime.pointer_pressed(center, now);
        runtime.pointer_left(now);
        runtime.tick(now);
        let eye = runtime.camera().eye;

        runtime.pointer_moved(center + Vec2::new(300.0, 0.0), now);
        runtime.tick(now + Duration::from_millis(16));
        runtime.tick(now + Duration::from_millis(32));
        assert!((runtime.camera().eye - eye).length() < 1e-3);
    }
}
