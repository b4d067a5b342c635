//! Window host
//!
//! Owns the window, the GPU context and the running [`PageRuntime`], feeds
//! winit events to the page and applies the effects it returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, Fullscreen, Window, WindowAttributes, WindowId};

use crate::interaction::CursorStyle;
use crate::pages::{Effect, NavigationTarget, PageKind, Viewport};
use crate::render::{GpuContext, SceneRenderer};
use crate::runtime::PageRuntime;
use crate::settings::PagesSettings;

/// Within this distance of the deadline we spin instead of sleeping
const SPIN_THRESHOLD: Duration = Duration::from_micros(2000);
/// Wake this early before a deadline
const WAKE_EARLY: Duration = Duration::from_micros(1000);

pub fn window_title(kind: PageKind) -> String {
    format!("Immersive Pages - {}", kind.display_name())
}

fn cursor_icon(style: CursorStyle) -> CursorIcon {
    match style {
        CursorStyle::Default => CursorIcon::Default,
        CursorStyle::Pointer => CursorIcon::Pointer,
    }
}

/// Fixed-rate redraw scheduling for when vsync is off
#[derive(Debug, Clone, Copy)]
struct FramePacer {
    frame_duration: Duration,
    next_redraw_at: Instant,
}

impl FramePacer {
    fn new(target_fps: u32, now: Instant) -> Self {
        // Integer nanoseconds to avoid floating-point drift
        let frame_nanos = 1_000_000_000u64 / target_fps.max(1) as u64;
        Self {
            frame_duration: Duration::from_nanos(frame_nanos),
            next_redraw_at: now,
        }
    }

    /// `Some(wake_at)` while the next frame is not close enough to start
    fn wait_until(&self, now: Instant) -> Option<Instant> {
        if now >= self.next_redraw_at || self.next_redraw_at.duration_since(now) <= SPIN_THRESHOLD {
            return None;
        }
        Some(self.wake_at())
    }

    /// Busy-wait the last stretch before the deadline
    fn spin_until_due(&self) {
        while Instant::now() < self.next_redraw_at {
            std::hint::spin_loop();
        }
    }

    /// Move to the next frame slot, dropping missed slots when far behind.
    /// Returns when to wake for it.
    fn advance(&mut self, now: Instant) -> Instant {
        self.next_redraw_at += self.frame_duration;
        if now > self.next_redraw_at + self.frame_duration * 2 {
            self.next_redraw_at = now + self.frame_duration;
        }
        self.wake_at()
    }

    fn wake_at(&self) -> Instant {
        self.next_redraw_at
            .checked_sub(WAKE_EARLY)
            .unwrap_or(self.next_redraw_at)
    }
}

enum AppState {
    Uninitialized,
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        renderer: SceneRenderer,
        runtime: PageRuntime,
    },
    /// Startup failed; the loop is exiting
    Failed,
}

/// Host application driven by the winit event loop
pub struct PagesApp {
    settings: PagesSettings,
    start_page: PageKind,
    state: AppState,
    /// Last cursor position in physical pixels
    pointer: Vec2,
    pacer: FramePacer,
}

impl PagesApp {
    pub fn new(settings: PagesSettings, start_page: PageKind) -> Self {
        let pacer = FramePacer::new(settings.target_fps, Instant::now());
        Self {
            settings,
            start_page,
            state: AppState::Uninitialized,
            pointer: Vec2::ZERO,
            pacer,
        }
    }

    /// Whether startup failed (window, GPU or asset loader)
    pub fn has_failed(&self) -> bool {
        matches!(self.state, AppState::Failed)
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<AppState, Box<dyn std::error::Error>> {
        let window_attributes = WindowAttributes::default()
            .with_title(window_title(self.start_page))
            .with_inner_size(LogicalSize::new(self.settings.window_width, self.settings.window_height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        window.focus_window();

        let size = window.inner_size();
        tracing::info!("Window created: {}x{}", size.width, size.height);

        let gpu = pollster::block_on(GpuContext::new(window.clone(), self.settings.vsync_enabled))?;
        let renderer = SceneRenderer::new(&gpu.device, &gpu.queue, gpu.format());
        let runtime = PageRuntime::new(
            self.settings.clone(),
            self.start_page,
            Viewport::new(size.width, size.height),
            Instant::now(),
        )?;

        Ok(AppState::Running {
            window,
            gpu,
            renderer,
            runtime,
        })
    }
}

/// Carry out what a page handler asked for
fn apply_effect(
    event_loop: &ActiveEventLoop,
    window: &Window,
    renderer: &mut SceneRenderer,
    runtime: &mut PageRuntime,
    effect: Effect,
) {
    match effect {
        Effect::SetCursor(style) => window.set_cursor(cursor_icon(style)),
        Effect::Navigate(NavigationTarget::Page(kind)) => {
            if let Err(e) = runtime.switch_to(kind, Instant::now()) {
                tracing::error!("Failed to switch to {} page: {}", kind.display_name(), e);
                event_loop.exit();
                return;
            }
            renderer.reset_assets();
            window.set_cursor(CursorIcon::Default);
            window.set_title(&window_title(kind));
        }
        Effect::Navigate(NavigationTarget::External(url)) => {
            tracing::info!("Opening {}", url);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open {}: {}", url, e);
            }
            // Following the link leaves the pages
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for PagesApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Uninitialized) {
            return;
        }
        tracing::info!("Creating window...");

        match self.start(event_loop) {
            Ok(state) => {
                self.state = state;
                self.pacer = FramePacer::new(self.settings.target_fps, Instant::now());
            }
            Err(e) => {
                tracing::error!("Startup failed: {}", e);
                self.state = AppState::Failed;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let AppState::Running {
            window,
            gpu,
            renderer,
            runtime,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, shutting down");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                runtime.resize(Viewport::new(size.width, size.height), Instant::now());
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = Vec2::new(position.x as f32, position.y as f32);
                if let Some(effect) = runtime.pointer_moved(self.pointer, Instant::now()) {
                    apply_effect(event_loop, &**window, renderer, runtime, effect);
                }
            }

            WindowEvent::CursorLeft { .. } => runtime.pointer_left(Instant::now()),

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if let Some(effect) = runtime.pointer_pressed(self.pointer, Instant::now()) {
                        apply_effect(event_loop, &**window, renderer, runtime, effect);
                    }
                }
                ElementState::Released => runtime.pointer_released(self.pointer, Instant::now()),
            },

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F11),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
            }

            WindowEvent::RedrawRequested => {
                runtime.tick(Instant::now());
                match renderer.render(gpu, runtime.scene(), runtime.camera(), runtime.assets()) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        tracing::warn!("Surface lost, reconfiguring...");
                        let (width, height) = gpu.size();
                        gpu.resize(width, height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(e) => {
                        tracing::warn!("Surface error: {:?}", e);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, .. } = &self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        // VSYNC mode: Fifo presentation paces the loop
        if self.settings.vsync_enabled {
            window.request_redraw();
            event_loop.set_control_flow(ControlFlow::Poll);
            return;
        }

        if let Some(wake_at) = self.pacer.wait_until(Instant::now()) {
            event_loop.set_control_flow(ControlFlow::WaitUntil(wake_at));
            return;
        }
        self.pacer.spin_until_due();

        window.request_redraw();

        let wake_at = self.pacer.advance(Instant::now());
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake_at));
    }
}
