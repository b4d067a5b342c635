//! Immersive Pages
//!
//! Three interactive 3D media pages (a fisheye photo slideshow, a landing
//! scene with spinning models and clickable buttons, and a looping video
//! viewer with click-triggered photo overlays) hosted natively with wgpu and
//! winit.

pub mod app;
pub mod assets;
pub mod interaction;
pub mod pages;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod settings;
pub mod shaders;
pub mod telemetry;
pub mod video;

pub use app::PagesApp;
pub use pages::{Effect, NavigationTarget, PageKind, Viewport};
pub use runtime::PageRuntime;
pub use settings::{PagesSettings, SettingsError};
