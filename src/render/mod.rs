//! GPU rendering of the running page's scene

mod gpu;
mod renderer;
mod texture;

pub use gpu::{GpuContext, RenderError};
pub use renderer::{draw_order, SceneRenderer};
pub use texture::TextureCache;
