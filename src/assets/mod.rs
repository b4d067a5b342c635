//! Asset slots and background loading
//!
//! Pages register images, videos and models up front and refer to them by
//! [`AssetId`]. Loads complete in any order; whatever is bound when a frame
//! is drawn is what appears. A failed load leaves its slot blank.

mod loader;
mod model;
mod store;

pub use loader::{AssetLoader, LoadCompletion};
pub use model::load_obj;
pub use store::{AssetData, AssetState, AssetStore, ImageData};

use std::path::{Path, PathBuf};

/// Handle to an asset slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u32);

/// What kind of media a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
    Model,
}

/// Errors raised while loading an asset. None of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse OBJ {path}: {message}")]
    ObjParse { path: PathBuf, message: String },
    #[error("model {0} has no geometry")]
    EmptyModel(PathBuf),
    #[error("remote asset sources are not supported: {0}")]
    RemoteSource(String),
    #[error("video {path}: {source}")]
    Video {
        path: PathBuf,
        #[source]
        source: crate::video::VideoError,
    },
    #[error("asset loader is not running")]
    LoaderStopped,
}

/// True for `http://` and `https://` sources, which are never fetched
pub fn is_remote(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.starts_with("http://") || text.starts_with("https://")
}

/// Resolve a configured asset path against the asset root
pub fn resolve(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() || is_remote(candidate) {
        candidate.to_path_buf()
    } else {
        root.join(path.trim_start_matches("./"))
    }
}
