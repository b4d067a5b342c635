//! Asset slot storage
//!
//! Every bind bumps the slot's generation so the renderer knows to re-upload.

use std::path::{Path, PathBuf};

use super::{AssetError, AssetId, AssetKind};
use crate::scene::MeshData;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA rows, top row first
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Get the expected data size for RGBA dimensions (width * height * 4)
    pub fn expected_size(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 4
    }

    /// Check if the pixel data matches the dimensions
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == Self::expected_size(self.width, self.height)
    }
}

/// Payload of a loaded asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    Image(ImageData),
    Mesh(MeshData),
}

/// Load state of a slot
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Pending,
    Ready(AssetData),
    /// Load failed; the reason was logged and the slot stays blank
    Failed(String),
}

#[derive(Debug)]
struct AssetEntry {
    path: PathBuf,
    kind: AssetKind,
    state: AssetState,
    generation: u64,
}

/// Ordered asset slots
#[derive(Debug, Default)]
pub struct AssetStore {
    entries: Vec<AssetEntry>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending slot
    pub fn register(&mut self, path: impl Into<PathBuf>, kind: AssetKind) -> AssetId {
        let id = AssetId(self.entries.len() as u32);
        self.entries.push(AssetEntry {
            path: path.into(),
            kind,
            state: AssetState::Pending,
            generation: 0,
        });
        id
    }

    /// Bind the outcome of a load.
    ///
    /// Failures are logged and leave the slot blank; there is no retry.
    pub fn complete(&mut self, id: AssetId, result: Result<AssetData, AssetError>) {
        let Some(entry) = self.entries.get_mut(id.0 as usize) else {
            tracing::warn!(asset = id.0, "Load completed for unknown asset slot");
            return;
        };
        match result {
            Ok(data) => {
                tracing::debug!(asset = id.0, path = %entry.path.display(), "Asset bound");
                entry.state = AssetState::Ready(data);
                entry.generation += 1;
            }
            Err(e) => {
                tracing::warn!(asset = id.0, path = %entry.path.display(), "Asset failed to load: {}", e);
                entry.state = AssetState::Failed(e.to_string());
            }
        }
    }

    /// Replace the image of a ready or pending slot (video frames)
    pub fn update_image(&mut self, id: AssetId, image: ImageData) {
        if let Some(entry) = self.entries.get_mut(id.0 as usize) {
            entry.state = AssetState::Ready(AssetData::Image(image));
            entry.generation += 1;
        }
    }

    pub fn state(&self, id: AssetId) -> Option<&AssetState> {
        self.entries.get(id.0 as usize).map(|e| &e.state)
    }

    pub fn kind(&self, id: AssetId) -> Option<AssetKind> {
        self.entries.get(id.0 as usize).map(|e| e.kind)
    }

    pub fn path(&self, id: AssetId) -> Option<&Path> {
        self.entries.get(id.0 as usize).map(|e| e.path.as_path())
    }

    /// Incremented on every bind; 0 means nothing was ever bound
    pub fn generation(&self, id: AssetId) -> u64 {
        self.entries.get(id.0 as usize).map_or(0, |e| e.generation)
    }

    pub fn image(&self, id: AssetId) -> Option<&ImageData> {
        match self.state(id)? {
            AssetState::Ready(AssetData::Image(image)) => Some(image),
            _ => None,
        }
    }

    pub fn mesh(&self, id: AssetId) -> Option<&MeshData> {
        match self.state(id)? {
            AssetState::Ready(AssetData::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_failed(&self, id: AssetId) -> bool {
        matches!(self.state(id), Some(AssetState::Failed(_)))
    }

    /// Slots in registration order
    pub fn ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        (0..self.entries.len()).map(|i| AssetId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(value: u8) -> ImageData {
        ImageData {
            width: 1,
            height: 1,
            pixels: vec![value; 4],
        }
    }

    #[test]
    fn test_out_of_order_completion() {
        let mut store = AssetStore::new();
        let first = store.register("photos/1.png", AssetKind::Image);
        let second = store.register("photos/2.png", AssetKind::Image);

        store.complete(second, Ok(AssetData::Image(pixel(2))));
        assert!(store.image(first).is_none());
        assert_eq!(store.image(second).unwrap().pixels[0], 2);

        store.complete(first, Ok(AssetData::Image(pixel(1))));
        assert_eq!(store.image(first).unwrap().pixels[0], 1);
        assert_eq!(store.generation(first), 1);
    }

    #[test]
    fn test_failure_leaves_slot_blank() {
        let mut store = AssetStore::new();
        let id = store.register("missing.png", AssetKind::Image);
        store.complete(id, Err(AssetError::RemoteSource("https://x.test".into())));
        assert!(store.is_failed(id));
        assert!(store.image(id).is_none());
        assert_eq!(store.generation(id), 0);
    }

    #[test]
    fn test_video_frames_bump_generation() {
        let mut store = AssetStore::new();
        let id = store.register("videos/raincoatf.mp4", AssetKind::Video);
        store.update_image(id, pixel(1));
        store.update_image(id, pixel(2));
        assert_eq!(store.generation(id), 2);
        assert_eq!(store.kind(id), Some(AssetKind::Video));
    }

    #[test]
    fn test_image_validity() {
        assert!(pixel(0).is_valid());
        let broken = ImageData {
            width: 2,
            height: 2,
            pixels: vec![0; 4],
        };
        assert!(!broken.is_valid());
    }
}
