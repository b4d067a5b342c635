//! Background asset loader
//!
//! Decodes images and parses models on a worker thread so page setup never
//! blocks the event loop. Completions arrive in whatever order the worker
//! finishes them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use super::store::{AssetData, ImageData};
use super::{is_remote, load_obj, AssetError, AssetId, AssetKind};

/// Request for an image or model load
struct LoadRequest {
    id: AssetId,
    path: PathBuf,
    kind: AssetKind,
}

/// Result of a load, success or failure
#[derive(Debug)]
pub struct LoadCompletion {
    pub id: AssetId,
    pub result: Result<AssetData, AssetError>,
}

/// Loader with a single background worker
pub struct AssetLoader {
    /// Channel to send load requests to the worker
    request_tx: Sender<LoadRequest>,
    /// Channel to receive completed loads from the worker
    result_rx: Receiver<LoadCompletion>,
    /// Ids requested but not yet completed
    pending: HashSet<AssetId>,
}

impl AssetLoader {
    /// Create a loader and spawn its worker thread
    pub fn new() -> Result<Self, AssetError> {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::channel::<LoadCompletion>();

        thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                Self::worker_thread(request_rx, result_tx);
            })
            .map_err(|source| AssetError::Io {
                path: PathBuf::from("asset-loader"),
                source,
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            pending: HashSet::new(),
        })
    }

    fn worker_thread(request_rx: Receiver<LoadRequest>, result_tx: Sender<LoadCompletion>) {
        while let Ok(request) = request_rx.recv() {
            let result = Self::load(&request.path, request.kind);
            if result_tx.send(LoadCompletion { id: request.id, result }).is_err() {
                // Loader dropped, exit
                break;
            }
        }
        tracing::debug!("Asset loader thread exiting");
    }

    /// Load one asset synchronously
    pub fn load(path: &Path, kind: AssetKind) -> Result<AssetData, AssetError> {
        if is_remote(path) {
            return Err(AssetError::RemoteSource(path.to_string_lossy().into_owned()));
        }
        match kind {
            AssetKind::Image => load_image(path).map(AssetData::Image),
            AssetKind::Model => load_obj(path).map(AssetData::Mesh),
            AssetKind::Video => Err(AssetError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Unsupported, "videos are streamed, not loaded"),
            }),
        }
    }

    /// Queue a load. Duplicate requests for a pending id are ignored.
    pub fn request(&mut self, id: AssetId, path: impl Into<PathBuf>, kind: AssetKind) -> Result<(), AssetError> {
        if !self.pending.insert(id) {
            return Ok(());
        }
        let path = path.into();
        tracing::debug!(asset = id.0, path = %path.display(), ?kind, "Queued asset load");
        self.request_tx
            .send(LoadRequest { id, path, kind })
            .map_err(|_| AssetError::LoaderStopped)
    }

    /// Drain completions without blocking
    pub fn poll(&mut self) -> Vec<LoadCompletion> {
        let mut completions = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(completion) => {
                    self.pending.remove(&completion.id);
                    completions.push(completion);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        completions
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn load_image(path: &Path) -> Result<ImageData, AssetError> {
    let decoded = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "Image decoded");
    Ok(ImageData {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    /// Block up to `timeout` for the next completion
    fn wait_for(loader: &mut AssetLoader, timeout: Duration) -> Option<LoadCompletion> {
        match loader.result_rx.recv_timeout(timeout) {
            Ok(completion) => {
                loader.pending.remove(&completion.id);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 128]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_loads_image_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "fish002.png", 4, 2);

        let mut loader = AssetLoader::new().unwrap();
        loader.request(AssetId(3), &path, AssetKind::Image).unwrap();
        assert_eq!(loader.pending_count(), 1);

        let completion = wait_for(&mut loader, Duration::from_secs(10)).unwrap();
        assert_eq!(completion.id, AssetId(3));
        match completion.result.unwrap() {
            AssetData::Image(image) => {
                assert_eq!((image.width, image.height), (4, 2));
                assert!(image.is_valid());
                assert_eq!(&image.pixels[..4], &[255, 0, 0, 128]);
            }
            other => panic!("unexpected asset data: {:?}", other),
        }
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_missing_file_reports_failure() {
        let mut loader = AssetLoader::new().unwrap();
        loader
            .request(AssetId(0), "/nonexistent/photos/1.png", AssetKind::Image)
            .unwrap();
        let completion = wait_for(&mut loader, Duration::from_secs(10)).unwrap();
        assert!(matches!(completion.result, Err(AssetError::Image { .. })));
    }

    #[test]
    fn test_remote_sources_are_rejected() {
        let result = AssetLoader::load(Path::new("https://drive.google.com/x"), AssetKind::Image);
        assert!(matches!(result, Err(AssetError::RemoteSource(_))));
    }

    #[test]
    fn test_duplicate_requests_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "click.png", 1, 1);
        let mut loader = AssetLoader::new().unwrap();
        loader.request(AssetId(1), &path, AssetKind::Image).unwrap();
        loader.request(AssetId(1), &path, AssetKind::Image).unwrap();
        assert_eq!(loader.pending_count(), 1);
        assert!(wait_for(&mut loader, Duration::from_secs(10)).is_some());
        assert!(wait_for(&mut loader, Duration::from_millis(100)).is_none());
    }
}
