//! Looping video playback
//!
//! Decodes video files with FFmpeg via the `ffmpeg-next` crate on a background
//! thread. Frames come out as RGBA buffers ready to bind to an asset slot.
//! Audio streams are never decoded, so playback is always muted.

mod decoder;
mod frame;
mod player;

pub use decoder::VideoDecoder;
pub use frame::DecodedFrame;
pub use player::{VideoInfo, VideoPlayer};

/// Errors that can occur while opening or decoding a video
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("failed to open video file: {0}")]
    OpenFailed(String),
    #[error("no video stream found in file")]
    NoVideoStream,
    #[error("failed to create decoder: {0}")]
    DecoderCreationFailed(String),
    #[error("failed to create scaler: {0}")]
    ScalerCreationFailed(String),
    #[error("decoding failed: {0}")]
    DecodeFailed(String),
    #[error("failed to spawn decode thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}
