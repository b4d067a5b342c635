//! Background-threaded looping video player
//!
//! Decodes on a background thread at the video's native frame rate and
//! rewinds at end of file. The main thread picks up the latest frame without
//! blocking; frames it misses are dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{DecodedFrame, VideoDecoder, VideoError};

/// Shared state between decode thread and main thread
struct SharedState {
    /// The latest decoded frame (if any)
    current_frame: Mutex<Option<DecodedFrame>>,
    new_frame_available: AtomicBool,
    running: AtomicBool,
}

/// Video metadata available on the main thread
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub duration: f64,
}

/// Looping, muted video player
pub struct VideoPlayer {
    state: Arc<SharedState>,
    thread_handle: Option<JoinHandle<()>>,
    info: VideoInfo,
}

impl VideoPlayer {
    /// Open a video file and start playback immediately
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        let decoder = VideoDecoder::open(path)?;
        let info = VideoInfo {
            width: decoder.width(),
            height: decoder.height(),
            frame_rate: decoder.frame_rate(),
            duration: decoder.duration(),
        };

        let state = Arc::new(SharedState {
            current_frame: Mutex::new(None),
            new_frame_available: AtomicBool::new(false),
            running: AtomicBool::new(true),
        });
        let thread_state = Arc::clone(&state);
        let thread_path = path.to_path_buf();
        // The scaler context is not Send, so the thread opens its own decoder
        drop(decoder);

        let thread_handle = thread::Builder::new()
            .name("video-decode".into())
            .spawn(move || Self::decode_loop(thread_state, thread_path))
            .map_err(VideoError::ThreadSpawn)?;

        Ok(Self {
            state,
            thread_handle: Some(thread_handle),
            info,
        })
    }

    fn decode_loop(state: Arc<SharedState>, path: PathBuf) {
        let mut decoder = match VideoDecoder::open(&path) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("Failed to open video in decode thread: {}", e);
                return;
            }
        };

        let frame_duration = Duration::from_secs_f64(1.0 / decoder.frame_rate());
        let mut next_frame_time = Instant::now();
        let mut failures = 0u32;
        let mut decoded_since_reset = false;

        while state.running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now < next_frame_time {
                thread::sleep(next_frame_time - now);
            }

            match decoder.decode_next_frame() {
                Ok(Some(frame)) => {
                    failures = 0;
                    decoded_since_reset = true;
                    if let Ok(mut current) = state.current_frame.lock() {
                        *current = Some(frame);
                        state.new_frame_available.store(true, Ordering::Release);
                    }
                }
                Ok(None) => {
                    if !decoded_since_reset {
                        tracing::warn!("Video {} yielded no frames, stopping playback", path.display());
                        break;
                    }
                    decoded_since_reset = false;
                    if let Err(e) = decoder.reset() {
                        tracing::warn!("Failed to rewind video for loop: {}", e);
                        break;
                    }
                    tracing::trace!("VideoPlayer: looping");
                    continue;
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!("Decode error: {}", e);
                    // A stream that never yields a frame would spin forever
                    if failures >= 30 {
                        break;
                    }
                }
            }

            next_frame_time += frame_duration;
            // Don't try to catch up after a stall
            let now = Instant::now();
            if next_frame_time < now {
                next_frame_time = now;
            }
        }

        tracing::debug!("VideoPlayer decode thread stopped");
    }

    /// Take the latest decoded frame if one arrived since the last call
    pub fn take_frame(&self) -> Option<DecodedFrame> {
        if self.state.new_frame_available.swap(false, Ordering::AcqRel) {
            if let Ok(mut current) = self.state.current_frame.lock() {
                return current.take();
            }
        }
        None
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!("Failed to join decode thread: {:?}", e);
            }
        }
    }
}
