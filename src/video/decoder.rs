//! Video decoder using FFmpeg
//!
//! Software decode to RGBA through a swscale context. Only the best video
//! stream is read; packets from every other stream are skipped.

use std::path::Path;

use super::frame::pack_rows;
use super::{DecodedFrame, VideoError};

/// Fallback when the container reports no usable frame rate
const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Video decoder that reads frames from a video file
pub struct VideoDecoder {
    input: ffmpeg_next::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg_next::decoder::Video,
    /// Converts decoder output to RGBA
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    frame_rate: f64,
    /// Duration in seconds, 0 when unknown
    duration: f64,
    /// Seconds per PTS tick
    time_base: f64,
    frame_index: u64,
    eof: bool,
}

impl VideoDecoder {
    /// Open a video file for decoding
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoError> {
        // Safe to call multiple times
        ffmpeg_next::init()?;

        let path = path.as_ref();
        let input = ffmpeg_next::format::input(&path)
            .map_err(|_| VideoError::OpenFailed(path.to_string_lossy().into_owned()))?;

        let video_stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let video_stream_index = video_stream.index();

        let time_base = video_stream.time_base();
        let time_base_f64 = time_base.numerator() as f64 / time_base.denominator() as f64;

        let frame_rate = video_stream.avg_frame_rate();
        let frame_rate_f64 = if frame_rate.denominator() > 0 && frame_rate.numerator() > 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            DEFAULT_FRAME_RATE
        };

        let duration = if video_stream.duration() > 0 {
            video_stream.duration() as f64 * time_base_f64
        } else if input.duration() > 0 {
            input.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        let context = ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| VideoError::DecoderCreationFailed(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::ScalerCreationFailed(e.to_string()))?;

        tracing::info!(
            "Opened video {}: {}x{} @ {:.2}fps, duration: {:.2}s",
            path.display(),
            width,
            height,
            frame_rate_f64,
            duration
        );

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler,
            width,
            height,
            frame_rate: frame_rate_f64,
            duration,
            time_base: time_base_f64,
            frame_index: 0,
            eof: false,
        })
    }

    /// Decode the next frame, returning None at end of file
    pub fn decode_next_frame(&mut self) -> Result<Option<DecodedFrame>, VideoError> {
        if self.eof {
            return Ok(None);
        }

        let mut decoded_frame = ffmpeg_next::frame::Video::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => return self.convert(&decoded_frame).map(Some),
                Err(ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::EAGAIN,
                }) => {
                    // Need more input
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.eof = true;
                    return Ok(None);
                }
                Err(e) => return Err(VideoError::DecodeFailed(e.to_string())),
            }

            self.feed_packet()?;
        }
    }

    /// Send the next video packet to the decoder, or EOF when the file ends
    fn feed_packet(&mut self) -> Result<(), VideoError> {
        loop {
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                        return Ok(());
                    }
                }
                None => {
                    self.decoder.send_eof()?;
                    return Ok(());
                }
            }
        }
    }

    fn convert(&mut self, decoded: &ffmpeg_next::frame::Video) -> Result<DecodedFrame, VideoError> {
        let pts = decoded.pts().unwrap_or(0) as f64 * self.time_base;

        // Recreate scaler if the decoder changed its output format mid-stream
        if decoded.format() != self.scaler.input().format {
            self.scaler = ffmpeg_next::software::scaling::Context::get(
                decoded.format(),
                self.width,
                self.height,
                ffmpeg_next::format::Pixel::RGBA,
                self.width,
                self.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .map_err(|e| VideoError::ScalerCreationFailed(e.to_string()))?;
        }

        let mut rgba_frame = ffmpeg_next::frame::Video::empty();
        self.scaler.run(decoded, &mut rgba_frame)?;

        let data = pack_rows(rgba_frame.data(0), rgba_frame.stride(0), self.width, self.height);
        let frame = DecodedFrame::new(data, self.width, self.height, pts, self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }

    /// Rewind to the first frame
    pub fn reset(&mut self) -> Result<(), VideoError> {
        self.input.seek(0, ..)?;
        self.decoder.flush();
        self.frame_index = 0;
        self.eof = false;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = VideoDecoder::open("/nonexistent/videos/raincoatf.mp4");
        assert!(matches!(result, Err(VideoError::OpenFailed(_))));
    }
}
