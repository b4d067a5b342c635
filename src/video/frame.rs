//! Decoded video frame representation

use crate::assets::ImageData;

/// A decoded RGBA video frame
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Tightly packed RGBA pixels (4 bytes/pixel)
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in seconds
    pub pts: f64,
    /// Frame index (0-based) within the current loop
    pub frame_index: u64,
}

impl DecodedFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, pts: f64, frame_index: u64) -> Self {
        Self {
            data,
            width,
            height,
            pts,
            frame_index,
        }
    }

    /// Get the expected data size for RGBA frame dimensions (width * height * 4)
    pub fn expected_size(width: u32, height: u32) -> usize {
        ImageData::expected_size(width, height)
    }

    /// Check if the frame data has the correct size
    pub fn is_valid(&self) -> bool {
        self.data.len() == Self::expected_size(self.width, self.height)
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        (self.width as usize) * 4
    }

    /// Hand the pixels over as an image for an asset slot
    pub fn into_image(self) -> ImageData {
        ImageData {
            width: self.width,
            height: self.height,
            pixels: self.data,
        }
    }
}

/// Copy rows out of a padded plane into a tightly packed buffer
pub(crate) fn pack_rows(data: &[u8], stride: usize, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = (width as usize) * 4;
    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }
    let mut output = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let row_start = y * stride;
        output.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    output
}
