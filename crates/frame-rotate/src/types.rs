use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{FrameError, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Bgra8,
    Rgba8,
    Bgr8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One captured video frame.
///
/// `stride` is the number of bytes per row and may exceed
/// `width * bytes_per_pixel` when the producer pads rows for alignment.
/// `pts` is the presentation timestamp relative to the start of the capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
    pub pts: Duration,
}

impl Frame {
    /// Build a frame with tightly packed rows.
    pub fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        data: Vec<u8>,
        pts: Duration,
    ) -> Self {
        let stride = width as usize * pixel_format.bytes_per_pixel();
        Self::with_stride(width, height, stride, pixel_format, data, pts)
    }

    pub fn with_stride(
        width: u32,
        height: u32,
        stride: usize,
        pixel_format: PixelFormat,
        data: Vec<u8>,
        pts: Duration,
    ) -> Self {
        Self {
            width,
            height,
            stride,
            pixel_format,
            data,
            pts,
        }
    }

    /// Bytes of visible pixel data in one row, excluding padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.pixel_format.bytes_per_pixel()
    }

    /// Check dimensions, stride and buffer length against each other.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidFrame(format!(
                "zero dimension {}x{}",
                self.width, self.height
            )));
        }
        let row_bytes = self.row_bytes();
        if self.stride < row_bytes {
            return Err(FrameError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                self.stride, row_bytes
            )));
        }
        let needed = self
            .stride
            .checked_mul(self.height as usize)
            .ok_or_else(|| FrameError::InvalidFrame("buffer size overflows".to_string()))?;
        if self.data.len() < needed {
            return Err(FrameError::InvalidFrame(format!(
                "buffer holds {} bytes, {}x{} with stride {} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.stride,
                needed
            )));
        }
        Ok(())
    }

    /// The bytes of the pixel at column `x`, row `y`, or `None` when out of bounds
    /// or when the offset does not fit in `usize`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.pixel_format.bytes_per_pixel();
        let start = (y as usize)
            .checked_mul(self.stride)?
            .checked_add((x as usize).checked_mul(bpp)?)?;
        self.data.get(start..start.checked_add(bpp)?)
    }

    /// Iterate over the visible part of each row.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_bytes = self.row_bytes();
        self.data
            .chunks(self.stride.max(1))
            .take(self.height as usize)
            .map(move |row| &row[..row_bytes.min(row.len())])
    }
}
