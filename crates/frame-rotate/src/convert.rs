use std::borrow::Cow;

use crate::{Frame, FrameError, PixelFormat, Result};

/// Return `frame` unchanged when it already has 4 bytes per pixel, otherwise
/// expand it to packed BGRA with an opaque alpha channel.
pub fn to_four_channel(frame: &Frame) -> Result<Cow<'_, Frame>> {
    match frame.pixel_format {
        PixelFormat::Bgra8 | PixelFormat::Rgba8 => Ok(Cow::Borrowed(frame)),
        PixelFormat::Bgr8 => expand(frame, |px| [px[0], px[1], px[2], 0xFF]).map(Cow::Owned),
        PixelFormat::Rgb8 => expand(frame, |px| [px[2], px[1], px[0], 0xFF]).map(Cow::Owned),
        PixelFormat::Gray8 => expand(frame, |px| [px[0], px[0], px[0], 0xFF]).map(Cow::Owned),
    }
}

fn expand(frame: &Frame, map: impl Fn(&[u8]) -> [u8; 4]) -> Result<Frame> {
    frame.validate()?;
    let bpp = frame.pixel_format.bytes_per_pixel();
    let len = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(FrameError::Allocation { bytes: usize::MAX })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FrameError::Allocation { bytes: len })?;
    for row in frame.rows() {
        for px in row.chunks_exact(bpp) {
            data.extend_from_slice(&map(px));
        }
    }
    Ok(Frame::new(
        frame.width,
        frame.height,
        PixelFormat::Bgra8,
        data,
        frame.pts,
    ))
}
