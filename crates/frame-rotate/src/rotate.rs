use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

use crate::{convert, Frame, FrameError, Result, RotationAngle, RotationControl};

const BPP: usize = 4;

/// Rotate a 4-byte-per-pixel frame clockwise by `angle`.
///
/// Pixel (x, y) of a `w x h` input lands at:
/// - 0°:   (x, y)
/// - 90°:  (h-1-y, x), output is `h x w`
/// - 180°: (w-1-x, h-1-y)
/// - 270°: (y, w-1-x), output is `h x w`
///
/// The output is always a fresh, tightly packed buffer. Row padding in the
/// input is dropped and `pts` is copied as-is.
pub fn rotate(frame: &Frame, angle: RotationAngle) -> Result<Frame> {
    if frame.pixel_format.bytes_per_pixel() != BPP {
        return Err(FrameError::UnsupportedFormat(frame.pixel_format));
    }
    frame.validate()?;

    let (out_w, out_h) = if angle.swaps_dimensions() {
        (frame.height, frame.width)
    } else {
        (frame.width, frame.height)
    };
    let out_stride = out_w as usize * BPP;
    let len = out_stride
        .checked_mul(out_h as usize)
        .ok_or(FrameError::Allocation { bytes: usize::MAX })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FrameError::Allocation { bytes: len })?;

    let w = frame.width as usize;
    let h = frame.height as usize;
    let stride = frame.stride;
    let src = |x: usize, y: usize| {
        let i = y * stride + x * BPP;
        &frame.data[i..i + BPP]
    };

    match angle {
        RotationAngle::Deg0 => {
            for row in frame.rows() {
                data.extend_from_slice(row);
            }
        }
        RotationAngle::Deg90 => {
            for oy in 0..w {
                for ox in 0..h {
                    data.extend_from_slice(src(oy, h - 1 - ox));
                }
            }
        }
        RotationAngle::Deg180 => {
            for y in (0..h).rev() {
                let row = &frame.data[y * stride..y * stride + w * BPP];
                for px in row.chunks_exact(BPP).rev() {
                    data.extend_from_slice(px);
                }
            }
        }
        RotationAngle::Deg270 => {
            for oy in 0..w {
                for ox in 0..h {
                    data.extend_from_slice(src(w - 1 - oy, ox));
                }
            }
        }
    }
    debug_assert_eq!(data.len(), len);

    Ok(Frame::with_stride(
        out_w,
        out_h,
        out_stride,
        frame.pixel_format,
        data,
        frame.pts,
    ))
}

/// Rotates frames by whatever angle the shared [`RotationControl`] holds.
#[derive(Debug)]
pub struct FrameRotator {
    control: RotationControl,
    last_turns: AtomicU8,
}

impl FrameRotator {
    pub fn new(control: RotationControl) -> Self {
        let last_turns = AtomicU8::new(control.get().quarter_turns());
        Self {
            control,
            last_turns,
        }
    }

    pub fn control(&self) -> &RotationControl {
        &self.control
    }

    /// Angle sampled by the most recent [`FrameRotator::process`] call.
    pub fn last_applied(&self) -> RotationAngle {
        RotationAngle::from_quarter_turns(self.last_turns.load(Ordering::Relaxed))
    }

    /// Rotate one frame. The angle is sampled once, so a concurrent
    /// `set` applies from the next frame on.
    pub fn process(&self, frame: &Frame) -> Result<Frame> {
        let angle = self.control.get();
        let prev = self
            .last_turns
            .swap(angle.quarter_turns(), Ordering::Relaxed);
        if prev != angle.quarter_turns() {
            debug!(
                from = %RotationAngle::from_quarter_turns(prev),
                to = %angle,
                "rotation changed"
            );
        }
        let input = convert::to_four_channel(frame)?;
        rotate(&input, angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;
    use time::Duration;

    const RED: [u8; 4] = [0, 0, 255, 255];
    const BLUE: [u8; 4] = [255, 0, 0, 255];

    /// Frame where every pixel encodes its own coordinates.
    fn coord_frame(width: u32, height: u32, pad: usize) -> Frame {
        let stride = width as usize * BPP + pad;
        let mut data = vec![0xEE; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let i = y * stride + x * BPP;
                data[i..i + BPP].copy_from_slice(&[x as u8, y as u8, 0x7F, 0xFF]);
            }
        }
        Frame::with_stride(
            width,
            height,
            stride,
            PixelFormat::Bgra8,
            data,
            Duration::milliseconds(1234),
        )
    }

    #[test]
    fn test_rotate_90_two_pixel_scenario() {
        let mut data = Vec::new();
        data.extend_from_slice(&RED);
        data.extend_from_slice(&BLUE);
        let f = Frame::new(2, 1, PixelFormat::Bgra8, data, Duration::ZERO);
        let out = rotate(&f, RotationAngle::Deg90).unwrap();
        assert_eq!((out.width, out.height), (1, 2));
        assert_eq!(out.pixel(0, 0), Some(&RED[..]));
        assert_eq!(out.pixel(0, 1), Some(&BLUE[..]));
    }

    #[test]
    fn test_rotate_180_moves_origin_to_far_corner() {
        let f = coord_frame(4, 2, 0);
        let out = rotate(&f, RotationAngle::Deg180).unwrap();
        assert_eq!((out.width, out.height), (4, 2));
        assert_eq!(out.pixel(3, 1), f.pixel(0, 0));
    }

    #[test]
    fn test_mapping_formulas_for_every_pixel() {
        let f = coord_frame(5, 3, 8);
        let (w, h) = (f.width, f.height);
        let r90 = rotate(&f, RotationAngle::Deg90).unwrap();
        let r180 = rotate(&f, RotationAngle::Deg180).unwrap();
        let r270 = rotate(&f, RotationAngle::Deg270).unwrap();
        for y in 0..h {
            for x in 0..w {
                let px = f.pixel(x, y);
                assert_eq!(r90.pixel(h - 1 - y, x), px);
                assert_eq!(r180.pixel(w - 1 - x, h - 1 - y), px);
                assert_eq!(r270.pixel(y, w - 1 - x), px);
            }
        }
    }

    #[test]
    fn test_dimension_swap() {
        let f = coord_frame(7, 3, 0);
        for angle in [RotationAngle::Deg90, RotationAngle::Deg270] {
            let out = rotate(&f, angle).unwrap();
            assert_eq!(out.width, f.height);
            assert_eq!(out.height, f.width);
            assert_eq!(out.stride, out.width as usize * BPP);
            assert_eq!(out.data.len(), out.stride * out.height as usize);
        }
    }

    #[test]
    fn test_identity_strips_padding_only() {
        let f = coord_frame(3, 4, 12);
        let out = rotate(&f, RotationAngle::Deg0).unwrap();
        assert_eq!((out.width, out.height), (3, 4));
        assert_eq!(out.stride, 12);
        for y in 0..4 {
            for x in 0..3 {
                assert_eq!(out.pixel(x, y), f.pixel(x, y));
            }
        }
        let packed = coord_frame(3, 4, 0);
        assert_eq!(rotate(&packed, RotationAngle::Deg0).unwrap(), packed);
    }

    #[test]
    fn test_round_trip_restores_original() {
        let f = coord_frame(6, 4, 0);
        for angle in RotationAngle::ALL {
            let there = rotate(&f, angle).unwrap();
            let back = rotate(&there, angle.inverse()).unwrap();
            assert_eq!(back, f, "round trip through {angle}");
        }
    }

    #[test]
    fn test_180_twice_is_identity() {
        let f = coord_frame(5, 2, 0);
        let twice = rotate(&rotate(&f, RotationAngle::Deg180).unwrap(), RotationAngle::Deg180)
            .unwrap();
        assert_eq!(twice, f);
    }

    #[test]
    fn test_pts_preserved() {
        let f = coord_frame(2, 3, 4);
        for angle in RotationAngle::ALL {
            assert_eq!(rotate(&f, angle).unwrap().pts, f.pts);
        }
    }

    #[test]
    fn test_single_pixel_unchanged() {
        let f = Frame::new(1, 1, PixelFormat::Bgra8, RED.to_vec(), Duration::ZERO);
        for angle in RotationAngle::ALL {
            let out = rotate(&f, angle).unwrap();
            assert_eq!((out.width, out.height), (1, 1));
            assert_eq!(out.data, RED.to_vec());
        }
    }

    #[test]
    fn test_zero_width_is_invalid() {
        let f = Frame::new(0, 4, PixelFormat::Bgra8, Vec::new(), Duration::ZERO);
        assert!(matches!(
            rotate(&f, RotationAngle::Deg90),
            Err(FrameError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_rejects_three_byte_format() {
        let f = Frame::new(1, 1, PixelFormat::Rgb8, vec![1, 2, 3], Duration::ZERO);
        assert_eq!(
            rotate(&f, RotationAngle::Deg0),
            Err(FrameError::UnsupportedFormat(PixelFormat::Rgb8))
        );
    }

    #[test]
    fn test_rotator_reads_control_per_frame() {
        let control = RotationControl::default();
        let rotator = FrameRotator::new(control.clone());
        let f = coord_frame(4, 2, 0);
        assert_eq!(rotator.process(&f).unwrap().width, 4);
        control.set(RotationAngle::Deg270);
        let out = rotator.process(&f).unwrap();
        assert_eq!((out.width, out.height), (2, 4));
    }

    #[test]
    fn test_rotator_converts_three_byte_input() {
        let rotator = FrameRotator::new(RotationControl::new(RotationAngle::Deg90));
        let f = Frame::new(2, 1, PixelFormat::Bgr8, vec![1, 2, 3, 4, 5, 6], Duration::ZERO);
        let out = rotator.process(&f).unwrap();
        assert_eq!(out.pixel_format, PixelFormat::Bgra8);
        assert_eq!(out.pixel(0, 0), Some(&[1u8, 2, 3, 255][..]));
        assert_eq!(out.pixel(0, 1), Some(&[4u8, 5, 6, 255][..]));
    }
}
