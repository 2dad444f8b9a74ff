use thiserror::Error;

use crate::PixelFormat;

pub type Result<T, E = FrameError> = core::result::Result<T, E>;

/// Per-frame failures. None of these are fatal to a capture pipeline; the
/// caller drops the frame and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("failed to allocate {bytes} byte output buffer")]
    Allocation { bytes: usize },
    #[error("not an angle: {0:?}")]
    InvalidAngle(String),
    #[error("unsupported rotation angle: {0} degrees")]
    UnsupportedAngle(i32),
    #[error("unsupported pixel format: {0:?}")]
    UnsupportedFormat(PixelFormat),
}
