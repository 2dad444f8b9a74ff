//! frame-rotate: exact quarter-turn rotation of interleaved video frames
//!
//! Frames arrive from a capture backend as 4-byte interleaved pixels (BGRA by
//! default), possibly with padded rows. [`rotate`] remaps every pixel with
//! integer arithmetic into a freshly allocated, tightly packed buffer and
//! carries the presentation timestamp over untouched.

mod types;
pub use types::{Frame, PixelFormat};

mod error;
pub use error::{FrameError, Result};

mod angle;
pub use angle::RotationAngle;

mod control;
pub use control::RotationControl;

mod rotate;
pub use rotate::{rotate, FrameRotator};

/// Pixel format conversion into the 4-byte layout the rotator works on
pub mod convert;
