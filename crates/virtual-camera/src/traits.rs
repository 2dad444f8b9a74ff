use frame_rotate::Frame;

use crate::{DeviceInfo, Result, SessionError, SessionPreset};

/// A blocking frame source backed by a physical (or mock) camera.
pub trait CameraSource {
    /// Enumerate the devices this backend can open.
    fn list() -> Result<Vec<DeviceInfo>>;

    /// Open a device by the id reported in [`CameraSource::list`].
    fn open(id: &str) -> Result<Self>
    where
        Self: Sized;

    fn supports_preset(&self, _preset: SessionPreset) -> bool {
        false
    }

    fn set_preset(&mut self, _preset: SessionPreset) -> Result<()> {
        Err(SessionError::Unsupported("capture presets not supported"))
    }

    /// Read the next frame, blocking until one is available.
    fn read(&mut self) -> Result<Frame>;
}

/// Downstream consumer of rotated frames.
pub trait FramePublisher: Send + Sync {
    fn publish(&self, frame: &Frame) -> Result<()>;
}

/// Process-wide capability that exposes published frames to other applications.
pub trait VirtualDeviceBackend {
    fn name(&self) -> &str;

    fn enable(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;
}
