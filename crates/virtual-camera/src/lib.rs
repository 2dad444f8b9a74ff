//! virtual-camera: capture session, publishing and virtual device plumbing
//!
//! A [`CaptureSession`] owns one dedicated worker thread that reads frames from
//! a [`CameraSource`], rotates them with [`frame_rotate::FrameRotator`] and hands
//! the result to a [`FramePublisher`]. Frames are handled strictly in capture
//! order. The default build ships a `mock` camera backend and logging stubs for
//! the publisher and the virtual device so everything runs on any host.

mod types;
pub use types::{DeviceInfo, SessionConfig, SessionPreset};

mod error;
pub use error::{Result, SessionError};

mod traits;
pub use traits::{CameraSource, FramePublisher, VirtualDeviceBackend};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::MockCamera;

mod publisher;
pub use publisher::LoggingPublisher;

mod device;
pub use device::{LoggingBackend, VirtualDevice};

mod monitor;
pub use monitor::{FrameRateMonitor, FrameRateStatus};

mod metrics;
pub use metrics::SessionMetrics;

mod session;
pub use session::CaptureSession;
