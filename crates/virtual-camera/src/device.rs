use tracing::{info, warn};

use crate::{Result, VirtualDeviceBackend};

/// Holds a [`VirtualDeviceBackend`] enabled for as long as the guard lives.
pub struct VirtualDevice<B: VirtualDeviceBackend> {
    backend: B,
}

impl<B: VirtualDeviceBackend> VirtualDevice<B> {
    pub fn acquire(mut backend: B) -> Result<Self> {
        backend.enable()?;
        info!(backend = backend.name(), "virtual camera enabled");
        Ok(Self { backend })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: VirtualDeviceBackend> Drop for VirtualDevice<B> {
    fn drop(&mut self) {
        match self.backend.disable() {
            Ok(()) => info!(backend = self.backend.name(), "virtual camera released"),
            Err(e) => warn!(backend = self.backend.name(), "failed to release virtual camera: {e}"),
        }
    }
}

/// Backend that only records that the capability was toggled. No device is
/// registered with the OS.
#[derive(Debug, Default)]
pub struct LoggingBackend {
    enabled: bool,
}

impl LoggingBackend {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl VirtualDeviceBackend for LoggingBackend {
    fn name(&self) -> &str {
        "logging"
    }

    fn enable(&mut self) -> Result<()> {
        self.enabled = true;
        info!("virtual camera system initialized (no device is exposed by this backend)");
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        Ok(())
    }
}
