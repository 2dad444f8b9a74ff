use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use frame_rotate::{Frame, FrameRotator, RotationAngle, RotationControl};
use tracing::{debug, error, info, warn};

use crate::{
    CameraSource, DeviceInfo, FramePublisher, FrameRateMonitor, FrameRateStatus, Result,
    SessionConfig, SessionError, SessionMetrics, SessionPreset,
};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);
const HEALTH_POLL: Duration = Duration::from_millis(50);

/// Capture, rotate and publish frames from one selected camera.
///
/// All per-frame work happens on a single named worker thread, so frames
/// reach the publisher in capture order. Rotation can be changed from any
/// thread through [`CaptureSession::rotation`]; it takes effect on the next
/// frame.
///
/// Capture health is checked once per second on a separate `capture-health`
/// thread, so a camera stuck inside `read` is still reported.
pub struct CaptureSession<C: CameraSource + Send + 'static> {
    config: SessionConfig,
    devices: Vec<DeviceInfo>,
    selected: Option<DeviceInfo>,
    rotation: RotationControl,
    publisher: Arc<dyn FramePublisher>,
    metrics: SessionMetrics,
    monitor: Arc<Mutex<FrameRateMonitor>>,
    health: Arc<Mutex<Option<FrameRateStatus>>>,
    worker: Option<Worker>,
    _camera: PhantomData<fn() -> C>,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl<C: CameraSource + Send + 'static> CaptureSession<C> {
    /// Discover cameras and select the first one.
    pub fn new(publisher: Arc<dyn FramePublisher>, config: SessionConfig) -> Result<Self> {
        let metrics = SessionMetrics::new().map_err(SessionError::Backend)?;
        let devices = C::list()?;
        let selected = devices.first().cloned();
        match &selected {
            Some(dev) => info!(device = %dev.id, name = %dev.name, "selected default camera"),
            None => warn!("no cameras available"),
        }
        let monitor = FrameRateMonitor::new(
            config.min_fps,
            Duration::from_millis(config.frame_timeout_ms),
        );
        Ok(Self {
            config,
            devices,
            selected,
            rotation: RotationControl::default(),
            publisher,
            metrics,
            monitor: Arc::new(Mutex::new(monitor)),
            health: Arc::new(Mutex::new(None)),
            worker: None,
            _camera: PhantomData,
        })
    }

    pub fn available_cameras(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn selected_camera(&self) -> Option<&DeviceInfo> {
        self.selected.as_ref()
    }

    /// Re-enumerate devices, keeping the current selection if it still exists.
    pub fn refresh_cameras(&mut self) -> Result<()> {
        self.devices = C::list()?;
        let still_present = self
            .selected
            .as_ref()
            .is_some_and(|sel| self.devices.iter().any(|d| d.id == sel.id));
        if !still_present {
            self.selected = self.devices.first().cloned();
        }
        debug!(count = self.devices.len(), "camera list refreshed");
        Ok(())
    }

    /// Shared handle for changing the rotation from other threads.
    pub fn rotation(&self) -> RotationControl {
        self.rotation.clone()
    }

    pub fn set_rotation(&self, angle: RotationAngle) {
        self.rotation.set(angle);
        self.metrics.rotation_degrees.set(i64::from(angle.degrees()));
        info!("rotation set to {angle}");
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Result of the most recent health check, `None` until the first one
    /// after [`CaptureSession::start`].
    pub fn health(&self) -> Option<FrameRateStatus> {
        self.health.lock().ok().and_then(|h| h.clone())
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        // A worker that gave up on its own still needs joining.
        self.stop();

        let device = self.selected.clone().ok_or(SessionError::NoCamera)?;
        let mut camera = C::open(&device.id)?;
        let preset = self.negotiate_preset(&mut camera)?;

        if let Ok(mut monitor) = self.monitor.lock() {
            monitor.reset();
        }
        if let Ok(mut health) = self.health.lock() {
            *health = None;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let ctx = WorkerContext {
            camera,
            rotator: FrameRotator::new(self.rotation.clone()),
            publisher: self.publisher.clone(),
            metrics: self.metrics.clone(),
            monitor: self.monitor.clone(),
            stop: stop.clone(),
            config: self.config.clone(),
        };
        let handle = thread::Builder::new()
            .name("capture-session".to_string())
            .spawn(move || ctx.run())
            .map_err(|e| SessionError::Io(e.to_string()))?;
        let ticker = match spawn_health_ticker(
            self.monitor.clone(),
            self.health.clone(),
            stop.clone(),
        ) {
            Ok(ticker) => ticker,
            Err(e) => {
                stop.store(true, Ordering::Release);
                let _ = handle.join();
                return Err(e);
            }
        };
        self.worker = Some(Worker {
            stop,
            handle,
            ticker,
        });
        info!(device = %device.id, ?preset, "capture session started");
        Ok(())
    }

    /// Stop capturing. The frame in flight is finished before this returns.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);
        if worker.handle.join().is_err() {
            error!("capture worker panicked");
        }
        if worker.ticker.join().is_err() {
            error!("capture health ticker panicked");
        }
        info!("capture session stopped");
    }

    /// Select another camera, restarting capture if it was running.
    pub fn switch_camera(&mut self, id: &str) -> Result<()> {
        let device = match self.find_device(id) {
            Some(device) => device,
            None => {
                // may have been plugged in after discovery
                self.refresh_cameras()?;
                self.find_device(id)
                    .ok_or_else(|| SessionError::NotFound(id.to_string()))?
            }
        };
        info!(device = %device.id, name = %device.name, "switching camera");
        self.selected = Some(device);
        if self.is_running() {
            self.stop();
            self.start()?;
        }
        Ok(())
    }

    fn find_device(&self, id: &str) -> Option<DeviceInfo> {
        self.devices.iter().find(|d| d.id == id).cloned()
    }

    fn negotiate_preset(&self, camera: &mut C) -> Result<Option<SessionPreset>> {
        for preset in [self.config.preferred_preset, SessionPreset::Medium] {
            if camera.supports_preset(preset) {
                camera.set_preset(preset)?;
                return Ok(Some(preset));
            }
        }
        debug!("camera has no known preset, using its native format");
        Ok(None)
    }
}

impl<C: CameraSource + Send + 'static> Drop for CaptureSession<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_health_ticker(
    monitor: Arc<Mutex<FrameRateMonitor>>,
    health: Arc<Mutex<Option<FrameRateStatus>>>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("capture-health".to_string())
        .spawn(move || {
            let mut next_check = Instant::now() + HEALTH_CHECK_INTERVAL;
            while !stop.load(Ordering::Acquire) {
                let now = Instant::now();
                if now < next_check {
                    thread::sleep((next_check - now).min(HEALTH_POLL));
                    continue;
                }
                next_check = now + HEALTH_CHECK_INTERVAL;
                let status = match monitor.lock() {
                    Ok(mut monitor) => monitor.check(),
                    Err(_) => {
                        error!("frame rate monitor poisoned");
                        break;
                    }
                };
                if let Some(err) = &status.last_error {
                    warn!(
                        fps = status.fps,
                        failures = status.consecutive_failures,
                        "capture unhealthy: {err}"
                    );
                }
                if let Ok(mut slot) = health.lock() {
                    *slot = Some(status);
                }
            }
        })
        .map_err(|e| SessionError::Io(e.to_string()))
}

struct WorkerContext<C> {
    camera: C,
    rotator: FrameRotator,
    publisher: Arc<dyn FramePublisher>,
    metrics: SessionMetrics,
    monitor: Arc<Mutex<FrameRateMonitor>>,
    stop: Arc<AtomicBool>,
    config: SessionConfig,
}

impl<C: CameraSource> WorkerContext<C> {
    fn run(mut self) {
        let mut last_pts = None;
        let mut read_errors = 0u32;

        while !self.stop.load(Ordering::Acquire) {
            match self.camera.read() {
                Ok(frame) => {
                    read_errors = 0;
                    self.metrics.frames_captured.inc();
                    if let Ok(mut monitor) = self.monitor.lock() {
                        monitor.record_frame();
                    }
                    self.handle_frame(&frame, &mut last_pts);
                }
                Err(e) => {
                    read_errors += 1;
                    self.metrics.frames_dropped.inc();
                    warn!(attempt = read_errors, "camera read failed: {e}");
                    if read_errors >= self.config.max_consecutive_errors {
                        error!(
                            "giving up after {read_errors} consecutive read failures"
                        );
                        break;
                    }
                }
            }
        }
        // also releases the health ticker when the worker gave up on its own
        self.stop.store(true, Ordering::Release);
        debug!("capture worker exiting");
    }

    fn handle_frame(&self, frame: &Frame, last_pts: &mut Option<time::Duration>) {
        if let Some(prev) = *last_pts {
            if frame.pts <= prev {
                warn!(pts = ?frame.pts, prev = ?prev, "dropping out-of-order frame");
                self.metrics.frames_dropped.inc();
                return;
            }
        }
        *last_pts = Some(frame.pts);

        let rotated = match self.rotator.process(frame) {
            Ok(rotated) => rotated,
            Err(e) => {
                warn!(pts = ?frame.pts, "dropping frame: {e}");
                self.metrics.frames_dropped.inc();
                return;
            }
        };
        self.metrics
            .rotation_degrees
            .set(i64::from(self.rotator.last_applied().degrees()));

        match self.publisher.publish(&rotated) {
            Ok(()) => self.metrics.frames_published.inc(),
            Err(e) => {
                warn!(pts = ?rotated.pts, "publish failed: {e}");
                self.metrics.frames_dropped.inc();
            }
        }
    }
}
