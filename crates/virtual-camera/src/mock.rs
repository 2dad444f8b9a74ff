use std::thread;
use std::time::{Duration as StdDuration, Instant};

use frame_rotate::{Frame, PixelFormat};
use time::Duration;

use crate::{CameraSource, DeviceInfo, Result, SessionError, SessionPreset};

const FPS: u64 = 30;
// Real capture buffers pad rows for alignment; mimic that.
const ROW_PAD: usize = 32;

// (id, name, supports HD)
const DEVICES: [(&str, &str, bool); 2] = [
    ("mock0", "Mock HD Camera", true),
    ("mock1", "Mock USB Camera", false),
];

/// Paced in-process camera producing BGRA gradient frames at 30 fps.
pub struct MockCamera {
    id: String,
    hd_capable: bool,
    preset: SessionPreset,
    counter: u64,
    next_due: Option<Instant>,
}

impl MockCamera {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn preset(&self) -> SessionPreset {
        self.preset
    }
}

impl CameraSource for MockCamera {
    fn list() -> Result<Vec<DeviceInfo>> {
        Ok(DEVICES
            .iter()
            .map(|(id, name, _)| DeviceInfo {
                id: id.to_string(),
                name: name.to_string(),
                driver: "mock".to_string(),
            })
            .collect())
    }

    fn open(id: &str) -> Result<Self> {
        let (_, _, hd_capable) = DEVICES
            .iter()
            .find(|(dev, _, _)| *dev == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            hd_capable: *hd_capable,
            preset: SessionPreset::Medium,
            counter: 0,
            next_due: None,
        })
    }

    fn supports_preset(&self, preset: SessionPreset) -> bool {
        match preset {
            SessionPreset::Hd1280x720 => self.hd_capable,
            SessionPreset::Medium => true,
        }
    }

    fn set_preset(&mut self, preset: SessionPreset) -> Result<()> {
        if !self.supports_preset(preset) {
            return Err(SessionError::Unsupported("preset not available on this device"));
        }
        self.preset = preset;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame> {
        let interval = StdDuration::from_nanos(1_000_000_000 / FPS);
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + interval);

        let (width, height) = self.preset.resolution();
        let stride = width as usize * 4 + ROW_PAD;
        let mut data = vec![0u8; stride * height as usize];
        for (y, row) in data.chunks_exact_mut(stride).enumerate() {
            for (x, px) in row[..width as usize * 4].chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&[x as u8, y as u8, self.counter as u8, 0xFF]);
            }
        }
        let pts = Duration::nanoseconds((self.counter * 1_000_000_000 / FPS) as i64);
        self.counter += 1;
        Ok(Frame::with_stride(
            width,
            height,
            stride,
            PixelFormat::Bgra8,
            data,
            pts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_open() {
        let devices = MockCamera::list().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "mock0");
        assert!(MockCamera::open("mock1").is_ok());
        assert!(matches!(
            MockCamera::open("nope"),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn test_preset_support() {
        let mut hd = MockCamera::open("mock0").unwrap();
        assert!(hd.set_preset(SessionPreset::Hd1280x720).is_ok());
        let mut usb = MockCamera::open("mock1").unwrap();
        assert!(!usb.supports_preset(SessionPreset::Hd1280x720));
        assert!(usb.set_preset(SessionPreset::Hd1280x720).is_err());
        assert_eq!(usb.preset(), SessionPreset::Medium);
    }

    #[test]
    fn test_frames_are_padded_and_ordered() {
        let mut cam = MockCamera::open("mock1").unwrap();
        let a = cam.read().unwrap();
        let b = cam.read().unwrap();
        assert_eq!((a.width, a.height), (480, 360));
        assert_eq!(a.stride, 480 * 4 + ROW_PAD);
        assert!(a.validate().is_ok());
        assert!(b.pts > a.pts);
    }
}
