use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct SessionMetrics {
    pub registry: Registry,
    pub frames_captured: IntCounter,
    pub frames_published: IntCounter,
    pub frames_dropped: IntCounter,
    pub rotation_degrees: IntGauge,
}

impl SessionMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let frames_captured =
            IntCounter::new("vcam_frames_captured", "Frames read from the camera")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let frames_published = IntCounter::new(
            "vcam_frames_published",
            "Rotated frames handed to the virtual camera",
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let frames_dropped = IntCounter::new(
            "vcam_frames_dropped",
            "Frames dropped after a read, rotate or publish failure",
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let rotation_degrees =
            IntGauge::new("vcam_rotation_degrees", "Currently applied rotation")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let _ = registry.register(Box::new(frames_captured.clone()));
        let _ = registry.register(Box::new(frames_published.clone()));
        let _ = registry.register(Box::new(frames_dropped.clone()));
        let _ = registry.register(Box::new(rotation_degrees.clone()));
        Ok(Self {
            registry,
            frames_captured,
            frames_published,
            frames_dropped,
            rotation_degrees,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_counters() {
        let m = SessionMetrics::new().unwrap();
        m.frames_captured.inc();
        m.frames_dropped.inc_by(2);
        m.rotation_degrees.set(90);
        let text = m.encode_text();
        assert!(text.contains("vcam_frames_captured 1"));
        assert!(text.contains("vcam_frames_dropped 2"));
        assert!(text.contains("vcam_rotation_degrees 90"));
    }
}
