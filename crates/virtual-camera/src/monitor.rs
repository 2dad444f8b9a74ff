use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRateStatus {
    pub healthy: bool,
    pub fps: f32,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Tracks capture frame rate and stalls.
///
/// Call [`FrameRateMonitor::record_frame`] for every frame and
/// [`FrameRateMonitor::check`] roughly once per second.
pub struct FrameRateMonitor {
    min_fps: f32,
    timeout: Duration,
    last_frame_time: Option<Instant>,
    consecutive_failures: u32,
    frame_count: u32,
    window_start: Instant,
}

impl FrameRateMonitor {
    pub fn new(min_fps: f32, timeout: Duration) -> Self {
        Self::starting_at(min_fps, timeout, Instant::now())
    }

    pub fn starting_at(min_fps: f32, timeout: Duration, now: Instant) -> Self {
        Self {
            min_fps,
            timeout,
            last_frame_time: None,
            consecutive_failures: 0,
            frame_count: 0,
            window_start: now,
        }
    }

    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now());
    }

    pub fn record_frame_at(&mut self, now: Instant) {
        self.last_frame_time = Some(now);
        self.frame_count += 1;
    }

    fn window_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    pub fn check(&mut self) -> FrameRateStatus {
        self.check_at(Instant::now())
    }

    pub fn check_at(&mut self, now: Instant) -> FrameRateStatus {
        let healthy = self
            .last_frame_time
            .is_some_and(|last| now.saturating_duration_since(last) < self.timeout);

        let elapsed = self.window_elapsed(now).as_secs_f32();
        let fps = if elapsed > 0.0 {
            self.frame_count as f32 / elapsed
        } else {
            0.0
        };
        if elapsed >= 1.0 {
            self.frame_count = 0;
            self.window_start = now;
        }

        let mut last_error = None;
        if !healthy {
            self.consecutive_failures += 1;
            last_error = Some("no camera frames received within timeout".to_string());
        } else if fps < self.min_fps {
            self.consecutive_failures += 1;
            last_error = Some(format!(
                "camera fps {:.1} below minimum {:.1}",
                fps, self.min_fps
            ));
        } else {
            self.consecutive_failures = 0;
        }

        FrameRateStatus {
            healthy: last_error.is_none(),
            fps,
            last_error,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Start a fresh window. The first frame then has a full timeout to arrive.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.last_frame_time = Some(now);
        self.consecutive_failures = 0;
        self.frame_count = 0;
        self.window_start = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_at_steady_rate() {
        let t0 = Instant::now();
        let mut m = FrameRateMonitor::starting_at(10.0, Duration::from_millis(500), t0);
        for i in 0..30 {
            m.record_frame_at(t0 + Duration::from_millis(i * 33));
        }
        let status = m.check_at(t0 + Duration::from_millis(1000));
        assert!(status.healthy, "{status:?}");
        assert!(status.fps >= 29.0);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[test]
    fn test_low_fps_reported() {
        let t0 = Instant::now();
        let mut m = FrameRateMonitor::starting_at(10.0, Duration::from_secs(5), t0);
        m.record_frame_at(t0 + Duration::from_millis(900));
        let status = m.check_at(t0 + Duration::from_secs(1));
        assert!(!status.healthy);
        assert!(status.last_error.unwrap().contains("below minimum"));
    }

    #[test]
    fn test_stall_counts_consecutive_failures() {
        let t0 = Instant::now();
        let mut m = FrameRateMonitor::starting_at(1.0, Duration::from_millis(200), t0);
        assert!(!m.check_at(t0 + Duration::from_secs(1)).healthy);
        let status = m.check_at(t0 + Duration::from_secs(2));
        assert_eq!(status.consecutive_failures, 2);
        m.reset();
        m.record_frame();
        assert_eq!(m.consecutive_failures, 0);
    }

    #[test]
    fn test_reset_grants_timeout_grace() {
        let t0 = Instant::now();
        let mut m = FrameRateMonitor::starting_at(0.0, Duration::from_millis(200), t0);
        assert!(!m.check_at(t0 + Duration::from_millis(100)).healthy);

        let t1 = t0 + Duration::from_secs(5);
        m.reset_at(t1);
        let status = m.check_at(t1 + Duration::from_millis(100));
        assert!(status.healthy, "{status:?}");
        assert_eq!(status.consecutive_failures, 0);
        assert!(!m.check_at(t1 + Duration::from_millis(300)).healthy);
    }
}
