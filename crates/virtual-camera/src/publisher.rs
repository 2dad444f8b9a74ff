use std::sync::Mutex;
use std::time::{Duration, Instant};

use frame_rotate::Frame;
use tracing::info;

use crate::{FramePublisher, Result, SessionError};

/// Stand-in for a real virtual camera sink: counts frames and logs arrival
/// at most once per interval.
pub struct LoggingPublisher {
    interval: Duration,
    state: Mutex<LogState>,
}

#[derive(Default)]
struct LogState {
    last_log: Option<Instant>,
    total: u64,
    since_log: u64,
}

impl Default for LoggingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingPublisher {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(LogState::default()),
        }
    }

    pub fn frames_published(&self) -> u64 {
        self.state.lock().map(|s| s.total).unwrap_or(0)
    }

    /// Record one frame as of `now`. Returns whether a log line was emitted.
    pub fn publish_at(&self, frame: &Frame, now: Instant) -> Result<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SessionError::Backend("publisher state poisoned".to_string()))?;
        state.total += 1;
        state.since_log += 1;
        let due = state
            .last_log
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if !due {
            return Ok(false);
        }
        info!(
            width = frame.width,
            height = frame.height,
            pts_ms = frame.pts.whole_milliseconds() as i64,
            frames = state.since_log,
            total = state.total,
            "virtual camera received frames"
        );
        state.last_log = Some(now);
        state.since_log = 0;
        Ok(true)
    }
}

impl FramePublisher for LoggingPublisher {
    fn publish(&self, frame: &Frame) -> Result<()> {
        self.publish_at(frame, Instant::now()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_rotate::PixelFormat;

    fn frame() -> Frame {
        Frame::new(
            1,
            1,
            PixelFormat::Bgra8,
            vec![0; 4],
            time::Duration::ZERO,
        )
    }

    #[test]
    fn test_logs_once_per_interval() {
        let publisher = LoggingPublisher::with_interval(Duration::from_secs(1));
        let start = Instant::now();
        let f = frame();
        assert!(publisher.publish_at(&f, start).unwrap());
        assert!(!publisher
            .publish_at(&f, start + Duration::from_millis(300))
            .unwrap());
        assert!(!publisher
            .publish_at(&f, start + Duration::from_millis(999))
            .unwrap());
        assert!(publisher
            .publish_at(&f, start + Duration::from_millis(1000))
            .unwrap());
        assert_eq!(publisher.frames_published(), 4);
    }

    #[test]
    fn test_publish_counts_frames() {
        let publisher = LoggingPublisher::new();
        for _ in 0..5 {
            publisher.publish(&frame()).unwrap();
        }
        assert_eq!(publisher.frames_published(), 5);
    }
}
