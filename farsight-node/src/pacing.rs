//! Frame pacing and frame-rate statistics

use std::time::{Duration, Instant};

/// Paces loop iterations to a maximum frame rate.
///
/// Each iteration sets its deadline to `now + interval` when it begins and
/// sleeps until that deadline when it ends. Slow iterations are not caught up.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Pacer {
    pub fn new(max_fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / max_fps.max(1),
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn begin(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    /// Sleep until the current iteration's deadline; returns immediately if
    /// it has already passed
    pub fn wait(&mut self) {
        if let Some(deadline) = self.deadline.take() {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
    }
}

/// Processing-time statistics, expressed as frames per second clamped to
/// the configured maximum
#[derive(Debug, Clone)]
pub struct FrameStats {
    max_fps: f64,
    frames: u64,
    total: Duration,
    last: Duration,
}

impl FrameStats {
    pub fn new(max_fps: u32) -> Self {
        Self {
            max_fps: max_fps as f64,
            frames: 0,
            total: Duration::ZERO,
            last: Duration::ZERO,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        self.total += elapsed;
        self.last = elapsed;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn instantaneous_fps(&self) -> f64 {
        self.clamped(1, self.last)
    }

    pub fn average_fps(&self) -> f64 {
        self.clamped(self.frames, self.total)
    }

    fn clamped(&self, frames: u64, elapsed: Duration) -> f64 {
        if frames == 0 {
            return 0.0;
        }
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return self.max_fps;
        }
        (frames as f64 / secs).min(self.max_fps)
    }
}
