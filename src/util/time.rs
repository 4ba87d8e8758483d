//! Frame timing utilities for the table simulation

use std::time::{Duration, Instant};

/// Frame rate configuration
pub const FRAME_TPS: u32 = 60; // 60 frames per second
pub const FRAME_DURATION_MICROS: u64 = 1_000_000 / FRAME_TPS as u64;

/// Upper bound on a single frame's delta
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Nominal delta time for one frame (in seconds)
#[cfg(test)]
pub fn frame_delta() -> f32 {
    1.0 / FRAME_TPS as f32
}

/// Tick period for the frame loop interval
pub fn frame_duration() -> Duration {
    Duration::from_micros(FRAME_DURATION_MICROS)
}

/// Measures real time between consecutive frames
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous call, clamped to `MAX_FRAME_DELTA`
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt.min(MAX_FRAME_DELTA)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_delta_matches_frame_rate() {
        assert!((frame_delta() - 1.0 / 60.0).abs() < f32::EPSILON);
        assert_eq!(frame_duration(), Duration::from_micros(16_666));
    }

    #[test]
    fn clock_never_exceeds_max_delta() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(2));
        let dt = clock.tick();
        assert!(dt > 0.0);
        assert!(dt <= MAX_FRAME_DELTA);
    }
}
