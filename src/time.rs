//! Time sources.
//!
//! Two independent clocks drive a running display:
//!
//! - the **frame timer** ([`FrameTimer`]) counts render-loop frames and
//!   measures FPS for the window title;
//! - the **scheduler clock** ([`Clock`]) is the wall-clock source tweens read.
//!   Burst progress depends only on this clock, never on how many frames were
//!   drawn.
//!
//! # Example
//!
//! ```ignore
//! use skyburst::time::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! clock.advance(1.5);
//! assert_eq!(clock.now().as_secs_f32(), 1.5);
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source read by the tween scheduler.
pub trait Clock {
    /// Time elapsed since the clock's epoch. Must never go backwards.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Hand-driven clock for tests and deterministic playback.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to a controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock stopped at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `secs` seconds. Negative values are ignored.
    pub fn advance(&self, secs: f32) {
        if secs > 0.0 {
            self.now.set(self.now.get() + Duration::from_secs_f32(secs));
        }
    }

    /// Jump to an absolute time, never moving backwards.
    pub fn set(&self, secs: f32) {
        let target = Duration::from_secs_f32(secs.max(0.0));
        if target > self.now.get() {
            self.now.set(target);
        }
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Render-loop timing: frame delta, frame count, and FPS.
#[derive(Debug)]
pub struct FrameTimer {
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Record a frame. Returns `true` when the FPS estimate was refreshed.
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();

        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            return true;
        }
        false
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Most recent frames-per-second estimate.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(0.25);
        clock.advance(0.25);
        assert!((clock.now().as_secs_f32() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let clock = ManualClock::new();
        clock.set(2.0);
        clock.set(1.0);
        clock.advance(-3.0);
        assert!((clock.now().as_secs_f32() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(1.0);
        assert_eq!(clock.now(), handle.now());
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        thread::sleep(Duration::from_millis(2));
        assert!(clock.now() > a);
    }

    #[test]
    fn test_frame_timer_tick() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.frame(), 0);
        thread::sleep(Duration::from_millis(10));
        timer.tick();
        assert_eq!(timer.frame(), 1);
        assert!(timer.delta() > 0.0);
    }

    #[test]
    fn test_frame_timer_fps_refresh() {
        let mut timer = FrameTimer::new();
        timer.fps_update_interval = Duration::from_millis(5);
        thread::sleep(Duration::from_millis(10));
        assert!(timer.tick());
        assert!(timer.fps() > 0.0);
    }
}
