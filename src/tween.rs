//! Time-based tweens.
//!
//! A [`Tween`] interpolates a scalar from `from` to `to` over a fixed
//! wall-clock duration. It holds no mutable state: sampling it at a given
//! clock reading always yields the same value, so a slow frame never skips or
//! repeats animation time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curves for tweens.
///
/// All curves map 0 to 0 and 1 to 1 exactly and are monotonically
/// non-decreasing in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant rate (default).
    #[default]
    Linear,
    /// Accelerating from zero velocity.
    QuadIn,
    /// Decelerating to zero velocity.
    QuadOut,
    /// Accelerate until halfway, then decelerate.
    QuadInOut,
    /// Stronger deceleration than [`Easing::QuadOut`].
    CubicOut,
}

impl Easing {
    /// Apply the curve to a normalized time `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// One reading of a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSample {
    /// Interpolated value.
    pub value: f32,
    /// Seconds since the tween started.
    pub elapsed: f32,
    /// Whether the full duration has elapsed. `value` equals `to` exactly
    /// once this is set.
    pub finished: bool,
}

/// Scalar interpolation over a wall-clock interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// Create a tween starting at clock reading `start`.
    ///
    /// `duration` is in seconds; non-positive durations finish immediately
    /// and ones too long for a [`Duration`] never finish.
    pub fn new(from: f32, to: f32, duration: f32, easing: Easing, start: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration: Duration::try_from_secs_f32(duration.max(0.0)).unwrap_or(Duration::MAX),
            easing,
        }
    }

    /// Duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration.as_secs_f32()
    }

    #[inline]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Clock reading at which the tween reaches `to`.
    #[inline]
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }

    /// Read the tween at clock reading `now`.
    pub fn sample(&self, now: Duration) -> TweenSample {
        let elapsed = now.saturating_sub(self.start);
        let finished = elapsed >= self.duration;
        let value = if finished {
            self.to
        } else {
            let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
            self.from + (self.to - self.from) * self.easing.apply(t)
        };
        TweenSample {
            value,
            elapsed: elapsed.as_secs_f32(),
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicOut,
    ];

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?}");
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for i in 0..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v >= last, "{easing:?} decreased at step {i}");
                last = v;
            }
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn test_linear_tween_midpoint() {
        let tween = Tween::new(0.0, 1.0, 3.0, Easing::Linear, Duration::ZERO);
        let sample = tween.sample(secs(1.5));
        assert!((sample.value - 0.5).abs() < 1e-4);
        assert!(!sample.finished);
    }

    #[test]
    fn test_tween_relative_to_start() {
        let tween = Tween::new(0.0, 1.0, 2.0, Easing::Linear, secs(10.0));
        assert_eq!(tween.sample(secs(5.0)).value, 0.0);
        assert!((tween.sample(secs(11.0)).value - 0.5).abs() < 1e-4);
        assert_eq!(tween.end(), secs(12.0));
    }

    #[test]
    fn test_tween_finishes_exactly_at_target() {
        let tween = Tween::new(0.0, 1.0, 3.0, Easing::QuadOut, Duration::ZERO);
        let sample = tween.sample(secs(3.0));
        assert!(sample.finished);
        assert_eq!(sample.value, 1.0);

        let late = tween.sample(secs(30.0));
        assert_eq!(late.value, 1.0);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let tween = Tween::new(0.0, 1.0, 0.0, Easing::Linear, Duration::ZERO);
        let sample = tween.sample(Duration::ZERO);
        assert!(sample.finished);
        assert_eq!(sample.value, 1.0);
    }

    #[test]
    fn test_huge_duration_never_finishes() {
        let tween = Tween::new(0.0, 1.0, 1e30, Easing::Linear, secs(5.0));
        assert_eq!(tween.end(), Duration::MAX);
        let sample = tween.sample(secs(1e9));
        assert!(!sample.finished);
        assert!(sample.value < 1e-6);
    }

    #[test]
    fn test_easing_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            easing: Easing,
        }
        let w: Wrapper = toml::from_str("easing = \"cubic_out\"").unwrap();
        assert_eq!(w.easing, Easing::CubicOut);
    }
}
