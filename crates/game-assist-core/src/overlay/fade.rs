//! Opacity animation.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// Length of a fade in either direction.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

/// Sine ease-in-out over `t` in `[0, 1]`.
pub fn ease_in_out_sine(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    -((PI * t).cos() - 1.0) / 2.0
}

/// A running opacity transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f64,
    to: f64,
    started: Instant,
    duration: Duration,
}

impl Fade {
    pub fn new(from: f64, to: f64, started: Instant) -> Self {
        Self {
            from,
            to,
            started,
            duration: FADE_DURATION,
        }
    }

    pub fn fade_in(started: Instant) -> Self {
        Self::new(0.0, 1.0, started)
    }

    /// Fade out from the current opacity.
    pub fn fade_out(from: f64, started: Instant) -> Self {
        Self::new(from, 0.0, started)
    }

    pub fn is_fade_out(&self) -> bool {
        self.to < self.from
    }

    pub fn ends_at(&self) -> Instant {
        self.started + self.duration
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now >= self.ends_at()
    }

    pub fn opacity_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let t = elapsed / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * ease_in_out_sine(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert!((ease_in_out_sine(0.0)).abs() < 1e-9);
        assert!((ease_in_out_sine(0.5) - 0.5).abs() < 1e-9);
        assert!((ease_in_out_sine(1.0) - 1.0).abs() < 1e-9);
        assert!(ease_in_out_sine(0.25) < 0.25);
    }

    #[test]
    fn test_fade_out_is_symmetric() {
        let t0 = Instant::now();
        let fade_in = Fade::fade_in(t0);
        let fade_out = Fade::fade_out(1.0, t0);
        let mid = t0 + Duration::from_millis(75);
        assert!((fade_in.opacity_at(mid) + fade_out.opacity_at(mid) - 1.0).abs() < 1e-9);
        assert!(fade_out.is_fade_out());
        assert!(fade_out.is_finished(t0 + FADE_DURATION));
        assert_eq!(fade_out.opacity_at(t0 + Duration::from_secs(5)), 0.0);
    }
}
