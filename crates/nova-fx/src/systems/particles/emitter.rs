//! Rate-based particle streams.

use crate::core::math::{finite_or, sanitize_dt};

/// How a stream releases particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmissionMode {
    /// Emit continuously at `rate` particles per second.
    Continuous,
    /// Emit `count` particles every `interval` seconds.
    Pulse { count: u32, interval: f32 },
}

/// Converts an emission rate into whole spawns per tick.
///
/// The fractional remainder carries over to the next tick, so 30 particles
/// per second at 60 Hz yields one spawn every other frame.
#[derive(Debug, Clone)]
pub struct StreamEmitter {
    pub active: bool,
    pub mode: EmissionMode,
    /// Particles per second (continuous mode).
    pub rate: f32,
    carry: f32,
    timer: f32,
}

impl Default for StreamEmitter {
    fn default() -> Self {
        Self {
            active: true,
            mode: EmissionMode::Continuous,
            rate: 0.0,
            carry: 0.0,
            timer: 0.0,
        }
    }
}

impl StreamEmitter {
    /// Upper bound on spawns returned by a single tick. A long stall must
    /// not dump seconds of backlog into the pool in one frame.
    pub const MAX_PER_TICK: usize = 64;

    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    pub fn pulse(count: u32, interval: f32) -> Self {
        Self {
            mode: EmissionMode::Pulse { count, interval },
            ..Self::default()
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Drop any fractional backlog.
    pub fn reset(&mut self) {
        self.carry = 0.0;
        self.timer = 0.0;
    }

    /// Advance by `dt` seconds with the global particle multiplier applied.
    /// Returns the number of particles to spawn this tick.
    pub fn tick(&mut self, dt: f32, multiplier: f32) -> usize {
        let dt = sanitize_dt(dt);
        let multiplier = finite_or(multiplier, 0.0).max(0.0);
        if !self.active || dt == 0.0 || multiplier == 0.0 {
            return 0;
        }

        match self.mode {
            EmissionMode::Continuous => {
                let rate = finite_or(self.rate, 0.0).max(0.0);
                self.carry += rate * multiplier * dt;
                let count = self.carry.floor();
                self.carry -= count;
                (count as usize).min(Self::MAX_PER_TICK)
            }
            EmissionMode::Pulse { count, interval } => {
                if !(interval.is_finite() && interval > 0.0) {
                    return 0;
                }
                self.timer += dt;
                if self.timer < interval {
                    return 0;
                }
                self.timer %= interval;
                let scaled = count as f32 * multiplier + self.carry;
                let whole = scaled.floor();
                self.carry = scaled - whole;
                (whole as usize).min(Self::MAX_PER_TICK)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_accumulator() {
        let mut e = StreamEmitter::new(60.0);
        assert_eq!(e.tick(1.0 / 60.0, 1.0), 1);
    }

    #[test]
    fn fractional_rate_carries_over() {
        let mut e = StreamEmitter::new(30.0);
        let total: usize = (0..60).map(|_| e.tick(1.0 / 60.0, 1.0)).sum();
        assert!((29..=30).contains(&total));
    }

    #[test]
    fn multiplier_scales_and_zero_disables() {
        let mut e = StreamEmitter::new(100.0);
        assert_eq!(e.tick(0.1, 2.0), 20);
        assert_eq!(e.tick(0.1, 0.0), 0);
    }

    #[test]
    fn stall_is_capped() {
        let mut e = StreamEmitter::new(1000.0);
        assert_eq!(e.tick(10.0, 1.0), StreamEmitter::MAX_PER_TICK);
    }

    #[test]
    fn pulse_fires_on_interval() {
        let mut e = StreamEmitter::pulse(5, 1.0);
        assert_eq!(e.tick(0.5, 1.0), 0);
        assert_eq!(e.tick(0.6, 1.0), 5);
        assert_eq!(e.tick(0.2, 1.0), 0);
    }

    #[test]
    fn inactive_or_bad_dt_emits_nothing() {
        let mut e = StreamEmitter::new(60.0);
        assert_eq!(e.tick(f32::NAN, 1.0), 0);
        e.active = false;
        assert_eq!(e.tick(1.0, 1.0), 0);
    }
}
