/// Converts host frame timestamps (milliseconds, e.g. `performance.now()`)
/// into per-frame deltas in seconds.
///
/// A long stall produces one large delta (up to `max_dt`, ten seconds by
/// default) rather than a burst of small catch-up steps, and the phase
/// registries jump straight to whatever phase that delta implies.
pub struct FrameClock {
    /// Timestamp of the previous frame in milliseconds.
    last_ms: Option<f64>,
    /// Upper bound for a single delta, in seconds.
    max_dt: f32,
}

impl FrameClock {
    /// Default ceiling for one frame delta (ten seconds).
    pub const DEFAULT_MAX_DT: f32 = 10.0;

    pub fn new() -> Self {
        Self {
            last_ms: None,
            max_dt: Self::DEFAULT_MAX_DT,
        }
    }

    /// Set the ceiling for one frame delta. Non-positive values are ignored.
    pub fn with_max_dt(mut self, max_dt: f32) -> Self {
        if max_dt.is_finite() && max_dt > 0.0 {
            self.max_dt = max_dt;
        }
        self
    }

    /// Feed the current host timestamp. Returns the delta in seconds since
    /// the previous call; the first call (and any backwards or non-finite
    /// timestamp) returns 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        if !now_ms.is_finite() {
            return 0.0;
        }
        let dt = match self.last_ms {
            Some(last) if now_ms >= last => ((now_ms - last) / 1000.0) as f32,
            _ => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt.min(self.max_dt)
    }

    /// Forget the previous timestamp (e.g. when the tab becomes visible again).
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
