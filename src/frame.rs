//! Frame-rate throttling for the render loop.

/// Decides whether an animation-frame callback should produce a frame.
///
/// Without throttling every callback renders. With throttling a callback that
/// arrives less than one frame interval after the last rendered frame is
/// skipped entirely: controls, model rotation and drawing all wait for the
/// next one. The first callback always renders.
#[derive(Clone, Debug)]
pub struct FrameLimiter {
    interval_ms: f64,
    throttle: bool,
    last_ms: Option<f64>,
}

impl FrameLimiter {
    pub fn new(target_fps: u32, throttle: bool) -> Self {
        Self {
            interval_ms: 1000.0 / target_fps.max(1) as f64,
            throttle,
            last_ms: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// `now_ms` is a monotonic timestamp of the current frame callback.
    pub fn should_render(&mut self, now_ms: f64) -> bool {
        if let Some(last_ms) = self.last_ms {
            if self.throttle && now_ms - last_ms < self.interval_ms {
                return false;
            }
        }
        self.last_ms = Some(now_ms);
        true
    }
}
