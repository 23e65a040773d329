/// Stopwatch driven by frame deltas rather than wall-clock time.
///
/// Completion is polled: [`CountdownTimer::advance`] reports `true` on every
/// call made while the timer is complete, not only on the first one. Owners
/// that want a single notification call [`CountdownTimer::reset`] when they
/// act on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownTimer {
    duration: f64,
    elapsed: f64,
    looping: bool,
}

impl CountdownTimer {
    /// One-shot timer running for `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            looping: false,
        }
    }

    /// Timer that rolls back by `duration` each time it signals completion.
    pub fn looping(duration: f64) -> Self {
        Self {
            looping: true,
            ..Self::new(duration)
        }
    }

    /// Accumulates `dt` while running. Once complete, every call returns
    /// `true`; a looping timer also rolls `elapsed` back by one period.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.elapsed < self.duration {
            self.elapsed += dt;
            false
        } else {
            if self.looping && self.duration > 0.0 {
                self.elapsed -= self.duration;
            }
            true
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Changes the period without touching `elapsed`.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}
