use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Monotonic clock used by the host loop to produce frame deltas.
pub trait Clock: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStats;
}

/// Summary of the recorded frame durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameStats {
    pub fn from_durations<'a>(durations: impl IntoIterator<Item = &'a Duration>) -> Self {
        let times: Vec<f64> = durations
            .into_iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return FrameStats::default();
        }
        let n = times.len() as f64;
        let avg = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FrameStats {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// [`Clock`] on top of [`Instant`], keeping the last `max_samples` frame times.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
}

impl Clock for FrameClock {
    /// Nanoseconds since the clock was created.
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }

    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_durations(&self.frame_times)
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
    fn stats_of_empty_clock_are_zero() {
        assert_eq!(FrameClock::new().frame_stats(), FrameStats::default());
    }

    #[test]
    fn stats_summarise_recorded_frames() {
        let mut clock = FrameClock::new();
        for ms in [10, 20, 30] {
            clock.record_frame(Duration::from_millis(ms));
        }
        let stats = clock.frame_stats();
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.average_frame_time_ns, 20_000_000.0);
        assert_eq!(stats.min_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 30_000_000.0);
        assert!((stats.effective_fps - 50.0).abs() < 1e-9);
        assert!(stats.jitter_ns > 8_000_000.0 && stats.jitter_ns < 8_200_000.0);
    }

    #[test]
    fn buffer_keeps_latest_samples_only() {
        let mut clock = FrameClock::with_capacity(2);
        clock.record_frame(Duration::from_millis(100));
        clock.record_frame(Duration::from_millis(1));
        clock.record_frame(Duration::from_millis(1));
        assert_eq!(clock.frame_count(), 2);
        assert_eq!(clock.frame_stats().max_frame_time_ns, 1_000_000.0);
    }

    #[test]
    fn timestamps_are_monotonic() {
        let clock = FrameClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.elapsed(u64::MAX) == Duration::ZERO);
    }
}
