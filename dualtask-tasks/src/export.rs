use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One tracking measurement, recorded every running frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time since the session started running.
    pub time: Duration,
    /// Distance between target and cursor centers, in pixels.
    pub delta: f32,
    pub direction_changed: bool,
}

impl Sample {
    /// `relative_time;delta;direction_changed`
    pub fn record(&self) -> String {
        format!(
            "{:.6};{:.4};{}",
            self.time.as_secs_f64(),
            self.delta,
            self.direction_changed
        )
    }
}

/// End-of-task statistics over the recorded samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackingSummary {
    pub max_delta: f32,
    /// Count of crossings from `<= radius` to `> radius`.
    pub times_outside: u32,
    /// Seconds between each departure and the following return, summed.
    pub wander_time: f64,
}

impl TrackingSummary {
    pub fn compute(samples: &[Sample], radius: f32) -> Self {
        let mut summary = TrackingSummary::default();
        let mut departed_at = Duration::ZERO;

        for (i, sample) in samples.iter().enumerate() {
            summary.max_delta = summary.max_delta.max(sample.delta);
            if i == 0 {
                continue;
            }
            let was_inside = samples[i - 1].delta <= radius;
            let is_inside = sample.delta <= radius;
            if was_inside && !is_inside {
                summary.times_outside += 1;
                departed_at = sample.time;
            } else if !was_inside && is_inside {
                summary.wander_time += sample.time.saturating_sub(departed_at).as_secs_f64();
            }
        }
        summary
    }
}

/// Destination of the tracking records.
pub trait ExportSink {
    fn write_records(&mut self, records: &[String]) -> io::Result<()>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Writes records as lines of a text file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for FileSink {
    fn write_records(&mut self, records: &[String]) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        for record in records {
            writeln!(out, "{record}")?;
        }
        out.flush()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
