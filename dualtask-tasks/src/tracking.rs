//! Continuous pursuit tracking: a target ring drifts around the playfield
//! in straight segments and the player keeps a crosshair on it with the
//! arrow keys.

use crate::config::{TaskKind, TrackingConfig};
use crate::error::{ConfigError, TaskError};
use crate::export::{ExportSink, FileSink, Sample, TrackingSummary};
use crate::screen::{ScreenContext, TaskScreen};
use dualtask_core::{
    Color, DrawCommand, FrameInput, Rect, RngSource, Scene, TextAnchor, UniformSource, Vec2,
};
use dualtask_timing::CountdownTimer;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Playfield height the sprite sizes were designed for.
const DESIGN_HEIGHT: f32 = 480.0;
const TARGET_RADIUS: f32 = 32.0;
const CURSOR_SIZE: f32 = 16.0;
/// Speeds are given in pixels per frame at this rate.
const REFERENCE_FPS: f64 = 60.0;

const BACKGROUND: Color = [46, 94, 52, 255];
const TARGET_COLOR: Color = [200, 200, 200, 255];
const CURSOR_COLOR: Color = [255, 255, 255, 255];
const SUMMARY_COLOR: Color = [173, 216, 230, 255];

/// Playfield edge the target touched or crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

pub struct TrackingController<S: UniformSource = RngSource> {
    config: TrackingConfig,
    duration: f64,
    source: S,
    sink: Box<dyn ExportSink>,

    playfield: Rect,
    target: Rect,
    target_direction: Vec2,
    cursor: Rect,
    cursor_direction: Vec2,
    segment: CountdownTimer,

    samples: Vec<Sample>,
    summary: Option<TrackingSummary>,
    start_time: Duration,
    elapsed: f64,
    loaded: bool,
    frozen: bool,
}

impl TrackingController<RngSource> {
    /// Controller drawing from the configured seed, or from entropy.
    pub fn from_config(config: TrackingConfig, duration: f64) -> Result<Self, ConfigError> {
        let source = RngSource::from_seed_option(config.seed);
        Self::new(config, duration, source)
    }
}

impl<S: UniformSource> TrackingController<S> {
    pub fn new(config: TrackingConfig, duration: f64, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        crate::config::positive("duration", duration)?;
        let sink = Box::new(FileSink::new(config.export_path.clone()));
        Ok(Self {
            segment: CountdownTimer::new(config.min_segment_time),
            config,
            duration,
            source,
            sink,
            playfield: Rect::default(),
            target: Rect::default(),
            target_direction: Vec2::new(1.0, 0.0),
            cursor: Rect::default(),
            cursor_direction: Vec2::ZERO,
            samples: Vec::new(),
            summary: None,
            start_time: Duration::ZERO,
            elapsed: 0.0,
            loaded: false,
            frozen: false,
        })
    }

    /// Replaces the file export with another destination.
    pub fn with_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Available once the task duration has been reached.
    pub fn summary(&self) -> Option<&TrackingSummary> {
        self.summary.as_ref()
    }

    pub fn target(&self) -> Rect {
        self.target
    }

    pub fn cursor(&self) -> Rect {
        self.cursor
    }

    pub fn target_direction(&self) -> Vec2 {
        self.target_direction
    }

    pub fn playfield(&self) -> Rect {
        self.playfield
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    /// Half the target's width; the inside/outside threshold for summaries.
    pub fn radius(&self) -> f32 {
        self.target.width * 0.5
    }

    /// Moves the target, e.g. to set up a scenario. The cursor is not moved.
    pub fn place_target(&mut self, position: Vec2) {
        self.target.x = position.x;
        self.target.y = position.y;
    }

    /// Advances the segment timer to completion so the next frame redirects.
    pub fn expire_segment(&mut self) {
        let remaining = self.segment.duration() - self.segment.elapsed();
        self.segment.advance(remaining.max(0.0));
    }

    fn sample_segment_duration(&mut self) -> f64 {
        self.source
            .range(self.config.min_segment_time, self.config.max_segment_time)
    }

    /// Edge the target has crossed, or failing that the first edge it
    /// touches, checked in left/right/top/bottom order.
    fn touched_edge(&self) -> Option<Edge> {
        let (t, f) = (&self.target, &self.playfield);
        let crossed = [
            (t.left() < f.left(), Edge::Left),
            (t.right() > f.right(), Edge::Right),
            (t.top() < f.top(), Edge::Top),
            (t.bottom() > f.bottom(), Edge::Bottom),
        ];
        let touched = [
            (t.left() <= f.left(), Edge::Left),
            (t.right() >= f.right(), Edge::Right),
            (t.top() <= f.top(), Edge::Top),
            (t.bottom() >= f.bottom(), Edge::Bottom),
        ];
        crossed
            .into_iter()
            .chain(touched)
            .find_map(|(hit, edge)| hit.then_some(edge))
    }

    /// New unit direction. Near an edge, the component across that edge is
    /// drawn from the half-range pointing back into the playfield.
    fn draw_direction(&mut self, edge: Option<Edge>) -> Vec2 {
        let src = &mut self.source;
        let mut draw = |low: f64, high: f64| src.range(low, high) as f32;
        // x is always drawn before y
        let raw = match edge {
            Some(Edge::Left) => {
                let x = draw(0.0, 0.5);
                Vec2::new(x, draw(-0.5, 0.5))
            }
            Some(Edge::Right) => {
                let x = -draw(0.0, 0.5);
                Vec2::new(x, draw(-0.5, 0.5))
            }
            Some(Edge::Top) => {
                let x = draw(-0.5, 0.5);
                Vec2::new(x, draw(0.0, 0.5))
            }
            Some(Edge::Bottom) => {
                let x = draw(-0.5, 0.5);
                Vec2::new(x, -draw(0.0, 0.5))
            }
            None => {
                let x = draw(-0.5, 0.5);
                Vec2::new(x, draw(-0.5, 0.5))
            }
        };
        raw.normalized().unwrap_or(match edge {
            Some(Edge::Left) | None => Vec2::new(1.0, 0.0),
            Some(Edge::Right) => Vec2::new(-1.0, 0.0),
            Some(Edge::Top) => Vec2::new(0.0, 1.0),
            Some(Edge::Bottom) => Vec2::new(0.0, -1.0),
        })
    }

    fn move_cursor(&mut self, input: &FrameInput, scale: f32) {
        self.cursor_direction = input.movement().clamp_unit();
        let speed = self.config.circle_speed * self.config.player_relative_speed;
        self.cursor
            .translate(self.cursor_direction * (speed * scale));
        // held at the edge on any axis that would leave the playfield
        self.playfield.clamp_inside(&mut self.cursor);
    }

    fn move_target(&mut self, scale: f32) -> bool {
        self.target
            .translate(self.target_direction * (self.config.circle_speed * scale));

        let escaped = !self.playfield.contains_rect(&self.target);
        if !(self.segment.is_complete() || escaped) {
            return false;
        }

        let edge = self.touched_edge();
        self.target_direction = self.draw_direction(edge);
        if escaped {
            self.playfield.clamp_inside(&mut self.target);
        }
        let next = self.sample_segment_duration();
        self.segment.set_duration(next);
        self.segment.reset();
        debug!(
            ?edge,
            escaped,
            x = self.target_direction.x,
            y = self.target_direction.y,
            next_segment = next,
            "target direction changed"
        );
        true
    }

    fn export(&mut self) {
        let summary = TrackingSummary::compute(&self.samples, self.radius());
        let records: Vec<String> = self.samples.iter().map(Sample::record).collect();
        match self.sink.write_records(&records) {
            Ok(()) => info!(
                records = records.len(),
                destination = %self.sink.describe(),
                "tracking results exported"
            ),
            Err(e) => warn!(
                error = %e,
                destination = %self.sink.describe(),
                "tracking export failed; continuing"
            ),
        }
        info!(
            max_delta = summary.max_delta,
            times_outside = summary.times_outside,
            wander_time = summary.wander_time,
            "tracking summary"
        );
        self.summary = Some(summary);
    }
}

impl<S: UniformSource> TaskScreen for TrackingController<S> {
    fn kind(&self) -> TaskKind {
        TaskKind::Continuous
    }

    fn initialize(&mut self) -> Result<(), TaskError> {
        let first = self.sample_segment_duration();
        self.segment = CountdownTimer::new(first);
        self.cursor_direction = Vec2::ZERO;
        self.samples.clear();
        self.summary = None;
        self.elapsed = 0.0;
        self.frozen = false;
        Ok(())
    }

    fn load_resources(&mut self, ctx: &ScreenContext) -> Result<(), TaskError> {
        self.playfield = ctx.local_bounds();
        let scale = self.playfield.height / DESIGN_HEIGHT;
        let target_size = (2.0 * TARGET_RADIUS * scale).round();
        let cursor_size = (CURSOR_SIZE * scale).round();

        let x = self
            .source
            .range(0.0, (self.playfield.width - target_size).max(0.0) as f64);
        let y = self
            .source
            .range(0.0, (self.playfield.height - target_size).max(0.0) as f64);
        self.target = Rect::new(x as f32, y as f32, target_size, target_size);
        self.cursor = Rect::centered(self.target.center(), cursor_size, cursor_size);
        self.target_direction = self.draw_direction(None);
        self.loaded = true;
        Ok(())
    }

    fn mark_start(&mut self, start_time: Duration) {
        self.start_time = start_time;
        self.elapsed = 0.0;
    }

    fn advance(&mut self, dt: f64, input: &FrameInput) {
        if self.frozen || !self.loaded {
            return;
        }
        let scale = (dt * REFERENCE_FPS) as f32;
        self.segment.advance(dt);
        self.elapsed += dt;

        self.move_cursor(input, scale);
        let changed = self.move_target(scale);

        self.samples.push(Sample {
            time: Duration::from_secs_f64(self.elapsed),
            delta: self.target.center().distance(self.cursor.center()),
            direction_changed: changed,
        });

        if self.summary.is_none() && self.elapsed >= self.duration {
            self.export();
        }
    }

    fn finish(&mut self) {
        self.frozen = true;
    }

    fn background(&self) -> Color {
        BACKGROUND
    }

    fn render(&self, scene: &mut Scene) {
        scene.fill(self.playfield, BACKGROUND);
        scene.push(DrawCommand::Circle {
            center: self.target.center(),
            radius: self.radius(),
            color: TARGET_COLOR,
            stroke: Some((self.target.width / 16.0).max(2.0)),
        });
        scene.push(DrawCommand::Crosshair {
            rect: self.cursor,
            thickness: (self.cursor.width / 8.0).max(1.0),
            color: CURSOR_COLOR,
        });

        if let Some(summary) = &self.summary {
            let x = self.playfield.width * 0.5;
            let mut y = self.playfield.height / 8.0;
            for line in [
                format!("Left circle: {} times", summary.times_outside),
                format!("Remained outside: {:.2} seconds", summary.wander_time),
                format!("Max delta: {:.2}", summary.max_delta),
            ] {
                scene.push(DrawCommand::Text {
                    content: line.as_str().into(),
                    position: Vec2::new(x, y),
                    size: 24.0,
                    color: SUMMARY_COLOR,
                    opacity: 1.0,
                    anchor: TextAnchor::Center,
                });
                y += 32.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn write_records(&mut self, _: &[String]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
        fn describe(&self) -> String {
            "nowhere".into()
        }
    }

    fn controller(seed: u64, duration: f64) -> TrackingController {
        let config = TrackingConfig {
            seed: Some(seed),
            ..Default::default()
        };
        let mut c = TrackingController::from_config(config, duration)
            .unwrap()
            .with_sink(Box::new(FailingSink));
        c.initialize().unwrap();
        c.load_resources(&ScreenContext::new(Rect::new(0.0, 0.0, 768.0, 768.0)))
            .unwrap();
        c.mark_start(Duration::from_secs(3));
        c
    }

    #[test]
    fn sizes_scale_with_playfield_height() {
        let c = controller(1, 10.0);
        assert_eq!(c.target().width, 102.0);
        assert_eq!(c.cursor().width, 26.0);
        assert!(c.playfield().contains_rect(&c.target()));
        assert_eq!(c.cursor().center(), c.target().center());
        assert!((c.target_direction().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn target_always_overlaps_playfield() {
        let mut c = controller(99, 1000.0);
        let input = FrameInput::default();
        for frame in 0..5000 {
            // occasional long frames stress the boundary correction
            let dt = if frame % 97 == 0 { 0.5 } else { 1.0 / 60.0 };
            c.advance(dt, &input);
            assert!(
                c.playfield().intersects(&c.target()),
                "target left the playfield on frame {frame}"
            );
            assert!((c.target_direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn touching_left_edge_redirects_rightwards() {
        for seed in 0..50 {
            let mut c = controller(seed, 100.0);
            c.place_target(Vec2::new(0.0, 300.0));
            c.expire_segment();
            let edge = c.touched_edge();
            assert_eq!(edge, Some(Edge::Left));
            let dir = c.draw_direction(edge);
            assert!(dir.x >= 0.0, "seed {seed} gave {dir:?}");
            assert!((dir.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn crossing_an_edge_marks_a_direction_change() {
        let mut c = controller(5, 100.0);
        c.place_target(Vec2::new(-10.0, 300.0));
        c.advance(1.0 / 60.0, &FrameInput::default());
        let last = c.samples().last().unwrap();
        assert!(last.direction_changed);
        assert!(c.target_direction().x >= 0.0);
        assert!(c.playfield().contains_rect(&c.target()));
    }

    #[test]
    fn timer_expiry_redirects_and_resets_segment() {
        let mut c = controller(8, 100.0);
        c.place_target(Vec2::new(300.0, 300.0));
        c.expire_segment();
        c.advance(1.0 / 60.0, &FrameInput::default());
        assert!(c.samples()[0].direction_changed);
        assert!(!c.segment.is_complete());
        assert_eq!(c.segment.elapsed(), 0.0);
        let d = c.segment.duration();
        assert!((0.5..1.5).contains(&d));
    }

    #[test]
    fn cursor_is_held_at_playfield_edge() {
        let mut c = controller(3, 100.0);
        let input = FrameInput {
            left: true,
            up: true,
            ..Default::default()
        };
        for _ in 0..2000 {
            c.advance(1.0 / 60.0, &input);
        }
        assert_eq!(c.cursor().left(), 0.0);
        assert_eq!(c.cursor().top(), 0.0);
    }

    #[test]
    fn one_sample_per_frame_with_distance() {
        let mut c = controller(11, 100.0);
        for _ in 0..10 {
            c.advance(0.01, &FrameInput::default());
        }
        assert_eq!(c.samples().len(), 10);
        let last = c.samples()[9];
        assert!((last.time.as_secs_f64() - 0.1).abs() < 1e-9);
        let expected = c.target().center().distance(c.cursor().center());
        assert_eq!(last.delta, expected);
    }

    #[test]
    fn summary_is_computed_once_and_export_failure_is_swallowed() {
        let mut c = controller(4, 0.5);
        for _ in 0..40 {
            c.advance(1.0 / 60.0, &FrameInput::default());
        }
        assert!(c.summary().is_some());
        let first = *c.summary().unwrap();
        for _ in 0..60 {
            c.advance(1.0 / 60.0, &FrameInput { right: true, ..Default::default() });
        }
        assert_eq!(*c.summary().unwrap(), first);
    }

    #[test]
    fn export_writes_one_line_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("continuousResults.csv");
        let config = TrackingConfig {
            seed: Some(21),
            export_path: path.clone(),
            ..Default::default()
        };
        let mut c = TrackingController::from_config(config, 0.25).unwrap();
        c.initialize().unwrap();
        c.load_resources(&ScreenContext::new(Rect::new(0.0, 0.0, 640.0, 480.0)))
            .unwrap();
        c.mark_start(Duration::ZERO);
        for _ in 0..40 {
            c.advance(0.01, &FrameInput::default());
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // exported on the frame that reached 0.25 s
        assert!(lines.len() >= 25 && lines.len() <= 26, "{} lines", lines.len());
        for (line, sample) in lines.iter().zip(c.samples()) {
            assert_eq!(*line, sample.record());
            assert_eq!(line.split(';').count(), 3);
        }
    }

    #[test]
    fn frozen_controller_ignores_frames() {
        let mut c = controller(2, 100.0);
        c.advance(0.01, &FrameInput::default());
        c.finish();
        c.advance(0.01, &FrameInput::default());
        assert_eq!(c.samples().len(), 1);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut a = controller(77, 100.0);
        let mut b = controller(77, 100.0);
        for _ in 0..600 {
            a.advance(1.0 / 60.0, &FrameInput::default());
            b.advance(1.0 / 60.0, &FrameInput::default());
        }
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = TrackingConfig {
            min_segment_time: 3.0,
            max_segment_time: 1.0,
            ..Default::default()
        };
        assert!(TrackingController::from_config(config, 10.0).is_err());
    }
}
