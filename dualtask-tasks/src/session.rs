//! Session lifecycle: start key, ready/go countdown, the timed run and the
//! end-of-session freeze, composed over the active task screens.

use crate::config::{RunGames, SessionConfig, TaskKind};
use crate::error::{ConfigError, TaskError};
use crate::nback::NBackController;
use crate::screen::{ScreenContext, TaskScreen};
use crate::tracking::TrackingController;
use dualtask_core::{Color, CountdownStage, FrameInput, Layer, Rect, SessionPhase, Vec2};
use std::time::Duration;
use tracing::{debug, info};

/// Length of the ready/go countdown.
pub const COUNTDOWN_SECS: f64 = 1.5;
/// Slack past `duration` before the run is declared over.
pub const END_TOLERANCE: f64 = 0.01;

const PROMPT_COLOR: Color = [173, 216, 230, 255];
const HUD_COLOR: Color = [255, 255, 255, 255];
const HUD_WARNING_COLOR: Color = [255, 255, 0, 255];
const BANNER_COLOR: Color = [255, 255, 255, 255];
const WARNING_SECONDS: i64 = 5;

/// What a call to [`SessionState::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing for the tasks this frame.
    None,
    CountdownStarted,
    /// The run began; tasks get `mark_start(start_time)`.
    Started { start_time: Duration },
    /// Running frame; tasks get the delta.
    Tick,
    /// Last running frame: tasks get the delta, then are finished.
    Ended,
}

/// Pure timing state of a session, stepped by frame deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: SessionPhase,
    duration: f64,
    elapsed: f64,
    countdown_elapsed: f64,
    /// Seconds since the state was created, across all phases.
    clock: f64,
    start_time: Duration,
}

impl SessionState {
    pub fn new(duration: f64) -> Result<Self, ConfigError> {
        crate::config::positive("duration", duration)?;
        Ok(Self {
            phase: SessionPhase::Idle,
            duration,
            elapsed: 0.0,
            countdown_elapsed: 0.0,
            clock: 0.0,
            start_time: Duration::ZERO,
        })
    }

    pub fn step(&mut self, dt: f64, start_pressed: bool) -> Transition {
        self.clock += dt;
        if self.phase.accepts_start() {
            // a finished run restarts only once its duration has passed
            let allowed = self.phase == SessionPhase::Idle || self.elapsed > self.duration;
            return if start_pressed && allowed {
                self.begin_countdown()
            } else {
                Transition::None
            };
        }
        match self.phase {
            SessionPhase::Idle | SessionPhase::Finished => Transition::None,
            SessionPhase::Countdown => {
                self.countdown_elapsed += dt;
                if self.countdown_elapsed > COUNTDOWN_SECS {
                    self.phase = SessionPhase::Running;
                    self.elapsed = 0.0;
                    self.start_time = Duration::from_secs_f64(self.clock);
                    Transition::Started {
                        start_time: self.start_time,
                    }
                } else {
                    Transition::None
                }
            }
            SessionPhase::Running => {
                self.elapsed += dt;
                if self.elapsed > self.duration + END_TOLERANCE {
                    self.phase = SessionPhase::Finished;
                    Transition::Ended
                } else {
                    Transition::Tick
                }
            }
        }
    }

    fn begin_countdown(&mut self) -> Transition {
        self.phase = self.phase.next();
        self.countdown_elapsed = 0.0;
        Transition::CountdownStarted
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn countdown_elapsed(&self) -> f64 {
        self.countdown_elapsed
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    /// Whole seconds shown on the HUD: `floor(duration - elapsed) + 1`.
    pub fn remaining_whole_seconds(&self) -> i64 {
        (self.duration - self.elapsed).floor() as i64 + 1
    }
}

/// Window regions for the tasks that run, left to right.
///
/// With both tasks the left region is `round(width * left_relative_width)`
/// pixels wide and hosts `left`; a single task gets the whole window.
pub fn split_layout(
    window: Rect,
    run_games: RunGames,
    left: TaskKind,
    left_relative_width: f32,
) -> Vec<(TaskKind, Rect)> {
    match run_games {
        RunGames::Continuous => vec![(TaskKind::Continuous, window)],
        RunGames::Discrete => vec![(TaskKind::Discrete, window)],
        RunGames::Both => {
            let left_width = (window.width * left_relative_width).round();
            let right = match left {
                TaskKind::Continuous => TaskKind::Discrete,
                TaskKind::Discrete => TaskKind::Continuous,
            };
            vec![
                (left, Rect::new(window.x, window.y, left_width, window.height)),
                (
                    right,
                    Rect::new(
                        window.x + left_width,
                        window.y,
                        window.width - left_width,
                        window.height,
                    ),
                ),
            ]
        }
    }
}

struct Slot {
    screen: Box<dyn TaskScreen>,
    bounds: Rect,
}

/// Owns the task screens and drives them from the session state.
pub struct SessionController {
    state: SessionState,
    window: Rect,
    slots: Vec<Slot>,
}

impl SessionController {
    pub fn new(duration: f64, window: Rect) -> Result<Self, ConfigError> {
        Ok(Self {
            state: SessionState::new(duration)?,
            window,
            slots: Vec::new(),
        })
    }

    /// Builds the screens selected by `config`, laid out over its window size.
    pub fn from_config(config: &SessionConfig) -> Result<Self, TaskError> {
        config.validate()?;
        let window = Rect::new(0.0, 0.0, config.width as f32, config.height as f32);
        let mut session = Self::new(config.duration, window)?;
        for (kind, bounds) in split_layout(
            window,
            config.run_games,
            config.left_side_game,
            config.left_screen_relative_width,
        ) {
            let screen: Box<dyn TaskScreen> = match kind {
                TaskKind::Continuous => Box::new(TrackingController::from_config(
                    config.tracking.clone(),
                    config.duration,
                )?),
                TaskKind::Discrete => Box::new(NBackController::from_config(
                    config.nback.clone(),
                    config.duration,
                )?),
            };
            session.add_screen(screen, bounds);
        }
        Ok(session)
    }

    pub fn add_screen(&mut self, screen: Box<dyn TaskScreen>, bounds: Rect) {
        debug!(kind = ?screen.kind(), ?bounds, "screen added");
        self.slots.push(Slot { screen, bounds });
    }

    /// Runs `initialize` then `load_resources` on every screen.
    pub fn initialize(&mut self) -> Result<(), TaskError> {
        for slot in &mut self.slots {
            slot.screen.initialize()?;
            slot.screen
                .load_resources(&ScreenContext::new(slot.bounds))?;
        }
        info!(screens = self.slots.len(), duration = self.state.duration(), "session ready");
        Ok(())
    }

    pub fn advance(&mut self, dt: f64, input: &FrameInput) -> Transition {
        let transition = self.state.step(dt, input.start);
        match transition {
            Transition::None => {}
            Transition::CountdownStarted => info!("countdown started"),
            Transition::Started { start_time } => {
                info!(start = ?start_time, "session running");
                for slot in &mut self.slots {
                    slot.screen.mark_start(start_time);
                }
            }
            Transition::Tick => {
                for slot in &mut self.slots {
                    slot.screen.advance(dt, input);
                }
            }
            Transition::Ended => {
                for slot in &mut self.slots {
                    slot.screen.advance(dt, input);
                    slot.screen.finish();
                }
                info!(elapsed = self.state.elapsed(), "session finished");
            }
        }
        transition
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    pub fn screen_bounds(&self) -> impl Iterator<Item = (TaskKind, Rect)> + '_ {
        self.slots.iter().map(|s| (s.screen.kind(), s.bounds))
    }

    /// One layer per screen followed by the session overlay.
    ///
    /// Before the first run only the screen backgrounds are shown.
    pub fn render(&self) -> Vec<Layer> {
        let pre_run = matches!(
            self.state.phase(),
            SessionPhase::Idle | SessionPhase::Countdown
        ) && self.state.elapsed() < self.state.duration();

        let mut layers: Vec<Layer> = self
            .slots
            .iter()
            .map(|slot| {
                let mut layer = Layer::new(slot.bounds);
                if pre_run {
                    let local = ScreenContext::new(slot.bounds).local_bounds();
                    layer.scene.fill(local, slot.screen.background());
                } else {
                    slot.screen.render(&mut layer.scene);
                }
                layer
            })
            .collect();
        layers.push(self.overlay());
        layers
    }

    fn overlay(&self) -> Layer {
        let mut layer = Layer::new(self.window);
        let center = Vec2::new(self.window.width * 0.5, self.window.height * 0.5);
        let scene = &mut layer.scene;
        match self.state.phase() {
            SessionPhase::Idle => {
                scene.text("Press ENTER to start", center, 32.0, PROMPT_COLOR);
            }
            SessionPhase::Countdown => {
                let label = match CountdownStage::at(self.state.countdown_elapsed()) {
                    CountdownStage::Ready => "READY",
                    CountdownStage::Go => "GO",
                };
                scene.text(label, center, 72.0, BANNER_COLOR);
            }
            SessionPhase::Running | SessionPhase::Finished => {
                if self.state.elapsed() < self.state.duration() {
                    let remaining = self.state.remaining_whole_seconds();
                    let color = if remaining <= WARNING_SECONDS {
                        HUD_WARNING_COLOR
                    } else {
                        HUD_COLOR
                    };
                    scene.text(
                        &format!("Time: {remaining}"),
                        Vec2::new(center.x, 30.0),
                        28.0,
                        color,
                    );
                }
                if self.state.phase().is_finished() {
                    scene.text("TIME UP", center, 72.0, BANNER_COLOR);
                }
            }
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    fn run_until(state: &mut SessionState, phase: SessionPhase) -> usize {
        let mut frames = 0;
        while state.phase() != phase {
            state.step(FRAME, false);
            frames += 1;
            assert!(frames < 100_000, "never reached {phase:?}");
        }
        frames
    }

    #[test]
    fn idle_waits_for_start() {
        let mut s = SessionState::new(10.0).unwrap();
        for _ in 0..100 {
            assert_eq!(s.step(FRAME, false), Transition::None);
        }
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.step(FRAME, true), Transition::CountdownStarted);
        assert_eq!(s.phase(), SessionPhase::Countdown);
    }

    #[test]
    fn countdown_runs_one_and_a_half_seconds() {
        let mut s = SessionState::new(10.0).unwrap();
        s.step(FRAME, true);
        assert_eq!(s.step(1.0, false), Transition::None);
        assert_eq!(s.step(0.5, false), Transition::None);
        match s.step(0.01, false) {
            Transition::Started { start_time } => {
                assert!((start_time.as_secs_f64() - (FRAME + 1.51)).abs() < 1e-9);
            }
            other => panic!("expected start, got {other:?}"),
        }
        assert_eq!(s.elapsed(), 0.0);
        assert!(s.phase().is_running());
    }

    #[test]
    fn start_is_ignored_during_countdown_and_run() {
        let mut s = SessionState::new(10.0).unwrap();
        s.step(FRAME, true);
        s.step(0.5, true);
        assert_eq!(s.countdown_elapsed(), 0.5);
        run_until(&mut s, SessionPhase::Running);
        assert_eq!(s.step(FRAME, true), Transition::Tick);
    }

    #[test]
    fn run_ends_just_past_duration() {
        let mut s = SessionState::new(1.0).unwrap();
        s.step(FRAME, true);
        run_until(&mut s, SessionPhase::Running);

        assert_eq!(s.step(1.0, false), Transition::Tick);
        assert_eq!(s.step(0.005, false), Transition::Tick);
        assert_eq!(s.step(0.01, false), Transition::Ended);
        assert!(s.phase().is_finished());
        assert_eq!(s.step(FRAME, false), Transition::None);
    }

    #[test]
    fn finished_session_restarts_into_countdown() {
        let mut s = SessionState::new(0.5).unwrap();
        s.step(FRAME, true);
        run_until(&mut s, SessionPhase::Finished);
        assert_eq!(s.step(FRAME, true), Transition::CountdownStarted);
        assert_eq!(s.phase(), SessionPhase::Countdown);
        run_until(&mut s, SessionPhase::Running);
        assert_eq!(s.elapsed(), 0.0);
    }

    #[test]
    fn remaining_seconds_round_up() {
        let mut s = SessionState::new(60.0).unwrap();
        s.step(FRAME, true);
        run_until(&mut s, SessionPhase::Running);
        assert_eq!(s.remaining_whole_seconds(), 61);
        s.step(0.5, false);
        assert_eq!(s.remaining_whole_seconds(), 60);
        s.step(55.0, false);
        assert_eq!(s.remaining_whole_seconds(), 5);
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(matches!(
            SessionState::new(0.0),
            Err(ConfigError::NonPositive { field: "duration", .. })
        ));
    }

    #[test]
    fn layout_puts_the_left_game_first() {
        let window = Rect::new(0.0, 0.0, 1366.0, 768.0);
        let layout = split_layout(window, RunGames::Both, TaskKind::Discrete, 768.0 / 1366.0);
        assert_eq!(layout[0], (TaskKind::Discrete, Rect::new(0.0, 0.0, 768.0, 768.0)));
        assert_eq!(
            layout[1],
            (TaskKind::Continuous, Rect::new(768.0, 0.0, 598.0, 768.0))
        );

        let single = split_layout(window, RunGames::Continuous, TaskKind::Discrete, 0.5);
        assert_eq!(single, vec![(TaskKind::Continuous, window)]);
    }
}
