//! Verbal N-back: one word per trial, the player presses space when the word
//! equals the one shown N trials earlier.

use crate::config::{NBackConfig, TaskKind};
use crate::error::{ConfigError, TaskError};
use crate::history::BoundedHistoryQueue;
use crate::screen::{ScreenContext, TaskScreen};
use crate::words::WordList;
use dualtask_cache::Atom;
use dualtask_core::{
    Color, DrawCommand, FrameInput, NBackScore, Rect, RngSource, Scene, TextAnchor,
    TrialOutcome, UniformSource, Vec2,
};
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, info};

/// Draws at or above this value repeat the N-back word on purpose.
const FORCED_MATCH_THRESHOLD: f64 = 0.75;

const BACKGROUND: Color = [64, 48, 36, 255];
const HUD_COLOR: Color = [173, 255, 47, 255];
const WORD_COLOR: Color = [255, 255, 255, 255];
const CORRECT_COLOR: Color = [0, 160, 0, 255];
const WRONG_COLOR: Color = [220, 30, 30, 255];

/// Opacity of the word while its window is open.
///
/// Driven by the time left in the window: with
/// `diff = remaining - (word_duration - animation_duration)` the opacity is
/// `1 - diff / animation_duration` while `diff >= 0`, rising to 1 as the
/// remaining time shrinks, and keeps `current` otherwise.
pub fn stimulus_opacity(
    remaining: f64,
    word_duration: f64,
    animation_duration: f64,
    current: f32,
) -> f32 {
    if animation_duration <= 0.0 {
        return 1.0;
    }
    let diff = remaining - (word_duration - animation_duration);
    if diff >= 0.0 {
        (1.0 - diff / animation_duration).clamp(0.0, 1.0) as f32
    } else {
        current
    }
}

/// The resolved word, kept on screen for `answer_duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub word: Atom,
    pub outcome: TrialOutcome,
    pub remaining: f64,
}

pub struct NBackController<S: UniformSource = RngSource> {
    config: NBackConfig,
    duration: f64,
    source: S,
    words: Option<WordList>,

    current: usize,
    history: BoundedHistoryQueue<Atom>,
    score: NBackScore,
    responded: bool,
    remaining: f64,
    feedback: Option<Feedback>,
    opacity: f32,

    trials: u32,
    last_outcome: Option<TrialOutcome>,
    elapsed: f64,
    finished: bool,
    viewport: Rect,
}

impl NBackController<RngSource> {
    /// Controller drawing from the configured seed, or from entropy.
    pub fn from_config(config: NBackConfig, duration: f64) -> Result<Self, ConfigError> {
        let source = RngSource::from_seed_option(config.seed);
        Self::new(config, duration, source)
    }
}

impl<S: UniformSource> NBackController<S> {
    pub fn new(config: NBackConfig, duration: f64, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        crate::config::positive("duration", duration)?;
        let capacity = NonZeroUsize::new(config.n).ok_or(ConfigError::ZeroN)?;
        Ok(Self {
            remaining: config.word_duration,
            config,
            duration,
            source,
            words: None,
            current: 0,
            history: BoundedHistoryQueue::new(capacity),
            score: NBackScore::default(),
            responded: false,
            feedback: None,
            opacity: 0.0,
            trials: 0,
            last_outcome: None,
            elapsed: 0.0,
            finished: false,
            viewport: Rect::default(),
        })
    }

    /// Uses `words` instead of reading the configured word directory.
    pub fn with_words(mut self, words: WordList) -> Self {
        self.words = Some(words);
        self
    }

    pub fn score(&self) -> NBackScore {
        self.score
    }

    /// Word currently presented, once initialized.
    pub fn current_word(&self) -> Option<&Atom> {
        self.words.as_ref().and_then(|w| w.get(self.current))
    }

    pub fn history(&self) -> &BoundedHistoryQueue<Atom> {
        &self.history
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn last_outcome(&self) -> Option<TrialOutcome> {
        self.last_outcome
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_responded(&self) -> bool {
        self.responded
    }

    /// Whether the presented word equals the one shown N trials ago.
    pub fn is_match(&self) -> bool {
        self.current_word()
            .is_some_and(|word| self.history.matches(word))
    }

    /// Scores the current trial, records its word and moves on to the next one.
    pub fn resolve(&mut self, pressed: bool) -> TrialOutcome {
        let Some(word) = self.current_word().cloned() else {
            return TrialOutcome::NoOp;
        };
        let outcome = TrialOutcome::classify(self.history.matches(&word), pressed);
        self.score.record(outcome);
        self.trials += 1;
        self.last_outcome = Some(outcome);
        debug!(trial = self.trials, word = %word, pressed, ?outcome, "trial resolved");

        self.history.push(word.clone());
        self.current = self.select_next();
        self.remaining = self.config.word_duration;
        self.responded = false;

        if outcome.is_scored() {
            self.feedback = Some(Feedback {
                word,
                outcome,
                remaining: self.config.answer_duration,
            });
            self.opacity = 1.0;
        } else {
            self.opacity = self.window_opacity();
        }
        outcome
    }

    fn select_next(&mut self) -> usize {
        let Some(words) = self.words.as_ref() else {
            return 0;
        };
        let u = self.source.unit();
        if u >= FORCED_MATCH_THRESHOLD && self.history.is_full() {
            if let Some(i) = self.history.front().and_then(|front| words.position(front)) {
                return i;
            }
        }
        self.source.index(words.len())
    }

    fn window_opacity(&self) -> f32 {
        stimulus_opacity(
            self.remaining,
            self.config.word_duration,
            self.config.animation_duration,
            self.opacity,
        )
    }

    fn advance_window(&mut self, dt: f64, space_pressed: bool) {
        if space_pressed && !self.responded {
            self.resolve(true);
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 && !self.responded {
            self.resolve(false);
        }
        if self.feedback.is_none() {
            self.opacity = self.window_opacity();
        }
    }

    fn word_color(&self) -> Color {
        match self.feedback.as_ref().map(|f| f.outcome) {
            Some(TrialOutcome::Correct) => CORRECT_COLOR,
            Some(_) => WRONG_COLOR,
            None => WORD_COLOR,
        }
    }
}

impl<S: UniformSource> TaskScreen for NBackController<S> {
    fn kind(&self) -> TaskKind {
        TaskKind::Discrete
    }

    fn initialize(&mut self) -> Result<(), TaskError> {
        if self.words.is_none() {
            self.words = Some(WordList::load(
                &self.config.word_dir,
                self.config.difficulty,
            )?);
        }
        let len = self.words.as_ref().map_or(0, WordList::len);
        if len == 0 {
            return Err(TaskError::EmptyWordList {
                origin: self.config.word_dir.display().to_string(),
            });
        }
        self.current = self.source.index(len);
        self.history.clear();
        self.score = NBackScore::default();
        self.responded = false;
        self.feedback = None;
        self.remaining = self.config.word_duration;
        self.opacity = self.window_opacity();
        self.trials = 0;
        self.last_outcome = None;
        self.elapsed = 0.0;
        self.finished = false;
        Ok(())
    }

    fn load_resources(&mut self, ctx: &ScreenContext) -> Result<(), TaskError> {
        self.viewport = ctx.local_bounds();
        Ok(())
    }

    fn mark_start(&mut self, _start_time: Duration) {
        self.elapsed = 0.0;
    }

    fn advance(&mut self, dt: f64, input: &FrameInput) {
        if self.finished || self.words.is_none() {
            return;
        }
        self.elapsed += dt;

        match self.feedback.as_mut() {
            Some(feedback) => {
                feedback.remaining -= dt;
                if feedback.remaining <= 0.0 {
                    self.feedback = None;
                    self.opacity = self.window_opacity();
                }
            }
            None => self.advance_window(dt, input.space),
        }

        if self.elapsed >= self.duration {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!(
            trials = self.trials,
            correct = self.score.correct,
            wrong = self.score.wrong,
            missed = self.score.missed,
            score = self.score.total(),
            "n-back finished"
        );
    }

    fn background(&self) -> Color {
        BACKGROUND
    }

    fn render(&self, scene: &mut Scene) {
        let v = self.viewport;
        scene.fill(v, BACKGROUND);
        let center = v.center();

        if self.finished {
            let lines = [
                (format!("Score: {}", self.score.total()), [100, 149, 237, 255], 100.0),
                (format!("Correct answers: {}", self.score.correct), [0, 128, 0, 255], 200.0),
                (format!("Wrong answers: {}", self.score.wrong), [255, 0, 0, 255], 250.0),
                (format!("Missed answers: {}", self.score.missed), [255, 165, 0, 255], 300.0),
            ];
            for (text, color, y) in lines {
                scene.text(&text, Vec2::new(center.x, y), 24.0, color);
            }
            return;
        }

        scene.push(DrawCommand::Text {
            content: format!("Score: {}", self.score.total()).as_str().into(),
            position: Vec2::new(v.width - 200.0, 20.0),
            size: 24.0,
            color: HUD_COLOR,
            opacity: 1.0,
            anchor: TextAnchor::TopLeft,
        });
        scene.push(DrawCommand::Text {
            content: format!("N = {}", self.config.n).as_str().into(),
            position: Vec2::new(20.0, 20.0),
            size: 24.0,
            color: HUD_COLOR,
            opacity: 1.0,
            anchor: TextAnchor::TopLeft,
        });

        let (word, opacity) = match &self.feedback {
            Some(feedback) => (Some(&feedback.word), 1.0),
            None => (self.current_word(), self.opacity),
        };
        if let Some(word) = word {
            scene.push(DrawCommand::Text {
                content: word.clone(),
                position: center,
                size: 60.0,
                color: self.word_color(),
                opacity,
                anchor: TextAnchor::Center,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted draws: `unit` and `index` each consume their own queue.
    #[derive(Default)]
    struct Script {
        units: VecDeque<f64>,
        indices: VecDeque<usize>,
    }

    impl Script {
        fn new(units: &[f64], indices: &[usize]) -> Self {
            Self {
                units: units.iter().copied().collect(),
                indices: indices.iter().copied().collect(),
            }
        }
    }

    impl UniformSource for Script {
        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.0)
        }
        fn index(&mut self, len: usize) -> usize {
            self.indices.pop_front().unwrap_or(0) % len
        }
    }

    fn config(n: usize) -> NBackConfig {
        NBackConfig {
            n,
            word_duration: 2.0,
            answer_duration: 0.5,
            animation_duration: 0.5,
            ..Default::default()
        }
    }

    fn words() -> WordList {
        WordList::from_words(["cat", "dog", "fish"], "test").unwrap()
    }

    fn scripted(n: usize, units: &[f64], indices: &[usize]) -> NBackController<Script> {
        let mut c = NBackController::new(config(n), 600.0, Script::new(units, indices))
            .unwrap()
            .with_words(words());
        c.initialize().unwrap();
        c.load_resources(&ScreenContext::new(Rect::new(0.0, 0.0, 600.0, 768.0)))
            .unwrap();
        c
    }

    fn word(c: &NBackController<Script>) -> String {
        c.current_word().unwrap().to_string()
    }

    const IDLE: FrameInput = FrameInput {
        start: false,
        space: false,
        left: false,
        right: false,
        up: false,
        down: false,
    };
    const SPACE: FrameInput = FrameInput {
        space: true,
        ..IDLE
    };

    #[test]
    fn forced_match_on_third_trial_scores_correct() {
        // first word cat; trial 2 dog (u < 0.75); trial 3 forced (u >= 0.75)
        let mut c = scripted(2, &[0.1, 0.9], &[0, 1]);
        assert_eq!(word(&c), "cat");

        assert_eq!(c.resolve(false), TrialOutcome::NoOp);
        assert_eq!(word(&c), "dog");
        assert_eq!(c.resolve(false), TrialOutcome::NoOp);
        assert!(c.history().is_full());

        // word 3 equals the oldest queue entry, word 1
        assert_eq!(word(&c), "cat");
        assert_eq!(&**c.history().front().unwrap(), "cat");
        assert!(c.is_match());

        c.advance(0.016, &SPACE);
        assert_eq!(
            c.score(),
            NBackScore {
                correct: 1,
                wrong: 0,
                missed: 0
            }
        );
    }

    #[test]
    fn timeout_on_a_match_counts_missed_only() {
        let mut c = scripted(1, &[0.9], &[2]);
        assert_eq!(word(&c), "fish");
        c.resolve(false);
        // forced repeat of "fish"
        assert_eq!(word(&c), "fish");
        assert!(c.is_match());

        c.advance(2.5, &IDLE);
        assert_eq!(
            c.score(),
            NBackScore {
                correct: 0,
                wrong: 0,
                missed: 1
            }
        );
        assert_eq!(c.last_outcome(), Some(TrialOutcome::Missed));
    }

    #[test]
    fn match_is_false_until_history_is_full() {
        // "cat" shown three times with n = 3: no match before the queue fills
        let mut c = scripted(3, &[0.1, 0.1, 0.1], &[0, 0, 0, 0]);
        assert!(!c.is_match());
        assert_eq!(c.resolve(true), TrialOutcome::Wrong);
        assert!(!c.is_match());
        assert_eq!(c.resolve(true), TrialOutcome::Wrong);
        assert!(!c.is_match());
        assert_eq!(c.resolve(true), TrialOutcome::Wrong);
        assert!(c.is_match());
        assert_eq!(c.resolve(true), TrialOutcome::Correct);
    }

    #[test]
    fn forced_branch_needs_a_full_history() {
        // u >= 0.75 while the queue is still filling falls through to a random pick
        let mut c = scripted(2, &[0.95], &[0, 2]);
        c.resolve(false);
        assert_eq!(word(&c), "fish");
    }

    #[test]
    fn press_resolves_immediately_without_counting_down() {
        let mut c = scripted(2, &[0.1], &[0, 1]);
        c.advance(0.5, &IDLE);
        assert!((c.remaining() - 1.5).abs() < 1e-12);

        c.advance(0.5, &SPACE);
        assert_eq!(c.score().wrong, 1);
        // new window, untouched this frame
        assert_eq!(c.remaining(), 2.0);
        assert!(c.feedback().is_some());
    }

    #[test]
    fn feedback_holds_the_resolved_word_and_ignores_input() {
        let mut c = scripted(2, &[0.1], &[0, 1]);
        c.advance(0.1, &SPACE);
        let fb = c.feedback().unwrap().clone();
        assert_eq!(&*fb.word, "cat");
        assert_eq!(fb.outcome, TrialOutcome::Wrong);
        assert_eq!(c.opacity(), 1.0);

        c.advance(0.2, &SPACE);
        assert_eq!(c.score().wrong, 1);
        assert_eq!(c.remaining(), 2.0);

        c.advance(0.4, &IDLE);
        assert!(c.feedback().is_none());
        assert_eq!(word(&c), "dog");
    }

    #[test]
    fn no_op_timeout_skips_feedback() {
        let mut c = scripted(2, &[0.1], &[0, 1]);
        c.advance(2.0, &IDLE);
        assert_eq!(c.score(), NBackScore::default());
        assert_eq!(c.trials(), 1);
        assert!(c.feedback().is_none());
        assert_eq!(word(&c), "dog");
    }

    #[test]
    fn opacity_ramps_with_remaining_time() {
        // word 2.0 s, animation 0.5 s
        assert_eq!(stimulus_opacity(2.0, 2.0, 0.5, 0.3), 0.0);
        assert!((stimulus_opacity(1.75, 2.0, 0.5, 0.3) - 0.5).abs() < 1e-6);
        assert_eq!(stimulus_opacity(1.5, 2.0, 0.5, 0.3), 1.0);
        // outside the ramp the previous value is kept
        assert_eq!(stimulus_opacity(1.0, 2.0, 0.5, 0.3), 0.3);
        assert_eq!(stimulus_opacity(1.0, 2.0, 0.0, 0.3), 1.0);

        let mut c = scripted(2, &[], &[0]);
        assert_eq!(c.opacity(), 0.0);
        c.advance(0.25, &IDLE);
        assert!((c.opacity() - 0.5).abs() < 1e-6);
        // a frame straddling the end of the ramp holds the last value
        c.advance(1.0, &IDLE);
        assert!((c.opacity() - 0.5).abs() < 1e-6);

        let mut c = scripted(2, &[], &[0]);
        for _ in 0..8 {
            c.advance(0.0625, &IDLE);
        }
        assert_eq!(c.opacity(), 1.0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed: u64| {
            let cfg = NBackConfig {
                seed: Some(seed),
                ..config(2)
            };
            let mut c = NBackController::from_config(cfg, 600.0)
                .unwrap()
                .with_words(words());
            c.initialize().unwrap();
            let mut seen = Vec::new();
            for frame in 0..3000 {
                let input = if frame % 37 == 0 { SPACE } else { IDLE };
                c.advance(1.0 / 60.0, &input);
                seen.push(c.current_word().unwrap().clone());
            }
            (seen, c.score())
        };
        assert_eq!(run(2024), run(2024));
    }

    #[test]
    fn session_end_freezes_scoring() {
        let mut c = NBackController::new(config(2), 1.0, Script::new(&[], &[0]))
            .unwrap()
            .with_words(words());
        c.initialize().unwrap();
        c.advance(1.0, &IDLE);
        assert!(c.is_finished());
        c.advance(0.1, &SPACE);
        assert_eq!(c.score(), NBackScore::default());
        assert_eq!(c.trials(), 0);
    }

    #[test]
    fn missing_word_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NBackConfig {
            word_dir: dir.path().to_path_buf(),
            ..config(2)
        };
        let mut c = NBackController::from_config(cfg, 60.0).unwrap();
        assert!(matches!(c.initialize(), Err(TaskError::WordList { .. })));
    }

    #[test]
    fn finished_screen_lists_the_counts() {
        let mut c = scripted(2, &[0.1], &[0, 1]);
        c.resolve(true);
        c.finish();
        let mut scene = Scene::new();
        c.render(&mut scene);
        let texts: Vec<&str> = scene.texts().collect();
        assert!(texts.contains(&"Score: -1"));
        assert!(texts.contains(&"Wrong answers: 1"));
    }
}
