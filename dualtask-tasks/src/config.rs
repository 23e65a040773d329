use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Continuous,
    Discrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunGames {
    Continuous,
    Discrete,
    #[default]
    Both,
}

impl RunGames {
    pub fn includes(&self, kind: TaskKind) -> bool {
        match self {
            RunGames::Both => true,
            RunGames::Continuous => kind == TaskKind::Continuous,
            RunGames::Discrete => kind == TaskKind::Discrete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Word file for this tier inside the configured word directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy.txt",
            Difficulty::Medium => "medium.txt",
            Difficulty::Hard => "hard.txt",
        }
    }
}

/// Pursuit-tracking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Target speed in pixels per 60 Hz frame.
    pub circle_speed: f32,
    /// Cursor speed as a multiple of the target speed.
    pub player_relative_speed: f32,
    pub min_segment_time: f64,
    pub max_segment_time: f64,
    pub seed: Option<u64>,
    pub export_path: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            circle_speed: 2.0,
            player_relative_speed: 1.5,
            min_segment_time: 0.5,
            max_segment_time: 1.5,
            seed: None,
            export_path: PathBuf::from("continuousResults.csv"),
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("circle_speed", self.circle_speed as f64)?;
        positive("player_relative_speed", self.player_relative_speed as f64)?;
        positive("min_segment_time", self.min_segment_time)?;
        if self.min_segment_time > self.max_segment_time {
            return Err(ConfigError::InvertedSegmentRange {
                min: self.min_segment_time,
                max: self.max_segment_time,
            });
        }
        Ok(())
    }
}

/// N-back parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBackConfig {
    pub n: usize,
    pub word_duration: f64,
    pub answer_duration: f64,
    pub animation_duration: f64,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
    pub word_dir: PathBuf,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            n: 2,
            word_duration: 5.0,
            answer_duration: 0.75,
            animation_duration: 0.75,
            difficulty: Difficulty::Easy,
            seed: None,
            word_dir: PathBuf::from("assets/words"),
        }
    }
}

impl NBackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(ConfigError::ZeroN);
        }
        positive("word_duration", self.word_duration)?;
        positive("answer_duration", self.answer_duration)?;
        if !(0.0..=self.word_duration).contains(&self.animation_duration) {
            return Err(ConfigError::AnimationOutOfRange {
                animation: self.animation_duration,
                word: self.word_duration,
            });
        }
        Ok(())
    }
}

/// Whole-run configuration as read by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub run_games: RunGames,
    pub left_screen_relative_width: f32,
    pub left_side_game: TaskKind,
    /// Session length in seconds, shared by both tasks.
    pub duration: f64,
    pub font_path: Option<PathBuf>,
    pub tracking: TrackingConfig,
    pub nback: NBackConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
            fullscreen: false,
            run_games: RunGames::Both,
            left_screen_relative_width: 768.0 / 1366.0,
            left_side_game: TaskKind::Continuous,
            duration: 60.0,
            font_path: Some(PathBuf::from(
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            )),
            tracking: TrackingConfig::default(),
            nback: NBackConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Validates the session values and every task that will run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("duration", self.duration)?;
        if self.run_games == RunGames::Both
            && !(self.left_screen_relative_width > 0.0 && self.left_screen_relative_width < 1.0)
        {
            return Err(ConfigError::InvalidSplit(self.left_screen_relative_width));
        }
        if self.run_games.includes(TaskKind::Continuous) {
            self.tracking.validate()?;
        }
        if self.run_games.includes(TaskKind::Discrete) {
            self.nback.validate()?;
        }
        Ok(())
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // written so NaN is rejected too
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}
