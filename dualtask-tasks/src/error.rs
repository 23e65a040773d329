use std::path::PathBuf;
use thiserror::Error;

/// Rejected configuration values. Nothing is clamped silently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("segment time range is inverted: min {min} > max {max}")]
    InvertedSegmentRange { min: f64, max: f64 },

    #[error("n-back distance must be at least 1")]
    ZeroN,

    #[error("animation_duration {animation} must lie within [0, word_duration = {word}]")]
    AnimationOutOfRange { animation: f64, word: f64 },

    #[error("left_screen_relative_width {0} must lie strictly between 0 and 1")]
    InvalidSplit(f32),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read word list {}: {source}", .path.display())]
    WordList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("word list {origin} contains no words")]
    EmptyWordList { origin: String },
}
