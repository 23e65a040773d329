pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod nback;
pub mod screen;
pub mod session;
pub mod tracking;
pub mod words;

pub use config::{Difficulty, NBackConfig, RunGames, SessionConfig, TaskKind, TrackingConfig};
pub use error::{ConfigError, TaskError};
pub use export::{ExportSink, FileSink, Sample, TrackingSummary};
pub use history::BoundedHistoryQueue;
pub use nback::NBackController;
pub use screen::{ScreenContext, TaskScreen};
pub use session::{SessionController, SessionState, Transition};
pub use tracking::TrackingController;
pub use words::WordList;
