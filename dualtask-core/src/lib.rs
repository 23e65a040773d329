pub mod geometry;
pub mod input;
pub mod phase;
pub mod random;
pub mod scene;
pub mod trial;

pub use geometry::{Rect, Vec2};
pub use input::FrameInput;
pub use phase::{CountdownStage, SessionPhase};
pub use random::{RngSource, UniformSource};
pub use scene::{Color, DrawCommand, Layer, Scene, TextAnchor};
pub use trial::{NBackScore, TrialOutcome};
