use crate::config::TaskKind;
use crate::error::TaskError;
use dualtask_core::{Color, FrameInput, Rect, Scene};
use std::time::Duration;

/// What a screen learns about its place on the display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenContext {
    /// Region of the window owned by the screen, in window pixels.
    pub bounds: Rect,
}

impl ScreenContext {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    /// The region in screen-local coordinates (origin at its top-left).
    pub fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.bounds.width, self.bounds.height)
    }
}

/// Lifecycle shared by the task screens the session drives.
///
/// Call order: `initialize`, `load_resources`, then `mark_start` once the
/// session starts running, `advance` once per running frame, `finish` when
/// the session ends. `render` may be called at any time.
pub trait TaskScreen {
    fn kind(&self) -> TaskKind;

    fn initialize(&mut self) -> Result<(), TaskError>;

    fn load_resources(&mut self, ctx: &ScreenContext) -> Result<(), TaskError>;

    /// `start_time` is the session clock reading when running began.
    fn mark_start(&mut self, start_time: Duration);

    /// `dt` is the frame delta in seconds.
    fn advance(&mut self, dt: f64, input: &FrameInput);

    /// Freezes the screen; later `advance` calls are ignored.
    fn finish(&mut self);

    fn background(&self) -> Color;

    /// Draws the screen in screen-local coordinates.
    fn render(&self, scene: &mut Scene);
}
