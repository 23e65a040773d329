use crate::geometry::Vec2;

/// Keys held down during one frame, as sampled by the host loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub start: bool,
    pub space: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl FrameInput {
    /// Arrow keys folded into a vector with components in `{-1, 0, 1}`.
    /// Opposite keys cancel out.
    pub fn movement(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}
