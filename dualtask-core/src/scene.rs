use crate::geometry::{Rect, Vec2};
use dualtask_cache::Atom;

/// Straight (non-premultiplied) RGBA.
pub type Color = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Center,
    TopLeft,
}

/// One primitive of a frame, in the coordinates of the screen region that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill {
        rect: Rect,
        color: Color,
    },
    /// Ring when `stroke` is set, disc otherwise.
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        stroke: Option<f32>,
    },
    Crosshair {
        rect: Rect,
        thickness: f32,
        color: Color,
    },
    Text {
        content: Atom,
        position: Vec2,
        size: f32,
        color: Color,
        opacity: f32,
        anchor: TextAnchor,
    },
}

/// Display list filled by task screens each frame and consumed by the renderer.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn fill(&mut self, rect: Rect, color: Color) {
        self.push(DrawCommand::Fill { rect, color });
    }

    pub fn text(&mut self, content: &str, position: Vec2, size: f32, color: Color) {
        self.push(DrawCommand::Text {
            content: Atom::from(content),
            position,
            size,
            color,
            opacity: 1.0,
            anchor: TextAnchor::Center,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every text item in drawing order; handy for assertions on overlays.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { content, .. } => Some(&**content),
            _ => None,
        })
    }
}

/// A scene placed on the window: `scene` is drawn in local coordinates and
/// translated to `bounds`, clipped to it.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub bounds: Rect,
    pub scene: Scene,
}

impl Layer {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            scene: Scene::new(),
        }
    }
}
