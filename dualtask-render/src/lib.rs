//! Software rasteriser for the task display lists: `tiny-skia` for shapes,
//! `ab_glyph` for text, output as an RGBA8 frame for the `pixels` surface.

pub mod render;
pub mod text;

pub use render::{RenderStats, Renderer, SkiaRenderer};
pub use text::{TextCache, load_font, render_text_pixmap};
