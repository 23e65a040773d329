use crate::text::TextCache;
use ab_glyph::FontArc;
use anyhow::{Result, bail};
use bytemuck::{cast_slice, cast_slice_mut};
use dualtask_core::{Color, DrawCommand, Layer, Rect, Scene, TextAnchor, Vec2};
use dualtask_timing::{Clock, FrameClock, FrameStats};
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{
    FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

/// Per-frame cost breakdown returned by [`SkiaRenderer::render_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub layers: usize,
    pub commands: usize,
}

/// Draws the display lists produced by the task screens.
pub trait Renderer {
    fn draw_scene(&mut self, scene: &Scene, target: &mut Pixmap);
    fn compose(&mut self, layers: &[Layer]);
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    clear_color: Color,
    canvas: Pixmap,
    /// One offscreen buffer per layer slot, reused across frames.
    layer_buffers: Vec<Pixmap>,
    text_cache: Option<TextCache>,
    stage_clocks: HashMap<&'static str, FrameClock>,
}

fn skia_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn paint(c: Color) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(skia_color(c));
    p.anti_alias = true;
    p
}

impl SkiaRenderer {
    /// Without a font, text commands are skipped.
    pub fn new(width: u32, height: u32, font: Option<FontArc>) -> Result<Self> {
        let Some(mut canvas) = Pixmap::new(width.max(1), height.max(1)) else {
            bail!("cannot allocate a {width}x{height} canvas");
        };
        let clear_color = [0, 0, 0, 255];
        canvas.fill(skia_color(clear_color));
        Ok(Self {
            width: canvas.width(),
            height: canvas.height(),
            clear_color,
            canvas,
            layer_buffers: Vec::new(),
            text_cache: font.map(TextCache::new),
            stage_clocks: ["clear", "draw", "copy", "total"]
                .into_iter()
                .map(|k| (k, FrameClock::with_capacity(600)))
                .collect(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let Some(canvas) = Pixmap::new(width.max(1), height.max(1)) else {
            bail!("cannot allocate a {width}x{height} canvas");
        };
        self.canvas = canvas;
        self.width = self.canvas.width();
        self.height = self.canvas.height();
        self.layer_buffers.clear();
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.text_cache.is_some()
    }

    /// Rasterises every interned word at the stimulus size; returns how many.
    pub fn prewarm_words(&mut self, size: f32, color: Color) -> usize {
        self.text_cache
            .as_mut()
            .map_or(0, |cache| cache.prewarm_words(size, color))
    }

    /// Timing statistics of a render stage ("clear", "draw", "copy" or "total").
    pub fn stage_stats(&self, stage: &str) -> Option<FrameStats> {
        self.stage_clocks.get(stage).map(Clock::frame_stats)
    }

    /// Composes `layers` and copies the result into `frame_buffer` (RGBA8,
    /// `width * height * 4` bytes).
    pub fn render_frame<C: Clock>(
        &mut self,
        layers: &[Layer],
        frame_buffer: &mut [u8],
        clock: &C,
    ) -> Result<RenderStats> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame_buffer.len() != expected {
            bail!(
                "frame buffer holds {} bytes, expected {expected}",
                frame_buffer.len()
            );
        }

        let t = clock.now();
        self.canvas.fill(skia_color(self.clear_color));
        let clear = clock.elapsed(t);

        let t = clock.now();
        self.compose(layers);
        let draw = clock.elapsed(t);

        // the canvas is opaque, so premultiplied and straight RGBA agree
        let t = clock.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = clock.elapsed(t);

        let total = clear + draw + copy;
        for (stage, d) in [("clear", clear), ("draw", draw), ("copy", copy), ("total", total)] {
            if let Some(c) = self.stage_clocks.get_mut(stage) {
                c.record_frame(d);
            }
        }

        Ok(RenderStats {
            clear,
            draw,
            copy,
            total,
            layers: layers.len(),
            commands: layers.iter().map(|l| l.scene.len()).sum(),
        })
    }

    fn layer_buffer(&mut self, slot: usize, width: u32, height: u32) -> Option<Pixmap> {
        while self.layer_buffers.len() <= slot {
            self.layer_buffers.push(Pixmap::new(1, 1)?);
        }
        let mut buffer = std::mem::replace(&mut self.layer_buffers[slot], Pixmap::new(1, 1)?);
        if buffer.width() != width || buffer.height() != height {
            buffer = Pixmap::new(width, height)?;
        } else {
            buffer.fill(tiny_skia::Color::TRANSPARENT);
        }
        Some(buffer)
    }

    fn draw_command(&mut self, command: &DrawCommand, target: &mut Pixmap) {
        match command {
            DrawCommand::Fill { rect, color } => {
                if let Some(r) = to_skia_rect(rect) {
                    target.fill_rect(r, &paint(*color), Transform::identity(), None);
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
                stroke,
            } => {
                let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) else {
                    return;
                };
                match stroke {
                    Some(width) => {
                        let stroke = Stroke {
                            width: *width,
                            ..Stroke::default()
                        };
                        target.stroke_path(&path, &paint(*color), &stroke, Transform::identity(), None);
                    }
                    None => target.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    ),
                }
            }
            DrawCommand::Crosshair {
                rect,
                thickness,
                color,
            } => {
                let mut p = paint(*color);
                p.anti_alias = false;
                let c = rect.center();
                let bars = [
                    Rect::new(rect.x, c.y - thickness * 0.5, rect.width, *thickness),
                    Rect::new(c.x - thickness * 0.5, rect.y, *thickness, rect.height),
                ];
                for bar in &bars {
                    if let Some(r) = to_skia_rect(bar) {
                        target.fill_rect(r, &p, Transform::identity(), None);
                    }
                }
            }
            DrawCommand::Text {
                content,
                position,
                size,
                color,
                opacity,
                anchor,
            } => {
                let Some(cache) = self.text_cache.as_mut() else {
                    return;
                };
                let Some(pm) = cache.get_or_render(content, *size, *color) else {
                    return;
                };
                let origin = match anchor {
                    TextAnchor::Center => Vec2::new(
                        position.x - pm.width() as f32 * 0.5,
                        position.y - pm.height() as f32 * 0.5,
                    ),
                    TextAnchor::TopLeft => *position,
                };
                blit_blend(&pm, target, origin, *opacity);
            }
        }
    }
}

impl Renderer for SkiaRenderer {
    fn draw_scene(&mut self, scene: &Scene, target: &mut Pixmap) {
        for command in scene.commands() {
            self.draw_command(command, target);
        }
    }

    /// Each layer is drawn into its own buffer, which clips it to its bounds,
    /// then placed on the canvas in order.
    fn compose(&mut self, layers: &[Layer]) {
        for (slot, layer) in layers.iter().enumerate() {
            let w = layer.bounds.width.round().max(1.0) as u32;
            let h = layer.bounds.height.round().max(1.0) as u32;
            let Some(mut buffer) = self.layer_buffer(slot, w, h) else {
                continue;
            };
            self.draw_scene(&layer.scene, &mut buffer);
            self.canvas.draw_pixmap(
                layer.bounds.x.round() as i32,
                layer.bounds.y.round() as i32,
                buffer.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
            self.layer_buffers[slot] = buffer;
        }
    }
}

fn to_skia_rect(r: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height)
}

/// Source-over blit of a premultiplied pixmap, scaled by `opacity`, clipped
/// to `dst`.
fn blit_blend(src: &Pixmap, dst: &mut Pixmap, origin: Vec2, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    let (w, h) = (src.width() as i32, src.height() as i32);
    let (cw, ch) = (dst.width() as i32, dst.height() as i32);
    let x = origin.x.round() as i32;
    let y = origin.y.round() as i32;

    // fully off-target
    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return;
    }

    let dst_x = x.max(0) as usize;
    let dst_y = y.max(0) as usize;
    let src_x = (-x).max(0) as usize;
    let src_y = (-y).max(0) as usize;
    let copy_w = (w as usize - src_x).min(cw as usize - dst_x);
    let copy_h = (h as usize - src_y).min(ch as usize - dst_y);

    let src_stride = w as usize;
    let dst_stride = cw as usize;
    let src_u32: &[u32] = cast_slice(src.data());
    let dst_u32: &mut [u32] = cast_slice_mut(dst.data_mut());
    let k = (opacity * 255.0).round() as u32;

    for row in 0..copy_h {
        let s_row = (src_y + row) * src_stride + src_x;
        let d_row = (dst_y + row) * dst_stride + dst_x;
        for i in 0..copy_w {
            let s = src_u32[s_row + i].to_le_bytes();
            if s[3] == 0 {
                continue;
            }
            let d = dst_u32[d_row + i].to_le_bytes();
            let scale = |c: u8| (c as u32 * k + 127) / 255;
            let sa = scale(s[3]);
            let inv = 255 - sa;
            let mut out = [0u8; 4];
            for c in 0..4 {
                out[c] = (scale(s[c]) + (d[c] as u32 * inv + 127) / 255).min(255) as u8;
            }
            dst_u32[d_row + i] = u32::from_le_bytes(out);
        }
    }
}
