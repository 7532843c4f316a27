//! Overlay rendering
//!
//! Redraws every annotation for a page from the store at a given scale.
//! The surface is fully cleared (or freshly allocated) each invocation;
//! nothing is painted incrementally, so there are no accumulation
//! artifacts. The same compositing routines serve the live view (scale =
//! current zoom, transparent surface) and the export pipeline (scale =
//! resolution factor, surface = the page raster).
//!
//! Coordinates are document space with the raster origin (top left,
//! y down); draw-time geometry is document value times scale.

use image::Rgba;
use markpdf_engine::RgbaImage;

use crate::annotation::{Color, PageDimensions, StrokeAnnotation, StrokeTool, TextAnnotation};
use crate::store::AnnotationStore;

/// Highlighter strokes always composite at this opacity, regardless of
/// the alpha carried by the chosen color.
pub const HIGHLIGHTER_OPACITY: f32 = 0.3;

/// Generic text-draw primitive.
///
/// The export path reuses whatever primitive the embedder supplies;
/// vector-accurate fonts are explicitly out of scope, so the default is
/// a glyph-cell placeholder in the same spirit as the engine's
/// placeholder page raster.
pub trait TextDraw {
    /// Draw `text` with its baseline at (`x`, `baseline_y`) in pixels.
    fn draw_text(
        &self,
        target: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline_y: f32,
        font_px: f32,
        color: Color,
    );
}

/// Default text primitive: one filled cell per non-whitespace glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockTextDraw;

impl TextDraw for BlockTextDraw {
    fn draw_text(
        &self,
        target: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline_y: f32,
        font_px: f32,
        color: Color,
    ) {
        let advance = font_px * 0.55;
        let glyph_height = font_px * 0.70;
        let glyph_width = advance * 0.85;
        let opacity = color.a as f32 / 255.0;

        let mut cursor = x;
        for ch in text.chars() {
            if !ch.is_whitespace() {
                fill_rect(
                    target,
                    cursor,
                    baseline_y - glyph_height,
                    glyph_width,
                    glyph_height,
                    color,
                    opacity,
                );
            }
            cursor += advance;
        }
    }
}

pub struct OverlayRenderer {
    text_draw: Box<dyn TextDraw>,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self { text_draw: Box::new(BlockTextDraw) }
    }

    pub fn with_text_draw(text_draw: Box<dyn TextDraw>) -> Self {
        Self { text_draw }
    }

    /// Render the transparent overlay for a page at the given scale.
    pub fn render(
        &self,
        store: &AnnotationStore,
        page: u16,
        scale: f32,
        dims: PageDimensions,
    ) -> RgbaImage {
        let width = (dims.width * scale).round().max(1.0) as u32;
        let height = (dims.height * scale).round().max(1.0) as u32;
        let mut surface = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        self.composite(&mut surface, store, page, scale);
        surface
    }

    /// Composite a page's annotations onto an existing surface.
    ///
    /// Stroke pass first in store order (later strokes paint over
    /// earlier ones), then the text pass.
    pub fn composite(&self, target: &mut RgbaImage, store: &AnnotationStore, page: u16, scale: f32) {
        for stroke in store.strokes(page) {
            draw_stroke(target, stroke, scale);
        }
        for text in store.texts(page) {
            self.draw_text_annotation(target, text, scale);
        }
    }

    fn draw_text_annotation(&self, target: &mut RgbaImage, text: &TextAnnotation, scale: f32) {
        self.text_draw.draw_text(
            target,
            &text.text,
            text.position.x * scale,
            text.position.y * scale,
            text.font_size * scale,
            text.color,
        );
    }
}

/// Rasterize one stroke as a round-capped polyline.
///
/// Coverage is accumulated into a per-stroke mask and composited once,
/// so a stroke overlapping itself keeps a single uniform opacity (the
/// single-path semantics the capture model assumes). Highlighter opacity
/// is pinned to [`HIGHLIGHTER_OPACITY`].
fn draw_stroke(target: &mut RgbaImage, stroke: &StrokeAnnotation, scale: f32) {
    if stroke.points.is_empty() {
        return;
    }

    let line_width = (stroke.width * scale).max(1.0);
    let radius = line_width / 2.0;
    let opacity = match stroke.tool {
        StrokeTool::Highlighter => HIGHLIGHTER_OPACITY,
        StrokeTool::Pen => stroke.color.a as f32 / 255.0,
    };

    let (width, height) = target.dimensions();
    let mut mask = vec![false; (width as usize) * (height as usize)];

    let scaled: Vec<(f32, f32)> =
        stroke.points.iter().map(|p| (p.x * scale, p.y * scale)).collect();

    stamp_disc(&mut mask, width, height, scaled[0], radius);
    for pair in scaled.windows(2) {
        stamp_segment(&mut mask, width, height, pair[0], pair[1], radius);
    }

    for y in 0..height {
        for x in 0..width {
            if mask[(y as usize) * (width as usize) + (x as usize)] {
                blend_pixel(target.get_pixel_mut(x, y), stroke.color, opacity);
            }
        }
    }
}

fn stamp_segment(mask: &mut [bool], width: u32, height: u32, a: (f32, f32), b: (f32, f32), radius: f32) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let length = (dx * dx + dy * dy).sqrt();
    let step = (radius * 0.5).max(0.5);
    let steps = (length / step).ceil().max(1.0) as u32;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(mask, width, height, (a.0 + dx * t, a.1 + dy * t), radius);
    }
}

fn stamp_disc(mask: &mut [bool], width: u32, height: u32, center: (f32, f32), radius: f32) {
    let r = radius.max(0.5);
    let min_x = (center.0 - r).floor().max(0.0) as u32;
    let max_x = ((center.0 + r).ceil() as i64).clamp(0, width as i64 - 1) as u32;
    let min_y = (center.1 - r).floor().max(0.0) as u32;
    let max_y = ((center.1 + r).ceil() as i64).clamp(0, height as i64 - 1) as u32;

    if center.0 + r < 0.0 || center.1 + r < 0.0 {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - center.0;
            let dy = y as f32 + 0.5 - center.1;
            if dx * dx + dy * dy <= r * r {
                mask[(y as usize) * (width as usize) + (x as usize)] = true;
            }
        }
    }
}

fn fill_rect(
    target: &mut RgbaImage,
    x: f32,
    y: f32,
    rect_width: f32,
    rect_height: f32,
    color: Color,
    opacity: f32,
) {
    let (width, height) = target.dimensions();
    let min_x = x.floor().max(0.0) as u32;
    let min_y = y.floor().max(0.0) as u32;
    let max_x = ((x + rect_width).ceil() as i64).clamp(0, width as i64) as u32;
    let max_y = ((y + rect_height).ceil() as i64).clamp(0, height as i64) as u32;

    for py in min_y..max_y {
        for px in min_x..max_x {
            blend_pixel(target.get_pixel_mut(px, py), color, opacity);
        }
    }
}

/// Source-over blend of a straight-alpha color at the given opacity.
fn blend_pixel(pixel: &mut Rgba<u8>, color: Color, opacity: f32) {
    let sa = opacity.clamp(0.0, 1.0);
    let da = pixel[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }

    let src = [color.r as f32, color.g as f32, color.b as f32];
    for channel in 0..3 {
        let dst = pixel[channel] as f32;
        let out = (src[channel] * sa + dst * da * (1.0 - sa)) / out_a;
        pixel[channel] = out.round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_a * 255.0).round() as u8;
}
