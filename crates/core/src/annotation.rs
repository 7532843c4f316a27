//! Annotation data model
//!
//! All coordinates are stored in document space: the page's natural
//! dimensions at reference scale 1.0. Geometry is never rewritten for a
//! zoom change; renderers multiply by the current scale instead.

use uuid::Uuid;

/// Point in document space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocPoint {
    pub x: f32,
    pub y: f32,
}

impl DocPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DocPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalized RGBA components (0.0 to 1.0).
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
}

/// Tools that produce stroke annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StrokeTool {
    Pen,
    Highlighter,
}

/// The session's active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Pen,
    Highlighter,
    Text,
    Eraser,
}

impl Tool {
    pub fn stroke_tool(self) -> Option<StrokeTool> {
        match self {
            Tool::Pen => Some(StrokeTool::Pen),
            Tool::Highlighter => Some(StrokeTool::Highlighter),
            Tool::Text | Tool::Eraser => None,
        }
    }
}

/// One continuous drawing gesture.
///
/// Points are appended monotonically while the gesture is active and
/// never reordered; the stroke is immutable after pointer-up. Width is
/// document space, so the drawn line thickens with zoom.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeAnnotation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub tool: StrokeTool,
    pub width: f32,
    pub color: Color,
    pub points: Vec<DocPoint>,
}

impl StrokeAnnotation {
    pub fn begin(tool: StrokeTool, width: f32, color: Color, start: DocPoint) -> Self {
        Self { id: Uuid::new_v4(), tool, width, color, points: vec![start] }
    }
}

/// Font settings supplied by the embedding UI when text is confirmed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font size in document-space units.
    pub font_size: f32,
    pub font_family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { font_size: 16.0, font_family: "Arial".to_owned() }
    }
}

/// A placed text annotation.
///
/// Position is the only mutable field (drag updates it by display
/// delta divided by scale); deletion happens only via page-wide clear.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextAnnotation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    pub position: DocPoint,
    pub font_size: f32,
    pub font_family: String,
    pub color: Color,
}

impl TextAnnotation {
    pub fn new(text: String, position: DocPoint, style: TextStyle, color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            position,
            font_size: style.font_size,
            font_family: style.font_family,
            color,
        }
    }
}

/// A page's natural dimensions at reference scale 1.0.
///
/// Captured once when the document loads and never mutated; the
/// denominator for every fit calculation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_point_distance() {
        let a = DocPoint::new(0.0, 0.0);
        let b = DocPoint::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 0.001);
    }

    #[test]
    fn color_normalization() {
        let (r, g, b, a) = Color::rgb(255, 128, 0).to_normalized();
        assert!((r - 1.0).abs() < 0.001);
        assert!((g - 0.502).abs() < 0.01);
        assert!((b - 0.0).abs() < 0.001);
        assert!((a - 1.0).abs() < 0.001);
    }

    #[test]
    fn stroke_begins_with_a_single_point() {
        let stroke = StrokeAnnotation::begin(
            StrokeTool::Pen,
            2.0,
            Color::BLACK,
            DocPoint::new(10.0, 20.0),
        );
        assert_eq!(stroke.points.len(), 1);
        assert_eq!(stroke.points[0], DocPoint::new(10.0, 20.0));
    }

    #[test]
    fn only_drawing_tools_map_to_stroke_tools() {
        assert_eq!(Tool::Pen.stroke_tool(), Some(StrokeTool::Pen));
        assert_eq!(Tool::Highlighter.stroke_tool(), Some(StrokeTool::Highlighter));
        assert_eq!(Tool::Text.stroke_tool(), None);
        assert_eq!(Tool::Eraser.stroke_tool(), None);
    }
}
