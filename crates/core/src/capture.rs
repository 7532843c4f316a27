//! Pointer gesture capture and the eraser query
//!
//! One state machine per pointer gesture: Idle -> Capturing -> Idle.
//! The in-progress stroke is addressed through an explicit (page, id)
//! reference held for the duration of the gesture, cleared on
//! pointer-up.

use uuid::Uuid;

use crate::annotation::{Color, DocPoint, StrokeAnnotation, StrokeTool, Tool};
use crate::scale::display_to_document;
use crate::store::AnnotationStore;

/// What the embedder should do after forwarding a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureResponse {
    /// Nothing changed.
    Ignored,
    /// The store changed; redraw the overlay.
    Redraw,
    /// Text tool: ask the UI to open text entry at this document-space
    /// position. No capture state was entered.
    TextPlacement(DocPoint),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drawing { page: u16, stroke: Uuid },
    Erasing { page: u16 },
}

#[derive(Debug, Clone, Copy)]
pub struct StrokeCapture {
    gesture: Gesture,
}

impl Default for StrokeCapture {
    fn default() -> Self {
        Self { gesture: Gesture::Idle }
    }
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_capturing(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Pointer-down on the drawing surface.
    ///
    /// `display_x`/`display_y` are surface-local display coordinates;
    /// `pen_width` is the configured document-space pen size.
    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        store: &mut AnnotationStore,
        page: u16,
        tool: Tool,
        display_x: f32,
        display_y: f32,
        scale: f32,
        pen_width: f32,
        color: Color,
    ) -> CaptureResponse {
        let point = DocPoint::new(
            display_to_document(display_x, scale),
            display_to_document(display_y, scale),
        );

        match tool {
            Tool::Text => CaptureResponse::TextPlacement(point),
            Tool::Eraser => {
                self.gesture = Gesture::Erasing { page };
                let removed = erase_strokes(store, page, point, pen_width / scale);
                if removed > 0 { CaptureResponse::Redraw } else { CaptureResponse::Ignored }
            }
            Tool::Pen => self.begin_stroke(store, page, StrokeTool::Pen, pen_width, color, point),
            Tool::Highlighter => {
                self.begin_stroke(store, page, StrokeTool::Highlighter, pen_width, color, point)
            }
        }
    }

    fn begin_stroke(
        &mut self,
        store: &mut AnnotationStore,
        page: u16,
        tool: StrokeTool,
        pen_width: f32,
        color: Color,
        point: DocPoint,
    ) -> CaptureResponse {
        let stroke = StrokeAnnotation::begin(tool, pen_width, color, point);
        let id = store.push_stroke(page, stroke);
        self.gesture = Gesture::Drawing { page, stroke: id };
        CaptureResponse::Redraw
    }

    /// Pointer-move while a gesture may be active.
    pub fn pointer_move(
        &mut self,
        store: &mut AnnotationStore,
        display_x: f32,
        display_y: f32,
        scale: f32,
        pen_width: f32,
    ) -> CaptureResponse {
        let point = DocPoint::new(
            display_to_document(display_x, scale),
            display_to_document(display_y, scale),
        );

        match self.gesture {
            Gesture::Idle => CaptureResponse::Ignored,
            Gesture::Erasing { page } => {
                // Continuous erasing along the drag path.
                let removed = erase_strokes(store, page, point, pen_width / scale);
                if removed > 0 { CaptureResponse::Redraw } else { CaptureResponse::Ignored }
            }
            Gesture::Drawing { page, stroke } => match store.stroke_mut(page, stroke) {
                Some(active) => {
                    active.points.push(point);
                    CaptureResponse::Redraw
                }
                // The gesture stroke was erased or cleared out from under
                // us; drop the gesture rather than resurrect it.
                None => {
                    self.gesture = Gesture::Idle;
                    CaptureResponse::Ignored
                }
            },
        }
    }

    /// Pointer-up anywhere, including outside the drawing surface.
    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

/// Remove every stroke on `page` with any point strictly within `radius`
/// of `center` (both document space). Whole-stroke removal: one erase
/// touch deletes the entire gesture it intersects. Returns the number of
/// strokes removed; no-op on an empty page.
pub fn erase_strokes(
    store: &mut AnnotationStore,
    page: u16,
    center: DocPoint,
    radius: f32,
) -> usize {
    let before = store.stroke_count(page);
    store.retain_strokes(page, |stroke| {
        !stroke.points.iter().any(|point| point.distance_to(&center) < radius)
    });
    before - store.stroke_count(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::StrokeTool;

    fn capture_line(
        capture: &mut StrokeCapture,
        store: &mut AnnotationStore,
        page: u16,
        scale: f32,
        points: &[(f32, f32)],
    ) {
        let (x0, y0) = points[0];
        capture.pointer_down(store, page, Tool::Pen, x0, y0, scale, 2.0, Color::BLACK);
        for &(x, y) in &points[1..] {
            capture.pointer_move(store, x, y, scale, 2.0);
        }
        capture.pointer_up();
    }

    #[test]
    fn captured_points_are_stored_in_document_space() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        capture_line(&mut capture, &mut store, 1, 2.0, &[(100.0, 50.0), (110.0, 60.0)]);

        let stroke = &store.strokes(1)[0];
        assert_eq!(stroke.points[0], DocPoint::new(50.0, 25.0));
        assert_eq!(stroke.points[1], DocPoint::new(55.0, 30.0));
    }

    #[test]
    fn move_without_down_is_ignored() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        let response = capture.pointer_move(&mut store, 10.0, 10.0, 1.0, 2.0);
        assert_eq!(response, CaptureResponse::Ignored);
        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn pointer_up_ends_the_gesture() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        capture.pointer_down(&mut store, 1, Tool::Pen, 0.0, 0.0, 1.0, 2.0, Color::BLACK);
        capture.pointer_up();
        capture.pointer_move(&mut store, 10.0, 10.0, 1.0, 2.0);

        assert_eq!(store.strokes(1)[0].points.len(), 1);
    }

    #[test]
    fn highlighter_gestures_record_the_highlighter_tool() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        capture.pointer_down(&mut store, 1, Tool::Highlighter, 5.0, 5.0, 1.0, 4.0, Color::YELLOW);

        assert_eq!(store.strokes(1)[0].tool, StrokeTool::Highlighter);
    }

    #[test]
    fn text_tool_requests_placement_without_capturing() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        let response =
            capture.pointer_down(&mut store, 1, Tool::Text, 80.0, 40.0, 2.0, 2.0, Color::BLACK);

        assert_eq!(response, CaptureResponse::TextPlacement(DocPoint::new(40.0, 20.0)));
        assert!(!capture.is_capturing());
        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn eraser_removes_whole_strokes_within_radius() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        capture_line(&mut capture, &mut store, 1, 1.0, &[(0.0, 0.0), (100.0, 0.0)]);
        capture_line(&mut capture, &mut store, 1, 1.0, &[(0.0, 500.0), (100.0, 500.0)]);

        // Erase near the end of the first stroke; the whole stroke goes.
        let response =
            capture.pointer_down(&mut store, 1, Tool::Eraser, 99.0, 1.0, 1.0, 5.0, Color::BLACK);
        capture.pointer_up();

        assert_eq!(response, CaptureResponse::Redraw);
        assert_eq!(store.strokes(1).len(), 1);
        assert_eq!(store.strokes(1)[0].points[0].y, 500.0);
    }

    #[test]
    fn eraser_drag_erases_continuously() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        capture_line(&mut capture, &mut store, 1, 1.0, &[(0.0, 0.0), (0.0, 1.0)]);
        capture_line(&mut capture, &mut store, 1, 1.0, &[(200.0, 0.0), (200.0, 1.0)]);

        capture.pointer_down(&mut store, 1, Tool::Eraser, 0.0, 0.0, 1.0, 5.0, Color::BLACK);
        capture.pointer_move(&mut store, 200.0, 0.0, 1.0, 5.0);
        capture.pointer_up();

        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn eraser_radius_is_display_constant_across_zoom() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();

        // Stroke 3 document units from the erase point.
        capture_line(&mut capture, &mut store, 1, 1.0, &[(3.0, 0.0), (3.0, 1.0)]);

        // Pen size 5 at scale 2.0 means a 2.5 document-unit radius: miss.
        capture.pointer_down(&mut store, 1, Tool::Eraser, 0.0, 0.0, 2.0, 5.0, Color::BLACK);
        capture.pointer_up();
        assert_eq!(store.strokes(1).len(), 1);

        // Same pen size at scale 1.0 means a 5 unit radius: hit.
        capture.pointer_down(&mut store, 1, Tool::Eraser, 0.0, 0.0, 1.0, 5.0, Color::BLACK);
        capture.pointer_up();
        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn erase_is_idempotent_on_an_empty_page() {
        let mut store = AnnotationStore::new();
        assert_eq!(erase_strokes(&mut store, 1, DocPoint::new(0.0, 0.0), 10.0), 0);
        assert_eq!(erase_strokes(&mut store, 1, DocPoint::new(0.0, 0.0), 10.0), 0);
    }

    #[test]
    fn strokes_outside_the_radius_are_unchanged() {
        let mut capture = StrokeCapture::new();
        let mut store = AnnotationStore::new();
        capture_line(&mut capture, &mut store, 1, 1.0, &[(50.0, 50.0), (60.0, 60.0)]);

        let removed = erase_strokes(&mut store, 1, DocPoint::new(0.0, 0.0), 10.0);
        assert_eq!(removed, 0);
        assert_eq!(store.strokes(1).len(), 1);
    }
}
