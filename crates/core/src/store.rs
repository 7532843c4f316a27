//! Per-page annotation collections
//!
//! Maps 1-based page indices to that page's stroke and text
//! annotations, both held in document space. Keys are created lazily on
//! the first annotation for a page; an absent key is an empty page. The
//! store lives as long as the loaded document and is replaced wholesale
//! when a new document loads.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::annotation::{DocPoint, StrokeAnnotation, TextAnnotation};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageAnnotations {
    #[serde(default)]
    pub strokes: Vec<StrokeAnnotation>,
    #[serde(default)]
    pub texts: Vec<TextAnnotation>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    pages: BTreeMap<u16, PageAnnotations>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strokes for a page in insertion order (z-order for rendering).
    pub fn strokes(&self, page: u16) -> &[StrokeAnnotation] {
        self.pages.get(&page).map(|p| p.strokes.as_slice()).unwrap_or(&[])
    }

    pub fn texts(&self, page: u16) -> &[TextAnnotation] {
        self.pages.get(&page).map(|p| p.texts.as_slice()).unwrap_or(&[])
    }

    /// Add a stroke and return its id for the in-progress gesture.
    pub fn push_stroke(&mut self, page: u16, stroke: StrokeAnnotation) -> Uuid {
        let id = stroke.id;
        self.pages.entry(page).or_default().strokes.push(stroke);
        id
    }

    /// Mutable access to a stroke while its gesture is active.
    pub fn stroke_mut(&mut self, page: u16, id: Uuid) -> Option<&mut StrokeAnnotation> {
        self.pages.get_mut(&page)?.strokes.iter_mut().find(|stroke| stroke.id == id)
    }

    pub fn push_text(&mut self, page: u16, text: TextAnnotation) -> Uuid {
        let id = text.id;
        self.pages.entry(page).or_default().texts.push(text);
        id
    }

    /// Move a text annotation by a document-space delta.
    pub fn translate_text(&mut self, page: u16, id: Uuid, dx: f32, dy: f32) -> bool {
        let Some(text) = self
            .pages
            .get_mut(&page)
            .and_then(|p| p.texts.iter_mut().find(|text| text.id == id))
        else {
            return false;
        };
        text.position = DocPoint::new(text.position.x + dx, text.position.y + dy);
        true
    }

    /// Keep only the strokes on `page` matching the predicate.
    pub fn retain_strokes(&mut self, page: u16, predicate: impl FnMut(&StrokeAnnotation) -> bool) {
        if let Some(annotations) = self.pages.get_mut(&page) {
            annotations.strokes.retain(predicate);
        }
    }

    /// Clear both collections for one page; other pages are untouched.
    pub fn clear_page(&mut self, page: u16) {
        self.pages.remove(&page);
    }

    pub fn stroke_count(&self, page: u16) -> usize {
        self.strokes(page).len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(|p| p.strokes.is_empty() && p.texts.is_empty())
    }
}
