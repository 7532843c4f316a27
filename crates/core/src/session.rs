//! Document session
//!
//! Owns all per-document state: the open rasterizer handle, the
//! annotation store, the scale model, the active tool, and the capture
//! state machine. A session is constructed on document load and replaced
//! wholesale on the next load; there are no ambient globals.

use std::path::Path;
use std::time::{Duration, Instant};

use markpdf_engine::{
    DocumentHandle, OpenSource, OutputAssembler, PageRasterizer, RasterError, RgbaImage,
};

use crate::annotation::{Color, DocPoint, PageDimensions, TextAnnotation, TextStyle, Tool};
use crate::capture::{CaptureResponse, StrokeCapture};
use crate::debounce::Debouncer;
use crate::export::{ExportError, ExportPipeline, ExportSettings, StatusSink};
use crate::overlay::OverlayRenderer;
use crate::scale::{FitOutcome, ScaleModel};
use crate::store::AnnotationStore;
use crate::text_extract::reconstruct_layout;

/// Delay before a resize-triggered refit runs.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Retry delay when fit-to-width finds an unmeasured container.
pub const FIT_RETRY_DELAY: Duration = Duration::from_millis(100);

const DEFAULT_PEN_SIZE: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("text annotation is empty")]
    EmptyText,
    #[error("no text placement is pending")]
    NoPendingText,
}

pub struct DocumentSession {
    rasterizer: Box<dyn PageRasterizer>,
    handle: DocumentHandle,
    page_dims: Vec<PageDimensions>,
    current_page: u16,
    store: AnnotationStore,
    scale: ScaleModel,
    tool: Tool,
    pen_size: f32,
    color: Color,
    capture: StrokeCapture,
    pending_text: Option<DocPoint>,
    renderer: OverlayRenderer,
    refit: Debouncer<()>,
}

impl DocumentSession {
    /// Open a document and build a fresh session around it.
    ///
    /// Page dimensions are captured here, once, and never mutated; they
    /// are the denominator for every fit calculation.
    pub fn open(
        mut rasterizer: Box<dyn PageRasterizer>,
        source: impl Into<OpenSource>,
    ) -> Result<Self, SessionError> {
        let handle = rasterizer.open(source.into())?;
        let page_count = rasterizer.page_count(handle)?;

        let mut page_dims = Vec::with_capacity(usize::from(page_count));
        for page in 1..=page_count {
            let size = rasterizer.page_size(handle, page)?;
            page_dims.push(PageDimensions { width: size.width_pt, height: size.height_pt });
        }

        log::info!("session opened ({page_count} pages)");

        Ok(Self {
            rasterizer,
            handle,
            page_dims,
            current_page: 1,
            store: AnnotationStore::new(),
            scale: ScaleModel::new(),
            tool: Tool::Pen,
            pen_size: DEFAULT_PEN_SIZE,
            color: Color::BLACK,
            capture: StrokeCapture::new(),
            pending_text: None,
            renderer: OverlayRenderer::new(),
            refit: Debouncer::new(),
        })
    }

    pub fn page_count(&self) -> u16 {
        self.page_dims.len() as u16
    }

    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    pub fn page_dimensions(&self) -> PageDimensions {
        self.page_dims[usize::from(self.current_page) - 1]
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.pending_text = None;
    }

    pub fn pen_size(&self) -> f32 {
        self.pen_size
    }

    pub fn set_pen_size(&mut self, size: f32) {
        self.pen_size = size.max(0.1);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn scale(&mut self) -> f32 {
        self.scale.sanitized()
    }

    pub fn zoom_percent(&self) -> u16 {
        self.scale.zoom_percent()
    }

    pub fn next_page(&mut self) -> u16 {
        if self.current_page < self.page_count() {
            self.current_page += 1;
            self.capture.pointer_up();
        }
        self.current_page
    }

    pub fn prev_page(&mut self) -> u16 {
        if self.current_page > 1 {
            self.current_page -= 1;
            self.capture.pointer_up();
        }
        self.current_page
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.scale.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.scale.zoom_out()
    }

    /// Fit the current page to the container width.
    ///
    /// An unmeasured container schedules a retry instead of failing; the
    /// embedder drives it through [`DocumentSession::poll`] with a fresh
    /// measurement.
    pub fn fit_to_width(&mut self, container_width: f32) -> FitOutcome {
        let outcome = self.scale.fit_to_width(container_width, self.page_dimensions().width);
        if outcome == FitOutcome::NotMeasurable {
            self.refit.schedule(FIT_RETRY_DELAY, ());
        }
        outcome
    }

    /// Container resize notification; refits after a debounce delay when
    /// fit-width mode is active.
    pub fn on_resize(&mut self) {
        if self.scale.is_fit_width() {
            self.refit.schedule(RESIZE_DEBOUNCE, ());
        }
    }

    /// Run any due deferred refit against a fresh container measurement.
    pub fn poll(&mut self, now: Instant, container_width: f32) -> Option<FitOutcome> {
        self.refit.fire_due(now)?;
        Some(self.fit_to_width(container_width))
    }

    pub fn pointer_down(&mut self, display_x: f32, display_y: f32) -> CaptureResponse {
        let scale = self.scale.sanitized();
        let response = self.capture.pointer_down(
            &mut self.store,
            self.current_page,
            self.tool,
            display_x,
            display_y,
            scale,
            self.pen_size,
            self.color,
        );

        if let CaptureResponse::TextPlacement(position) = response {
            self.pending_text = Some(position);
        }
        response
    }

    pub fn pointer_move(&mut self, display_x: f32, display_y: f32) -> CaptureResponse {
        let scale = self.scale.sanitized();
        self.capture.pointer_move(&mut self.store, display_x, display_y, scale, self.pen_size)
    }

    pub fn pointer_up(&mut self) {
        self.capture.pointer_up();
    }

    pub fn pending_text_position(&self) -> Option<DocPoint> {
        self.pending_text
    }

    /// Confirm the pending text entry. Empty or whitespace-only text is
    /// rejected before any state changes.
    pub fn confirm_text(
        &mut self,
        text: &str,
        style: TextStyle,
    ) -> Result<uuid::Uuid, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }
        let position = self.pending_text.ok_or(SessionError::NoPendingText)?;

        let annotation = TextAnnotation::new(text.to_owned(), position, style, self.color);
        let id = self.store.push_text(self.current_page, annotation);
        self.pending_text = None;
        Ok(id)
    }

    pub fn cancel_text(&mut self) {
        self.pending_text = None;
    }

    /// Drag a text annotation by a display-space delta; the stored
    /// position moves by exactly (dx / scale, dy / scale).
    pub fn drag_text(&mut self, id: uuid::Uuid, display_dx: f32, display_dy: f32) -> bool {
        let scale = self.scale.sanitized();
        self.store.translate_text(self.current_page, id, display_dx / scale, display_dy / scale)
    }

    pub fn clear_current_page(&mut self) {
        self.capture.pointer_up();
        self.store.clear_page(self.current_page);
    }

    /// Base page raster for the current page at the current scale.
    pub fn render_page(&mut self) -> Result<RgbaImage, SessionError> {
        let scale = self.scale.sanitized();
        Ok(self.rasterizer.render_page(self.handle, self.current_page, scale)?)
    }

    /// Transparent annotation overlay for the current page, rebuilt from
    /// the store on every call.
    pub fn render_overlay(&mut self) -> RgbaImage {
        let scale = self.scale.sanitized();
        let dims = self.page_dimensions();
        self.renderer.render(&self.store, self.current_page, scale, dims)
    }

    /// Reconstructed text of the current page.
    pub fn extract_text(&self) -> Result<String, SessionError> {
        let fragments = self.rasterizer.text_fragments(self.handle, self.current_page)?;
        Ok(reconstruct_layout(&fragments))
    }

    /// Export every page with its annotations at the requested DPI.
    pub fn export(
        &self,
        assembler: &mut dyn OutputAssembler,
        settings: &ExportSettings,
        output: &Path,
        sink: &mut dyn StatusSink,
    ) -> Result<(), SessionError> {
        let pipeline = ExportPipeline::new(&self.renderer);
        pipeline
            .run(self.rasterizer.as_ref(), self.handle, &self.store, assembler, settings, output, sink)?;
        Ok(())
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        if let Err(err) = self.rasterizer.close(self.handle) {
            log::debug!("close on drop failed: {err}");
        }
    }
}
