//! Export pipeline
//!
//! Re-renders every page at a target DPI, composites the annotation
//! store at that resolution, and feeds finished raster pages to the
//! output assembler. Export resolution is fully decoupled from the view
//! scale; the store is read-only for the duration.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use markpdf_engine::{
    AssembleError, DocumentHandle, OutputAssembler, PageRasterizer, RasterError,
};

use crate::overlay::OverlayRenderer;
use crate::store::AnnotationStore;

/// Default export resolution.
pub const DEFAULT_DPI: u32 = 150;

/// Reference DPI of document-space points (1/72 inch).
pub const REFERENCE_DPI: f32 = 72.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportSettings {
    pub dpi: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl ExportSettings {
    /// Scale factor applied to document-space geometry for export.
    pub fn resolution_factor(&self) -> f32 {
        self.dpi as f32 / REFERENCE_DPI
    }
}

/// Exported filename: `annotated-<timestamp>.pdf` with ':' and '.'
/// replaced by '-' to stay filesystem-safe.
pub fn export_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("annotated-{stamp}.pdf")
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("page render failed: {0}")]
    Raster(#[from] RasterError),
    #[error("output assembly failed: {0}")]
    Assemble(#[from] AssembleError),
    #[error("document has no pages")]
    EmptyDocument,
}

/// Receives progress signals from a running export.
///
/// `finished` fires unconditionally, success or failure, so a loading
/// indicator driven by `started`/`finished` can never get stuck.
pub trait StatusSink {
    fn export_started(&mut self) {}
    fn export_finished(&mut self);
    fn export_failed(&mut self, message: &str);
}

/// No-op sink for headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentStatus;

impl StatusSink for SilentStatus {
    fn export_finished(&mut self) {}
    fn export_failed(&mut self, _message: &str) {}
}

pub struct ExportPipeline<'a> {
    renderer: &'a OverlayRenderer,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(renderer: &'a OverlayRenderer) -> Self {
        Self { renderer }
    }

    /// Run one export pass over every page in document order.
    ///
    /// Pages are processed strictly sequentially; at most one
    /// high-resolution raster is alive at a time. Any failure aborts the
    /// whole export and surfaces a single alert through the sink, but
    /// the annotation store and the open document are left intact.
    pub fn run(
        &self,
        rasterizer: &dyn PageRasterizer,
        handle: DocumentHandle,
        store: &AnnotationStore,
        assembler: &mut dyn OutputAssembler,
        settings: &ExportSettings,
        output: &Path,
        sink: &mut dyn StatusSink,
    ) -> Result<(), ExportError> {
        sink.export_started();
        let result = self.run_inner(rasterizer, handle, store, assembler, settings, output);
        sink.export_finished();

        if let Err(err) = &result {
            log::error!("export failed: {err}");
            sink.export_failed(&err.to_string());
        }
        result
    }

    fn run_inner(
        &self,
        rasterizer: &dyn PageRasterizer,
        handle: DocumentHandle,
        store: &AnnotationStore,
        assembler: &mut dyn OutputAssembler,
        settings: &ExportSettings,
        output: &Path,
    ) -> Result<(), ExportError> {
        let factor = settings.resolution_factor();
        let page_count = rasterizer.page_count(handle)?;
        if page_count == 0 {
            return Err(ExportError::EmptyDocument);
        }

        log::info!("exporting {page_count} pages at {} dpi", settings.dpi);

        for page in 1..=page_count {
            let size = rasterizer.page_size(handle, page)?;
            let mut raster = rasterizer.render_page(handle, page, factor)?;

            self.renderer.composite(&mut raster, store, page, factor);

            if page == 1 {
                assembler.new_document(size.width_pt, size.height_pt)?;
            } else {
                assembler.append_page(size.width_pt, size.height_pt)?;
            }
            assembler.add_raster_to_current_page(&raster)?;
        }

        assembler.save(output)?;
        Ok(())
    }
}
