//! Export pipeline behavior against real and scripted collaborators.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};
use markpdf_core::annotation::{Color, DocPoint, StrokeAnnotation, StrokeTool};
use markpdf_core::export::{ExportError, ExportPipeline, ExportSettings, StatusSink};
use markpdf_core::overlay::OverlayRenderer;
use markpdf_core::store::AnnotationStore;
use markpdf_engine::{
    AssembleError, DocumentHandle, LopdfAssembler, LopdfRasterizer, OutputAssembler,
    PageRasterizer, PageSize, RasterError, RgbaImage, TextFragment,
};

/// Tiny valid PDF with empty US Letter pages.
fn minimal_pdf_bytes(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(page_count);

    for _ in 0..page_count {
        let content = Content { operations: vec![] };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("empty content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("in-memory save succeeds");
    bytes
}

/// Assembler double that keeps the rasters it is handed.
#[derive(Default)]
struct RecordingAssembler {
    pages: Vec<(f32, f32)>,
    rasters: Vec<RgbaImage>,
    saved: bool,
}

impl OutputAssembler for RecordingAssembler {
    fn new_document(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError> {
        self.pages.push((page_width, page_height));
        Ok(())
    }

    fn append_page(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError> {
        self.pages.push((page_width, page_height));
        Ok(())
    }

    fn add_raster_to_current_page(&mut self, raster: &RgbaImage) -> Result<(), AssembleError> {
        self.rasters.push(raster.clone());
        Ok(())
    }

    fn save(&mut self, _path: &Path) -> Result<(), AssembleError> {
        self.saved = true;
        Ok(())
    }
}

#[derive(Default)]
struct CountingStatus {
    started: usize,
    finished: usize,
    alerts: Vec<String>,
}

impl StatusSink for CountingStatus {
    fn export_started(&mut self) {
        self.started += 1;
    }

    fn export_finished(&mut self) {
        self.finished += 1;
    }

    fn export_failed(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }
}

/// Rasterizer that fails when asked to render a configured page.
struct FailingRasterizer {
    inner: LopdfRasterizer,
    fail_on_page: u16,
}

impl PageRasterizer for FailingRasterizer {
    fn open(&mut self, source: markpdf_engine::OpenSource) -> Result<DocumentHandle, RasterError> {
        self.inner.open(source)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u16, RasterError> {
        self.inner.page_count(handle)
    }

    fn page_size(&self, handle: DocumentHandle, page: u16) -> Result<PageSize, RasterError> {
        self.inner.page_size(handle, page)
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        page: u16,
        scale: f32,
    ) -> Result<RgbaImage, RasterError> {
        if page == self.fail_on_page {
            return Err(RasterError::Backend("scripted render failure".to_owned()));
        }
        self.inner.render_page(handle, page, scale)
    }

    fn text_fragments(
        &self,
        handle: DocumentHandle,
        page: u16,
    ) -> Result<Vec<TextFragment>, RasterError> {
        self.inner.text_fragments(handle, page)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), RasterError> {
        self.inner.close(handle)
    }
}

fn annotated_store() -> AnnotationStore {
    let mut store = AnnotationStore::new();
    let mut stroke = StrokeAnnotation::begin(
        StrokeTool::Pen,
        4.0,
        Color::BLACK,
        DocPoint::new(100.0, 100.0),
    );
    stroke.points.push(DocPoint::new(200.0, 100.0));
    store.push_stroke(1, stroke);
    store
}

/// Centroid of dark pixels, as a fraction of the raster dimensions.
fn relative_ink_centroid(raster: &RgbaImage) -> (f32, f32) {
    let (width, height) = raster.dimensions();
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut count = 0.0f64;

    for (x, y, pixel) in raster.enumerate_pixels() {
        if pixel[0] < 128 && pixel[3] > 0 {
            sum_x += f64::from(x);
            sum_y += f64::from(y);
            count += 1.0;
        }
    }

    assert!(count > 0.0, "expected inked pixels in the raster");
    (
        (sum_x / count / f64::from(width)) as f32,
        (sum_y / count / f64::from(height)) as f32,
    )
}

#[test]
fn annotations_keep_their_relative_position_across_export_resolutions() {
    let mut rasterizer = LopdfRasterizer::new();
    let handle = rasterizer.open(minimal_pdf_bytes(1).into()).expect("open");
    let store = annotated_store();
    let renderer = OverlayRenderer::new();
    let pipeline = ExportPipeline::new(&renderer);
    let temp = tempfile::tempdir().expect("temp dir");

    let mut centroids = Vec::new();
    for dpi in [150, 300] {
        let mut assembler = RecordingAssembler::default();
        let mut status = CountingStatus::default();
        pipeline
            .run(
                &rasterizer,
                handle,
                &store,
                &mut assembler,
                &ExportSettings { dpi },
                &temp.path().join(format!("out-{dpi}.pdf")),
                &mut status,
            )
            .expect("export succeeds");

        assert_eq!(assembler.rasters.len(), 1);
        // Raster size tracks the DPI; page size stays in points.
        let factor = dpi as f32 / 72.0;
        assert_eq!(assembler.rasters[0].width(), (612.0 * factor).round() as u32);
        assert_eq!(assembler.pages[0], (612.0, 792.0));

        centroids.push(relative_ink_centroid(&assembler.rasters[0]));
    }

    let (low, high) = (centroids[0], centroids[1]);
    assert!((low.0 - high.0).abs() < 0.01, "x ratio drifted: {low:?} vs {high:?}");
    assert!((low.1 - high.1).abs() < 0.01, "y ratio drifted: {low:?} vs {high:?}");
}

#[test]
fn a_failing_page_aborts_the_export_but_always_signals_finished() {
    let mut rasterizer =
        FailingRasterizer { inner: LopdfRasterizer::new(), fail_on_page: 2 };
    let handle = rasterizer.open(minimal_pdf_bytes(3).into()).expect("open");
    let store = annotated_store();
    let renderer = OverlayRenderer::new();
    let pipeline = ExportPipeline::new(&renderer);
    let temp = tempfile::tempdir().expect("temp dir");

    let mut assembler = RecordingAssembler::default();
    let mut status = CountingStatus::default();
    let result = pipeline.run(
        &rasterizer,
        handle,
        &store,
        &mut assembler,
        &ExportSettings::default(),
        &temp.path().join("out.pdf"),
        &mut status,
    );

    assert!(matches!(result, Err(ExportError::Raster(_))));
    assert!(!assembler.saved, "aborted export must not save");
    assert_eq!(status.started, 1);
    assert_eq!(status.finished, 1, "loading indicator must clear on failure");
    assert_eq!(status.alerts.len(), 1, "exactly one user-visible alert");

    // The store survives the failed export and is exportable again.
    assert_eq!(store.strokes(1).len(), 1);
}

#[test]
fn end_to_end_export_writes_a_parseable_document() {
    let mut rasterizer = LopdfRasterizer::new();
    let handle = rasterizer.open(minimal_pdf_bytes(2).into()).expect("open");
    let store = annotated_store();
    let renderer = OverlayRenderer::new();
    let pipeline = ExportPipeline::new(&renderer);

    let temp = tempfile::tempdir().expect("temp dir");
    let output = temp.path().join("annotated.pdf");

    let mut assembler = LopdfAssembler::new();
    let mut status = CountingStatus::default();
    pipeline
        .run(
            &rasterizer,
            handle,
            &store,
            &mut assembler,
            &ExportSettings::default(),
            &output,
            &mut status,
        )
        .expect("export succeeds");

    let doc = Document::load(&output).expect("output parses");
    assert_eq!(doc.get_pages().len(), 2);
    assert!(status.alerts.is_empty());
}
