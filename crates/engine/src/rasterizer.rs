//! Page rasterization boundary
//!
//! The core talks to the rasterizer exclusively through [`PageRasterizer`];
//! view-time and export-time renders are independent calls at independent
//! scales. [`LopdfRasterizer`] is the default backend: it parses page
//! geometry and text with lopdf and renders placeholder page rasters. A
//! full-fidelity backend (pdfium or similar) is a drop-in trait impl.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::Rgba;
use lopdf::Document;

use crate::text_fragments::{self, TextFragment};
use crate::RgbaImage;

/// Opaque handle for an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Construct a handle from its raw value; for backend implementations.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in points (1/72 inch) at reference scale 1.0.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("not a PDF document")]
    NotAPdf,
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u16, page_count: u16 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Contract the annotation core renders against.
///
/// Page indices are 1-based throughout, bounded by `page_count`.
pub trait PageRasterizer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, RasterError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u16, RasterError>;
    fn page_size(&self, handle: DocumentHandle, page: u16) -> Result<PageSize, RasterError>;

    /// Render a page at an arbitrary positive scale. A non-positive scale
    /// is treated as 1.0.
    fn render_page(
        &self,
        handle: DocumentHandle,
        page: u16,
        scale: f32,
    ) -> Result<RgbaImage, RasterError>;

    /// Positioned text fragments for layout reconstruction.
    fn text_fragments(
        &self,
        handle: DocumentHandle,
        page: u16,
    ) -> Result<Vec<TextFragment>, RasterError>;

    fn close(&mut self, handle: DocumentHandle) -> Result<(), RasterError>;
}

struct DocumentRecord {
    doc: Document,
    page_sizes: Vec<PageSize>,
}

/// Default lopdf-backed rasterizer.
///
/// Renders a white page with a light grey border so the pipeline is fully
/// exercisable without a native rendering library.
#[derive(Default)]
pub struct LopdfRasterizer {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(bytes: &[u8]) -> Result<DocumentRecord, RasterError> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(RasterError::NotAPdf);
        }

        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(RasterError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(PageSize { width_pt: 612.0, height_pt: 792.0 });

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(RasterError::Backend("document has no pages".to_owned()));
        }

        Ok(DocumentRecord { doc, page_sizes: sizes })
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, RasterError> {
        self.docs.get(&handle).ok_or(RasterError::InvalidHandle(handle.raw()))
    }

    fn check_page(record: &DocumentRecord, page: u16) -> Result<usize, RasterError> {
        let page_count = record.page_sizes.len() as u16;
        if page == 0 || page > page_count {
            return Err(RasterError::PageOutOfRange { page, page_count });
        }
        Ok(usize::from(page) - 1)
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, RasterError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let record = Self::parse(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document {} ({} pages)", handle.raw(), record.page_sizes.len());
        self.docs.insert(handle, record);

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u16, RasterError> {
        Ok(self.record(handle)?.page_sizes.len() as u16)
    }

    fn page_size(&self, handle: DocumentHandle, page: u16) -> Result<PageSize, RasterError> {
        let record = self.record(handle)?;
        let index = Self::check_page(record, page)?;
        Ok(record.page_sizes[index])
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        page: u16,
        scale: f32,
    ) -> Result<RgbaImage, RasterError> {
        let size = self.page_size(handle, page)?;
        let scale = if scale <= 0.0 || !scale.is_finite() { 1.0 } else { scale };

        let width = (size.width_pt * scale).round().max(1.0) as u32;
        let height = (size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn text_fragments(
        &self,
        handle: DocumentHandle,
        page: u16,
    ) -> Result<Vec<TextFragment>, RasterError> {
        let record = self.record(handle)?;
        Self::check_page(record, page)?;

        let pages = record.doc.get_pages();
        let page_id = pages
            .get(&u32::from(page))
            .copied()
            .ok_or(RasterError::PageOutOfRange { page, page_count: pages.len() as u16 })?;

        let content = record.doc.get_page_content(page_id)?;
        text_fragments::extract(&content).map_err(RasterError::from)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), RasterError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(RasterError::InvalidHandle(handle.raw()))
    }
}
