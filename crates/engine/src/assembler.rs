//! Output document assembly
//!
//! The export pipeline hands over finished, already-composited raster
//! pages; the assembler never sees annotation geometry. [`LopdfAssembler`]
//! encodes each raster as a JPEG image XObject drawn across the full page
//! MediaBox, with page sizes given in document-space points, and writes
//! the result with lopdf.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use lopdf::{dictionary, Document, Object, Stream};

use crate::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("no output document has been started")]
    NoDocument,
    #[error("page {0} already has a raster")]
    PageAlreadyRasterized(usize),
    #[error("page {0} has no raster")]
    MissingRaster(usize),
    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("PDF write error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives composited raster pages and produces a saved document.
///
/// `new_document` sets the output page size from the first page;
/// subsequent pages are added with `append_page`. Each page gets exactly
/// one raster before `save`.
pub trait OutputAssembler {
    fn new_document(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError>;
    fn append_page(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError>;
    fn add_raster_to_current_page(&mut self, raster: &RgbaImage) -> Result<(), AssembleError>;
    fn save(&mut self, path: &Path) -> Result<(), AssembleError>;
}

struct PendingPage {
    width_pt: f32,
    height_pt: f32,
    jpeg: Option<EncodedRaster>,
}

struct EncodedRaster {
    bytes: Vec<u8>,
    width_px: u32,
    height_px: u32,
}

/// lopdf-backed assembler writing JPEG page images.
pub struct LopdfAssembler {
    quality: u8,
    pages: Vec<PendingPage>,
    started: bool,
}

impl LopdfAssembler {
    pub fn new() -> Self {
        Self { quality: 90, pages: Vec::new(), started: false }
    }

    pub fn with_quality(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100), pages: Vec::new(), started: false }
    }

    fn encode(&self, raster: &RgbaImage) -> Result<EncodedRaster, AssembleError> {
        let rgb = image::DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut bytes), self.quality).encode_image(&rgb)?;
        Ok(EncodedRaster { bytes, width_px: raster.width(), height_px: raster.height() })
    }

    fn build_document(&self) -> Result<Document, AssembleError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());

        for (index, page) in self.pages.iter().enumerate() {
            let raster = page.jpeg.as_ref().ok_or(AssembleError::MissingRaster(index + 1))?;

            let image_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(raster.width_px),
                    "Height" => i64::from(raster.height_px),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                raster.bytes.clone(),
            );
            let image_id = doc.add_object(image_stream);

            // Stretch the image across the full MediaBox; the raster was
            // rendered at the export resolution for exactly this page size.
            let content = format!(
                "q\n{:.4} 0 0 {:.4} 0 0 cm\n/Im0 Do\nQ\n",
                page.width_pt, page.height_pt
            );
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(page.width_pt),
                    Object::Real(page.height_pt),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }
}

impl Default for LopdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputAssembler for LopdfAssembler {
    fn new_document(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError> {
        self.pages.clear();
        self.started = true;
        self.pages.push(PendingPage { width_pt: page_width, height_pt: page_height, jpeg: None });
        Ok(())
    }

    fn append_page(&mut self, page_width: f32, page_height: f32) -> Result<(), AssembleError> {
        if !self.started {
            return Err(AssembleError::NoDocument);
        }
        self.pages.push(PendingPage { width_pt: page_width, height_pt: page_height, jpeg: None });
        Ok(())
    }

    fn add_raster_to_current_page(&mut self, raster: &RgbaImage) -> Result<(), AssembleError> {
        let index = self.pages.len();
        let page = self.pages.last().ok_or(AssembleError::NoDocument)?;
        if page.jpeg.is_some() {
            return Err(AssembleError::PageAlreadyRasterized(index));
        }
        let encoded = self.encode(raster)?;
        self.pages.last_mut().expect("checked above").jpeg = Some(encoded);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), AssembleError> {
        if !self.started {
            return Err(AssembleError::NoDocument);
        }
        let mut doc = self.build_document()?;
        doc.save(path)?;
        log::debug!("saved {} page(s) to {}", self.pages.len(), path.display());
        Ok(())
    }
}
