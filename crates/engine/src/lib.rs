//! Collaborator boundary for the annotation core
//!
//! Hosts the two external contracts the core consumes and produces:
//! page rasterization (document bytes -> page image at an arbitrary
//! scale, plus positioned text fragments) and output assembly
//! (composited raster pages -> a saved multi-page document).

pub mod assembler;
pub mod rasterizer;
mod text_fragments;

pub use assembler::{AssembleError, LopdfAssembler, OutputAssembler};
pub use rasterizer::{
    DocumentHandle, LopdfRasterizer, OpenSource, PageRasterizer, PageSize, RasterError,
};
pub use text_fragments::TextFragment;

pub type RgbaImage = image::ImageBuffer<image::Rgba<u8>, Vec<u8>>;
