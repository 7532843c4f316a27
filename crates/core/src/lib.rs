//! Annotation and rendering core
//!
//! Resolution-independent annotation model for a paginated document
//! viewer: all geometry lives in document space (page points at scale
//! 1.0) and is multiplied by a scale factor only at draw time, which
//! makes annotations correct at any zoom level and any export
//! resolution without re-deriving geometry.

pub mod annotation;
pub mod capture;
pub mod debounce;
pub mod export;
pub mod input;
pub mod overlay;
pub mod scale;
pub mod session;
pub mod store;
pub mod text_extract;
pub mod textgen;

pub use annotation::{
    Color, DocPoint, PageDimensions, StrokeAnnotation, StrokeTool, TextAnnotation, TextStyle, Tool,
};
pub use capture::{CaptureResponse, StrokeCapture};
pub use debounce::Debouncer;
pub use export::{
    export_filename, ExportError, ExportPipeline, ExportSettings, SilentStatus, StatusSink,
};
pub use input::{Action, Key, KeyInput};
pub use overlay::{BlockTextDraw, OverlayRenderer, TextDraw};
pub use scale::{document_to_display, display_to_document, FitOutcome, ScaleModel};
pub use session::{DocumentSession, SessionError};
pub use store::{AnnotationStore, PageAnnotations};
pub use text_extract::reconstruct_layout;
pub use textgen::{PanelOutput, SummaryLength, TextGenError, TextGenerationService};
