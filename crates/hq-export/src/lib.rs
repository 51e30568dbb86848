//! hq-export: document shaping and rendering.
//!
//! [`shape_document`] flattens a report into a format-neutral
//! [`ReportDocument`]; each [`DocumentRenderer`] turns that into bytes.

pub mod csv;
pub mod pdf;
pub mod render;
pub mod shape;

pub use csv::CsvRenderer;
pub use pdf::PdfRenderer;
pub use render::{DocumentRenderer, RenderError, RenderResult, RenderedArtifact, renderer_for};
pub use shape::{
    ContentsEntry, Field, KindSummary, ReportDocument, RoomSection, TestRow, shape_document,
    verdict_label,
};
