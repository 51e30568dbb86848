//! Renderer seam.

use hq_core::DocumentFormat;

use crate::csv::CsvRenderer;
use crate::pdf::PdfRenderer;
use crate::shape::ReportDocument;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("PDF error: {reason}")]
    Pdf { reason: String },

    #[error("Document has no content: {what}")]
    Empty { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bytes of one generated document and the file name to store them under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait DocumentRenderer: Send + Sync {
    fn format(&self) -> DocumentFormat;
    fn render(&self, document: &ReportDocument) -> RenderResult<RenderedArtifact>;
}

/// The built-in renderer for a format.
pub fn renderer_for(format: DocumentFormat) -> Box<dyn DocumentRenderer> {
    match format {
        DocumentFormat::Pdf => Box::new(PdfRenderer::default()),
        DocumentFormat::Excel => Box::new(CsvRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_for_matches_format() {
        for format in DocumentFormat::ALL {
            assert_eq!(renderer_for(format).format(), format);
        }
    }
}
