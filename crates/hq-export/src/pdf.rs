//! A4 PDF rendering with the built-in Helvetica faces.

use std::io::BufWriter;

use hq_core::DocumentFormat;
use printpdf::*;

use crate::render::{DocumentRenderer, RenderError, RenderResult, RenderedArtifact};
use crate::shape::{ReportDocument, RoomSection, verdict_label};

const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM: Mm = Mm(18.0);
const LEFT: Mm = Mm(20.0);
const INDENT: Mm = Mm(25.0);
const WRAP_CHARS: usize = 95;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

fn pdf_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf {
        reason: e.to_string(),
    }
}

/// Writes lines top-down and starts a new page when the bottom margin is hit.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
    pages: usize,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self
            .doc
            .add_page(PAGE_W, PAGE_H, format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    fn skip(&mut self, gap: Mm) {
        self.y -= gap;
    }

    fn text(&mut self, text: &str, size: f32, x: Mm, bold: bool, advance: Mm) {
        if self.y - advance < BOTTOM {
            self.new_page();
        }
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, x, self.y, font);
        self.y -= advance;
    }

    fn wrapped(&mut self, text: &str, size: f32, x: Mm) {
        for line in wrap_text(text, WRAP_CHARS) {
            self.text(&line, size, x, false, Mm(4.5));
        }
    }

    fn room(&mut self, room: &RoomSection) {
        self.text(
            &format!("{}. {}", room.section, room.heading),
            13.0,
            LEFT,
            true,
            Mm(8.0),
        );
        for fact in &room.facts {
            self.text(&format!("{}: {}", fact.label, fact.value), 9.0, INDENT, false, Mm(4.5));
        }
        self.skip(Mm(4.0));

        for test in &room.tests {
            self.text(
                &format!("{}  [{}]", test.title, verdict_label(test.meets_criteria)),
                10.0,
                LEFT,
                true,
                Mm(5.5),
            );
            for value in &test.values {
                self.wrapped(&format!("{}: {}", value.label, value.value), 9.0, INDENT);
            }
            self.wrapped(&format!("Criteria: {}", test.criteria), 9.0, INDENT);
            self.skip(Mm(3.0));
        }

        self.text("Summary by test type", 10.0, LEFT, true, Mm(5.5));
        for kind in &room.kinds {
            self.text(
                &format!(
                    "{}: {}/{} passed, {}",
                    kind.label,
                    kind.passed,
                    kind.instances,
                    verdict_label(kind.meets_criteria)
                ),
                9.0,
                INDENT,
                false,
                Mm(4.5),
            );
        }
        self.skip(Mm(2.0));
        self.text(
            &format!("Room result: {}", verdict_label(room.meets_criteria)),
            11.0,
            LEFT,
            true,
            Mm(6.0),
        );
    }
}

impl PdfRenderer {
    pub fn to_pdf(&self, document: &ReportDocument) -> RenderResult<Vec<u8>> {
        let (doc, page1, layer1) = PdfDocument::new(&document.title, PAGE_W, PAGE_H, "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        let pages = {
            let mut w = PageWriter {
                doc: &doc,
                layer: doc.get_page(page1).get_layer(layer1),
                regular,
                bold,
                y: TOP,
                pages: 1,
            };

            w.text(&document.title, 16.0, LEFT, true, Mm(10.0));
            for info in &document.info {
                w.text(&format!("{}: {}", info.label, info.value), 10.0, LEFT, false, Mm(5.5));
            }
            w.text(
                &format!("Generated: {}", document.generated_at.format("%Y-%m-%d %H:%M UTC")),
                8.0,
                LEFT,
                false,
                Mm(8.0),
            );

            w.text("Contents", 12.0, LEFT, true, Mm(6.5));
            for entry in &document.contents {
                w.text(&format!("{}. {}", entry.section, entry.title), 10.0, INDENT, false, Mm(5.0));
            }
            w.skip(Mm(6.0));
            w.text(
                &format!("Overall result: {}", verdict_label(document.meets_criteria)),
                12.0,
                LEFT,
                true,
                Mm(6.0),
            );

            for room in &document.rooms {
                w.new_page();
                w.room(room);
            }
            w.pages
        };

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf).map_err(pdf_error)?;
        let bytes = buf.into_inner().map_err(|e| RenderError::Io(e.into_error()))?;
        tracing::debug!(pages, bytes = bytes.len(), "rendered pdf");
        Ok(bytes)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn render(&self, document: &ReportDocument) -> RenderResult<RenderedArtifact> {
        if document.rooms.is_empty() {
            return Err(RenderError::Empty {
                what: "no rooms".to_string(),
            });
        }
        Ok(RenderedArtifact {
            file_name: format!("{}.{}", document.file_stem(), self.format().extension()),
            bytes: self.to_pdf(document)?,
        })
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
