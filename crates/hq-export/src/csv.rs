//! Excel-compatible CSV: one row per test, report facts repeated per row.

use hq_core::DocumentFormat;

use crate::render::{DocumentRenderer, RenderError, RenderResult, RenderedArtifact};
use crate::shape::{ReportDocument, verdict_label};

const HEADER: &str = "Report number,Hospital,Measurement date,Section,Room,Room class,Volume,Test,Values,Criteria,Result,Room result";

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

/// Leading characters that make a spreadsheet read the cell as a formula.
const FORMULA_PREFIXES: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

fn escape(value: &str) -> String {
    let value = if value.starts_with(FORMULA_PREFIXES) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn info_value<'a>(document: &'a ReportDocument, label: &str) -> &'a str {
    document
        .info
        .iter()
        .find(|f| f.label == label)
        .map(|f| f.value.as_str())
        .unwrap_or("")
}

impl CsvRenderer {
    pub fn to_csv(&self, document: &ReportDocument) -> String {
        let mut csv = String::new();
        // BOM so Excel picks UTF-8
        csv.push('\u{feff}');
        csv.push_str(HEADER);
        csv.push_str("\r\n");

        let hospital = info_value(document, "Hospital");
        let date = info_value(document, "Measurement date");

        for room in &document.rooms {
            let fact = |label: &str| {
                room.facts
                    .iter()
                    .find(|f| f.label == label)
                    .map(|f| f.value.clone())
                    .unwrap_or_default()
            };
            for test in &room.tests {
                let values = test
                    .values
                    .iter()
                    .map(|f| format!("{}: {}", f.label, f.value))
                    .collect::<Vec<_>>()
                    .join("; ");
                let cells: [&str; 12] = [
                    document.report_number.as_str(),
                    hospital,
                    date,
                    room.section.as_str(),
                    room.heading.as_str(),
                    &fact("Room class"),
                    &fact("Volume"),
                    test.title.as_str(),
                    &values,
                    test.criteria.as_str(),
                    verdict_label(test.meets_criteria),
                    verdict_label(room.meets_criteria),
                ];
                let line = cells.iter().map(|c| escape(c)).collect::<Vec<_>>().join(",");
                csv.push_str(&line);
                csv.push_str("\r\n");
            }
        }

        csv.push_str(&format!(
            "Overall result,{}\r\n",
            verdict_label(document.meets_criteria)
        ));
        csv
    }
}

impl DocumentRenderer for CsvRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Excel
    }

    fn render(&self, document: &ReportDocument) -> RenderResult<RenderedArtifact> {
        if document.rooms.is_empty() {
            return Err(RenderError::Empty {
                what: "no rooms".to_string(),
            });
        }
        let csv = self.to_csv(document);
        let rows: usize = document.rooms.iter().map(|r| r.tests.len()).sum();
        tracing::debug!(rows, "rendered csv");
        Ok(RenderedArtifact {
            file_name: format!("{}.{}", document.file_stem(), self.format().extension()),
            bytes: csv.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_formula_cells() {
        assert_eq!(escape("=1+1"), "'=1+1");
        assert_eq!(escape("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(escape("+31 20"), "'+31 20");
        assert_eq!(escape("-2.5 Pa"), "'-2.5 Pa");
        assert_eq!(escape("=HYPERLINK(\"x\",\"y\")"), "\"'=HYPERLINK(\"\"x\"\",\"\"y\"\")\"");
        assert_eq!(escape("a=b"), "a=b");
    }

    #[test]
    fn escape_quotes_only_when_needed() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
