use hq_core::ReportId;

use crate::export_service::{ExportError, ExportOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    LoadingReport,
    Deriving,
    Validating,
    Rendering,
    WritingArtifact,
    RecordingFile,
}

/// Sent from an export worker to its [`ExportHandle`](crate::ExportHandle).
#[derive(Debug)]
pub enum ExportMessage {
    Stage {
        report_id: ReportId,
        stage: ExportStage,
    },
    Finished(Result<ExportOutcome, ExportError>),
}

impl ExportStage {
    pub fn label(self) -> &'static str {
        match self {
            ExportStage::LoadingReport => "Loading report",
            ExportStage::Deriving => "Recomputing derived values",
            ExportStage::Validating => "Validating",
            ExportStage::Rendering => "Rendering",
            ExportStage::WritingArtifact => "Writing file",
            ExportStage::RecordingFile => "Recording file",
        }
    }
}
