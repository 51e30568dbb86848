//! Document export: derive, validate, render, write, record.
//!
//! At most one export per report id runs at a time. The file record is
//! written only after the artifact is on disk, so a failed export never
//! leaves a record behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use hq_core::{DocumentFormat, ReportId};
use hq_criteria::CriteriaTable;
use hq_export::{DocumentRenderer, RenderError, renderer_for, shape_document};
use hq_report::{ReportEditor, validate_report};
use hq_store::{
    BlobStore, ReportFileIndex, ReportFileRecord, ReportRepository, StoreError, artifact_digest,
};

use crate::progress::{ExportMessage, ExportStage};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("An export of report {report_id} is already in progress")]
    AlreadyInFlight { report_id: ReportId },

    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: ReportId },

    #[error("Report is incomplete: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },

    #[error("No renderer for {format}")]
    NoRenderer { format: DocumentFormat },

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Export worker stopped without a result")]
    WorkerLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub report_id: ReportId,
    pub format: DocumentFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub report_id: ReportId,
    pub format: DocumentFormat,
    pub path: PathBuf,
    pub record: ReportFileRecord,
}

pub(crate) type InFlight = Arc<Mutex<HashSet<ReportId>>>;

/// Holds a report id in the in-flight set until dropped.
struct InFlightGuard {
    in_flight: InFlight,
    report_id: ReportId,
}

impl InFlightGuard {
    fn acquire(in_flight: &InFlight, report_id: ReportId) -> Result<Self, ExportError> {
        let mut set = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(report_id) {
            return Err(ExportError::AlreadyInFlight { report_id });
        }
        Ok(Self {
            in_flight: in_flight.clone(),
            report_id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.report_id);
    }
}

/// A running export. Dropping it abandons the result; the worker still finishes.
pub struct ExportHandle {
    pub report_id: ReportId,
    pub format: DocumentFormat,
    messages: Receiver<ExportMessage>,
    _handle: JoinHandle<()>,
}

impl ExportHandle {
    pub fn messages(&self) -> &Receiver<ExportMessage> {
        &self.messages
    }

    /// Block until the worker reports its result.
    pub fn wait(self) -> Result<ExportOutcome, ExportError> {
        while let Ok(message) = self.messages.recv() {
            match message {
                ExportMessage::Stage { stage, .. } => {
                    tracing::trace!(report_id = %self.report_id, ?stage, "export stage");
                }
                ExportMessage::Finished(result) => return result,
            }
        }
        Err(ExportError::WorkerLost)
    }
}

#[derive(Clone)]
pub struct ExportCoordinator {
    criteria: Arc<CriteriaTable>,
    reports: Arc<dyn ReportRepository>,
    files: Arc<ReportFileIndex<dyn BlobStore>>,
    output_dir: PathBuf,
    renderers: Arc<Vec<Arc<dyn DocumentRenderer>>>,
    in_flight: InFlight,
}

impl ExportCoordinator {
    pub fn new(
        criteria: Arc<CriteriaTable>,
        reports: Arc<dyn ReportRepository>,
        files: Arc<ReportFileIndex<dyn BlobStore>>,
        output_dir: PathBuf,
    ) -> Self {
        let renderers: Vec<Arc<dyn DocumentRenderer>> = DocumentFormat::ALL
            .into_iter()
            .map(|format| Arc::from(renderer_for(format)))
            .collect();
        Self {
            criteria,
            reports,
            files,
            output_dir,
            renderers: Arc::new(renderers),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Share the in-flight set with other coordinators over the same store.
    pub(crate) fn with_in_flight(mut self, in_flight: InFlight) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Replace the renderer for `renderer.format()`.
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        let mut renderers: Vec<_> = self
            .renderers
            .iter()
            .filter(|r| r.format() != renderer.format())
            .cloned()
            .collect();
        renderers.push(renderer);
        self.renderers = Arc::new(renderers);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_in_flight(&self, report_id: ReportId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&report_id)
    }

    /// Start an export on a worker thread.
    ///
    /// The in-flight check happens before this returns, so a second call for
    /// the same report fails immediately with [`ExportError::AlreadyInFlight`].
    pub fn start(&self, request: ExportRequest) -> Result<ExportHandle, ExportError> {
        let guard = InFlightGuard::acquire(&self.in_flight, request.report_id)?;
        let (tx, rx) = channel();
        let coordinator = self.clone();

        let handle = thread::spawn(move || {
            let result = coordinator.run(request, &tx);
            drop(guard);
            if let Err(e) = &result {
                tracing::warn!(report_id = %request.report_id, error = %e, "export failed");
            }
            let _ = tx.send(ExportMessage::Finished(result));
        });

        Ok(ExportHandle {
            report_id: request.report_id,
            format: request.format,
            messages: rx,
            _handle: handle,
        })
    }

    /// Run an export on the calling thread, under the same in-flight rule.
    pub fn export_blocking(&self, request: ExportRequest) -> Result<ExportOutcome, ExportError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, request.report_id)?;
        let (tx, _rx) = channel();
        self.run(request, &tx)
    }

    fn renderer(&self, format: DocumentFormat) -> Result<&Arc<dyn DocumentRenderer>, ExportError> {
        self.renderers
            .iter()
            .find(|r| r.format() == format)
            .ok_or(ExportError::NoRenderer { format })
    }

    fn run(
        &self,
        request: ExportRequest,
        tx: &Sender<ExportMessage>,
    ) -> Result<ExportOutcome, ExportError> {
        let ExportRequest { report_id, format } = request;
        let stage = |stage| {
            let _ = tx.send(ExportMessage::Stage { report_id, stage });
        };

        stage(ExportStage::LoadingReport);
        let mut report = self
            .reports
            .get_by_id(report_id)?
            .ok_or(ExportError::ReportNotFound { report_id })?;

        stage(ExportStage::Deriving);
        ReportEditor::new(&self.criteria).rederive(&mut report);

        stage(ExportStage::Validating);
        let validation = validate_report(&report);
        if !validation.valid {
            return Err(ExportError::Invalid {
                errors: validation.errors,
            });
        }

        stage(ExportStage::Rendering);
        let renderer = self.renderer(format)?;
        let document = shape_document(&report, &self.criteria, Utc::now());
        let artifact = renderer.render(&document)?;

        stage(ExportStage::WritingArtifact);
        let path = self.output_dir.join(&artifact.file_name);
        std::fs::create_dir_all(&self.output_dir)
            .and_then(|()| std::fs::write(&path, &artifact.bytes))
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;

        stage(ExportStage::RecordingFile);
        let record = ReportFileRecord {
            file_name: artifact.file_name,
            created_at: document.generated_at,
            size_bytes: artifact.bytes.len() as u64,
            sha256: artifact_digest(&artifact.bytes),
        };
        self.files.record(report_id, format, record.clone())?;

        tracing::info!(%report_id, %format, path = %path.display(), "export finished");
        Ok(ExportOutcome {
            report_id,
            format,
            path,
            record,
        })
    }
}
