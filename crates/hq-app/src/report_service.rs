//! Report editing on top of the persisted store.
//!
//! Every mutation is load → edit through [`ReportEditor`] → save, so the
//! stored report always carries up-to-date derived values.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hq_core::{ReportId, RoomId, TestId};
use hq_criteria::{CriteriaTable, TestData};
use hq_report::{
    BuilderError, Report, ReportEditor, ReportInfo, Room, RoomDraft, TestInstance,
    ValidationOutcome, validate_report,
};
use hq_store::{
    BlobReportRepository, BlobStore, FsBlobStore, ReportFileIndex, ReportFiles, ReportRepository,
};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::export_service::{ExportCoordinator, InFlight};

/// Summary of a report for listing.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub id: ReportId,
    pub report_number: String,
    pub hospital_name: String,
    pub room_count: usize,
    pub test_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportService {
    criteria: Arc<CriteriaTable>,
    reports: Arc<dyn ReportRepository>,
    files: Arc<ReportFileIndex<dyn BlobStore>>,
    in_flight: InFlight,
}

impl ReportService {
    pub fn new(criteria: CriteriaTable, store: Arc<dyn BlobStore>) -> Self {
        Self {
            criteria: Arc::new(criteria),
            reports: Arc::new(BlobReportRepository::new(store.clone())),
            files: Arc::new(ReportFileIndex::new(store)),
            in_flight: InFlight::default(),
        }
    }

    /// Filesystem-backed service for a config.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let criteria = config.load_criteria()?;
        let store = FsBlobStore::open(&config.data_dir)?;
        tracing::debug!(data_dir = %config.data_dir.display(), "opened report store");
        Ok(Self::new(criteria, Arc::new(store)))
    }

    pub fn criteria(&self) -> &CriteriaTable {
        &self.criteria
    }

    /// Exporters from one service share a single in-flight set.
    pub fn exporter(&self, output_dir: impl Into<PathBuf>) -> ExportCoordinator {
        ExportCoordinator::new(
            self.criteria.clone(),
            self.reports.clone(),
            self.files.clone(),
            output_dir.into(),
        )
        .with_in_flight(self.in_flight.clone())
    }

    pub fn list(&self) -> AppResult<Vec<ReportSummary>> {
        Ok(self
            .reports
            .get_all()?
            .iter()
            .map(|report| ReportSummary {
                id: report.id(),
                report_number: report.info().report_number.clone(),
                hospital_name: report.info().hospital_name.clone(),
                room_count: report.rooms().len(),
                test_count: report.test_count(),
                updated_at: report.updated_at(),
            })
            .collect())
    }

    /// The stored report, re-derived against the current criteria table.
    pub fn get(&self, id: ReportId) -> AppResult<Report> {
        let mut report = self
            .reports
            .get_by_id(id)?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))?;
        ReportEditor::new(&self.criteria).rederive(&mut report);
        Ok(report)
    }

    pub fn create(&self, info: ReportInfo) -> AppResult<Report> {
        let report = ReportEditor::new(&self.criteria).create_report(info);
        self.reports.save(&report)?;
        tracing::info!(report_id = %report.id(), "created report");
        Ok(report)
    }

    fn edit<T>(
        &self,
        id: ReportId,
        f: impl FnOnce(&ReportEditor<'_>, &mut Report) -> Result<T, BuilderError>,
    ) -> AppResult<T> {
        let mut report = self.get(id)?;
        let out = f(&ReportEditor::new(&self.criteria), &mut report)?;
        self.reports.save(&report)?;
        Ok(out)
    }

    pub fn update_info(&self, id: ReportId, info: ReportInfo) -> AppResult<()> {
        self.edit(id, |editor, report| {
            editor.update_info(report, info);
            Ok(())
        })
    }

    pub fn add_room(&self, id: ReportId, draft: RoomDraft) -> AppResult<RoomId> {
        self.edit(id, |editor, report| Ok(editor.add_room(report, draft)))
    }

    pub fn update_room(&self, id: ReportId, room_id: RoomId, draft: RoomDraft) -> AppResult<()> {
        self.edit(id, |editor, report| editor.update_room(report, room_id, draft))
    }

    pub fn remove_room(&self, id: ReportId, room_id: RoomId) -> AppResult<Room> {
        self.edit(id, |editor, report| editor.remove_room(report, room_id))
    }

    /// Move a room to a 0-based position in document order.
    pub fn move_room(&self, id: ReportId, room_id: RoomId, position: usize) -> AppResult<()> {
        self.edit(id, |editor, report| {
            editor.move_room(report, room_id, position)
        })
    }

    pub fn add_test(&self, id: ReportId, room_id: RoomId, data: TestData) -> AppResult<TestId> {
        self.edit(id, |editor, report| editor.add_test(report, room_id, data))
    }

    pub fn update_test(
        &self,
        id: ReportId,
        room_id: RoomId,
        test_id: TestId,
        data: TestData,
    ) -> AppResult<()> {
        self.edit(id, |editor, report| {
            editor.update_test(report, room_id, test_id, data)
        })
    }

    pub fn remove_test(
        &self,
        id: ReportId,
        room_id: RoomId,
        test_id: TestId,
    ) -> AppResult<TestInstance> {
        self.edit(id, |editor, report| {
            editor.remove_test(report, room_id, test_id)
        })
    }

    pub fn validate(&self, id: ReportId) -> AppResult<ValidationOutcome> {
        Ok(validate_report(&self.get(id)?))
    }

    pub fn files(&self, id: ReportId) -> AppResult<ReportFiles> {
        Ok(self.files.get(id)?)
    }

    /// Delete a report and its file records; returns whether it existed.
    pub fn delete(&self, id: ReportId) -> AppResult<bool> {
        let removed = self.reports.delete(id)?;
        let files = self.files.remove(id)?;
        if removed {
            tracing::info!(report_id = %id, had_files = !files.is_empty(), "deleted report");
        }
        Ok(removed)
    }
}
