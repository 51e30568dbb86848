//! Report persistence over a blob store.

use std::sync::{Arc, Mutex};

use hq_core::ReportId;
use hq_report::Report;
use serde_json::Value;

use crate::blob::{BlobStore, load_json_or_discard};
use crate::{StoreError, StoreResult};

pub const REPORTS_KEY: &str = "hvac-reports";

/// Collection-level access to persisted reports.
pub trait ReportRepository: Send + Sync {
    /// Every report, in the order they were first saved.
    fn get_all(&self) -> StoreResult<Vec<Report>>;
    fn get_by_id(&self, id: ReportId) -> StoreResult<Option<Report>>;
    /// Insert or replace by id; a replaced report keeps its position.
    fn save(&self, report: &Report) -> StoreResult<()>;
    /// Returns whether a report was removed.
    fn delete(&self, id: ReportId) -> StoreResult<bool>;
}

/// Stores all reports as one JSON array under [`REPORTS_KEY`].
///
/// Entries this build cannot read (a newer version, a failed integrity check)
/// are hidden from readers but written back untouched.
pub struct BlobReportRepository<S: BlobStore + ?Sized> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: BlobStore + ?Sized> BlobReportRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn load_entries(&self) -> StoreResult<Vec<Value>> {
        Ok(load_json_or_discard(&*self.store, REPORTS_KEY)?.unwrap_or_default())
    }

    fn load(&self) -> StoreResult<Vec<Report>> {
        let entries = self.load_entries()?;
        let mut reports = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            match hq_report::from_json_value(entry) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::warn!(position, error = %e, "skipping unreadable report");
                }
            }
        }
        Ok(reports)
    }

    fn store_entries(&self, entries: &[Value]) -> StoreResult<()> {
        let content = serde_json::to_string(entries)?;
        self.store.put(REPORTS_KEY, &content)
    }
}

fn entry_id(entry: &Value) -> Option<ReportId> {
    entry.get("id")?.as_str()?.parse().ok()
}

impl<S: BlobStore + ?Sized> ReportRepository for BlobReportRepository<S> {
    fn get_all(&self) -> StoreResult<Vec<Report>> {
        self.load()
    }

    fn get_by_id(&self, id: ReportId) -> StoreResult<Option<Report>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    fn save(&self, report: &Report) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::poisoned("report"))?;
        let mut entries = self.load_entries()?;
        let value = serde_json::to_value(report)?;
        match entries
            .iter_mut()
            .find(|entry| entry_id(entry) == Some(report.id()))
        {
            Some(existing) => *existing = value,
            None => entries.push(value),
        }
        self.store_entries(&entries)?;
        tracing::debug!(report_id = %report.id(), "saved report");
        Ok(())
    }

    fn delete(&self, id: ReportId) -> StoreResult<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::poisoned("report"))?;
        let mut entries = self.load_entries()?;
        let before = entries.len();
        entries.retain(|entry| entry_id(entry) != Some(id));
        if entries.len() == before {
            return Ok(false);
        }
        self.store_entries(&entries)?;
        tracing::debug!(report_id = %id, "deleted report");
        Ok(true)
    }
}
