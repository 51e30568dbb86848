//! Index of generated documents per report.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use hq_core::{DocumentFormat, ReportId};
use serde::{Deserialize, Serialize};

use crate::blob::{BlobStore, load_json_or_discard};
use crate::{StoreError, StoreResult};

pub const FILES_KEY: &str = "hvac-report-files";

/// Metadata of one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFileRecord {
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Latest artifact per format; a newer export replaces the older record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<ReportFileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel: Option<ReportFileRecord>,
}

impl ReportFiles {
    pub fn get(&self, format: DocumentFormat) -> Option<&ReportFileRecord> {
        match format {
            DocumentFormat::Pdf => self.pdf.as_ref(),
            DocumentFormat::Excel => self.excel.as_ref(),
        }
    }

    pub fn set(&mut self, format: DocumentFormat, record: ReportFileRecord) {
        match format {
            DocumentFormat::Pdf => self.pdf = Some(record),
            DocumentFormat::Excel => self.excel = Some(record),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pdf.is_none() && self.excel.is_none()
    }
}

type FileMap = BTreeMap<ReportId, ReportFiles>;

/// File records of every report, stored as one JSON object under [`FILES_KEY`].
pub struct ReportFileIndex<S: BlobStore + ?Sized> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: BlobStore + ?Sized> ReportFileIndex<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> StoreResult<FileMap> {
        Ok(load_json_or_discard(&*self.store, FILES_KEY)?.unwrap_or_default())
    }

    fn modify<R>(&self, f: impl FnOnce(&mut FileMap) -> R) -> StoreResult<R> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::poisoned("file index"))?;
        let mut map = self.load()?;
        let out = f(&mut map);
        let content = serde_json::to_string(&map)?;
        self.store.put(FILES_KEY, &content)?;
        Ok(out)
    }

    pub fn all(&self) -> StoreResult<BTreeMap<ReportId, ReportFiles>> {
        self.load()
    }

    pub fn get(&self, report_id: ReportId) -> StoreResult<ReportFiles> {
        Ok(self.load()?.remove(&report_id).unwrap_or_default())
    }

    pub fn record(
        &self,
        report_id: ReportId,
        format: DocumentFormat,
        record: ReportFileRecord,
    ) -> StoreResult<()> {
        let file_name = record.file_name.clone();
        self.modify(|map| map.entry(report_id).or_default().set(format, record))?;
        tracing::info!(%report_id, %format, %file_name, "recorded generated file");
        Ok(())
    }

    /// Drop every record of a report; returns what was removed.
    pub fn remove(&self, report_id: ReportId) -> StoreResult<ReportFiles> {
        self.modify(|map| map.remove(&report_id).unwrap_or_default())
    }
}
