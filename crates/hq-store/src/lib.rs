//! hq-store: persisted reports and the generated-file index.
//!
//! Everything sits on a [`BlobStore`]: a key/value store of JSON documents.
//! Reports live under one key, file records under another.

pub mod blob;
pub mod files;
pub mod hash;
pub mod repository;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use files::{FILES_KEY, ReportFileIndex, ReportFileRecord, ReportFiles};
pub use hash::artifact_digest;
pub use repository::{BlobReportRepository, REPORTS_KEY, ReportRepository};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// The blob exists but is not text; readers discard it.
    #[error("Corrupt blob {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: String },
}

impl StoreError {
    pub(crate) fn poisoned(what: &str) -> Self {
        StoreError::Unavailable {
            reason: format!("{what} lock poisoned"),
        }
    }
}
