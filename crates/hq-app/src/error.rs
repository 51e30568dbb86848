//! Error types for the hq-app service layer.

use std::path::PathBuf;

use crate::export_service::ExportError;

/// Application error type that wraps errors from the backend crates
/// and gives front ends one error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Criteria error: {0}")]
    Criteria(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Edit rejected: {0}")]
    Builder(#[from] hq_report::BuilderError),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hq-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<hq_criteria::CriteriaError> for AppError {
    fn from(err: hq_criteria::CriteriaError) -> Self {
        AppError::Criteria(err.to_string())
    }
}

impl From<hq_report::ReportError> for AppError {
    fn from(err: hq_report::ReportError) -> Self {
        AppError::Report(err.to_string())
    }
}

impl From<hq_store::StoreError> for AppError {
    fn from(err: hq_store::StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<hq_core::HqError> for AppError {
    fn from(err: hq_core::HqError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
