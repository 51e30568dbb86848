//! Shared application service layer for hvacqual.
//!
//! Front ends talk to [`ReportService`] for editing and to
//! [`ExportCoordinator`] for document generation; both sit on the same
//! blob store and criteria table.

pub mod config;
pub mod error;
pub mod export_service;
pub mod progress;
pub mod report_service;

pub use config::{AppConfig, CONFIG_FILE_NAME, HOME_ENV};
pub use error::{AppError, AppResult};
pub use export_service::{
    ExportCoordinator, ExportError, ExportHandle, ExportOutcome, ExportRequest,
};
pub use progress::{ExportMessage, ExportStage};
pub use report_service::{ReportService, ReportSummary};
