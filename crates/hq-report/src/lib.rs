//! hq-report: report aggregate, editing and validation.

pub mod builder;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use builder::{BuilderError, BuilderResult, ReportEditor, RoomDraft};
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{
    IntegrityIssue, ValidationIssue, ValidationOutcome, check_integrity, validate_report,
};

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Integrity error: {0}")]
    Integrity(IntegrityIssue),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one report, bring it to the latest schema and check its structure.
pub fn from_json_str(content: &str) -> ReportResult<Report> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    from_json_value(value)
}

/// As [`from_json_str`], for a report already split out of a larger document.
pub fn from_json_value(value: serde_json::Value) -> ReportResult<Report> {
    let report: Report = serde_json::from_value(value)?;
    let report = migrate_to_latest(report)?;
    if let Some(issue) = check_integrity(&report).into_iter().next() {
        return Err(ReportError::Integrity(issue));
    }
    Ok(report)
}

pub fn to_json_string(report: &Report) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn load_json(path: &std::path::Path) -> ReportResult<Report> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn save_json(path: &std::path::Path, report: &Report) -> ReportResult<()> {
    let content = to_json_string(report)?;
    std::fs::write(path, content)?;
    Ok(())
}
